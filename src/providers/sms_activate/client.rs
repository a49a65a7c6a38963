//! SMS Activate HTTP client (legacy `handler_api` protocol).

use super::tokenizer::{Sentinel, SentinelLine, tokenize};
use crate::errors::AdapterError;
use crate::types::{CountryCode, PhoneNumber, ServiceCode, VendorOrderId};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

/// Default SMS Activate API URL.
pub const DEFAULT_API_URL: &str = "https://api.sms-activate.org/stubs/handler_api.php";

/// Cancel code for the `setStatus` action.
const STATUS_CANCEL_ACTIVATION: u8 = 8;

/// One country record from the JSON `getCountries` action.
#[derive(Debug, Clone, Deserialize)]
pub(super) struct CountryEntry {
    pub eng: String,
    #[serde(default = "default_visible")]
    pub visible: u8,
}

fn default_visible() -> u8 {
    1
}

/// One service price record from the JSON `getPrices` action.
#[derive(Debug, Clone, Deserialize)]
pub(super) struct PriceEntry {
    pub cost: f64,
    pub count: u32,
}

/// SMS Activate HTTP client.
///
/// Lifecycle actions answer with single-line colon-delimited text that is
/// routed through the sentinel tokenizer; catalog actions (`getCountries`,
/// `getPrices`) answer with JSON.
#[derive(Clone)]
pub struct SmsActivateClient {
    http_client: ClientWithMiddleware,
    api_key: SecretString,
    endpoint: Url,
}

impl std::fmt::Debug for SmsActivateClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmsActivateClient")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// Builder for configuring a [`SmsActivateClient`].
pub struct SmsActivateClientBuilder {
    api_key: String,
    endpoint: Option<Url>,
    timeout: Duration,
    http_client: Option<ClientWithMiddleware>,
}

impl SmsActivateClientBuilder {
    /// Create a new builder with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: None,
            timeout: Duration::from_secs(30),
            http_client: None,
        }
    }

    /// Set a custom API endpoint.
    pub fn endpoint(mut self, endpoint: Url) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    /// Bound every request to the given timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set a custom HTTP client with middleware.
    pub fn http_client(mut self, client: ClientWithMiddleware) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Build the [`SmsActivateClient`].
    pub fn build(self) -> Result<SmsActivateClient, AdapterError> {
        let endpoint = self
            .endpoint
            .unwrap_or_else(|| Url::parse(DEFAULT_API_URL).expect("Invalid default URL"));

        let http_client = match self.http_client {
            Some(client) => client,
            None => {
                let client = reqwest::Client::builder()
                    .timeout(self.timeout)
                    .build()
                    .map_err(AdapterError::BuildHttpClient)?;
                ClientBuilder::new(client).build()
            }
        };

        Ok(SmsActivateClient {
            http_client,
            api_key: SecretString::from(self.api_key),
            endpoint,
        })
    }
}

impl SmsActivateClient {
    /// Create a new client against a custom endpoint.
    pub fn new(endpoint: impl AsRef<str>, api_key: impl Into<String>) -> Result<Self, AdapterError> {
        let url = Url::parse(endpoint.as_ref()).map_err(|e| {
            AdapterError::BuildRequestUrl(serde_urlencoded::ser::Error::Custom(
                std::borrow::Cow::Owned(e.to_string()),
            ))
        })?;

        Self::builder(api_key).endpoint(url).build()
    }

    /// Create a new client with the default API URL.
    pub fn with_api_key(api_key: impl Into<String>) -> Result<Self, AdapterError> {
        Self::builder(api_key).build()
    }

    /// Create a builder for configuring the client.
    pub fn builder(api_key: impl Into<String>) -> SmsActivateClientBuilder {
        SmsActivateClientBuilder::new(api_key)
    }

    /// Build request URL with action and parameters.
    fn build_request_url(
        &self,
        action: &str,
        additional: Vec<(&str, String)>,
    ) -> Result<Url, AdapterError> {
        let mut endpoint = self.endpoint.clone();
        let api_key = self.api_key.expose_secret().to_string();

        let mut params = HashMap::new();
        params.insert("api_key", api_key);
        params.insert("action", action.to_string());

        for (key, value) in additional {
            params.insert(key, value);
        }

        endpoint.set_query(Some(
            &serde_urlencoded::to_string(&params).map_err(AdapterError::BuildRequestUrl)?,
        ));

        Ok(endpoint)
    }

    /// Send a GET request and return the response text.
    async fn send_request(&self, url: Url) -> Result<String, AdapterError> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(AdapterError::HttpRequest)?;

        response.text().await.map_err(AdapterError::ParseResponse)
    }

    /// Run a lifecycle action and tokenize the single-line response.
    ///
    /// Account-level error sentinels are converted here; `NO_NUMBERS` is
    /// left to the caller, which knows the purchase context.
    async fn lifecycle_request(
        &self,
        action: &str,
        params: Vec<(&str, String)>,
    ) -> Result<SentinelLine, AdapterError> {
        let url = self.build_request_url(action, params)?;
        let text = self.send_request(url).await?;
        let line = tokenize(&text)?;

        match line.sentinel {
            Sentinel::NoBalance => Err(AdapterError::InsufficientUpstreamBalance),
            Sentinel::BadKey => Err(AdapterError::Auth {
                detail: line.raw.clone(),
            }),
            _ => Ok(line),
        }
    }

    /// Run a catalog action and decode the JSON body.
    async fn catalog_request<T: DeserializeOwned>(
        &self,
        action: &str,
        params: Vec<(&str, String)>,
    ) -> Result<T, AdapterError> {
        let url = self.build_request_url(action, params)?;
        let text = self.send_request(url).await?;

        match serde_json::from_str(&text) {
            Ok(value) => Ok(value),
            // The vendor answers catalog actions with a sentinel line when
            // the request itself is rejected.
            Err(json_err) => match tokenize(&text) {
                Ok(line) if line.sentinel == Sentinel::BadKey => Err(AdapterError::Auth {
                    detail: line.raw.clone(),
                }),
                Ok(line) => Err(AdapterError::UpstreamFormat { raw: line.raw }),
                Err(_) => Err(AdapterError::DeserializeJson(json_err)),
            },
        }
    }

    /// Account balance: `ACCESS_BALANCE:<amount>`.
    pub async fn get_balance(&self) -> Result<f64, AdapterError> {
        let line = self.lifecycle_request("getBalance", vec![]).await?;

        match line.sentinel {
            Sentinel::AccessBalance => line
                .field(0)
                .and_then(|v| v.parse::<f64>().ok())
                .ok_or(AdapterError::UpstreamFormat { raw: line.raw }),
            _ => Err(AdapterError::UpstreamFormat { raw: line.raw }),
        }
    }

    /// Rent a number: `ACCESS_NUMBER:<id>:<number>`.
    #[tracing::instrument(
        name = "SmsActivateClient::get_number",
        skip_all,
        fields(country = %country, service = %service)
    )]
    pub async fn get_number(
        &self,
        country: &CountryCode,
        service: &ServiceCode,
    ) -> Result<(VendorOrderId, PhoneNumber), AdapterError> {
        let line = self
            .lifecycle_request(
                "getNumber",
                vec![
                    ("service", service.to_string()),
                    ("country", country.to_string()),
                ],
            )
            .await?;

        match line.sentinel {
            Sentinel::NoNumbers => Err(AdapterError::NoInventory {
                country: country.clone(),
                service: service.clone(),
            }),
            Sentinel::AccessNumber => {
                let id = line.field(0).ok_or_else(|| AdapterError::UpstreamFormat {
                    raw: line.raw.clone(),
                })?;
                let number = line
                    .field(1)
                    .and_then(|n| PhoneNumber::new(n).ok())
                    .ok_or_else(|| AdapterError::UpstreamFormat {
                        raw: line.raw.clone(),
                    })?;
                Ok((VendorOrderId::new(id), number))
            }
            _ => Err(AdapterError::UpstreamFormat { raw: line.raw }),
        }
    }

    /// Poll activation status: one of the `STATUS_*` sentinels.
    #[tracing::instrument(
        name = "SmsActivateClient::get_status",
        skip_all,
        fields(vendor_order_id = %id)
    )]
    pub async fn get_status(&self, id: &VendorOrderId) -> Result<SentinelLine, AdapterError> {
        self.lifecycle_request("getStatus", vec![("id", id.to_string())])
            .await
    }

    /// Cancel the activation: expects `ACCESS_CANCEL` (or `STATUS_CANCEL`
    /// when the vendor already considers it cancelled).
    #[tracing::instrument(
        name = "SmsActivateClient::cancel_activation",
        skip_all,
        fields(vendor_order_id = %id)
    )]
    pub async fn cancel_activation(&self, id: &VendorOrderId) -> Result<SentinelLine, AdapterError> {
        self.lifecycle_request(
            "setStatus",
            vec![
                ("id", id.to_string()),
                ("status", STATUS_CANCEL_ACTIVATION.to_string()),
            ],
        )
        .await
    }

    /// Country catalog (JSON action).
    pub(super) async fn get_countries(
        &self,
    ) -> Result<HashMap<String, CountryEntry>, AdapterError> {
        self.catalog_request("getCountries", vec![]).await
    }

    /// Price catalog for one country (JSON action), keyed country → service.
    pub(super) async fn get_prices(
        &self,
        country: &CountryCode,
    ) -> Result<HashMap<String, HashMap<String, PriceEntry>>, AdapterError> {
        self.catalog_request("getPrices", vec![("country", country.to_string())])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> SmsActivateClient {
        SmsActivateClient::new(server.uri(), "test_key").unwrap()
    }

    #[tokio::test]
    async fn test_get_balance() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(query_param("action", "getBalance"))
            .and(query_param("api_key", "test_key"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ACCESS_BALANCE:12.34"))
            .mount(&server)
            .await;

        let balance = client(&server).get_balance().await.unwrap();
        assert_eq!(balance, 12.34);
    }

    #[tokio::test]
    async fn test_get_number_success() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(query_param("action", "getNumber"))
            .and(query_param("service", "tg"))
            .and(query_param("country", "0"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("ACCESS_NUMBER:987654:79001234567"),
            )
            .mount(&server)
            .await;

        let (id, number) = client(&server)
            .get_number(&"0".into(), &"tg".into())
            .await
            .unwrap();
        assert_eq!(id.as_ref(), "987654");
        assert_eq!(number.as_str(), "79001234567");
    }

    #[tokio::test]
    async fn test_get_number_no_inventory() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(query_param("action", "getNumber"))
            .respond_with(ResponseTemplate::new(200).set_body_string("NO_NUMBERS"))
            .mount(&server)
            .await;

        let err = client(&server)
            .get_number(&"0".into(), &"tg".into())
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::NoInventory { .. }));
    }

    #[tokio::test]
    async fn test_no_balance_sentinel() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(query_param("action", "getNumber"))
            .respond_with(ResponseTemplate::new(200).set_body_string("NO_BALANCE"))
            .mount(&server)
            .await;

        let err = client(&server)
            .get_number(&"0".into(), &"tg".into())
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::InsufficientUpstreamBalance));
    }

    #[tokio::test]
    async fn test_bad_key_sentinel() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(query_param("action", "getBalance"))
            .respond_with(ResponseTemplate::new(200).set_body_string("BAD_KEY"))
            .mount(&server)
            .await;

        let err = client(&server).get_balance().await.unwrap_err();
        assert!(matches!(err, AdapterError::Auth { .. }));
    }

    #[tokio::test]
    async fn test_unknown_line_fails_closed() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(query_param("action", "getBalance"))
            .respond_with(ResponseTemplate::new(200).set_body_string("SOMETHING_ELSE:1:2"))
            .mount(&server)
            .await;

        let err = client(&server).get_balance().await.unwrap_err();
        assert!(matches!(err, AdapterError::UpstreamFormat { .. }));
    }

    #[tokio::test]
    async fn test_cancel_activation() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(query_param("action", "setStatus"))
            .and(query_param("status", "8"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ACCESS_CANCEL"))
            .mount(&server)
            .await;

        let line = client(&server)
            .cancel_activation(&VendorOrderId::from("987654"))
            .await
            .unwrap();
        assert_eq!(line.sentinel, Sentinel::AccessCancel);
    }

    #[tokio::test]
    async fn test_get_prices_catalog() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(query_param("action", "getPrices"))
            .and(query_param("country", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "0": {"tg": {"cost": 20.0, "count": 150}}
            })))
            .mount(&server)
            .await;

        let prices = client(&server).get_prices(&"0".into()).await.unwrap();
        assert_eq!(prices["0"]["tg"].cost, 20.0);
        assert_eq!(prices["0"]["tg"].count, 150);
    }
}

//! 5sim HTTP client.

use super::types::{ApiErrorBody, BuyResponse, CountryInfo, OrderResponse, ProfileResponse, Product};
use crate::errors::AdapterError;
use crate::types::{CountryCode, ServiceCode, VendorOrderId};
use reqwest::header;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

/// Default 5sim API base URL.
pub const DEFAULT_API_URL: &str = "https://5sim.net/";

/// 5sim HTTP client.
///
/// All requests are bearer-token-authenticated GETs; success bodies are
/// JSON, business failures arrive as plain-text bodies with HTTP 400.
#[derive(Clone)]
pub struct FiveSimClient {
    http_client: ClientWithMiddleware,
    api_key: SecretString,
    endpoint: Url,
}

impl std::fmt::Debug for FiveSimClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FiveSimClient")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// Builder for configuring a [`FiveSimClient`].
pub struct FiveSimClientBuilder {
    api_key: String,
    endpoint: Option<Url>,
    timeout: Duration,
    http_client: Option<ClientWithMiddleware>,
}

impl FiveSimClientBuilder {
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

    /// Build the [`FiveSimClient`].
    pub fn build(self) -> Result<FiveSimClient, AdapterError> {
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

        Ok(FiveSimClient {
            http_client,
            api_key: SecretString::from(self.api_key),
            endpoint,
        })
    }
}

impl FiveSimClient {
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
    pub fn builder(api_key: impl Into<String>) -> FiveSimClientBuilder {
        FiveSimClientBuilder::new(api_key)
    }

    fn api_url(&self, path: &str) -> Result<Url, AdapterError> {
        self.endpoint.join(path).map_err(|e| {
            AdapterError::BuildRequestUrl(serde_urlencoded::ser::Error::Custom(
                std::borrow::Cow::Owned(e.to_string()),
            ))
        })
    }

    /// Send an authenticated GET and return status plus body text.
    async fn get_text(&self, url: Url) -> Result<(u16, String), AdapterError> {
        let response = self
            .http_client
            .get(url)
            .header(
                header::AUTHORIZATION,
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(AdapterError::HttpRequest)?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(AdapterError::ParseResponse)?;
        Ok((status, text))
    }

    /// Decode a response after any operation-specific error mapping ran.
    fn decode_success<T: DeserializeOwned>(status: u16, text: &str) -> Result<T, AdapterError> {
        if status == 401 || status == 403 {
            return Err(AdapterError::Auth {
                detail: text.trim().to_string(),
            });
        }
        if !(200..300).contains(&status) {
            return Err(AdapterError::Status {
                status,
                body: text.trim().to_string(),
            });
        }
        serde_json::from_str(text).map_err(AdapterError::DeserializeJson)
    }

    fn decode<T: DeserializeOwned>(status: u16, text: &str) -> Result<T, AdapterError> {
        if let Some(api) = ApiErrorBody::from_body(text) {
            return Err(api.into_adapter_error(text));
        }
        Self::decode_success(status, text)
    }

    /// Account profile, including the vendor-side balance.
    pub async fn get_profile(&self) -> Result<ProfileResponse, AdapterError> {
        let url = self.api_url("v1/user/profile")?;
        let (status, text) = self.get_text(url).await?;
        Self::decode(status, &text)
    }

    /// Country catalog, keyed by purchase code.
    pub async fn get_countries(&self) -> Result<HashMap<String, CountryInfo>, AdapterError> {
        let url = self.api_url("v1/guest/countries")?;
        let (status, text) = self.get_text(url).await?;
        Self::decode(status, &text)
    }

    /// Product catalog for a country, keyed by service code.
    pub async fn get_products(
        &self,
        country: &CountryCode,
    ) -> Result<HashMap<String, Product>, AdapterError> {
        let url = self.api_url(&format!("v1/guest/products/{country}/any"))?;
        let (status, text) = self.get_text(url).await?;
        Self::decode(status, &text)
    }

    /// Buy an activation number.
    #[tracing::instrument(
        name = "FiveSimClient::buy_activation",
        skip_all,
        fields(country = %country, service = %service)
    )]
    pub async fn buy_activation(
        &self,
        country: &CountryCode,
        service: &ServiceCode,
    ) -> Result<BuyResponse, AdapterError> {
        let url = self.api_url(&format!("v1/user/buy/activation/{country}/any/{service}"))?;
        let (status, text) = self.get_text(url).await?;

        if let Some(api) = ApiErrorBody::from_body(&text) {
            return Err(api.into_purchase_error(country, service));
        }
        Self::decode_success(status, &text)
    }

    /// Poll an order's status and messages.
    #[tracing::instrument(
        name = "FiveSimClient::check_order",
        skip_all,
        fields(vendor_order_id = %id)
    )]
    pub async fn check_order(&self, id: &VendorOrderId) -> Result<OrderResponse, AdapterError> {
        let url = self.api_url(&format!("v1/user/check/{id}"))?;
        let (status, text) = self.get_text(url).await?;
        Self::decode(status, &text)
    }

    /// Cancel an order. Returns `None` when the vendor no longer knows the
    /// order, which callers treat as "already cancelled".
    #[tracing::instrument(
        name = "FiveSimClient::cancel_order",
        skip_all,
        fields(vendor_order_id = %id)
    )]
    pub async fn cancel_order(
        &self,
        id: &VendorOrderId,
    ) -> Result<Option<OrderResponse>, AdapterError> {
        let url = self.api_url(&format!("v1/user/cancel/{id}"))?;
        let (status, text) = self.get_text(url).await?;

        match ApiErrorBody::from_body(&text) {
            Some(ApiErrorBody::OrderNotFound) | Some(ApiErrorBody::OrderExpired) => Ok(None),
            Some(api) => Err(api.into_adapter_error(&text)),
            None => Self::decode_success(status, &text).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client(server: &MockServer) -> FiveSimClient {
        FiveSimClient::new(format!("{}/", server.uri()), "test_key").unwrap()
    }

    #[tokio::test]
    async fn test_get_profile_sends_bearer_token() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/user/profile"))
            .and(header("authorization", "Bearer test_key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": 1, "email": "x@y.z", "balance": 42.5
            })))
            .mount(&server)
            .await;

        let profile = client(&server).await.get_profile().await.unwrap();
        assert_eq!(profile.balance, 42.5);
    }

    #[tokio::test]
    async fn test_buy_activation_success() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/user/buy/activation/ukraine/any/telegram"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": 123456789,
                "phone": "+380501234567",
                "price": 7.0,
                "status": "PENDING",
                "expires": "2025-01-01T12:20:00Z"
            })))
            .mount(&server)
            .await;

        let response = client(&server)
            .await
            .buy_activation(&"ukraine".into(), &"telegram".into())
            .await
            .unwrap();
        assert_eq!(response.id, 123456789);
        assert_eq!(response.phone, "+380501234567");
    }

    #[tokio::test]
    async fn test_buy_activation_no_inventory() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/user/buy/activation/ukraine/any/telegram"))
            .respond_with(ResponseTemplate::new(400).set_body_string("no free phones"))
            .mount(&server)
            .await;

        let err = client(&server)
            .await
            .buy_activation(&"ukraine".into(), &"telegram".into())
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::NoInventory { .. }));
    }

    #[tokio::test]
    async fn test_buy_activation_upstream_balance() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/user/buy/activation/ukraine/any/telegram"))
            .respond_with(ResponseTemplate::new(400).set_body_string("not enough user balance"))
            .mount(&server)
            .await;

        let err = client(&server)
            .await
            .buy_activation(&"ukraine".into(), &"telegram".into())
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::InsufficientUpstreamBalance));
    }

    #[tokio::test]
    async fn test_check_order_with_code() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/user/check/123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "RECEIVED",
                "sms": [{"code": "482913", "text": "code: 482913"}]
            })))
            .mount(&server)
            .await;

        let order = client(&server)
            .await
            .check_order(&VendorOrderId::from("123"))
            .await
            .unwrap();
        assert_eq!(order.status, "RECEIVED");
        assert_eq!(order.sms[0].code, "482913");
    }

    #[tokio::test]
    async fn test_cancel_unknown_order_is_none() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/user/cancel/123"))
            .respond_with(ResponseTemplate::new(400).set_body_string("order not found"))
            .mount(&server)
            .await;

        let result = client(&server)
            .await
            .cancel_order(&VendorOrderId::from("123"))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_unauthorized_maps_to_auth_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/user/profile"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
            .mount(&server)
            .await;

        let err = client(&server).await.get_profile().await.unwrap_err();
        assert!(matches!(err, AdapterError::Auth { .. }));
    }
}

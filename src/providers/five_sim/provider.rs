//! 5sim provider adapter.

use super::client::FiveSimClient;
use super::types::{flag_emoji, normalize_status};
use crate::errors::AdapterError;
use crate::model::ProviderConfig;
use crate::provider::{
    ProviderAdapter, VendorBalance, VendorCountry, VendorPoll, VendorPurchase, VendorService,
};
use crate::types::{CountryCode, NumberStatus, PhoneNumber, ServiceCode, SmsCode, VendorOrderId};
use async_trait::async_trait;
use secrecy::ExposeSecret;
use tracing::debug;

/// Adapter for the 5sim JSON/REST API.
#[derive(Debug, Clone)]
pub struct FiveSimProvider {
    client: FiveSimClient,
}

impl FiveSimProvider {
    pub fn new(client: FiveSimClient) -> Self {
        Self { client }
    }

    /// Build an adapter from a stored provider configuration, applying the
    /// endpoint and path overrides and the per-provider request timeout.
    pub fn from_config(config: &ProviderConfig) -> Result<Self, AdapterError> {
        let mut builder = FiveSimClient::builder(config.api_key.expose_secret())
            .timeout(config.settings.request_timeout);

        let mut endpoint = config.endpoint.clone().unwrap_or_else(|| {
            url::Url::parse(super::client::DEFAULT_API_URL).expect("Invalid default URL")
        });
        if let Some(path) = &config.settings.path_override {
            endpoint.set_path(path);
        }
        builder = builder.endpoint(endpoint);
        Ok(Self::new(builder.build()?))
    }

    /// Get reference to the inner client.
    pub fn client(&self) -> &FiveSimClient {
        &self.client
    }
}

#[async_trait]
impl ProviderAdapter for FiveSimProvider {
    fn vendor(&self) -> &'static str {
        "5sim"
    }

    async fn get_balance(&self) -> Result<VendorBalance, AdapterError> {
        let profile = self.client.get_profile().await?;
        Ok(VendorBalance {
            amount: profile.balance,
            currency: "RUB".to_string(),
        })
    }

    async fn get_countries(&self) -> Result<Vec<VendorCountry>, AdapterError> {
        let raw = self.client.get_countries().await?;

        let mut countries: Vec<VendorCountry> = raw
            .into_iter()
            .map(|(code, info)| {
                let iso = info.iso.keys().min().cloned().unwrap_or_default();
                VendorCountry {
                    code: CountryCode::new(code),
                    name: info.text_en,
                    flag: flag_emoji(&iso),
                }
            })
            .collect();
        countries.sort_by(|a, b| a.code.as_str().cmp(b.code.as_str()));
        Ok(countries)
    }

    async fn get_services(
        &self,
        country: &CountryCode,
    ) -> Result<Vec<VendorService>, AdapterError> {
        let raw = self.client.get_products(country).await?;

        let mut services: Vec<VendorService> = raw
            .into_iter()
            .filter(|(_, product)| product.category == "activation")
            .map(|(code, product)| VendorService {
                name: code.clone(),
                service: ServiceCode::new(code),
                price: product.price,
                available: product.qty,
            })
            .collect();
        services.sort_by(|a, b| a.service.as_str().cmp(b.service.as_str()));
        Ok(services)
    }

    async fn purchase_number(
        &self,
        country: &CountryCode,
        service: &ServiceCode,
    ) -> Result<VendorPurchase, AdapterError> {
        let response = self.client.buy_activation(country, service).await?;

        let number =
            PhoneNumber::new(&response.phone).map_err(|_| AdapterError::UpstreamFormat {
                raw: response.phone.clone(),
            })?;

        Ok(VendorPurchase {
            vendor_order_id: VendorOrderId::new(response.id.to_string()),
            number,
            status: normalize_status(&response.status)?,
            expires_at: Some(response.expires),
            price: Some(response.price),
        })
    }

    async fn check_number(&self, id: &VendorOrderId) -> Result<VendorPoll, AdapterError> {
        let response = self.client.check_order(id).await?;

        let status = normalize_status(&response.status)?;
        let code = response
            .sms
            .first()
            .filter(|sms| !sms.code.is_empty())
            .map(|sms| SmsCode::new(&sms.code));

        Ok(VendorPoll { status, code })
    }

    async fn cancel_number(&self, id: &VendorOrderId) -> Result<bool, AdapterError> {
        match self.client.cancel_order(id).await? {
            Some(order) => {
                let status = normalize_status(&order.status)?;
                Ok(status == NumberStatus::Cancelled)
            }
            None => {
                debug!(vendor_order_id = %id, "vendor no longer knows the order, treating cancel as settled");
                Ok(false)
            }
        }
    }
}

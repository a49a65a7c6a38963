//! SMS Activate provider adapter.

use super::client::SmsActivateClient;
use super::tokenizer::{Sentinel, SentinelLine};
use crate::errors::AdapterError;
use crate::model::ProviderConfig;
use crate::provider::{
    ProviderAdapter, VendorBalance, VendorCountry, VendorPoll, VendorPurchase, VendorService,
};
use crate::types::{CountryCode, NumberStatus, ServiceCode, SmsCode, VendorOrderId};
use async_trait::async_trait;
use secrecy::ExposeSecret;

/// Adapter for the SMS Activate `handler_api` text protocol.
#[derive(Debug, Clone)]
pub struct SmsActivateProvider {
    client: SmsActivateClient,
}

impl SmsActivateProvider {
    pub fn new(client: SmsActivateClient) -> Self {
        Self { client }
    }

    /// Build an adapter from a stored provider configuration, applying the
    /// endpoint and path overrides and the per-provider request timeout.
    pub fn from_config(config: &ProviderConfig) -> Result<Self, AdapterError> {
        let mut builder = SmsActivateClient::builder(config.api_key.expose_secret())
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
    pub fn client(&self) -> &SmsActivateClient {
        &self.client
    }
}

/// Map a `getStatus` sentinel onto the shared lifecycle enum.
///
/// `STATUS_OK` carries the code; the three `WAIT` variants all mean the
/// number is live and listening. `STATUS_WAIT_RETRY` echoes the previous
/// code, which callers already have, so no code is reported for it.
fn normalize_poll(line: &SentinelLine) -> Result<VendorPoll, AdapterError> {
    match line.sentinel {
        Sentinel::StatusOk => Ok(VendorPoll {
            status: NumberStatus::Completed,
            code: line.rest(0).map(SmsCode::new),
        }),
        Sentinel::StatusWaitCode | Sentinel::StatusWaitRetry | Sentinel::StatusWaitResend => {
            Ok(VendorPoll {
                status: NumberStatus::Active,
                code: None,
            })
        }
        Sentinel::StatusCancel => Ok(VendorPoll {
            status: NumberStatus::Cancelled,
            code: None,
        }),
        _ => Err(AdapterError::UpstreamFormat {
            raw: line.raw.clone(),
        }),
    }
}

#[async_trait]
impl ProviderAdapter for SmsActivateProvider {
    fn vendor(&self) -> &'static str {
        "sms-activate"
    }

    async fn get_balance(&self) -> Result<VendorBalance, AdapterError> {
        let amount = self.client.get_balance().await?;
        Ok(VendorBalance {
            amount,
            currency: "RUB".to_string(),
        })
    }

    async fn get_countries(&self) -> Result<Vec<VendorCountry>, AdapterError> {
        let raw = self.client.get_countries().await?;

        let mut countries: Vec<VendorCountry> = raw
            .into_iter()
            .filter(|(_, entry)| entry.visible == 1)
            .map(|(code, entry)| VendorCountry {
                code: CountryCode::new(code),
                name: entry.eng,
                // Numeric country ids carry no ISO code to derive a flag from.
                flag: String::new(),
            })
            .collect();
        countries.sort_by(|a, b| {
            let (a_num, b_num) = (a.code.as_str().parse::<u32>(), b.code.as_str().parse::<u32>());
            match (a_num, b_num) {
                (Ok(a), Ok(b)) => a.cmp(&b),
                _ => a.code.as_str().cmp(b.code.as_str()),
            }
        });
        Ok(countries)
    }

    async fn get_services(
        &self,
        country: &CountryCode,
    ) -> Result<Vec<VendorService>, AdapterError> {
        let raw = self.client.get_prices(country).await?;

        let per_service = raw.get(country.as_str()).cloned().unwrap_or_default();

        let mut services: Vec<VendorService> = per_service
            .into_iter()
            .map(|(code, entry)| VendorService {
                name: code.clone(),
                service: ServiceCode::new(code),
                price: entry.cost,
                available: entry.count,
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
        let (vendor_order_id, number) = self.client.get_number(country, service).await?;

        // The protocol reports neither an expiry nor a price on rent; the
        // number starts out live and listening.
        Ok(VendorPurchase {
            vendor_order_id,
            number,
            status: NumberStatus::Active,
            expires_at: None,
            price: None,
        })
    }

    async fn check_number(&self, id: &VendorOrderId) -> Result<VendorPoll, AdapterError> {
        let line = self.client.get_status(id).await?;
        normalize_poll(&line)
    }

    async fn cancel_number(&self, id: &VendorOrderId) -> Result<bool, AdapterError> {
        let line = self.client.cancel_activation(id).await?;

        match line.sentinel {
            Sentinel::AccessCancel => Ok(true),
            // Already cancelled on the vendor side.
            Sentinel::StatusCancel => Ok(false),
            _ => Err(AdapterError::UpstreamFormat { raw: line.raw }),
        }
    }
}

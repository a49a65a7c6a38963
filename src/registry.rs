//! Vendor code → adapter dispatch.

use crate::errors::AdapterError;
use crate::model::{ProviderConfig, ProviderId};
use crate::provider::ProviderAdapter;
use crate::providers::five_sim::FiveSimProvider;
use crate::providers::sms_activate::SmsActivateProvider;
use crate::providers::{NullAdapter, StubAdapter};
use once_cell::sync::Lazy;
use std::sync::Arc;
use tracing::warn;
use url::Url;

/// Seed values for auto-provisioning a provider record for a known vendor.
/// Never consulted at request time; resolution works off the stored config.
#[derive(Debug, Clone, Copy)]
pub struct VendorDefaults {
    pub vendor: &'static str,
    pub display_name: &'static str,
    pub endpoint: Option<&'static str>,
}

static VENDOR_DEFAULTS: Lazy<Vec<VendorDefaults>> = Lazy::new(|| {
    vec![
        VendorDefaults {
            vendor: "5sim",
            display_name: "5SIM",
            endpoint: Some(crate::providers::five_sim::DEFAULT_API_URL),
        },
        VendorDefaults {
            vendor: "sms-activate",
            display_name: "SMS Activate",
            endpoint: Some(crate::providers::sms_activate::DEFAULT_API_URL),
        },
        VendorDefaults {
            vendor: "smshub",
            display_name: "SMS Hub",
            endpoint: None,
        },
        VendorDefaults {
            vendor: "onlinesim",
            display_name: "OnlineSim",
            endpoint: None,
        },
    ]
});

/// All vendors the registry knows about, wired or not.
pub fn known_vendors() -> &'static [VendorDefaults] {
    &VENDOR_DEFAULTS
}

/// Look up auto-provisioning defaults for a vendor code.
pub fn vendor_defaults(code: &str) -> Option<VendorDefaults> {
    let normalized = normalize_vendor_code(code);
    VENDOR_DEFAULTS
        .iter()
        .find(|d| normalize_vendor_code(d.vendor) == normalized)
        .copied()
}

/// Build a provider configuration for a known vendor from the defaults
/// table. Returns `None` for vendor codes the table does not know.
pub fn auto_provision(
    id: ProviderId,
    vendor_code: &str,
    api_key: impl Into<String>,
) -> Option<ProviderConfig> {
    let defaults = vendor_defaults(vendor_code)?;
    let mut config = ProviderConfig::new(id, defaults.vendor, api_key);
    config.display_name = defaults.display_name.to_string();
    config.endpoint = defaults
        .endpoint
        .and_then(|endpoint| Url::parse(endpoint).ok());
    Some(config)
}

/// Canonical form of a vendor code: lowercased, separators stripped, so
/// `5sim`, `5-SIM` and `5_sim` all dispatch to the same adapter.
fn normalize_vendor_code(code: &str) -> String {
    code.trim()
        .chars()
        .filter(|c| *c != '-' && *c != '_')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Resolve the adapter for a provider configuration.
///
/// Known-but-unwired vendors get a [`StubAdapter`], unknown codes the
/// fail-closed [`NullAdapter`]; either way the caller receives a working
/// object whose operations fail with `UnsupportedProvider` instead of a
/// resolution error that would have to be threaded separately.
pub fn resolve(config: &ProviderConfig) -> Result<Arc<dyn ProviderAdapter>, AdapterError> {
    match normalize_vendor_code(&config.vendor).as_str() {
        "5sim" | "fivesim" => Ok(Arc::new(FiveSimProvider::from_config(config)?)),
        "smsactivate" => Ok(Arc::new(SmsActivateProvider::from_config(config)?)),
        "smshub" => Ok(Arc::new(StubAdapter::new("smshub"))),
        "onlinesim" => Ok(Arc::new(StubAdapter::new("onlinesim"))),
        other => {
            warn!(
                provider_id = %config.id,
                vendor = other,
                "unknown vendor code, resolving to the fail-closed adapter"
            );
            Ok(Arc::new(NullAdapter::new(config.vendor.clone())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ProviderConfig, ProviderId};

    fn config(vendor: &str) -> ProviderConfig {
        ProviderConfig::new(ProviderId::from("p1"), vendor, "test_key")
    }

    #[tokio::test]
    async fn test_resolve_wired_vendors() {
        let adapter = resolve(&config("5sim")).unwrap();
        assert_eq!(adapter.vendor(), "5sim");

        let adapter = resolve(&config("sms-activate")).unwrap();
        assert_eq!(adapter.vendor(), "sms-activate");
    }

    #[tokio::test]
    async fn test_resolve_normalizes_vendor_code() {
        let adapter = resolve(&config("5-SIM")).unwrap();
        assert_eq!(adapter.vendor(), "5sim");

        let adapter = resolve(&config("SMS_Activate")).unwrap();
        assert_eq!(adapter.vendor(), "sms-activate");
    }

    #[tokio::test]
    async fn test_resolve_known_unwired_vendor_fails_closed() {
        let adapter = resolve(&config("smshub")).unwrap();
        assert!(!adapter.test_connection().await);
        assert!(adapter.get_balance().await.is_err());
    }

    #[tokio::test]
    async fn test_resolve_unknown_vendor_fails_closed() {
        let adapter = resolve(&config("sms-bargain")).unwrap();
        assert!(!adapter.test_connection().await);

        let err = adapter.get_balance().await.unwrap_err();
        assert!(matches!(
            err,
            crate::errors::AdapterError::UnsupportedProvider { ref vendor, .. }
                if vendor == "sms-bargain"
        ));
    }

    #[test]
    fn test_auto_provision_known_vendor() {
        let config = auto_provision(ProviderId::from("p1"), "SMS-Activate", "key").unwrap();
        assert_eq!(config.vendor, "sms-activate");
        assert_eq!(config.display_name, "SMS Activate");
        assert!(config.endpoint.is_some());
        assert!(config.active);

        assert!(auto_provision(ProviderId::from("p2"), "sms-bargain", "key").is_none());
    }

    #[test]
    fn test_vendor_defaults_lookup() {
        let defaults = vendor_defaults("5_SIM").unwrap();
        assert_eq!(defaults.vendor, "5sim");
        assert!(defaults.endpoint.is_some());

        assert!(vendor_defaults("sms-bargain").is_none());
    }
}

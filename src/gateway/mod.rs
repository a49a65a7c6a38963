//! The rental gateway: orchestration over a store and the vendor adapters.

mod acquire;
mod lifecycle;

use crate::errors::GatewayError;
use crate::model::{ProviderConfig, ProviderId, UserId};
use crate::provider::{ProviderAdapter, VendorBalance, VendorCountry, VendorService};
use crate::registry;
use crate::retry::call_with_retry;
use crate::store::Store;
use crate::types::CountryCode;
use chrono::Duration;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Tuning knobs for the gateway itself.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Lifetime granted to an order when the vendor reports no expiry.
    pub default_order_ttl: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            default_order_ttl: Duration::minutes(20),
        }
    }
}

impl GatewayConfig {
    pub fn with_default_order_ttl(mut self, ttl: Duration) -> Self {
        self.default_order_ttl = ttl;
        self
    }
}

/// Entry point for callers: number acquisition, lifecycle polling and
/// catalog passthroughs, all over one [`Store`] implementation.
///
/// Provider configurations are re-read from the store on every operation;
/// adapters are built per call and never cached, so credential rotations
/// and endpoint changes take effect immediately.
pub struct RentalGateway<S: Store> {
    store: S,
    config: GatewayConfig,
    /// Per-user critical sections for the balance check-then-debit window.
    user_locks: Mutex<HashMap<UserId, Arc<Mutex<()>>>>,
}

impl<S: Store> RentalGateway<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, GatewayConfig::default())
    }

    pub fn with_config(store: S, config: GatewayConfig) -> Self {
        Self {
            store,
            config,
            user_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Direct access to the underlying store, for embedding callers that
    /// manage users and provider configurations themselves.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub(crate) async fn user_lock(&self, user_id: &UserId) -> Arc<Mutex<()>> {
        let mut locks = self.user_locks.lock().await;
        locks
            .entry(user_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Load a provider configuration and build its adapter.
    ///
    /// `require_active` gates mutating operations; lifecycle polling of
    /// already-purchased orders works even on a disabled provider.
    pub(crate) async fn resolve_provider(
        &self,
        provider_id: &ProviderId,
        require_active: bool,
    ) -> Result<(ProviderConfig, Arc<dyn ProviderAdapter>), GatewayError> {
        let config = self
            .store
            .find_provider(provider_id)
            .await?
            .ok_or_else(|| GatewayError::not_found("provider", provider_id.as_str()))?;

        if require_active && !config.active {
            return Err(GatewayError::ProviderDisabled {
                id: provider_id.to_string(),
            });
        }

        let adapter = registry::resolve(&config)
            .map_err(|e| GatewayError::adapter(provider_id.as_str(), "resolve", e))?;
        Ok((config, adapter))
    }

    /// Countries the provider's vendor can rent numbers in.
    pub async fn list_adapter_countries(
        &self,
        provider_id: &ProviderId,
    ) -> Result<Vec<VendorCountry>, GatewayError> {
        let (config, adapter) = self.resolve_provider(provider_id, true).await?;
        call_with_retry(&config.settings, "get_countries", || adapter.get_countries())
            .await
            .map_err(|e| GatewayError::adapter(provider_id.as_str(), "get_countries", e))
    }

    /// Services purchasable in the given country at the provider's vendor.
    pub async fn list_adapter_services(
        &self,
        provider_id: &ProviderId,
        country: &CountryCode,
    ) -> Result<Vec<VendorService>, GatewayError> {
        let (config, adapter) = self.resolve_provider(provider_id, true).await?;
        call_with_retry(&config.settings, "get_services", || {
            adapter.get_services(country)
        })
        .await
        .map_err(|e| GatewayError::adapter(provider_id.as_str(), "get_services", e))
    }

    /// The vendor account balance behind a provider configuration.
    pub async fn get_adapter_balance(
        &self,
        provider_id: &ProviderId,
    ) -> Result<VendorBalance, GatewayError> {
        let (config, adapter) = self.resolve_provider(provider_id, true).await?;
        call_with_retry(&config.settings, "get_balance", || adapter.get_balance())
            .await
            .map_err(|e| GatewayError::adapter(provider_id.as_str(), "get_balance", e))
    }

    /// Probe a provider's credentials and reachability.
    ///
    /// Works on disabled configurations so administrators can verify a
    /// provider before switching it on. Adapter failures come back as
    /// `false`, never as an error.
    pub async fn test_adapter_connection(
        &self,
        provider_id: &ProviderId,
    ) -> Result<bool, GatewayError> {
        let (_, adapter) = self.resolve_provider(provider_id, false).await?;
        Ok(adapter.test_connection().await)
    }
}

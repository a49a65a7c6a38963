//! The normalized provider adapter contract.

use crate::errors::AdapterError;
use crate::types::{CountryCode, NumberStatus, PhoneNumber, ServiceCode, SmsCode, VendorOrderId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

/// Vendor account balance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VendorBalance {
    pub amount: f64,
    /// ISO currency code or vendor-native currency label.
    pub currency: String,
}

/// One country in a vendor's catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VendorCountry {
    /// Vendor-facing code to use in purchase requests.
    pub code: CountryCode,
    pub name: String,
    /// Emoji flag glyph, empty when the vendor supplies none.
    pub flag: String,
}

/// One purchasable service in a vendor's catalog for a given country.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VendorService {
    pub service: ServiceCode,
    pub name: String,
    pub price: f64,
    /// Numbers the vendor currently has in stock.
    pub available: u32,
}

/// Result of a successful number purchase at the vendor.
#[derive(Debug, Clone)]
pub struct VendorPurchase {
    pub vendor_order_id: VendorOrderId,
    pub number: PhoneNumber,
    pub status: NumberStatus,
    /// Vendor-reported end of the number's lifetime, when given.
    pub expires_at: Option<DateTime<Utc>>,
    /// Vendor-reported price, when given. Informational; the gateway
    /// charges the price it validated the balance against.
    pub price: Option<f64>,
}

/// Result of polling a vendor for an order's status.
#[derive(Debug, Clone)]
pub struct VendorPoll {
    pub status: NumberStatus,
    pub code: Option<SmsCode>,
}

/// Contract every vendor adapter implements.
///
/// Adapters translate these operations into vendor-specific requests and
/// normalize the responses; their only side effects are outbound calls to
/// the vendor. They never touch the document store.
///
/// The trait is object-safe: the registry hands out `Arc<dyn
/// ProviderAdapter>` so the orchestrator and poller stay vendor-agnostic.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Canonical vendor code of this adapter.
    fn vendor(&self) -> &'static str;

    /// Vendor account balance.
    async fn get_balance(&self) -> Result<VendorBalance, AdapterError>;

    /// Countries the vendor can rent numbers in.
    async fn get_countries(&self) -> Result<Vec<VendorCountry>, AdapterError>;

    /// Services purchasable in the given country, with price and stock.
    async fn get_services(
        &self,
        country: &CountryCode,
    ) -> Result<Vec<VendorService>, AdapterError>;

    /// Rent a number for the given country and service.
    ///
    /// Fails with [`AdapterError::NoInventory`] when the vendor has no
    /// numbers and [`AdapterError::InsufficientUpstreamBalance`] when the
    /// vendor account itself lacks funds.
    async fn purchase_number(
        &self,
        country: &CountryCode,
        service: &ServiceCode,
    ) -> Result<VendorPurchase, AdapterError>;

    /// Poll the vendor for the order's status and any received code.
    async fn check_number(&self, id: &VendorOrderId) -> Result<VendorPoll, AdapterError>;

    /// Cancel the order at the vendor.
    ///
    /// Idempotent: a second cancel of an already-cancelled order returns
    /// `Ok(false)` rather than an error.
    async fn cancel_number(&self, id: &VendorOrderId) -> Result<bool, AdapterError>;

    /// Probe whether the vendor is reachable with the configured credentials.
    ///
    /// Default implementation calls `get_balance` and converts any failure
    /// into `false`. Adapters override only to short-circuit cheaply.
    async fn test_connection(&self) -> bool {
        match self.get_balance().await {
            Ok(_) => true,
            Err(e) => {
                debug!(vendor = self.vendor(), error = %e, "connection test failed");
                false
            }
        }
    }
}

//! Fail-closed adapters for vendor codes without a live integration.

use crate::errors::AdapterError;
use crate::provider::{
    ProviderAdapter, VendorBalance, VendorCountry, VendorPoll, VendorPurchase, VendorService,
};
use crate::types::{CountryCode, ServiceCode, VendorOrderId};
use async_trait::async_trait;

/// Adapter for vendor codes the registry recognizes but has no wire
/// implementation for yet. Every operation fails with
/// [`AdapterError::UnsupportedProvider`].
#[derive(Debug, Clone)]
pub struct StubAdapter {
    vendor: &'static str,
}

impl StubAdapter {
    pub fn new(vendor: &'static str) -> Self {
        Self { vendor }
    }

    fn unsupported(&self, operation: &'static str) -> AdapterError {
        AdapterError::UnsupportedProvider {
            vendor: self.vendor.to_string(),
            operation,
        }
    }
}

#[async_trait]
impl ProviderAdapter for StubAdapter {
    fn vendor(&self) -> &'static str {
        self.vendor
    }

    async fn get_balance(&self) -> Result<VendorBalance, AdapterError> {
        Err(self.unsupported("get_balance"))
    }

    async fn get_countries(&self) -> Result<Vec<VendorCountry>, AdapterError> {
        Err(self.unsupported("get_countries"))
    }

    async fn get_services(&self, _: &CountryCode) -> Result<Vec<VendorService>, AdapterError> {
        Err(self.unsupported("get_services"))
    }

    async fn purchase_number(
        &self,
        _: &CountryCode,
        _: &ServiceCode,
    ) -> Result<VendorPurchase, AdapterError> {
        Err(self.unsupported("purchase_number"))
    }

    async fn check_number(&self, _: &VendorOrderId) -> Result<VendorPoll, AdapterError> {
        Err(self.unsupported("check_number"))
    }

    async fn cancel_number(&self, _: &VendorOrderId) -> Result<bool, AdapterError> {
        Err(self.unsupported("cancel_number"))
    }

    /// No wire implementation means nothing to probe.
    async fn test_connection(&self) -> bool {
        false
    }
}

/// Adapter for vendor codes the registry does not recognize at all.
///
/// Keeps the misconfigured provider visible and inert instead of letting a
/// typo'd vendor code route traffic somewhere surprising.
#[derive(Debug, Clone)]
pub struct NullAdapter {
    /// The unrecognized vendor code as configured, kept for error messages.
    requested: String,
}

impl NullAdapter {
    pub fn new(requested: impl Into<String>) -> Self {
        Self {
            requested: requested.into(),
        }
    }

    fn unsupported(&self, operation: &'static str) -> AdapterError {
        AdapterError::UnsupportedProvider {
            vendor: self.requested.clone(),
            operation,
        }
    }
}

#[async_trait]
impl ProviderAdapter for NullAdapter {
    fn vendor(&self) -> &'static str {
        "null"
    }

    async fn get_balance(&self) -> Result<VendorBalance, AdapterError> {
        Err(self.unsupported("get_balance"))
    }

    async fn get_countries(&self) -> Result<Vec<VendorCountry>, AdapterError> {
        Err(self.unsupported("get_countries"))
    }

    async fn get_services(&self, _: &CountryCode) -> Result<Vec<VendorService>, AdapterError> {
        Err(self.unsupported("get_services"))
    }

    async fn purchase_number(
        &self,
        _: &CountryCode,
        _: &ServiceCode,
    ) -> Result<VendorPurchase, AdapterError> {
        Err(self.unsupported("purchase_number"))
    }

    async fn check_number(&self, _: &VendorOrderId) -> Result<VendorPoll, AdapterError> {
        Err(self.unsupported("check_number"))
    }

    async fn cancel_number(&self, _: &VendorOrderId) -> Result<bool, AdapterError> {
        Err(self.unsupported("cancel_number"))
    }

    async fn test_connection(&self) -> bool {
        false
    }
}

//! Error taxonomy for gateway and adapter operations.

use crate::types::{CountryCode, ServiceCode};
use thiserror::Error;

/// Trait for errors that can be classified as retryable or permanent.
///
/// `is_retryable` answers whether re-invoking the same vendor call might
/// succeed (network hiccups, transient vendor-side failures). The opt-in
/// retry path in [`crate::retry`] consults it before re-dialing a vendor.
///
/// `should_retry_operation` answers the broader question of whether a fresh
/// attempt (a new purchase) could work even when the same call will not,
/// e.g. after the vendor ran out of inventory for one country.
pub trait RetryableError {
    /// Returns true if this error represents a transient failure that
    /// might succeed on retry of the same call.
    fn is_retryable(&self) -> bool;

    /// Returns true if a fresh operation might succeed.
    ///
    /// Default implementation returns the same as `is_retryable()`.
    fn should_retry_operation(&self) -> bool {
        self.is_retryable()
    }
}

/// Errors produced by provider adapters while talking to a vendor.
///
/// The granular upstream variants (`BuildHttpClient` through `Status`) all
/// read as "the vendor could not be reached or answered garbage"; the
/// typed variants above them carry vendor-reported business failures the
/// orchestrator reacts to individually.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Vendor reports no numbers available for the requested country/service.
    #[error("no numbers available for {service} in {country}")]
    NoInventory {
        country: CountryCode,
        service: ServiceCode,
    },

    /// The vendor account itself lacks funds.
    #[error("vendor account has insufficient balance")]
    InsufficientUpstreamBalance,

    /// No adapter is wired up for this vendor code, or the operation is
    /// not implemented by the resolved adapter.
    #[error("vendor '{vendor}' does not support {operation}")]
    UnsupportedProvider {
        vendor: String,
        operation: &'static str,
    },

    /// A vendor response matched no known sentinel or shape.
    #[error("unrecognized vendor response: {raw}")]
    UpstreamFormat { raw: String },

    /// The vendor rejected our credentials.
    #[error("vendor rejected credentials: {detail}")]
    Auth { detail: String },

    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client: {0}")]
    BuildHttpClient(#[source] reqwest::Error),

    /// Failed to build the vendor request URL.
    #[error("failed to build request URL: {0}")]
    BuildRequestUrl(#[source] serde_urlencoded::ser::Error),

    /// Failed to send the HTTP request.
    #[error("failed to send HTTP request: {0}")]
    HttpRequest(#[from] reqwest_middleware::Error),

    /// Failed to read the response body.
    #[error("failed to read response body: {0}")]
    ParseResponse(#[source] reqwest::Error),

    /// Failed to deserialize a JSON response.
    #[error("failed to deserialize JSON response: {0}")]
    DeserializeJson(#[source] serde_json::Error),

    /// Vendor answered with an unexpected HTTP status.
    #[error("vendor answered HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

impl RetryableError for AdapterError {
    fn is_retryable(&self) -> bool {
        match self {
            // Inventory fluctuates; the same request can succeed moments later.
            AdapterError::NoInventory { .. } => true,
            AdapterError::HttpRequest(_) => true,
            AdapterError::Status { status, .. } => *status >= 500,
            AdapterError::InsufficientUpstreamBalance
            | AdapterError::UnsupportedProvider { .. }
            | AdapterError::UpstreamFormat { .. }
            | AdapterError::Auth { .. }
            | AdapterError::BuildHttpClient(_)
            | AdapterError::BuildRequestUrl(_)
            | AdapterError::ParseResponse(_)
            | AdapterError::DeserializeJson(_) => false,
        }
    }

    fn should_retry_operation(&self) -> bool {
        match self {
            AdapterError::NoInventory { .. } | AdapterError::HttpRequest(_) => true,
            AdapterError::Status { status, .. } => *status >= 500,
            // Account and wiring problems won't fix themselves.
            AdapterError::InsufficientUpstreamBalance
            | AdapterError::UnsupportedProvider { .. }
            | AdapterError::UpstreamFormat { .. }
            | AdapterError::Auth { .. }
            | AdapterError::BuildHttpClient(_)
            | AdapterError::BuildRequestUrl(_)
            | AdapterError::ParseResponse(_)
            | AdapterError::DeserializeJson(_) => false,
        }
    }
}

/// Errors surfaced by [`crate::store::Store`] implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store failed.
    #[error("store backend error: {message}")]
    Backend { message: String },

    /// An optimistic precondition (balance snapshot, status guard) failed.
    #[error("store conflict: {message}")]
    Conflict { message: String },
}

impl StoreError {
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }
}

/// Errors returned to callers of the gateway's inbound operations.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// A referenced user, provider or order does not exist.
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    /// The provider configuration exists but is switched off.
    #[error("provider '{id}' is disabled")]
    ProviderDisabled { id: String },

    /// The user's balance does not cover the price.
    #[error("insufficient funds: balance {balance:.2}, price {price:.2}")]
    InsufficientFunds { balance: f64, price: f64 },

    /// An adapter call failed; carries which provider and which operation.
    #[error("provider '{provider}' failed during {operation}: {source}")]
    Adapter {
        provider: String,
        operation: &'static str,
        #[source]
        source: AdapterError,
    },

    /// The persistence layer failed.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

impl GatewayError {
    pub(crate) fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub(crate) fn adapter(
        provider: impl Into<String>,
        operation: &'static str,
        source: AdapterError,
    ) -> Self {
        Self::Adapter {
            provider: provider.into(),
            operation,
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_errors_are_retryable() {
        let err = AdapterError::Status {
            status: 503,
            body: "unavailable".into(),
        };
        assert!(err.is_retryable());

        let err = AdapterError::Status {
            status: 400,
            body: "bad country".into(),
        };
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_business_errors_are_permanent() {
        assert!(!AdapterError::InsufficientUpstreamBalance.is_retryable());
        assert!(
            !AdapterError::UnsupportedProvider {
                vendor: "smshub".into(),
                operation: "purchase_number",
            }
            .is_retryable()
        );
        assert!(
            !AdapterError::UpstreamFormat {
                raw: "WAT".into()
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_no_inventory_allows_fresh_attempt() {
        let err = AdapterError::NoInventory {
            country: "usa".into(),
            service: "telegram".into(),
        };
        assert!(err.should_retry_operation());
    }
}

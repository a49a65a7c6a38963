//! Persisted records: provider configurations, users, orders, ledger entries.

use crate::types::{CountryCode, NumberStatus, PhoneNumber, ServiceCode, SmsCode, VendorOrderId};
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::time::Duration;
use url::Url;
use uuid::Uuid;

// =============================================================================
// Record ids
// =============================================================================

/// Document-store id of a user record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Document-store id of a provider configuration record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProviderId(String);

impl ProviderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ProviderId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Id of an order record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(Uuid);

impl OrderId {
    /// Generate a fresh order id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Provider configuration
// =============================================================================

/// Per-vendor tuning knobs stored alongside a provider configuration.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    /// Upper bound on any single vendor HTTP call.
    pub request_timeout: Duration,
    /// Whether failed adapter calls are re-invoked automatically.
    pub auto_retry: bool,
    /// Maximum number of automatic re-invocations when `auto_retry` is set.
    pub max_retries: usize,
    /// Administrator-set price that overrides the vendor catalog price.
    pub price_override: Option<f64>,
    /// Replacement for the vendor's default endpoint path.
    pub path_override: Option<String>,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            auto_retry: false,
            max_retries: 3,
            price_override: None,
            path_override: None,
        }
    }
}

/// Administrator-managed configuration for one vendor account.
///
/// Re-read from the store on every acquisition or refresh; the registry
/// never caches credentials between requests. The API key is a
/// [`SecretString`] so `Debug` output stays redacted, and the record is
/// deliberately not `Serialize` — it never leaves the trust boundary.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub id: ProviderId,
    /// Dispatch discriminator, e.g. "5sim" or "sms-activate".
    pub vendor: String,
    pub display_name: String,
    pub api_key: SecretString,
    /// Base endpoint; `None` means the vendor's default.
    pub endpoint: Option<Url>,
    pub active: bool,
    /// At most one configuration may carry this flag.
    pub is_default: bool,
    pub settings: ProviderSettings,
}

impl ProviderConfig {
    /// Create an active, non-default configuration with default settings.
    pub fn new(id: ProviderId, vendor: impl Into<String>, api_key: impl Into<String>) -> Self {
        let vendor = vendor.into();
        Self {
            id,
            display_name: vendor.clone(),
            vendor,
            api_key: SecretString::from(api_key.into()),
            endpoint: None,
            active: true,
            is_default: false,
            settings: ProviderSettings::default(),
        }
    }
}

// =============================================================================
// User
// =============================================================================

/// The slice of a user record the gateway needs: identity and balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub balance: f64,
}

// =============================================================================
// Order
// =============================================================================

/// One acquired phone number and its lifecycle state.
///
/// Created by the acquisition orchestrator; status mutated only by the
/// lifecycle poller or an explicit cancel; immutable once terminal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub provider_id: ProviderId,
    pub vendor_order_id: VendorOrderId,
    pub number: PhoneNumber,
    pub country: CountryCode,
    pub service: ServiceCode,
    pub price: f64,
    pub status: NumberStatus,
    pub sms_code: Option<SmsCode>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Whether this order admits no further transitions.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

// =============================================================================
// Ledger
// =============================================================================

/// Kind of a balance-affecting ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerKind {
    Purchase,
    Deposit,
    GiftSent,
    GiftReceived,
}

impl LedgerKind {
    /// Sign applied to the entry amount when summing a balance.
    pub fn sign(&self) -> f64 {
        match self {
            Self::Purchase | Self::GiftSent => -1.0,
            Self::Deposit | Self::GiftReceived => 1.0,
        }
    }
}

/// Settlement state of a ledger entry. Only completed entries count
/// towards a user's balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerStatus {
    Pending,
    Completed,
    Failed,
}

/// Immutable balance-affecting record tied to a user.
///
/// Amounts are stored positive; [`LedgerEntry::signed_amount`] applies the
/// kind's sign. A purchase writes exactly one entry whose amount equals
/// the price charged for the order named in its description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub user_id: UserId,
    pub amount: f64,
    pub kind: LedgerKind,
    pub status: LedgerStatus,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Build the completed purchase entry paired with an order debit.
    pub fn purchase(user_id: UserId, amount: f64, order_id: OrderId) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            amount,
            kind: LedgerKind::Purchase,
            status: LedgerStatus::Completed,
            description: format!("number rental, order {order_id}"),
            created_at: Utc::now(),
        }
    }

    /// Amount with the kind's sign applied, for balance summation.
    pub fn signed_amount(&self) -> f64 {
        self.amount * self.kind.sign()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_config_debug_redacts_key() {
        let cfg = ProviderConfig::new(ProviderId::from("p1"), "5sim", "super-secret");
        let dump = format!("{cfg:?}");
        assert!(!dump.contains("super-secret"));
    }

    #[test]
    fn test_ledger_purchase_entry() {
        let order_id = OrderId::generate();
        let entry = LedgerEntry::purchase(UserId::from("u1"), 7.0, order_id);
        assert_eq!(entry.amount, 7.0);
        assert_eq!(entry.kind, LedgerKind::Purchase);
        assert_eq!(entry.status, LedgerStatus::Completed);
        assert_eq!(entry.signed_amount(), -7.0);
        assert!(entry.description.contains(&order_id.to_string()));
    }

    #[test]
    fn test_ledger_kind_signs() {
        assert_eq!(LedgerKind::Deposit.sign(), 1.0);
        assert_eq!(LedgerKind::GiftReceived.sign(), 1.0);
        assert_eq!(LedgerKind::Purchase.sign(), -1.0);
        assert_eq!(LedgerKind::GiftSent.sign(), -1.0);
    }

    #[test]
    fn test_default_settings() {
        let settings = ProviderSettings::default();
        assert_eq!(settings.request_timeout, Duration::from_secs(30));
        assert!(!settings.auto_retry);
        assert_eq!(settings.max_retries, 3);
    }
}

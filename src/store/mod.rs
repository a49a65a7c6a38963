//! Persistence boundary of the gateway.

mod memory;

pub use memory::MemoryStore;

use crate::errors::StoreError;
use crate::model::{LedgerEntry, Order, OrderId, ProviderConfig, ProviderId, User, UserId};
use crate::types::{NumberStatus, SmsCode};
use async_trait::async_trait;

/// Document-store operations the gateway depends on.
///
/// The gateway holds balance arithmetic and status rules; implementations
/// hold atomicity. `commit_purchase` and `update_order_if_status` are the
/// two conditional writes everything else leans on.
#[async_trait]
pub trait Store: Send + Sync {
    async fn find_user(&self, id: &UserId) -> Result<Option<User>, StoreError>;

    async fn find_provider(&self, id: &ProviderId) -> Result<Option<ProviderConfig>, StoreError>;

    /// The provider configuration flagged `is_default`, if any.
    async fn find_default_provider(&self) -> Result<Option<ProviderConfig>, StoreError>;

    async fn upsert_provider(&self, config: ProviderConfig) -> Result<(), StoreError>;

    async fn upsert_user(&self, user: User) -> Result<(), StoreError>;

    async fn find_order(&self, id: &OrderId) -> Result<Option<Order>, StoreError>;

    async fn list_orders_for_user(&self, user_id: &UserId) -> Result<Vec<Order>, StoreError>;

    /// Persist a freshly purchased order, debit the owner and append the
    /// paired ledger entry, atomically.
    ///
    /// Re-verifies the balance under the write lock and fails with
    /// [`StoreError::Conflict`] if it no longer covers the price; on any
    /// failure no record is written and no balance moves.
    async fn commit_purchase(&self, order: Order, entry: LedgerEntry) -> Result<(), StoreError>;

    /// Conditionally transition an order's status.
    ///
    /// The write happens only while the order's current status is one of
    /// `expected`; otherwise `Ok(None)` is returned and nothing changes.
    /// A `Some(code)` also records the received SMS code. This guard is
    /// what keeps a stale poll from resurrecting a terminal order.
    async fn update_order_if_status(
        &self,
        id: &OrderId,
        expected: &[NumberStatus],
        status: NumberStatus,
        code: Option<SmsCode>,
    ) -> Result<Option<Order>, StoreError>;

    /// Append a balance-affecting entry and move the balance accordingly.
    async fn append_ledger_entry(&self, entry: LedgerEntry) -> Result<(), StoreError>;

    async fn list_ledger_for_user(&self, user_id: &UserId)
    -> Result<Vec<LedgerEntry>, StoreError>;
}

//! In-memory store for tests and embedding.

use super::Store;
use crate::errors::StoreError;
use crate::model::{LedgerEntry, LedgerStatus, Order, OrderId, ProviderConfig, ProviderId, User, UserId};
use crate::types::{NumberStatus, SmsCode};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct Inner {
    users: HashMap<UserId, User>,
    providers: HashMap<ProviderId, ProviderConfig>,
    orders: HashMap<OrderId, Order>,
    ledger: Vec<LedgerEntry>,
}

/// [`Store`] backed by process-local maps.
///
/// A single `RwLock` over all collections makes `commit_purchase` and
/// `update_order_if_status` naturally atomic.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_user(&self, id: &UserId) -> Result<Option<User>, StoreError> {
        Ok(self.inner.read().await.users.get(id).cloned())
    }

    async fn find_provider(&self, id: &ProviderId) -> Result<Option<ProviderConfig>, StoreError> {
        Ok(self.inner.read().await.providers.get(id).cloned())
    }

    async fn find_default_provider(&self) -> Result<Option<ProviderConfig>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .providers
            .values()
            .find(|p| p.is_default)
            .cloned())
    }

    async fn upsert_provider(&self, config: ProviderConfig) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if config.is_default {
            // At most one default configuration.
            for existing in inner.providers.values_mut() {
                existing.is_default = false;
            }
        }
        inner.providers.insert(config.id.clone(), config);
        Ok(())
    }

    async fn upsert_user(&self, user: User) -> Result<(), StoreError> {
        self.inner.write().await.users.insert(user.id.clone(), user);
        Ok(())
    }

    async fn find_order(&self, id: &OrderId) -> Result<Option<Order>, StoreError> {
        Ok(self.inner.read().await.orders.get(id).cloned())
    }

    async fn list_orders_for_user(&self, user_id: &UserId) -> Result<Vec<Order>, StoreError> {
        let inner = self.inner.read().await;
        let mut orders: Vec<Order> = inner
            .orders
            .values()
            .filter(|o| &o.user_id == user_id)
            .cloned()
            .collect();
        orders.sort_by_key(|o| o.created_at);
        Ok(orders)
    }

    async fn commit_purchase(&self, order: Order, entry: LedgerEntry) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;

        let user = inner
            .users
            .get_mut(&order.user_id)
            .ok_or_else(|| StoreError::backend(format!("user '{}' vanished", order.user_id)))?;

        // The orchestrator checked the balance before dialing the vendor;
        // re-verify under the write lock in case it moved since.
        if user.balance < order.price {
            return Err(StoreError::conflict(format!(
                "balance {:.2} no longer covers price {:.2}",
                user.balance, order.price
            )));
        }

        user.balance += entry.signed_amount();
        inner.ledger.push(entry);
        inner.orders.insert(order.id, order);
        Ok(())
    }

    async fn update_order_if_status(
        &self,
        id: &OrderId,
        expected: &[NumberStatus],
        status: NumberStatus,
        code: Option<SmsCode>,
    ) -> Result<Option<Order>, StoreError> {
        let mut inner = self.inner.write().await;

        let Some(order) = inner.orders.get_mut(id) else {
            return Ok(None);
        };
        if !expected.contains(&order.status) {
            return Ok(None);
        }

        order.status = status;
        if code.is_some() {
            order.sms_code = code;
        }
        order.updated_at = Utc::now();
        Ok(Some(order.clone()))
    }

    async fn append_ledger_entry(&self, entry: LedgerEntry) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;

        if entry.status == LedgerStatus::Completed {
            let user = inner
                .users
                .get_mut(&entry.user_id)
                .ok_or_else(|| StoreError::backend(format!("user '{}' not found", entry.user_id)))?;
            user.balance += entry.signed_amount();
        }
        inner.ledger.push(entry);
        Ok(())
    }

    async fn list_ledger_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<LedgerEntry>, StoreError> {
        let inner = self.inner.read().await;
        let mut entries: Vec<LedgerEntry> = inner
            .ledger
            .iter()
            .filter(|e| &e.user_id == user_id)
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.created_at);
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LedgerKind;
    use crate::types::{CountryCode, PhoneNumber, ServiceCode, VendorOrderId};
    use chrono::Duration;

    fn order(user: &str, price: f64) -> Order {
        let now = Utc::now();
        Order {
            id: OrderId::generate(),
            user_id: UserId::from(user),
            provider_id: ProviderId::from("p1"),
            vendor_order_id: VendorOrderId::from("987654"),
            number: PhoneNumber::new("380501234567").unwrap(),
            country: CountryCode::new("ukraine"),
            service: ServiceCode::new("telegram"),
            price,
            status: NumberStatus::Pending,
            sms_code: None,
            expires_at: now + Duration::minutes(20),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_commit_purchase_debits_and_records() {
        let store = MemoryStore::new();
        store
            .upsert_user(User {
                id: UserId::from("u1"),
                balance: 10.0,
            })
            .await
            .unwrap();

        let order = order("u1", 7.0);
        let order_id = order.id;
        let entry = LedgerEntry::purchase(UserId::from("u1"), 7.0, order_id);
        store.commit_purchase(order, entry).await.unwrap();

        let user = store.find_user(&UserId::from("u1")).await.unwrap().unwrap();
        assert_eq!(user.balance, 3.0);
        assert!(store.find_order(&order_id).await.unwrap().is_some());

        let ledger = store
            .list_ledger_for_user(&UserId::from("u1"))
            .await
            .unwrap();
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger[0].amount, 7.0);
        assert_eq!(ledger[0].kind, LedgerKind::Purchase);
    }

    #[tokio::test]
    async fn test_commit_purchase_conflicts_when_balance_moved() {
        let store = MemoryStore::new();
        store
            .upsert_user(User {
                id: UserId::from("u1"),
                balance: 5.0,
            })
            .await
            .unwrap();

        let order = order("u1", 7.0);
        let order_id = order.id;
        let entry = LedgerEntry::purchase(UserId::from("u1"), 7.0, order_id);
        let err = store.commit_purchase(order, entry).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));

        // Nothing written, nothing debited.
        let user = store.find_user(&UserId::from("u1")).await.unwrap().unwrap();
        assert_eq!(user.balance, 5.0);
        assert!(store.find_order(&order_id).await.unwrap().is_none());
        assert!(store
            .list_ledger_for_user(&UserId::from("u1"))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_update_order_if_status_guard() {
        let store = MemoryStore::new();
        store
            .upsert_user(User {
                id: UserId::from("u1"),
                balance: 10.0,
            })
            .await
            .unwrap();
        let order = order("u1", 7.0);
        let order_id = order.id;
        let entry = LedgerEntry::purchase(UserId::from("u1"), 7.0, order_id);
        store.commit_purchase(order, entry).await.unwrap();

        // Guard matches: Pending -> Cancelled.
        let updated = store
            .update_order_if_status(
                &order_id,
                &[NumberStatus::Pending, NumberStatus::Active],
                NumberStatus::Cancelled,
                None,
            )
            .await
            .unwrap();
        assert_eq!(updated.unwrap().status, NumberStatus::Cancelled);

        // Guard no longer matches: the terminal order stays put.
        let updated = store
            .update_order_if_status(
                &order_id,
                &[NumberStatus::Pending, NumberStatus::Active],
                NumberStatus::Completed,
                Some(SmsCode::new("482913")),
            )
            .await
            .unwrap();
        assert!(updated.is_none());
        let order = store.find_order(&order_id).await.unwrap().unwrap();
        assert_eq!(order.status, NumberStatus::Cancelled);
        assert!(order.sms_code.is_none());
    }

    #[tokio::test]
    async fn test_append_completed_deposit_moves_balance() {
        let store = MemoryStore::new();
        store
            .upsert_user(User {
                id: UserId::from("u1"),
                balance: 0.0,
            })
            .await
            .unwrap();

        let entry = LedgerEntry {
            id: uuid::Uuid::new_v4(),
            user_id: UserId::from("u1"),
            amount: 25.0,
            kind: LedgerKind::Deposit,
            status: LedgerStatus::Completed,
            description: "top-up".into(),
            created_at: Utc::now(),
        };
        store.append_ledger_entry(entry).await.unwrap();

        let user = store.find_user(&UserId::from("u1")).await.unwrap().unwrap();
        assert_eq!(user.balance, 25.0);
    }

    #[tokio::test]
    async fn test_single_default_provider() {
        let store = MemoryStore::new();

        let mut first = ProviderConfig::new(ProviderId::from("p1"), "5sim", "k1");
        first.is_default = true;
        store.upsert_provider(first).await.unwrap();

        let mut second = ProviderConfig::new(ProviderId::from("p2"), "sms-activate", "k2");
        second.is_default = true;
        store.upsert_provider(second).await.unwrap();

        let default = store.find_default_provider().await.unwrap().unwrap();
        assert_eq!(default.id, ProviderId::from("p2"));
    }
}

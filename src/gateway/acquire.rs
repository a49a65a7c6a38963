//! Number acquisition: balance check, vendor purchase, atomic commit.

use super::RentalGateway;
use crate::errors::GatewayError;
use crate::model::{LedgerEntry, Order, OrderId, ProviderId, UserId};
use crate::retry::call_with_retry;
use crate::store::Store;
use crate::types::{CountryCode, ServiceCode};
use chrono::Utc;
use tracing::{info, warn};

impl<S: Store> RentalGateway<S> {
    /// Rent a number for the user from the given provider.
    ///
    /// Runs inside the user's critical section so two concurrent purchases
    /// cannot both pass the balance check against the same funds. The
    /// order of effects is fixed: balance verified before the vendor is
    /// dialed, nothing persisted unless the vendor purchase succeeded, and
    /// order, debit and ledger entry land in one `commit_purchase`.
    #[tracing::instrument(
        skip(self),
        fields(user_id = %user_id, provider_id = %provider_id, country = %country, service = %service)
    )]
    pub async fn acquire_number(
        &self,
        user_id: &UserId,
        provider_id: &ProviderId,
        country: &CountryCode,
        service: &ServiceCode,
    ) -> Result<Order, GatewayError> {
        let (config, adapter) = self.resolve_provider(provider_id, true).await?;

        let lock = self.user_lock(user_id).await;
        let _guard = lock.lock().await;

        let user = self
            .store
            .find_user(user_id)
            .await?
            .ok_or_else(|| GatewayError::not_found("user", user_id.as_str()))?;

        // Administrator override wins; otherwise the vendor catalog decides.
        let price = match config.settings.price_override {
            Some(price) => price,
            None => {
                let services = call_with_retry(&config.settings, "get_services", || {
                    adapter.get_services(country)
                })
                .await
                .map_err(|e| GatewayError::adapter(provider_id.as_str(), "get_services", e))?;

                services
                    .iter()
                    .find(|s| &s.service == service)
                    .map(|s| s.price)
                    .ok_or_else(|| GatewayError::not_found("service", service.as_str()))?
            }
        };

        if user.balance < price {
            return Err(GatewayError::InsufficientFunds {
                balance: user.balance,
                price,
            });
        }

        let purchase = call_with_retry(&config.settings, "purchase_number", || {
            adapter.purchase_number(country, service)
        })
        .await
        .map_err(|e| GatewayError::adapter(provider_id.as_str(), "purchase_number", e))?;

        // The user is charged the price the balance was validated against;
        // a differing vendor-reported price is worth knowing about.
        if let Some(vendor_price) = purchase.price {
            if (vendor_price - price).abs() > f64::EPSILON {
                warn!(
                    charged = price,
                    vendor_reported = vendor_price,
                    "vendor reported a different price than charged"
                );
            }
        }

        let now = Utc::now();
        let expires_at = purchase
            .expires_at
            .unwrap_or_else(|| now + self.config.default_order_ttl);

        let order = Order {
            id: OrderId::generate(),
            user_id: user_id.clone(),
            provider_id: provider_id.clone(),
            vendor_order_id: purchase.vendor_order_id.clone(),
            number: purchase.number,
            country: country.clone(),
            service: service.clone(),
            price,
            status: purchase.status,
            sms_code: None,
            expires_at,
            created_at: now,
            updated_at: now,
        };
        let entry = LedgerEntry::purchase(user_id.clone(), price, order.id);

        if let Err(e) = self.store.commit_purchase(order.clone(), entry).await {
            // The vendor purchase went through but nothing was persisted;
            // release the number so it is not billed upstream for nothing.
            warn!(error = %e, vendor_order_id = %purchase.vendor_order_id, "commit failed, releasing vendor order");
            if let Err(cancel_err) = adapter.cancel_number(&purchase.vendor_order_id).await {
                warn!(error = %cancel_err, vendor_order_id = %purchase.vendor_order_id, "failed to release vendor order");
            }
            return Err(e.into());
        }

        info!(
            order_id = %order.id,
            number = %order.number,
            price,
            "number acquired"
        );
        Ok(order)
    }
}

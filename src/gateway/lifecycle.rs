//! Order lifecycle: lazy polling, expiry, cancellation.

use super::RentalGateway;
use crate::errors::GatewayError;
use crate::model::{Order, OrderId};
use crate::retry::call_with_retry;
use crate::store::Store;
use crate::types::NumberStatus;
use chrono::Utc;
use tracing::{debug, info, warn};

/// Statuses a poll or cancel is allowed to transition away from.
const POLLABLE: &[NumberStatus] = &[NumberStatus::Pending, NumberStatus::Active];

impl<S: Store> RentalGateway<S> {
    /// Refresh an order's status, consulting the vendor only when needed.
    ///
    /// Terminal orders come back unchanged without any vendor call, as do
    /// orders past their `expires_at` (which are marked `Expired` first).
    /// A vendor-reported code moves the order straight to `Completed`
    /// regardless of the reported status. Vendor failures surface as
    /// errors and leave the order untouched.
    #[tracing::instrument(skip(self), fields(order_id = %order_id))]
    pub async fn check_order(&self, order_id: &OrderId) -> Result<Order, GatewayError> {
        let order = self
            .store
            .find_order(order_id)
            .await?
            .ok_or_else(|| GatewayError::not_found("order", order_id.to_string()))?;

        if order.is_terminal() {
            return Ok(order);
        }

        if Utc::now() >= order.expires_at {
            debug!("order past expiry, skipping vendor poll");
            return self
                .transition(order, NumberStatus::Expired, None)
                .await;
        }

        let (config, adapter) = self.resolve_provider(&order.provider_id, false).await?;

        let poll = call_with_retry(&config.settings, "check_number", || {
            adapter.check_number(&order.vendor_order_id)
        })
        .await
        .map_err(|e| GatewayError::adapter(order.provider_id.as_str(), "check_number", e))?;

        // A received code settles the order whatever the vendor calls it.
        let (status, code) = match poll.code {
            Some(code) => (NumberStatus::Completed, Some(code)),
            None => (poll.status, None),
        };

        if status == order.status {
            return Ok(order);
        }

        if status == NumberStatus::Completed {
            info!(number = %order.number, "verification code received");
        }
        self.transition(order, status, code).await
    }

    /// Cancel an order.
    ///
    /// The local record is marked `Cancelled` even when the vendor cannot
    /// be reached; the vendor-side failure is logged and swallowed.
    /// Cancelling an already-terminal order is a no-op.
    #[tracing::instrument(skip(self), fields(order_id = %order_id))]
    pub async fn cancel_order(&self, order_id: &OrderId) -> Result<Order, GatewayError> {
        let order = self
            .store
            .find_order(order_id)
            .await?
            .ok_or_else(|| GatewayError::not_found("order", order_id.to_string()))?;

        if order.is_terminal() {
            debug!(status = %order.status, "order already terminal, cancel is a no-op");
            return Ok(order);
        }

        match self.resolve_provider(&order.provider_id, false).await {
            Ok((config, adapter)) => {
                let result = call_with_retry(&config.settings, "cancel_number", || {
                    adapter.cancel_number(&order.vendor_order_id)
                })
                .await;
                match result {
                    Ok(true) => debug!("vendor confirmed cancellation"),
                    Ok(false) => debug!("vendor already considered the order settled"),
                    Err(e) => {
                        warn!(error = %e, "vendor cancel failed, cancelling locally anyway")
                    }
                }
            }
            Err(e) => warn!(error = %e, "could not resolve provider, cancelling locally anyway"),
        }

        self.transition(order, NumberStatus::Cancelled, None).await
    }

    /// Apply a guarded status write and return the winning record.
    ///
    /// When the conditional update loses a race (another caller already
    /// moved the order), the freshly persisted state is returned instead
    /// of an error.
    async fn transition(
        &self,
        order: Order,
        status: NumberStatus,
        code: Option<crate::types::SmsCode>,
    ) -> Result<Order, GatewayError> {
        let updated = self
            .store
            .update_order_if_status(&order.id, POLLABLE, status, code)
            .await?;

        match updated {
            Some(order) => Ok(order),
            None => {
                let current = self
                    .store
                    .find_order(&order.id)
                    .await?
                    .ok_or_else(|| GatewayError::not_found("order", order.id.to_string()))?;
                debug!(status = %current.status, "status write lost a race, returning current state");
                Ok(current)
            }
        }
    }
}

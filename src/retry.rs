//! Opt-in retry of adapter calls, driven by provider settings.

use crate::errors::{AdapterError, RetryableError};
use crate::model::ProviderSettings;
use backon::{ExponentialBuilder, Retryable};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Configuration for retry behavior.
///
/// ```rust
/// use sms_rental::RetryConfig;
/// use std::time::Duration;
///
/// let config = RetryConfig::default()
///     .with_min_delay(Duration::from_secs(30))
///     .with_max_retries(5);
/// ```
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Minimum delay between retries.
    pub min_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Exponential backoff factor.
    pub factor: f32,
    /// Maximum number of retry attempts.
    pub max_retries: usize,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            factor: 2.0,
            max_retries: 3,
        }
    }
}

impl RetryConfig {
    /// Derive the retry policy a provider configuration opted into.
    ///
    /// The delay floor is the provider's request timeout, so a vendor is
    /// never re-dialed faster than one call is allowed to take.
    pub fn for_provider(settings: &ProviderSettings) -> Self {
        Self::default()
            .with_min_delay(settings.request_timeout)
            .with_max_retries(settings.max_retries)
    }

    /// Set the minimum delay between retries.
    pub fn with_min_delay(mut self, delay: Duration) -> Self {
        self.min_delay = delay;
        self
    }

    /// Set the maximum delay between retries.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Set the exponential backoff factor.
    pub fn with_factor(mut self, factor: f32) -> Self {
        self.factor = factor;
        self
    }

    /// Set the maximum number of retry attempts.
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Build a backoff strategy from this configuration.
    pub fn build_strategy(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_factor(self.factor)
            .with_max_times(self.max_retries)
    }
}

/// Invoke an adapter call, re-invoking it on transient errors when the
/// provider configuration opted into `auto_retry`.
pub(crate) async fn call_with_retry<T, Fut, F>(
    settings: &ProviderSettings,
    operation: &'static str,
    mut op: F,
) -> Result<T, AdapterError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AdapterError>>,
{
    if !settings.auto_retry || settings.max_retries == 0 {
        return op().await;
    }

    op.retry(RetryConfig::for_provider(settings).build_strategy())
        .when(|err: &AdapterError| err.is_retryable())
        .notify(|err: &AdapterError, after: Duration| {
            warn!(
                error = %err,
                operation,
                retry_after_secs = %after.as_secs_f64(),
                "retrying adapter call after transient error"
            );
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_config_builder() {
        let config = RetryConfig::default()
            .with_min_delay(Duration::from_millis(500))
            .with_max_delay(Duration::from_secs(10))
            .with_factor(1.5)
            .with_max_retries(5);

        assert_eq!(config.min_delay, Duration::from_millis(500));
        assert_eq!(config.max_delay, Duration::from_secs(10));
        assert_eq!(config.factor, 1.5);
        assert_eq!(config.max_retries, 5);
    }

    #[test]
    fn test_provider_policy_floor_is_request_timeout() {
        let settings = ProviderSettings {
            request_timeout: Duration::from_secs(20),
            auto_retry: true,
            max_retries: 2,
            ..ProviderSettings::default()
        };
        let config = RetryConfig::for_provider(&settings);
        assert_eq!(config.min_delay, Duration::from_secs(20));
        assert_eq!(config.max_retries, 2);
    }

    #[tokio::test]
    async fn test_no_retry_when_opted_out() {
        let settings = ProviderSettings::default();
        let mut calls = 0u32;
        let result: Result<(), AdapterError> = call_with_retry(&settings, "get_balance", || {
            calls += 1;
            async {
                Err(AdapterError::Status {
                    status: 503,
                    body: "unavailable".into(),
                })
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_retry_when_opted_in() {
        let settings = ProviderSettings {
            // Zero floor keeps the test fast.
            request_timeout: Duration::from_millis(0),
            auto_retry: true,
            max_retries: 3,
            ..ProviderSettings::default()
        };
        let mut calls = 0u32;
        let result: Result<u32, AdapterError> = call_with_retry(&settings, "get_balance", || {
            calls += 1;
            let attempt = calls;
            async move {
                if attempt < 3 {
                    Err(AdapterError::Status {
                        status: 503,
                        body: "unavailable".into(),
                    })
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls, 3);
    }

    #[tokio::test]
    async fn test_permanent_errors_not_retried() {
        let settings = ProviderSettings {
            request_timeout: Duration::from_millis(0),
            auto_retry: true,
            max_retries: 3,
            ..ProviderSettings::default()
        };
        let mut calls = 0u32;
        let result: Result<(), AdapterError> = call_with_retry(&settings, "purchase_number", || {
            calls += 1;
            async { Err(AdapterError::InsufficientUpstreamBalance) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls, 1);
    }
}

//! Retry with exponential backoff and per-attempt deadlines.
//!
//! Each attempt runs under `tokio::time::timeout`. An overrun drops the
//! attempt future, which cancels the backend request itself. Terminal
//! failures stop the loop at once; transient ones are retried up to the
//! configured bound and then surface wrapped as `MaxRetriesExceeded`.

use crate::GatewaySettings;
use gatehouse_error::{GatewayError, GatewayErrorKind, GatewayResult};
use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio_retry2::{Retry, RetryError, strategy::jitter};
use tracing::{debug, warn};

/// Backoff exponents beyond this are already far above any sane ceiling.
const MAX_EXPONENT: u32 = 62;

/// Exponential backoff parameters.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use gatehouse_rate_limit::RetryPolicy;
///
/// let policy = RetryPolicy::new(3, Duration::from_secs(1), Duration::from_secs(3));
/// let delays: Vec<Duration> = policy.delays().collect();
/// assert_eq!(
///     delays,
///     vec![Duration::from_secs(1), Duration::from_secs(2), Duration::from_secs(3)]
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, derive_getters::Getters)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    max_retries: u32,
    /// Delay before the first retry.
    base_delay: Duration,
    /// Upper bound on any delay.
    max_delay: Duration,
    /// Randomise each delay within [0, delay).
    jitter: bool,
}

impl RetryPolicy {
    /// Create a policy without jitter.
    pub fn new(max_retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay,
            jitter: false,
        }
    }

    /// Create a policy from gateway settings.
    pub fn from_settings(settings: &GatewaySettings) -> Self {
        Self::new(
            settings.max_retries,
            settings.base_delay(),
            settings.max_delay(),
        )
        .with_jitter(settings.jitter)
    }

    /// Enable or disable jitter.
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Delay after failed attempt `retry` (0-based): min(base * 2^retry, max).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.min(MAX_EXPONENT) as i32;
        let secs = self.base_delay.as_secs_f64() * 2f64.powi(exponent);
        Duration::from_secs_f64(secs.min(self.max_delay.as_secs_f64()))
    }

    /// The full backoff schedule, one delay per retry.
    pub fn delays(self) -> impl Iterator<Item = Duration> {
        (0..self.max_retries).map(move |retry| {
            let delay = self.delay_for(retry);
            if self.jitter { jitter(delay) } else { delay }
        })
    }
}

/// Result of a retried operation plus attempt accounting.
#[derive(Debug)]
pub struct RetryOutcome<T> {
    /// Final value or error.
    pub result: GatewayResult<T>,
    /// Attempts made, at least one.
    pub attempts: u32,
    /// Attempts that overran their deadline.
    pub timeouts: u32,
}

impl<T> RetryOutcome<T> {
    /// Attempts beyond the first.
    pub fn retries(&self) -> u32 {
        self.attempts.saturating_sub(1)
    }
}

/// Runs one logical operation with deadlines and backoff.
#[derive(Debug, Clone)]
pub struct RetryOrchestrator {
    policy: RetryPolicy,
}

impl RetryOrchestrator {
    /// Create an orchestrator.
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// The backoff policy in use.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `attempt` (called with the 0-based attempt index) until it succeeds,
    /// fails terminally, or exhausts `max_retries + 1` attempts.
    ///
    /// Each attempt gets its own `timeout`. Cancelling the returned future
    /// stops any in-flight attempt or backoff sleep immediately.
    pub async fn run<F, Fut, T>(&self, timeout: Duration, mut attempt: F) -> RetryOutcome<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = GatewayResult<T>>,
    {
        let attempts = AtomicU32::new(0);
        let timeouts = AtomicU32::new(0);
        let policy = self.policy;
        let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);

        let result = Retry::spawn(policy.delays(), || {
            let index = attempts.fetch_add(1, Ordering::Relaxed);
            let operation = attempt(index);
            let timeouts = &timeouts;
            async move {
                let outcome = match tokio::time::timeout(timeout, operation).await {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        timeouts.fetch_add(1, Ordering::Relaxed);
                        Err(GatewayError::new(GatewayErrorKind::Timeout(timeout_ms)))
                    }
                };

                match outcome {
                    Ok(value) => Ok(value),
                    Err(e) if e.is_terminal() => {
                        debug!(attempt = index + 1, error = %e, "Terminal failure, not retrying");
                        Err(RetryError::Permanent(e))
                    }
                    Err(e) => {
                        if index < policy.max_retries {
                            warn!(
                                attempt = index + 1,
                                delay_ms = policy.delay_for(index).as_millis() as u64,
                                error = %e,
                                "Transient failure, will retry"
                            );
                        }
                        Err(RetryError::Transient {
                            err: e,
                            retry_after: None,
                        })
                    }
                }
            }
        })
        .await;

        let attempts = attempts.into_inner();
        let result = result.map_err(|e| {
            if e.is_terminal() {
                e
            } else {
                warn!(attempts, error = %e, "Retries exhausted");
                GatewayError::new(GatewayErrorKind::MaxRetriesExceeded {
                    attempts,
                    last: Box::new(e.into_kind()),
                })
            }
        });

        RetryOutcome {
            result,
            attempts,
            timeouts: timeouts.into_inner(),
        }
    }
}

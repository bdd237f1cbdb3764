//! Bounded retry with exponential backoff.

use std::time::Duration;

use rand::Rng;
use tokio_util::sync::CancellationToken;

use crate::clients::Error;
use crate::transport::{Middleware, MiddlewareFuture, Next, PipelineRequest};

/// Retry policy for the transport pipeline.
///
/// Retries apply only to a fixed retryable set: HTTP 429, server errors
/// (5xx), and transport-level connection failures. Any other 4xx is returned
/// immediately. Delays grow exponentially with a jitter factor and are
/// capped at `max_backoff`.
///
/// # Example
///
/// ```rust
/// use quickbooks_api::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::default()
///     .with_max_attempts(5)
///     .with_initial_backoff(Duration::from_millis(250));
/// ```
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    /// Total attempts, the first try included.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_backoff: Duration,
    /// Upper bound on any single delay.
    pub max_backoff: Duration,
    /// Multiplier applied per retry.
    pub multiplier: f64,
    /// Jitter factor (0.0 to 1.0) applied to each delay.
    pub jitter: f64,
    /// Statuses retried besides server errors.
    pub retryable_statuses: Vec<u16>,
    /// Whether 5xx responses are retried.
    pub retry_server_errors: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
            multiplier: 2.0,
            jitter: 0.1,
            retryable_statuses: vec![429],
            retry_server_errors: true,
        }
    }
}

impl RetryPolicy {
    /// Sets the total number of attempts.
    #[must_use]
    pub const fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Sets the delay before the first retry.
    #[must_use]
    pub const fn with_initial_backoff(mut self, delay: Duration) -> Self {
        self.initial_backoff = delay;
        self
    }

    /// Sets the upper bound on any single delay.
    #[must_use]
    pub const fn with_max_backoff(mut self, delay: Duration) -> Self {
        self.max_backoff = delay;
        self
    }

    /// Sets the jitter factor (0.0 disables jitter).
    #[must_use]
    pub const fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter;
        self
    }

    /// Replaces the retryable status set.
    #[must_use]
    pub fn with_retryable_statuses(mut self, statuses: Vec<u16>) -> Self {
        self.retryable_statuses = statuses;
        self
    }

    /// Returns `true` if a response with this status should be retried.
    #[must_use]
    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.retryable_statuses.contains(&status)
            || (self.retry_server_errors && (500..600).contains(&status))
    }

    /// Calculates the delay before the retry following `attempt`.
    ///
    /// Attempts are 1-based: the delay after the first failed attempt uses
    /// `initial_backoff`, doubling (by default) from there.
    #[must_use]
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let base = self.initial_backoff.as_secs_f64() * self.multiplier.powi(exponent);
        let jitter = base * self.jitter * jitter_factor();
        let delay = (base + jitter).clamp(0.0, self.max_backoff.as_secs_f64());

        Duration::from_secs_f64(delay)
    }
}

/// Random factor between -1.0 and 1.0.
fn jitter_factor() -> f64 {
    rand::thread_rng().gen_range(-1.0..1.0)
}

/// The outermost pipeline stage: re-runs the inner chain on retryable
/// failures.
///
/// Each attempt passes through rate-limit admission, auth injection, and
/// logging again, so a token that expired mid-flight is re-fetched and every
/// wire exchange is recorded. The attempt count is stamped on the response
/// (or final transport error) that is ultimately returned.
pub struct RetryStage {
    policy: RetryPolicy,
}

impl RetryStage {
    /// Creates the stage with the given policy.
    #[must_use]
    pub const fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// Reads a `Retry-After` seconds hint from a 429 response.
    fn retry_after_hint(response: &super::PipelineResponse) -> Option<Duration> {
        if response.status != 429 {
            return None;
        }
        response
            .header("retry-after")
            .and_then(|value| value.trim().parse::<f64>().ok())
            .map(Duration::from_secs_f64)
    }
}

impl Middleware for RetryStage {
    fn handle<'a>(
        &'a self,
        request: PipelineRequest,
        next: Next<'a>,
        cancel: &'a CancellationToken,
    ) -> MiddlewareFuture<'a> {
        Box::pin(async move {
            let mut attempt = 0;

            loop {
                attempt += 1;

                let delay = match next.run(request.clone(), cancel).await {
                    Ok(mut response) => {
                        response.attempts = attempt;

                        if !self.policy.is_retryable_status(response.status)
                            || attempt >= self.policy.max_attempts
                        {
                            return Ok(response);
                        }

                        Self::retry_after_hint(&response)
                            .unwrap_or_else(|| self.policy.backoff_delay(attempt))
                    }
                    Err(Error::Transport { source, .. }) => {
                        if attempt >= self.policy.max_attempts {
                            return Err(Error::Transport {
                                attempts: attempt,
                                source,
                            });
                        }

                        self.policy.backoff_delay(attempt)
                    }
                    // Auth failures, cancellation, and the like are not
                    // retryable at this layer
                    Err(other) => return Err(other),
                };

                tokio::select! {
                    () = tokio::time::sleep(delay) => {}
                    () = cancel.cancelled() => return Err(Error::Cancelled),
                }
            }
        })
    }
}

//! Client-side request rate limiting.
//!
//! QuickBooks Online throttles apps per realm, so the client paces its own
//! requests with a token bucket instead of waiting to be throttled with 429
//! responses. The bucket is shared by every request issued through one
//! client, including retry attempts.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::clients::Error;
use crate::transport::{Middleware, MiddlewareFuture, Next, PipelineRequest};

/// Configuration for the client-side token bucket.
///
/// # Example
///
/// ```rust
/// use quickbooks_api::RateLimitConfig;
///
/// let config = RateLimitConfig {
///     requests_per_second: 5.0,
///     burst: 10,
/// };
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RateLimitConfig {
    /// Sustained request rate the bucket refills at.
    pub requests_per_second: f64,
    /// Requests that may be issued back-to-back before pacing kicks in.
    pub burst: u32,
}

impl Default for RateLimitConfig {
    /// Defaults sized against the provider's 500-requests-per-minute realm
    /// throttle, with headroom for other consumers of the same realm.
    fn default() -> Self {
        Self {
            requests_per_second: 8.0,
            burst: 10,
        }
    }
}

/// A token bucket admitting requests at a sustained rate with burst capacity.
///
/// Admission is FIFO under contention: waiters queue on one async mutex that
/// is held across the refill wait, so no request is starved by later
/// arrivals.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    state: Mutex<BucketState>,
}

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl RateLimiter {
    /// Creates a limiter with a full bucket.
    #[must_use]
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            state: Mutex::new(BucketState {
                tokens: f64::from(config.burst),
                last_refill: Instant::now(),
            }),
        }
    }

    /// Waits until the bucket admits one request.
    ///
    /// The wait is cooperative (a timer sleep, not a spin), and aborts with
    /// [`Error::Cancelled`] if `cancel` fires first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] if the caller's cancellation token fires
    /// while queued or while waiting for refill.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<(), Error> {
        let mut state = tokio::select! {
            guard = self.state.lock() => guard,
            () = cancel.cancelled() => return Err(Error::Cancelled),
        };

        loop {
            state.refill(self.config);

            if state.tokens >= 1.0 {
                state.tokens -= 1.0;
                return Ok(());
            }

            let deficit = 1.0 - state.tokens;
            let wait = Duration::from_secs_f64(deficit / self.config.requests_per_second);

            // The lock is held across the sleep: tokio's mutex queues waiters
            // in FIFO order, which makes admission order arrival order
            tokio::select! {
                () = tokio::time::sleep(wait) => {}
                () = cancel.cancelled() => return Err(Error::Cancelled),
            }
        }
    }
}

impl BucketState {
    fn refill(&mut self, config: RateLimitConfig) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();

        self.tokens =
            f64::from(config.burst).min(self.tokens + elapsed * config.requests_per_second);
        self.last_refill = now;
    }
}

/// Pipeline stage that blocks each attempt on the shared [`RateLimiter`].
pub struct RateLimitStage {
    limiter: Arc<RateLimiter>,
}

impl RateLimitStage {
    /// Creates the stage around a shared limiter.
    #[must_use]
    pub fn new(limiter: Arc<RateLimiter>) -> Self {
        Self { limiter }
    }
}

impl Middleware for RateLimitStage {
    fn handle<'a>(
        &'a self,
        request: PipelineRequest,
        next: Next<'a>,
        cancel: &'a CancellationToken,
    ) -> MiddlewareFuture<'a> {
        Box::pin(async move {
            self.limiter.acquire(cancel).await?;
            next.run(request, cancel).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(requests_per_second: f64, burst: u32) -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            requests_per_second,
            burst,
        })
    }

    #[tokio::test]
    async fn test_burst_is_admitted_immediately() {
        let limiter = limiter(1.0, 5);
        let cancel = CancellationToken::new();

        let start = Instant::now();
        for _ in 0..5 {
            limiter.acquire(&cancel).await.unwrap();
        }

        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test(start_paused = true)]
    async fn test_drained_bucket_waits_for_refill() {
        let limiter = limiter(10.0, 1);
        let cancel = CancellationToken::new();

        limiter.acquire(&cancel).await.unwrap();

        // The bucket is empty; the next acquire needs ~100ms of refill
        let start = Instant::now();
        limiter.acquire(&cancel).await.unwrap();
        let waited = start.elapsed();

        assert!(waited >= Duration::from_millis(90), "waited {waited:?}");
    }

    #[tokio::test]
    async fn test_cancelled_waiter_unblocks_with_cancellation_error() {
        let limiter = limiter(0.1, 1);
        let cancel = CancellationToken::new();

        // Drain the bucket; the next acquire would wait ~10 seconds
        limiter.acquire(&cancel).await.unwrap();

        cancel.cancel();
        let result = limiter.acquire(&cancel).await;
        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[tokio::test]
    async fn test_tokens_do_not_exceed_burst() {
        let limiter = limiter(1000.0, 2);
        let cancel = CancellationToken::new();

        // Even after idling, only `burst` tokens are available at once
        tokio::time::sleep(Duration::from_millis(20)).await;

        let start = Instant::now();
        limiter.acquire(&cancel).await.unwrap();
        limiter.acquire(&cancel).await.unwrap();
        assert!(start.elapsed() < Duration::from_millis(50));
    }
}

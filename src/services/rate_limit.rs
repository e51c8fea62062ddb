use std::time::Duration;

use governor::{DefaultDirectRateLimiter, Jitter, Quota};

/// Single-token bucket that paces calls to an upstream provider.
///
/// The first `acquire` is immediate. After that the token refills every
/// `min_delay`, and each wait gets up to `max_delay - min_delay` of random
/// jitter, so calls end up spaced somewhere in `[min_delay, max_delay]`.
/// A zero range disables pacing.
pub struct RateLimiter {
    bucket: Option<DefaultDirectRateLimiter>,
    jitter: Duration,
}

impl RateLimiter {
    pub fn new(min_delay: Duration, max_delay: Duration) -> Self {
        let (min_delay, max_delay) = if min_delay <= max_delay {
            (min_delay, max_delay)
        } else {
            (max_delay, min_delay)
        };

        // A zero period is not a valid quota; fall back to the upper bound
        let period = if min_delay.is_zero() { max_delay } else { min_delay };
        let bucket = Quota::with_period(period).map(DefaultDirectRateLimiter::direct);
        let jitter = if min_delay.is_zero() {
            Duration::ZERO
        } else {
            max_delay - min_delay
        };

        Self { bucket, jitter }
    }

    /// Waits until the token is available and takes it
    pub async fn acquire(&self) {
        if let Some(bucket) = &self.bucket {
            bucket.until_ready_with_jitter(Jitter::up_to(self.jitter)).await;
        }
    }
}

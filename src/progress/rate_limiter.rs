//! Minimum-interval gate for progress edits.
//!
//! Telegram answers frequent edits of the same message with flood errors, so
//! updates are only accepted once the interval since the last one has passed.

use std::time::{Duration, Instant};

use tracing::warn;

/// Rate limiter that enforces minimum intervals between operations.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    /// Minimum duration between allowed operations.
    min_interval: Duration,

    /// Last time an operation was performed.
    last_operation: Option<Instant>,

    /// Set after a flood answer; no operation is allowed before it.
    blocked_until: Option<Instant>,
}

impl RateLimiter {
    /// Creates a new rate limiter with the specified minimum interval.
    #[must_use]
    pub const fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_operation: None,
            blocked_until: None,
        }
    }

    /// Creates a rate limiter whose interval starts now, as if an operation
    /// had just been performed.
    #[must_use]
    pub fn started_now(min_interval: Duration) -> Self {
        let mut limiter = Self::new(min_interval);
        limiter.mark_used();
        limiter
    }

    /// Checks if an operation is currently allowed without blocking.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        self.time_until_allowed().is_zero()
    }

    /// Marks an operation as just performed.
    pub fn mark_used(&mut self) {
        self.last_operation = Some(Instant::now());
    }

    /// Returns the time remaining until the next operation is allowed.
    #[must_use]
    pub fn time_until_allowed(&self) -> Duration {
        let interval_wait = self.last_operation.map_or(Duration::ZERO, |last| {
            self.min_interval.saturating_sub(last.elapsed())
        });
        let block_wait = self
            .blocked_until
            .map_or(Duration::ZERO, |until| {
                until.saturating_duration_since(Instant::now())
            });
        interval_wait.max(block_wait)
    }

    /// Blocks operations for `wait` after a flood/retry-after answer.
    pub fn back_off(&mut self, wait: Duration) {
        warn!("Progress updates backing off for {:?}", wait);
        self.blocked_until = Some(Instant::now() + wait);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limiter_first_operation() {
        let limiter = RateLimiter::new(Duration::from_secs(1));
        assert!(limiter.is_allowed());
        assert_eq!(limiter.time_until_allowed(), Duration::ZERO);
    }

    #[test]
    fn test_rate_limiter_subsequent_operation() {
        let mut limiter = RateLimiter::new(Duration::from_secs(60));
        limiter.mark_used();

        assert!(!limiter.is_allowed());
        assert!(limiter.time_until_allowed() > Duration::ZERO);
    }

    #[test]
    fn test_rate_limiter_started_now() {
        let limiter = RateLimiter::started_now(Duration::from_secs(60));
        assert!(!limiter.is_allowed());

        let limiter = RateLimiter::started_now(Duration::ZERO);
        assert!(limiter.is_allowed());
    }

    #[test]
    fn test_rate_limiter_back_off() {
        let mut limiter = RateLimiter::new(Duration::ZERO);
        limiter.back_off(Duration::from_secs(30));
        assert!(!limiter.is_allowed());
        assert!(limiter.time_until_allowed() > Duration::from_secs(29));
    }
}

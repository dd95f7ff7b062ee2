//! Rate-limited, deduplicating progress sink.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, trace};

use super::{ProgressSink, ProgressTarget, RateLimiter, RenderError};

/// Progress sink that forwards snapshots to a target, dropping updates that
/// come too soon or repeat the last shown text.
///
/// Once [`finish`](ProgressSink::finish) has run the sink is ended and ignores
/// everything else.
#[derive(Debug)]
pub struct ThrottledProgress<T> {
    target: T,
    limiter: RateLimiter,
    last_text: String,
    ended: bool,
}

impl<T: ProgressTarget> ThrottledProgress<T> {
    /// Wraps `target`, which currently shows `initial_text`.
    ///
    /// The interval starts now, since showing the initial text counts as an update.
    #[must_use]
    pub fn new(target: T, min_interval: Duration, initial_text: impl Into<String>) -> Self {
        Self {
            target,
            limiter: RateLimiter::started_now(min_interval),
            last_text: initial_text.into(),
            ended: false,
        }
    }

    #[must_use]
    pub const fn is_ended(&self) -> bool {
        self.ended
    }

    #[must_use]
    pub fn last_text(&self) -> &str {
        &self.last_text
    }
}

#[async_trait]
impl<T: ProgressTarget> ProgressSink for ThrottledProgress<T> {
    async fn push(&mut self, text: &str) {
        if self.ended {
            return;
        }
        if text == self.last_text {
            trace!("Skipping unchanged progress update");
            return;
        }
        if !self.limiter.is_allowed() {
            trace!(
                "Skipping progress update, next allowed in {:?}",
                self.limiter.time_until_allowed()
            );
            return;
        }

        self.limiter.mark_used();
        match self.target.render(text).await {
            Ok(()) => text.clone_into(&mut self.last_text),
            Err(RenderError::RetryAfter(wait)) => self.limiter.back_off(wait),
            Err(e) => debug!("Progress update dropped: {}", e),
        }
    }

    async fn finish(&mut self, text: &str) {
        if self.ended {
            return;
        }
        self.ended = true;

        if let Err(e) = self.target.render(text).await {
            debug!("Final progress update failed: {}", e);
        }
        text.clone_into(&mut self.last_text);
    }
}

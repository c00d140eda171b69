//! Constant delay between attempts.

use super::jitter;
use super::strategy::Backoff;
use crate::config::duration_ms;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Fixed backoff: every retry waits `interval`, optionally jittered.
///
/// # Examples
///
/// ```rust
/// use retrier::retry::{Backoff, FixedBackoff};
/// use std::time::Duration;
///
/// let backoff = FixedBackoff::new(Duration::from_millis(200));
/// assert_eq!(backoff.next_delay(0), Duration::from_millis(200));
/// assert_eq!(backoff.next_delay(42), Duration::from_millis(200));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FixedBackoff {
    #[serde(rename = "interval_ms", with = "duration_ms")]
    interval: Duration,
    jitter: f64,
}

impl FixedBackoff {
    /// Constant `interval` with no jitter.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            jitter: 0.0,
        }
    }

    /// Set the jitter fraction; values outside `(0, 1)` disable it.
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter;
        self
    }

    /// Delay between attempts.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Jitter fraction.
    pub fn jitter(&self) -> f64 {
        self.jitter
    }
}

impl Default for FixedBackoff {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl Backoff for FixedBackoff {
    fn next_delay(&self, _attempt: u32) -> Duration {
        jitter::apply(self.interval, self.jitter)
    }
}

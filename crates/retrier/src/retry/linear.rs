//! Linear backoff with jitter.

use super::jitter;
use super::strategy::Backoff;
use crate::config::duration_ms;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Linear backoff: `base + attempt * step`, capped at `max` when `max` is non-zero.
///
/// The cap is applied before jitter. This is the executor's default strategy,
/// configured as 1s base, 1s step, 10s cap and 10% jitter.
///
/// # Examples
///
/// ```rust
/// use retrier::retry::{Backoff, LinearBackoff};
/// use std::time::Duration;
///
/// let backoff = LinearBackoff::builder()
///     .base(Duration::from_millis(500))
///     .step(Duration::from_millis(250))
///     .max(Duration::from_secs(1))
///     .jitter(0.0)
///     .build();
///
/// assert_eq!(backoff.next_delay(0), Duration::from_millis(500));
/// assert_eq!(backoff.next_delay(1), Duration::from_millis(750));
/// assert_eq!(backoff.next_delay(9), Duration::from_secs(1));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LinearBackoff {
    #[serde(rename = "base_ms", with = "duration_ms")]
    base: Duration,
    #[serde(rename = "step_ms", with = "duration_ms")]
    step: Duration,
    #[serde(rename = "max_ms", with = "duration_ms")]
    max: Duration,
    jitter: f64,
}

impl LinearBackoff {
    /// Create a new builder for configuring linear backoff.
    pub fn builder() -> LinearBackoffBuilder {
        LinearBackoffBuilder::default()
    }

    /// Delay for the first retry.
    pub fn base(&self) -> Duration {
        self.base
    }

    /// Amount added per attempt.
    pub fn step(&self) -> Duration {
        self.step
    }

    /// Cap applied before jitter; zero means uncapped.
    pub fn max(&self) -> Duration {
        self.max
    }

    /// Jitter fraction.
    pub fn jitter(&self) -> f64 {
        self.jitter
    }

    fn capped_delay(&self, attempt: u32) -> Duration {
        let delay = self.base.saturating_add(self.step.saturating_mul(attempt));
        if !self.max.is_zero() && delay > self.max {
            self.max
        } else {
            delay
        }
    }
}

impl Default for LinearBackoff {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(1),
            step: Duration::from_secs(1),
            max: Duration::from_secs(10),
            jitter: 0.1,
        }
    }
}

impl Backoff for LinearBackoff {
    fn next_delay(&self, attempt: u32) -> Duration {
        jitter::apply(self.capped_delay(attempt), self.jitter)
    }
}

/// Builder for configuring `LinearBackoff`.
///
/// Unset parameters fall back to [`LinearBackoff::default`].
#[derive(Debug, Default)]
pub struct LinearBackoffBuilder {
    base: Option<Duration>,
    step: Option<Duration>,
    max: Option<Duration>,
    jitter: Option<f64>,
}

impl LinearBackoffBuilder {
    /// Set the delay before the first retry. Default: 1s
    pub fn base(mut self, base: Duration) -> Self {
        self.base = Some(base);
        self
    }

    /// Set the per-attempt increment. Default: 1s
    pub fn step(mut self, step: Duration) -> Self {
        self.step = Some(step);
        self
    }

    /// Set the maximum delay; `Duration::ZERO` removes the cap. Default: 10s
    pub fn max(mut self, max: Duration) -> Self {
        self.max = Some(max);
        self
    }

    /// Set the jitter fraction; values outside `(0, 1)` disable it. Default: 0.1
    pub fn jitter(mut self, jitter: f64) -> Self {
        self.jitter = Some(jitter);
        self
    }

    /// Build the `LinearBackoff` instance.
    pub fn build(self) -> LinearBackoff {
        let defaults = LinearBackoff::default();
        LinearBackoff {
            base: self.base.unwrap_or(defaults.base),
            step: self.step.unwrap_or(defaults.step),
            max: self.max.unwrap_or(defaults.max),
            jitter: self.jitter.unwrap_or(defaults.jitter),
        }
    }
}

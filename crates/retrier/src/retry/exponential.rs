//! Exponential backoff with jitter.

use super::jitter;
use super::strategy::Backoff;
use crate::config::duration_ms;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Exponential backoff strategy with configurable jitter.
///
/// Delays between retries increase exponentially: `base * factor^attempt`,
/// capped at `max` when `max` is non-zero. Jitter is applied to the capped
/// value, so a jittered delay may exceed `max` by up to the jitter fraction.
///
/// # Mathematical Formula
///
/// For attempt `n` (0-indexed, the attempt that just failed):
/// ```text
/// base_delay   = base * (factor ^ n)
/// capped_delay = max > 0 ? min(base_delay, max) : base_delay
/// final_delay  = capped_delay * (1 + random(-jitter, +jitter))   if 0 < jitter < 1
///              = capped_delay                                     otherwise
/// ```
///
/// # Examples
///
/// ```rust
/// use retrier::retry::{Backoff, ExponentialBackoff};
/// use std::time::Duration;
///
/// // Default configuration (base=100ms, factor=2.0, max=60s, jitter=0.1)
/// let backoff = ExponentialBackoff::default();
///
/// // Custom configuration
/// let backoff = ExponentialBackoff::builder()
///     .base(Duration::from_millis(100))
///     .max(Duration::from_secs(30))
///     .factor(2.0)
///     .jitter(0.0)
///     .build();
///
/// assert_eq!(backoff.next_delay(0), Duration::from_millis(100));
/// assert_eq!(backoff.next_delay(2), Duration::from_millis(400));
/// ```
///
/// # Performance Characteristics
///
/// - **Memory**: O(1), no allocations
/// - **CPU**: O(1) per call, one `powf` and at most one random number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExponentialBackoff {
    #[serde(rename = "base_ms", with = "duration_ms")]
    base: Duration,
    factor: f64,
    #[serde(rename = "max_ms", with = "duration_ms")]
    max: Duration,
    jitter: f64,
}

impl ExponentialBackoff {
    /// Create a new builder for configuring exponential backoff.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use retrier::retry::ExponentialBackoff;
    /// use std::time::Duration;
    ///
    /// let backoff = ExponentialBackoff::builder()
    ///     .base(Duration::from_millis(250))
    ///     .build();
    /// ```
    pub fn builder() -> ExponentialBackoffBuilder {
        ExponentialBackoffBuilder::default()
    }

    /// Delay for the first retry.
    pub fn base(&self) -> Duration {
        self.base
    }

    /// Exponential multiplier.
    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// Cap applied before jitter; zero means uncapped.
    pub fn max(&self) -> Duration {
        self.max
    }

    /// Jitter fraction.
    pub fn jitter(&self) -> f64 {
        self.jitter
    }

    /// The capped delay for `attempt`, before jitter.
    fn capped_delay(&self, attempt: u32) -> Duration {
        let delay = grow(self.base, self.factor, attempt);
        if !self.max.is_zero() && delay > self.max {
            self.max
        } else {
            delay
        }
    }
}

/// `base * factor^attempt`, computed in nanoseconds so integral results are exact.
fn grow(base: Duration, factor: f64, attempt: u32) -> Duration {
    let nanos = base.as_nanos() as f64 * factor.powf(f64::from(attempt));
    if nanos.is_nan() || nanos <= 0.0 {
        return Duration::ZERO;
    }
    if nanos < u64::MAX as f64 {
        Duration::from_nanos(nanos as u64)
    } else {
        jitter::from_secs_f64_saturating(nanos / 1e9)
    }
}

impl Default for ExponentialBackoff {
    /// Create an exponential backoff with sensible defaults.
    ///
    /// Defaults:
    /// - `base`: 100ms
    /// - `factor`: 2.0 (doubles each time)
    /// - `max`: 60s
    /// - `jitter`: 0.1 (10% randomization)
    fn default() -> Self {
        Self {
            base: Duration::from_millis(100),
            factor: 2.0,
            max: Duration::from_secs(60),
            jitter: 0.1,
        }
    }
}

impl Backoff for ExponentialBackoff {
    fn next_delay(&self, attempt: u32) -> Duration {
        jitter::apply(self.capped_delay(attempt), self.jitter)
    }
}

/// Builder for configuring `ExponentialBackoff`.
///
/// # Examples
///
/// ```rust
/// use retrier::retry::ExponentialBackoff;
/// use std::time::Duration;
///
/// let backoff = ExponentialBackoff::builder()
///     .base(Duration::from_millis(100))
///     .max(Duration::from_secs(30))
///     .factor(1.5)
///     .jitter(0.2)
///     .build();
/// ```
#[derive(Debug, Default)]
pub struct ExponentialBackoffBuilder {
    base: Option<Duration>,
    factor: Option<f64>,
    max: Option<Duration>,
    jitter: Option<f64>,
}

impl ExponentialBackoffBuilder {
    /// Set the delay before the first retry.
    ///
    /// Default: 100ms
    pub fn base(mut self, base: Duration) -> Self {
        self.base = Some(base);
        self
    }

    /// Set the exponential multiplier.
    ///
    /// Each retry delay is multiplied by this factor.
    ///
    /// Default: 2.0 (doubles each time)
    pub fn factor(mut self, factor: f64) -> Self {
        self.factor = Some(factor);
        self
    }

    /// Set the maximum delay. `Duration::ZERO` removes the cap.
    ///
    /// Default: 60s
    pub fn max(mut self, max: Duration) -> Self {
        self.max = Some(max);
        self
    }

    /// Set the jitter fraction.
    ///
    /// A jitter of 0.1 means the delay can vary by ±10%. Values outside
    /// `(0, 1)` disable jitter.
    ///
    /// Default: 0.1
    pub fn jitter(mut self, jitter: f64) -> Self {
        self.jitter = Some(jitter);
        self
    }

    /// Build the `ExponentialBackoff` instance.
    ///
    /// Uses default values for any unset parameters.
    pub fn build(self) -> ExponentialBackoff {
        let defaults = ExponentialBackoff::default();
        ExponentialBackoff {
            base: self.base.unwrap_or(defaults.base),
            factor: self.factor.unwrap_or(defaults.factor),
            max: self.max.unwrap_or(defaults.max),
            jitter: self.jitter.unwrap_or(defaults.jitter),
        }
    }
}

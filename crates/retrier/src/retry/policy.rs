//! A closed set of the built-in strategies, selectable from configuration.

use super::strategy::Backoff;
use super::{ExponentialBackoff, FixedBackoff, LinearBackoff};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One of the built-in backoff strategies.
///
/// This is the form strategies take in [`RetryConfig`](crate::config::RetryConfig):
/// internally tagged by `kind`, with durations in milliseconds.
///
/// ```toml
/// kind = "linear"
/// base_ms = 500
/// step_ms = 500
/// max_ms = 5000
/// jitter = 0.1
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackoffPolicy {
    /// Constant delay.
    Fixed(FixedBackoff),
    /// `base + attempt * step`.
    Linear(LinearBackoff),
    /// `base * factor^attempt`.
    Exponential(ExponentialBackoff),
}

impl BackoffPolicy {
    /// Name of the variant as it appears in configuration.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Fixed(_) => "fixed",
            Self::Linear(_) => "linear",
            Self::Exponential(_) => "exponential",
        }
    }

    /// Configured jitter fraction of the selected variant.
    pub fn jitter(&self) -> f64 {
        match self {
            Self::Fixed(b) => b.jitter(),
            Self::Linear(b) => b.jitter(),
            Self::Exponential(b) => b.jitter(),
        }
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::Linear(LinearBackoff::default())
    }
}

impl Backoff for BackoffPolicy {
    fn next_delay(&self, attempt: u32) -> Duration {
        match self {
            Self::Fixed(b) => b.next_delay(attempt),
            Self::Linear(b) => b.next_delay(attempt),
            Self::Exponential(b) => b.next_delay(attempt),
        }
    }
}

impl From<FixedBackoff> for BackoffPolicy {
    fn from(backoff: FixedBackoff) -> Self {
        Self::Fixed(backoff)
    }
}

impl From<LinearBackoff> for BackoffPolicy {
    fn from(backoff: LinearBackoff) -> Self {
        Self::Linear(backoff)
    }
}

impl From<ExponentialBackoff> for BackoffPolicy {
    fn from(backoff: ExponentialBackoff) -> Self {
        Self::Exponential(backoff)
    }
}

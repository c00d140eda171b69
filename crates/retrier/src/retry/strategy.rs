//! The backoff capability shared by every delay strategy.

use std::time::Duration;

/// A strategy for computing how long to wait between attempts.
///
/// Implementations are pure: given the zero-based index of the attempt that
/// just failed, they return the delay before the next attempt. Apart from an
/// optional jitter term they are deterministic, and they never fail.
///
/// # Design Philosophy
///
/// The executor only ever asks "how long for attempt `n`?", so any strategy
/// can be swapped in without touching the retry loop:
///
/// - Built-in variants ([`FixedBackoff`], [`LinearBackoff`], [`ExponentialBackoff`])
/// - The serde-configurable [`BackoffPolicy`] enum
/// - Any `Fn(u32) -> Duration + Send + Sync` closure
///
/// [`FixedBackoff`]: crate::retry::FixedBackoff
/// [`LinearBackoff`]: crate::retry::LinearBackoff
/// [`ExponentialBackoff`]: crate::retry::ExponentialBackoff
/// [`BackoffPolicy`]: crate::retry::BackoffPolicy
///
/// # Examples
///
/// ```rust
/// use retrier::retry::{Backoff, ExponentialBackoff};
/// use std::time::Duration;
///
/// let backoff = ExponentialBackoff::builder()
///     .base(Duration::from_millis(100))
///     .factor(2.0)
///     .jitter(0.0)
///     .build();
///
/// assert_eq!(backoff.next_delay(0), Duration::from_millis(100));
/// assert_eq!(backoff.next_delay(3), Duration::from_millis(800));
///
/// // Closures are strategies too
/// let custom = |attempt: u32| Duration::from_millis(10 * u64::from(attempt + 1));
/// assert_eq!(custom.next_delay(1), Duration::from_millis(20));
/// ```
pub trait Backoff: Send + Sync {
    /// Calculate the delay before the attempt following `attempt`.
    ///
    /// # Parameters
    /// - `attempt`: The index of the attempt that just failed (0-indexed)
    ///
    /// # Notes
    ///
    /// This method is called AFTER a retryable failure and BEFORE sleeping.
    /// The first attempt (attempt=0) will call `next_delay(0)` before the second try.
    fn next_delay(&self, attempt: u32) -> Duration;
}

impl<F> Backoff for F
where
    F: Fn(u32) -> Duration + Send + Sync,
{
    fn next_delay(&self, attempt: u32) -> Duration {
        self(attempt)
    }
}

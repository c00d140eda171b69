//! Randomized perturbation of computed delays.

use rand::Rng;
use std::time::Duration;

/// Returns `true` when `jitter` lies strictly inside `(0, 1)`.
///
/// Anything else, NaN included, turns jitter off.
pub(crate) fn is_enabled(jitter: f64) -> bool {
    jitter > 0.0 && jitter < 1.0
}

/// Scale `delay` by `1 + δ` with `δ` drawn uniformly from `[-jitter, +jitter]`.
///
/// Returns `delay` untouched when jitter is disabled. The caller applies any
/// cap before calling this, so the result may land above that cap.
pub(crate) fn apply(delay: Duration, jitter: f64) -> Duration {
    if !is_enabled(jitter) {
        return delay;
    }
    let delta = rand::thread_rng().gen_range(-jitter..=jitter);
    scale(delay, 1.0 + delta)
}

/// Multiply a duration by a non-negative factor, saturating instead of panicking.
pub(crate) fn scale(delay: Duration, factor: f64) -> Duration {
    from_secs_f64_saturating(delay.as_secs_f64() * factor)
}

/// Convert seconds to a `Duration`, mapping NaN and negatives to zero and
/// overflow to `Duration::MAX`.
pub(crate) fn from_secs_f64_saturating(secs: f64) -> Duration {
    if secs.is_nan() || secs <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}

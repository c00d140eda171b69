//! Property-based tests for the backoff strategies
//!
//! These check the delay formulas and their bounds across randomly generated
//! parameters rather than a handful of hand-picked cases.

#[cfg(test)]
mod tests {
    use crate::retry::{Backoff, ExponentialBackoff, FixedBackoff, LinearBackoff};
    use proptest::prelude::*;
    use std::time::Duration;

    // ===== Strategy Generators =====

    fn arb_millis() -> impl Strategy<Value = u64> {
        0u64..100_000u64
    }

    fn arb_attempt() -> impl Strategy<Value = u32> {
        0u32..64u32
    }

    fn arb_enabled_jitter() -> impl Strategy<Value = f64> {
        0.01f64..0.99f64
    }

    fn arb_disabled_jitter() -> impl Strategy<Value = f64> {
        prop_oneof![Just(0.0), -5.0f64..=0.0, 1.0f64..5.0]
    }

    fn within_jitter(delay: Duration, nominal: Duration, jitter: f64) -> bool {
        let d = delay.as_secs_f64();
        let n = nominal.as_secs_f64();
        // Allow for nanosecond rounding in the float conversion
        let slack = 1e-9 * (1.0 + n);
        d >= n * (1.0 - jitter) - slack && d <= n * (1.0 + jitter) + slack
    }

    proptest! {
        /// Property: fixed backoff ignores the attempt index
        #[test]
        fn prop_fixed_is_constant(interval in arb_millis(), attempt in any::<u32>()) {
            let backoff = FixedBackoff::new(Duration::from_millis(interval));
            prop_assert_eq!(backoff.next_delay(attempt), Duration::from_millis(interval));
        }

        /// Property: linear backoff equals min(base + n*step, max) when max > 0
        #[test]
        fn prop_linear_formula(
            base in arb_millis(),
            step in arb_millis(),
            max in 1u64..1_000_000u64,
            attempt in arb_attempt(),
        ) {
            let backoff = LinearBackoff::builder()
                .base(Duration::from_millis(base))
                .step(Duration::from_millis(step))
                .max(Duration::from_millis(max))
                .jitter(0.0)
                .build();

            let expected = (base + u64::from(attempt) * step).min(max);
            prop_assert_eq!(backoff.next_delay(attempt), Duration::from_millis(expected));
        }

        /// Property: exponential backoff never exceeds a non-zero cap without jitter
        #[test]
        fn prop_exponential_capped(
            base in arb_millis(),
            factor in 1.0f64..10.0,
            max in 1u64..1_000_000u64,
            attempt in arb_attempt(),
        ) {
            let backoff = ExponentialBackoff::builder()
                .base(Duration::from_millis(base))
                .factor(factor)
                .max(Duration::from_millis(max))
                .jitter(0.0)
                .build();

            prop_assert!(backoff.next_delay(attempt) <= Duration::from_millis(max));
        }

        /// Property: exponential backoff is non-decreasing for factor >= 1
        #[test]
        fn prop_exponential_monotonic(
            base in arb_millis(),
            factor in 1.0f64..4.0,
            attempt in 0u32..40u32,
        ) {
            let backoff = ExponentialBackoff::builder()
                .base(Duration::from_millis(base))
                .factor(factor)
                .max(Duration::ZERO)
                .jitter(0.0)
                .build();

            prop_assert!(backoff.next_delay(attempt) <= backoff.next_delay(attempt + 1));
        }

        /// Property: attempt 0 of exponential backoff is exactly base
        #[test]
        fn prop_exponential_attempt_zero_is_base(base in arb_millis(), factor in 0.0f64..100.0) {
            let backoff = ExponentialBackoff::builder()
                .base(Duration::from_millis(base))
                .factor(factor)
                .max(Duration::ZERO)
                .jitter(0.0)
                .build();

            prop_assert_eq!(backoff.next_delay(0), Duration::from_millis(base));
        }

        /// Property: enabled jitter stays within [d*(1-j), d*(1+j)] of the capped delay
        #[test]
        fn prop_jitter_bounds(
            base in arb_millis(),
            step in arb_millis(),
            max in 1u64..1_000_000u64,
            attempt in arb_attempt(),
            jitter in arb_enabled_jitter(),
        ) {
            let nominal = LinearBackoff::builder()
                .base(Duration::from_millis(base))
                .step(Duration::from_millis(step))
                .max(Duration::from_millis(max))
                .jitter(0.0)
                .build()
                .next_delay(attempt);
            let jittered = LinearBackoff::builder()
                .base(Duration::from_millis(base))
                .step(Duration::from_millis(step))
                .max(Duration::from_millis(max))
                .jitter(jitter)
                .build()
                .next_delay(attempt);

            prop_assert!(
                within_jitter(jittered, nominal, jitter),
                "{:?} not within {} of {:?}", jittered, jitter, nominal
            );
        }

        /// Property: jitter outside (0, 1) returns the capped delay exactly
        #[test]
        fn prop_disabled_jitter_is_exact(
            interval in arb_millis(),
            attempt in arb_attempt(),
            jitter in arb_disabled_jitter(),
        ) {
            let backoff = FixedBackoff::new(Duration::from_millis(interval)).with_jitter(jitter);
            prop_assert_eq!(backoff.next_delay(attempt), Duration::from_millis(interval));

            // Cap equal to base: every attempt clamps back to the interval
            let exp = ExponentialBackoff::builder()
                .base(Duration::from_millis(interval))
                .factor(2.0)
                .max(Duration::from_millis(interval))
                .jitter(jitter)
                .build();
            prop_assert_eq!(exp.next_delay(attempt), Duration::from_millis(interval));
        }
    }
}

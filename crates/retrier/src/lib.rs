#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Uniform, composable retry semantics for fallible async operations.
//!
//! This crate provides:
//!
//! - **A retry executor** via [`Retrier`](retry::Retrier)
//!   - Attempt limits, with `0` meaning unbounded
//!   - Custom retry predicates
//!   - Cancellation before every attempt and during every backoff wait
//! - **Backoff strategies** via the [`Backoff`](retry::Backoff) trait
//!   - Fixed, linear and exponential delays, each with optional jitter
//!   - Any `Fn(u32) -> Duration` closure
//! - **Cancellation signals** via [`CancelSignal`](cancel::CancelSignal)
//! - **Declarative configuration** via [`RetryConfig`](config::RetryConfig)
//!
//! # Outcomes
//!
//! [`Retrier::execute`](retry::Retrier::execute) returns `Ok` on success.
//! Otherwise it returns one of three [`RetryError`] variants, which callers
//! tell apart by matching:
//!
//! - [`RetryError::Canceled`] carries the signal's own error
//! - [`RetryError::Unretryable`] wraps the error the predicate rejected
//! - [`RetryError::Exhausted`] wraps the final error once attempts run out
//!
//! # Examples
//!
//! Using the prelude for convenient imports:
//!
//! ```rust
//! use retrier::prelude::*;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let retrier = Retrier::builder()
//!     .max_attempts(4)
//!     .backoff(ExponentialBackoff::builder().base(Duration::from_millis(100)).build())
//!     .build();
//!
//! let ctx = Context::new().with_timeout(Duration::from_secs(10));
//! let result = retrier
//!     .execute(&ctx, |_attempt| async { Ok::<_, std::io::Error>(42) })
//!     .await;
//!
//! match result {
//!     Ok(value) => assert_eq!(value, 42),
//!     Err(RetryError::Canceled(reason)) => eprintln!("gave up: {reason}"),
//!     Err(RetryError::Unretryable(cause)) => eprintln!("permanent failure: {cause}"),
//!     Err(RetryError::Exhausted { attempts, source }) => {
//!         eprintln!("failed {attempts} times, last error: {source}")
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod cancel;
pub mod config;
pub mod error;
pub mod retry;

mod property_tests;

pub use error::RetryError;
pub use retry::retry;

/// Convenient re-exports of commonly used items.
///
/// Import all core abstractions with:
///
/// ```rust
/// use retrier::prelude::*;
/// ```
pub mod prelude {
    pub use crate::cancel::{CancelSignal, Context, Never};
    pub use crate::config::RetryConfig;
    pub use crate::error::{Canceled, ContextError, RetryError};
    pub use crate::retry::{
        Backoff, BackoffPolicy, ExponentialBackoff, FixedBackoff, LinearBackoff, Retrier, retry,
    };
}

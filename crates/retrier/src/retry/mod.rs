//! Retry executor and backoff strategies.
//!
//! This module provides the retry loop ([`Retrier`]) and the delay strategies
//! it consults between attempts.
//!
//! # Key Types
//!
//! - [`Backoff`] - Core trait for delay strategies
//! - [`FixedBackoff`], [`LinearBackoff`], [`ExponentialBackoff`] - Built-in strategies
//! - [`BackoffPolicy`] - Serde-configurable choice of built-in strategy
//! - [`Retrier`] - The executor
//!
//! # Examples
//!
//! ```rust
//! use retrier::cancel::Never;
//! use retrier::retry::{ExponentialBackoff, Retrier};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let retrier = Retrier::builder()
//!     .max_attempts(3)
//!     .backoff(ExponentialBackoff::builder().base(Duration::from_millis(100)).build())
//!     .build();
//!
//! let result = retrier
//!     .execute(&Never, |_attempt| async {
//!         // Your operation here
//!         Ok::<_, std::io::Error>(42)
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod executor;
mod exponential;
mod fixed;
mod jitter;
mod linear;
mod policy;
mod strategy;

pub use executor::{DEFAULT_MAX_ATTEMPTS, Retrier, RetrierBuilder, RetryPredicate, retry};
pub use exponential::{ExponentialBackoff, ExponentialBackoffBuilder};
pub use fixed::FixedBackoff;
pub use linear::{LinearBackoff, LinearBackoffBuilder};
pub use policy::BackoffPolicy;
pub use strategy::Backoff;

//! The retry loop.

use super::strategy::Backoff;
use super::BackoffPolicy;
use crate::cancel::CancelSignal;
use crate::error::RetryError;
use std::error::Error;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Default maximum number of attempts.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Decides whether a failed attempt should be retried.
///
/// Receives the operation's error as a trait object; use
/// [`RetrierBuilder::retry_if_error`] to match on a concrete type.
pub type RetryPredicate = Arc<dyn Fn(&(dyn Error + 'static)) -> bool + Send + Sync>;

/// Executes an operation with retry semantics.
///
/// A `Retrier` is an immutable bundle of a backoff strategy, an attempt
/// limit and a retry predicate. All per-run state lives inside
/// [`execute`](Retrier::execute), so one value can drive many sequential
/// runs. Cloning is cheap.
///
/// # Examples
///
/// ```rust
/// use retrier::cancel::Context;
/// use retrier::retry::{FixedBackoff, Retrier};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let retrier = Retrier::builder()
///     .max_attempts(5)
///     .backoff(FixedBackoff::new(Duration::from_millis(10)))
///     .build();
///
/// let ctx = Context::new().with_timeout(Duration::from_secs(2));
/// let value = retrier
///     .execute(&ctx, |attempt| async move {
///         if attempt < 2 {
///             Err(std::io::Error::other("transient"))
///         } else {
///             Ok(attempt)
///         }
///     })
///     .await?;
///
/// assert_eq!(value, 2);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Retrier {
    backoff: Arc<dyn Backoff>,
    max_attempts: u32,
    is_retryable: RetryPredicate,
}

impl Retrier {
    /// A retrier with the default configuration.
    ///
    /// Defaults:
    /// - `max_attempts`: 3
    /// - `backoff`: linear, 1s base, 1s step, 10s cap, 10% jitter
    /// - `is_retryable`: every error is retryable
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a new builder for configuring a retrier.
    pub fn builder() -> RetrierBuilder {
        RetrierBuilder::default()
    }

    /// Maximum number of attempts; zero means unbounded.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// The configured backoff strategy.
    pub fn backoff(&self) -> &dyn Backoff {
        self.backoff.as_ref()
    }

    /// Whether the configured predicate would retry `error`.
    pub fn is_retryable(&self, error: &(dyn Error + 'static)) -> bool {
        (self.is_retryable)(error)
    }

    /// Run `operation` until it succeeds, is canceled, fails permanently, or
    /// runs out of attempts.
    ///
    /// `operation` receives the zero-based attempt index. Each run proceeds as
    /// follows:
    ///
    /// 1. If `signal` has already fired, return [`RetryError::Canceled`].
    /// 2. Invoke the operation. On `Ok`, return it immediately.
    /// 3. If the predicate rejects the error, return [`RetryError::Unretryable`]
    ///    without waiting.
    /// 4. If this was the last permitted attempt, return [`RetryError::Exhausted`].
    /// 5. Otherwise wait `backoff.next_delay(attempt)`, or until `signal` fires,
    ///    whichever comes first. Cancellation here returns [`RetryError::Canceled`].
    ///
    /// The signal is not observed while an attempt is in flight.
    ///
    /// # Errors
    ///
    /// Returns one of the three [`RetryError`] variants described above.
    pub async fn execute<S, F, Fut, T, E>(
        &self,
        signal: &S,
        mut operation: F,
    ) -> Result<T, RetryError<E, S::Error>>
    where
        S: CancelSignal,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Error + 'static,
    {
        let mut attempt: u32 = 0;

        loop {
            if let Some(cause) = signal.err() {
                tracing::debug!(attempt, reason = %cause, "retry canceled before attempt");
                return Err(RetryError::Canceled(cause));
            }

            let err = match operation(attempt).await {
                Ok(value) => {
                    if attempt > 0 {
                        tracing::trace!(attempts = attempt + 1, "retry succeeded");
                    }
                    return Ok(value);
                }
                Err(err) => err,
            };

            if !self.is_retryable(&err) {
                tracing::debug!(attempt, error = %err, "unretryable error, giving up");
                return Err(RetryError::Unretryable(err));
            }

            let attempts = attempt.saturating_add(1);
            if self.max_attempts > 0 && attempts >= self.max_attempts {
                tracing::warn!(attempts, error = %err, "all retry attempts failed");
                return Err(RetryError::Exhausted {
                    attempts,
                    source: err,
                });
            }

            let delay = self.backoff.next_delay(attempt);
            tracing::debug!(attempt, ?delay, error = %err, "attempt failed, backing off");

            tokio::select! {
                biased;
                cause = signal.cancelled() => {
                    tracing::debug!(attempt, reason = %cause, "retry canceled during backoff");
                    return Err(RetryError::Canceled(cause));
                }
                () = tokio::time::sleep(delay) => {}
            }

            attempt = attempts;
        }
    }
}

impl Default for Retrier {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Retrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Retrier")
            .field("max_attempts", &self.max_attempts)
            .finish_non_exhaustive()
    }
}

/// Run `operation` with the default backoff and predicate and the given attempt limit.
///
/// Shorthand for `Retrier::builder().max_attempts(max_attempts).build().execute(signal, operation)`.
///
/// # Examples
///
/// ```rust
/// use retrier::retry;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() {
/// let token = CancellationToken::new();
/// let result = retry(&token, 3, |_| async { Ok::<_, std::io::Error>("done") }).await;
/// assert_eq!(result.unwrap(), "done");
/// # }
/// ```
///
/// # Errors
///
/// See [`Retrier::execute`].
pub async fn retry<S, F, Fut, T, E>(
    signal: &S,
    max_attempts: u32,
    operation: F,
) -> Result<T, RetryError<E, S::Error>>
where
    S: CancelSignal,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Error + 'static,
{
    Retrier::builder()
        .max_attempts(max_attempts)
        .build()
        .execute(signal, operation)
        .await
}

/// Builder for configuring a [`Retrier`].
///
/// # Examples
///
/// ```rust
/// use retrier::retry::{ExponentialBackoff, Retrier};
/// use std::io;
/// use std::time::Duration;
///
/// let retrier = Retrier::builder()
///     .max_attempts(0) // unbounded, rely on the signal's deadline
///     .backoff(ExponentialBackoff::builder().base(Duration::from_millis(50)).build())
///     .retry_if_error(|err: &io::Error| err.kind() != io::ErrorKind::PermissionDenied)
///     .build();
///
/// assert_eq!(retrier.max_attempts(), 0);
/// ```
#[derive(Default)]
pub struct RetrierBuilder {
    backoff: Option<Arc<dyn Backoff>>,
    max_attempts: Option<u32>,
    is_retryable: Option<RetryPredicate>,
}

impl RetrierBuilder {
    /// Set the maximum number of attempts; zero means unbounded.
    ///
    /// Default: 3
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Set the backoff strategy.
    ///
    /// Default: [`BackoffPolicy::default`] (linear, 1s/1s/10s, 10% jitter)
    pub fn backoff(mut self, backoff: impl Backoff + 'static) -> Self {
        self.backoff = Some(Arc::new(backoff));
        self
    }

    /// Set a backoff strategy that is already shared.
    pub fn shared_backoff(mut self, backoff: Arc<dyn Backoff>) -> Self {
        self.backoff = Some(backoff);
        self
    }

    /// Set the retry predicate. Returning `false` stops the sequence immediately.
    ///
    /// Default: retry every error
    pub fn retry_if<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&(dyn Error + 'static)) -> bool + Send + Sync + 'static,
    {
        self.is_retryable = Some(Arc::new(predicate));
        self
    }

    /// Set a retry predicate over a concrete error type.
    ///
    /// Errors that are not an `E` remain retryable.
    pub fn retry_if_error<E, P>(self, predicate: P) -> Self
    where
        E: Error + 'static,
        P: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.retry_if(move |err| err.downcast_ref::<E>().is_none_or(&predicate))
    }

    /// Build the `Retrier`, using defaults for any unset parameters.
    pub fn build(self) -> Retrier {
        Retrier {
            backoff: self
                .backoff
                .unwrap_or_else(|| Arc::new(BackoffPolicy::default())),
            max_attempts: self.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS),
            is_retryable: self.is_retryable.unwrap_or_else(|| Arc::new(|_| true)),
        }
    }
}

impl fmt::Debug for RetrierBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetrierBuilder")
            .field("max_attempts", &self.max_attempts)
            .field("has_backoff", &self.backoff.is_some())
            .field("has_predicate", &self.is_retryable.is_some())
            .finish()
    }
}

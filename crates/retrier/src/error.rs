//! Error types for the retry executor.
//!
//! A retry sequence ends in one of three distinguishable failures, all carried
//! by [`RetryError`]. Callers branch on the variant (or the `is_*` helpers),
//! never on the message text.

use thiserror::Error;

/// Terminal failure of a retry sequence.
///
/// - `E` is the operation's error type.
/// - `C` is the error type produced by the cancellation signal.
///
/// The operation's original error is always reachable, through
/// [`std::error::Error::source`], [`RetryError::cause`], or
/// [`RetryError::into_cause`].
#[derive(Debug, Error)]
pub enum RetryError<E, C> {
    /// The cancellation signal fired before an attempt or during a backoff wait.
    ///
    /// Holds the signal's own error value, unmodified.
    #[error(transparent)]
    Canceled(C),

    /// The retry predicate classified the error as non-retryable.
    #[error("unretryable error: {0}")]
    Unretryable(#[source] E),

    /// Every permitted attempt failed with a retryable error.
    #[error("all attempts failed: {source}")]
    Exhausted {
        /// Number of attempts made.
        attempts: u32,
        /// Error returned by the final attempt.
        #[source]
        source: E,
    },
}

impl<E, C> RetryError<E, C> {
    /// Whether the sequence stopped because of cancellation.
    pub fn is_canceled(&self) -> bool {
        matches!(self, Self::Canceled(_))
    }

    /// Whether the sequence stopped on a non-retryable error.
    pub fn is_unretryable(&self) -> bool {
        matches!(self, Self::Unretryable(_))
    }

    /// Whether the sequence ran out of attempts.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }

    /// The operation error behind an unretryable or exhausted outcome.
    pub fn cause(&self) -> Option<&E> {
        match self {
            Self::Unretryable(cause) | Self::Exhausted { source: cause, .. } => Some(cause),
            Self::Canceled(_) => None,
        }
    }

    /// Consume the error, returning the operation error if there is one.
    pub fn into_cause(self) -> Option<E> {
        match self {
            Self::Unretryable(cause) | Self::Exhausted { source: cause, .. } => Some(cause),
            Self::Canceled(_) => None,
        }
    }

    /// The cancellation signal's error, if the sequence was canceled.
    pub fn cancellation(&self) -> Option<&C> {
        match self {
            Self::Canceled(err) => Some(err),
            _ => None,
        }
    }

    /// Number of attempts made, when the sequence was exhausted.
    pub fn attempts(&self) -> Option<u32> {
        match self {
            Self::Exhausted { attempts, .. } => Some(*attempts),
            _ => None,
        }
    }
}

/// Error produced by a [`CancellationToken`](tokio_util::sync::CancellationToken) signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation canceled")]
pub struct Canceled;

/// Error produced by a [`Context`](crate::cancel::Context) signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContextError {
    /// The context's token was canceled.
    #[error("context canceled")]
    Canceled,

    /// The context's deadline passed.
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// Errors raised while loading or validating a [`RetryConfig`](crate::config::RetryConfig).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A setting holds a value that cannot be used.
    #[error("invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        /// Name of the setting or environment variable
        key: String,
        /// Offending value as written
        value: String,
        /// Why it was rejected
        reason: String,
    },

    /// The backoff kind is not one of `fixed`, `linear`, `exponential`.
    #[error("unknown backoff kind: {0:?}")]
    UnknownBackoff(String),
}

impl ConfigError {
    pub(crate) fn invalid(
        key: impl Into<String>,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            key: key.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

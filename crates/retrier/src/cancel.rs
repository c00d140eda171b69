//! Cancellation signals observed by the retry loop.
//!
//! The executor never originates cancellation. It polls a [`CancelSignal`]
//! before every attempt and races its [`cancelled`](CancelSignal::cancelled)
//! future against each backoff wait.
//!
//! Three signals ship with the crate:
//!
//! - [`CancellationToken`] from `tokio-util`, failing with [`Canceled`]
//! - [`Context`], a token plus an optional deadline, failing with [`ContextError`]
//! - [`Never`], for callers with no deadline at all

use crate::error::{Canceled, ContextError};
use async_trait::async_trait;
use std::convert::Infallible;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// An externally owned cancellation or deadline notification.
///
/// # Examples
///
/// ```rust
/// use retrier::cancel::CancelSignal;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() {
/// let token = CancellationToken::new();
/// assert!(token.err().is_none());
///
/// token.cancel();
/// assert!(token.err().is_some());
/// let _reason = CancelSignal::cancelled(&token).await;
/// # }
/// ```
#[async_trait]
pub trait CancelSignal: Send + Sync {
    /// Error surfaced to the caller when cancellation is observed.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns the cancellation error if cancellation has already been requested.
    fn err(&self) -> Option<Self::Error>;

    /// Resolves once cancellation is requested, yielding the cancellation error.
    ///
    /// Resolves immediately if cancellation was already requested.
    async fn cancelled(&self) -> Self::Error;
}

#[async_trait]
impl CancelSignal for CancellationToken {
    type Error = Canceled;

    fn err(&self) -> Option<Canceled> {
        self.is_cancelled().then_some(Canceled)
    }

    async fn cancelled(&self) -> Canceled {
        CancellationToken::cancelled(self).await;
        Canceled
    }
}

/// A signal that never fires.
#[derive(Debug, Clone, Copy, Default)]
pub struct Never;

#[async_trait]
impl CancelSignal for Never {
    type Error = Infallible;

    fn err(&self) -> Option<Infallible> {
        None
    }

    async fn cancelled(&self) -> Infallible {
        std::future::pending().await
    }
}

/// Request-scoped cancellation: a token plus an optional deadline.
///
/// Deadlines only ever tighten. Applying a later deadline to a context that
/// already has an earlier one keeps the earlier one, and [`child`](Context::child)
/// contexts inherit their parent's deadline.
///
/// Uses [`tokio::time::Instant`], so it follows a paused test clock.
///
/// # Examples
///
/// ```rust
/// use retrier::cancel::Context;
/// use std::time::Duration;
///
/// # async fn example() {
/// let ctx = Context::new().with_timeout(Duration::from_secs(5));
/// let per_call = ctx.child().with_timeout(Duration::from_millis(500));
///
/// ctx.cancel();
/// assert!(per_call.is_done());
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// A context with a fresh token and no deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing token.
    pub fn from_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Set the deadline to `now + timeout`, unless an earlier one is already set.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self,
        }
    }

    /// Set the deadline, unless an earlier one is already set.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        });
        self
    }

    /// A context canceled along with this one, with the same deadline.
    ///
    /// Canceling the child does not cancel the parent.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Request cancellation of this context and its children.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// The underlying token.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// The deadline, if one is set.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether the context is canceled or past its deadline.
    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }
}

#[async_trait]
impl CancelSignal for Context {
    type Error = ContextError;

    fn err(&self) -> Option<ContextError> {
        if self.token.is_cancelled() {
            return Some(ContextError::Canceled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }

    async fn cancelled(&self) -> ContextError {
        match self.deadline {
            Some(deadline) => tokio::select! {
                biased;
                () = self.token.cancelled() => ContextError::Canceled,
                () = tokio::time::sleep_until(deadline) => ContextError::DeadlineExceeded,
            },
            None => {
                self.token.cancelled().await;
                ContextError::Canceled
            }
        }
    }
}

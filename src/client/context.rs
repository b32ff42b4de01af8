//! Per-call cancellation and deadlines.

use crate::error::{Result, TransportError};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Cancellation signal and optional deadline for one call.
///
/// Every [`RestClient`](crate::RestClient) operation runs under a context.
/// When the token is cancelled or the deadline passes, the call returns
/// immediately and drops its in-flight request and body streams.
///
/// # Examples
///
/// ```
/// use storage_rest_core::CallContext;
/// use std::time::Duration;
///
/// let ctx = CallContext::background();
/// assert!(!ctx.is_cancelled());
///
/// let ctx = CallContext::with_timeout(Duration::from_secs(5));
/// ctx.cancel();
/// assert!(ctx.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// A context that expires `timeout` from now.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// A context that expires at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        CallContext {
            token: CancellationToken::new(),
            deadline: Some(deadline),
        }
    }

    /// A context cancelled through an externally owned token.
    pub fn with_cancellation(token: CancellationToken) -> Self {
        CallContext {
            token,
            deadline: None,
        }
    }

    /// Derive a context that also expires at `deadline` (the earlier one wins).
    pub fn and_deadline(&self, deadline: Instant) -> Self {
        CallContext {
            token: self.token.clone(),
            deadline: Some(self.deadline.map_or(deadline, |d| d.min(deadline))),
        }
    }

    /// Cancel every call running under this context.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// True once [`cancel`](Self::cancel) was called.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// The deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// The cancellation token.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Run `fut` until it completes, the context is cancelled, or the
    /// deadline passes, whichever happens first.
    pub async fn run<F, T>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(TransportError::Cancelled.into()),
            _ = expired => Err(TransportError::DeadlineExceeded.into()),
            res = fut => res,
        }
    }
}

//! Cancellable dial context.
//!
//! A [`DialContext`] couples a [`CancellationToken`] with an optional
//! deadline. Child contexts are cancelled with their parent and never outlive
//! its deadline.

use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Why a context is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CancelReason {
    /// `cancel()` was called on this context or an ancestor.
    Cancelled,
    DeadlineExceeded,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => f.write_str("context cancelled"),
            Self::DeadlineExceeded => f.write_str("deadline exceeded"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DialContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Default for DialContext {
    fn default() -> Self {
        Self::background()
    }
}

impl DialContext {
    /// Root context: no deadline, cancelled only explicitly.
    pub fn background() -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: None,
        }
    }

    /// Child that is cancelled with `self`.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Child whose deadline is `timeout` from now, or the parent's if sooner.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Child whose deadline is `deadline`, or the parent's if sooner.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(parent) => parent.min(deadline),
            None => deadline,
        };
        Self {
            token: self.token.child_token(),
            deadline: Some(deadline),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Cancel this context and all of its children.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// `Some` once the context is done.
    pub fn err(&self) -> Option<CancelReason> {
        if self.token.is_cancelled() {
            Some(CancelReason::Cancelled)
        } else if self.deadline.is_some_and(|d| Instant::now() >= d) {
            Some(CancelReason::DeadlineExceeded)
        } else {
            None
        }
    }

    /// Resolves when the context is cancelled or its deadline passes.
    pub async fn done(&self) -> CancelReason {
        match self.deadline {
            Some(deadline) => tokio::select! {
                _ = self.token.cancelled() => CancelReason::Cancelled,
                _ = tokio::time::sleep_until(deadline) => CancelReason::DeadlineExceeded,
            },
            None => {
                self.token.cancelled().await;
                CancelReason::Cancelled
            }
        }
    }

    /// Drive `fut` until it completes or the context is done.
    ///
    /// On cancellation `fut` is dropped, along with anything it owns.
    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output, CancelReason> {
        tokio::select! {
            biased;
            reason = self.done() => Err(reason),
            out = fut => Ok(out),
        }
    }
}

//! Per-call cancellation and deadlines.

use crate::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Carries cancellation and an optional deadline for one call.
///
/// Every suspension point of a dispatch (waiting for the rate limiter, the
/// network round trip, reading the body) is raced against the context, so a
/// cancelled or expired context makes the call return promptly.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use wordpress_client::{Context, Error};
///
/// # #[tokio::main]
/// # async fn main() {
/// let ctx = Context::with_timeout(Duration::from_secs(5));
/// ctx.cancel();
/// let result = ctx.run(async { 42 }).await;
/// assert!(matches!(result, Err(Error::Cancelled)));
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// A context that expires `timeout` from now.
    ///
    /// A timeout too large to represent as an instant means no deadline.
    pub fn with_timeout(timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => Self::with_deadline(deadline),
            None => Self::background(),
        }
    }

    /// A context that expires at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Some(deadline),
        }
    }

    /// A context cancelled through `token`.
    pub fn with_cancellation(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Derives a context that is cancelled with this one and expires after
    /// `timeout` or at this context's deadline, whichever comes first.
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        let deadline = match (self.deadline, Instant::now().checked_add(timeout)) {
            (Some(parent), Some(own)) => Some(parent.min(own)),
            (parent, own) => parent.or(own),
        };
        Self {
            token: self.token.child_token(),
            deadline,
        }
    }

    /// Cancels this context and every context derived from it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// The token backing this context.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.token
    }

    /// The deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns the context error if the context is already done.
    pub fn check(&self) -> Result<()> {
        if self.token.is_cancelled() {
            return Err(Error::Cancelled);
        }

        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(Error::DeadlineExceeded);
        }

        Ok(())
    }

    /// Drives `future` to completion unless the context is cancelled or its
    /// deadline passes first.
    pub async fn run<F>(&self, future: F) -> Result<F::Output>
    where
        F: Future,
    {
        self.check()?;

        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(Error::Cancelled),
            _ = expired => Err(Error::DeadlineExceeded),
            output = future => Ok(output),
        }
    }
}

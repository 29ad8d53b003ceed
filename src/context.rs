//! Call deadlines
//!
//! Every store and wallet call made on behalf of a request runs under the
//! caller's deadline. The orchestrator forwards one `CallContext` to both
//! collaborators; bookkeeping writes that must survive an expired caller use
//! [`CallContext::grace`].

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;

/// The caller's deadline elapsed before the operation finished.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("deadline exceeded")]
pub struct DeadlineExceeded;

/// Deadline carried through a single workflow invocation.
#[derive(Debug, Clone, Copy)]
pub struct CallContext {
    deadline: Option<Instant>,
}

impl CallContext {
    /// No deadline; calls are bounded only by their own timeouts.
    pub fn background() -> Self {
        Self { deadline: None }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Some(Instant::now() + timeout),
        }
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline. `None` when unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline.map(|d| d.saturating_duration_since(Instant::now()))
    }

    pub fn is_expired(&self) -> bool {
        matches!(self.remaining(), Some(left) if left.is_zero())
    }

    /// Fresh context for a write that must be attempted even when this one
    /// has already expired (e.g. recording a `failed` outcome).
    pub fn grace(&self, timeout: Duration) -> Self {
        Self::with_timeout(timeout)
    }

    /// Caps `limit` by the time remaining on this context.
    pub fn bounded(&self, limit: Duration) -> Duration {
        match self.remaining() {
            Some(left) => left.min(limit),
            None => limit,
        }
    }

    /// Run `fut` to completion or until the deadline fires.
    pub async fn run<F, T>(&self, fut: F) -> Result<T, DeadlineExceeded>
    where
        F: Future<Output = T>,
    {
        match self.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, fut)
                .await
                .map_err(|_| DeadlineExceeded),
            None => Ok(fut.await),
        }
    }
}

impl Default for CallContext {
    fn default() -> Self {
        Self::background()
    }
}

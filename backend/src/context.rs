//! Per-call execution context carrying an optional deadline.

use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Clone, Copy, Default)]
pub struct Context {
    deadline: Option<Instant>,
}

impl Context {
    /// No deadline; the call is bounded only by its own limits and by the
    /// caller dropping the future.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
        }
    }

    /// Context with a deadline only when `timeout` is set.
    pub fn from_timeout(timeout: Option<Duration>) -> Self {
        timeout.map(Self::with_timeout).unwrap_or_default()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// The earlier of the caller's deadline and `now + limit`.
    pub fn deadline_within(&self, limit: Duration) -> Instant {
        let local = Instant::now() + limit;
        match self.deadline {
            Some(deadline) if deadline < local => deadline,
            _ => local,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|d| d <= Instant::now())
    }
}

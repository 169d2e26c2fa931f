//! Process phases of the bookstore server.
//!
//! ```text
//! Initializing -> Serving -> Draining -> Stopped
//! ```
//!
//! The phase only moves forward. [`BookService`](super::BookService) consults
//! it to refuse new calls once draining has begun.

use core::fmt;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    /// Connecting to the store and binding the listener.
    Initializing,
    /// Accepting RPC calls.
    Serving,
    /// Shutdown requested; new calls are refused.
    Draining,
    /// Listener closed and store released.
    Stopped,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Initializing => write!(f, "initializing"),
            Phase::Serving => write!(f, "serving"),
            Phase::Draining => write!(f, "draining"),
            Phase::Stopped => write!(f, "stopped"),
        }
    }
}

/// Shared handle to the current [`Phase`].
#[derive(Clone, Debug)]
pub struct Lifecycle {
    tx: Arc<watch::Sender<Phase>>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            tx: Arc::new(watch::Sender::new(Phase::Initializing)),
        }
    }

    pub fn phase(&self) -> Phase {
        *self.tx.borrow()
    }

    /// Moves to `next` if it is ahead of the current phase. Returns whether a
    /// transition happened.
    pub fn advance(&self, next: Phase) -> bool {
        let advanced = self.tx.send_if_modified(|phase| {
            if next > *phase {
                *phase = next;
                true
            } else {
                false
            }
        });
        if advanced {
            tracing::info!(phase = %next, "Lifecycle transition");
        }
        advanced
    }

    pub fn is_accepting(&self) -> bool {
        self.phase() < Phase::Draining
    }
}

//! The refinement loop and its collaborators.
//!
//! A session repeatedly picks the most useful remaining test, asks an [`Oracle`] about it, and
//! prunes the candidate programs that disagree with the verdict, until the query budget or the
//! tests run out.

mod oracle;
mod session;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;

pub use oracle::{InteractiveOracle, Oracle, ReferenceOracle, Verdict, reference_verdict};
pub use session::{SessionInputs, SessionTrace, Snapshot, run_session};

/// The only errors that escape a session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("session cancelled: {0}")]
    Cancelled(String),
}

/// Cooperative cancellation shared between a session and whoever may stop it.
///
/// Clones observe the same flag.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// `Err(Cancelled)` once [`cancel`](Self::cancel) has been called.
    pub fn check(&self) -> Result<(), SessionError> {
        if self.is_cancelled() {
            return Err(SessionError::Cancelled("cancellation requested".to_string()));
        }
        Ok(())
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

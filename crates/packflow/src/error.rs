//! Error types for the pipeline core.
//!
//! Injected faults and failed orders are *outcomes*, not errors; they travel
//! through the failed queue. An [`Error`] here always means the protocol
//! itself was violated, and workers treat every variant as fatal.

use crate::Stage;
use std::sync::{MutexGuard, PoisonError};

pub type Result<T> = core::result::Result<T, Error>;

/// Fatal protocol errors observable by workers and observers.
#[derive(Clone, thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// A lock was poisoned: some thread panicked while holding it. There is
    /// no recovery path; the order being processed must not be silently
    /// dropped, so the worker aborts instead.
    #[error("lock poisoned: a worker panicked while holding it")]
    LockPoisoned,

    /// An order without a locker claim was handed to a pool operation that
    /// needs one. Indicates a synchronization bug upstream.
    #[error("order #{sequence} carries no locker claim")]
    NoClaim { sequence: u64 },

    /// A poison pill surfaced in a queue that never receives one.
    #[error("poison pill observed in the {stage} queue")]
    UnexpectedPoison { stage: Stage },
}

// Convert all poisoned lock errors to a simplified `LockPoisoned`.
impl<T> From<PoisonError<MutexGuard<'_, T>>> for Error {
    fn from(_: PoisonError<MutexGuard<'_, T>>) -> Self {
        Self::LockPoisoned
    }
}

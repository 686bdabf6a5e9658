//! Crate-level error type surfaced by the orchestration entry points.

use crate::datasource::CommerceError;
use crate::engine::EditionOverflow;
use crate::store::{LockTimeout, StoreError};
use thiserror::Error;

/// Errors a caller of the ledger write paths can observe.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Edition capacity exceeded. Needs operator resolution; nothing was
    /// committed.
    #[error(transparent)]
    Overflow(#[from] EditionOverflow),

    /// Lock contention. Transient; retry with backoff.
    #[error(transparent)]
    LockTimeout(#[from] LockTimeout),

    /// The store rejected the atomic batch; the whole pass rolled back.
    #[error("persistence conflict: {0}")]
    Conflict(String),

    /// Other store backend failure.
    #[error("store error: {0}")]
    Store(String),

    /// Commerce backend failure while fetching fresh external data.
    #[error("commerce backend error: {0}")]
    Commerce(#[from] CommerceError),
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => LedgerError::Conflict(msg),
            StoreError::Backend(msg) => LedgerError::Store(msg),
        }
    }
}

impl LedgerError {
    /// Whether a retry (with backoff) can reasonably succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            LedgerError::LockTimeout(_) | LedgerError::Conflict(_)
        )
    }
}

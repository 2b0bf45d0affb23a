//! Git protocol error types.

use crate::delta::DeltaError;
use thiserror::Error;

/// Errors that can occur during clone and protocol operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// Transport failure: connection error or non-200 status.
    #[error("transport error: {0}")]
    Transport(String),

    /// Malformed protocol stream.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Invalid pkt-line framing.
    #[error("invalid pkt-line: {0}")]
    InvalidPktLine(String),

    /// Invalid pack file structure.
    #[error("invalid pack file: {0}")]
    InvalidPack(String),

    /// Delta application failure.
    #[error("delta error: {0}")]
    Delta(#[from] DeltaError),

    /// Precondition failure, before any writes.
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// Checkout failure.
    #[error("checkout error: {0}")]
    Checkout(String),

    /// Storage error.
    #[error("storage error: {0}")]
    Storage(#[from] offshoot_storage::StorageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

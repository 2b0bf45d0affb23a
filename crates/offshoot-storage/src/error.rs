//! Storage error types.

use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Object not found in the store.
    #[error("object not found: {0}")]
    ObjectNotFound(String),

    /// Stored object failed header or length validation.
    #[error("corrupt object: {0}")]
    CorruptObject(String),

    /// Invalid object id or object type.
    #[error("invalid object: {0}")]
    InvalidObject(String),

    /// Reference not found.
    #[error("reference not found: {0}")]
    RefNotFound(String),

    /// Invalid reference content.
    #[error("invalid reference: {0}")]
    InvalidRef(String),

    /// Invalid tree payload or tree entry.
    #[error("invalid tree: {0}")]
    InvalidTree(String),

    /// Invalid commit payload.
    #[error("invalid commit: {0}")]
    InvalidCommit(String),

    /// Repository already exists at the target path.
    #[error("repository already exists: {0}")]
    RepoExists(String),

    /// Path is not an Offshoot repository.
    #[error("not a repository: {0}")]
    NotARepository(String),

    /// Compression or decompression failure.
    #[error("compression error: {0}")]
    Compression(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

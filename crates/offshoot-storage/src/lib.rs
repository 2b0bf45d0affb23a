//! # Offshoot Storage
//!
//! Content-addressed object storage for Offshoot repositories.
//!
//! Provides the git object model (blobs, trees, commits, tags), a loose
//! on-disk object store under `.git/objects/`, and file-based reference
//! management under `.git/refs/`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod commit;
mod error;
mod object;
mod refs;
mod repository;
mod store;
mod tree;

pub use commit::Commit;
pub use error::{Result, StorageError};
pub use object::{Object, ObjectId, ObjectKind};
pub use refs::{RefStore, Reference};
pub use repository::Repository;
pub use store::ObjectStore;
pub use tree::{EntryMode, Tree, TreeEntry};

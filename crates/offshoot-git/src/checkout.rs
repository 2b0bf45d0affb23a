//! Working-tree checkout.
//!
//! Walks a commit's root tree recursively, reading trees and blobs out
//! of the object store and writing files under the working directory.
//! Entries whose objects are missing are logged and skipped, so a
//! partial object set yields a partial checkout rather than an abort.

use crate::{GitError, Result};
use offshoot_storage::{
    Commit, EntryMode, ObjectId, ObjectKind, ObjectStore, Repository, StorageError, Tree,
};
use std::path::Path;

/// Materializes a commit's tree into the repository's working directory.
pub fn checkout_commit(repo: &Repository, commit_id: ObjectId) -> Result<()> {
    let commit = repo.objects.read(&commit_id)?;
    if commit.kind != ObjectKind::Commit {
        return Err(GitError::Checkout(format!(
            "object {commit_id} is a {}, not a commit",
            commit.kind
        )));
    }

    let tree_id = Commit::root_tree(&commit.data)?;
    materialize_tree(&repo.objects, &tree_id, repo.work_dir())
}

/// Recursively writes a tree's entries under `dir`.
fn materialize_tree(store: &ObjectStore, tree_id: &ObjectId, dir: &Path) -> Result<()> {
    let tree_obj = match store.read(tree_id) {
        Ok(obj) => obj,
        Err(StorageError::ObjectNotFound(_)) => {
            tracing::warn!(tree = %tree_id, "skipping missing tree");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    if tree_obj.kind != ObjectKind::Tree {
        tracing::warn!(id = %tree_id, kind = %tree_obj.kind, "skipping non-tree object");
        return Ok(());
    }

    let tree = Tree::parse(&tree_obj.data)?;
    for entry in &tree.entries {
        let path = dir.join(&entry.name);
        match entry.mode {
            EntryMode::Directory => {
                std::fs::create_dir_all(&path)?;
                materialize_tree(store, &entry.id, &path)?;
            }
            // Symlinks are written as regular files holding the link
            // target bytes.
            EntryMode::Regular | EntryMode::Executable | EntryMode::Symlink => {
                let blob = match store.read(&entry.id) {
                    Ok(blob) => blob,
                    Err(StorageError::ObjectNotFound(_)) => {
                        tracing::warn!(
                            path = %path.display(),
                            blob = %entry.id,
                            "skipping entry with missing blob"
                        );
                        continue;
                    }
                    Err(e) => return Err(e.into()),
                };
                std::fs::write(&path, &blob.data)?;
                set_file_mode(&path, entry.mode);
            }
        }
    }

    Ok(())
}

#[cfg(unix)]
fn set_file_mode(path: &Path, mode: EntryMode) {
    use std::os::unix::fs::PermissionsExt;

    let perms = std::fs::Permissions::from_mode(mode.unix_permissions());
    if let Err(e) = std::fs::set_permissions(path, perms) {
        tracing::warn!(path = %path.display(), error = %e, "failed to set file mode");
    }
}

#[cfg(not(unix))]
fn set_file_mode(_path: &Path, _mode: EntryMode) {}

//! Repository layout: init and open.

use crate::{ObjectStore, RefStore, Result, StorageError};
use std::path::{Path, PathBuf};

const GIT_DIR: &str = ".git";
const DEFAULT_BRANCH_REF: &str = "refs/heads/main";

/// A local repository: a working directory plus its `.git` layout.
#[derive(Debug, Clone)]
pub struct Repository {
    work_dir: PathBuf,
    git_dir: PathBuf,
    /// Loose object store under `.git/objects/`.
    pub objects: ObjectStore,
    /// Reference store under `.git/`.
    pub refs: RefStore,
}

impl Repository {
    fn from_work_dir(work_dir: PathBuf) -> Self {
        let git_dir = work_dir.join(GIT_DIR);
        Self {
            objects: ObjectStore::new(git_dir.join("objects")),
            refs: RefStore::new(git_dir.clone()),
            work_dir,
            git_dir,
        }
    }

    /// Initializes the repository layout inside `work_dir`.
    ///
    /// Creates `.git/`, `.git/objects/`, `.git/refs/`, and a `HEAD`
    /// pointing at the default branch. HEAD is left untouched when it
    /// already exists, so re-running init on a repository is harmless.
    pub fn init(work_dir: impl Into<PathBuf>) -> Result<Self> {
        let repo = Self::from_work_dir(work_dir.into());

        std::fs::create_dir_all(repo.git_dir.join("objects"))?;
        std::fs::create_dir_all(repo.git_dir.join("refs"))?;

        if !repo.git_dir.join("HEAD").exists() {
            repo.refs.set_symbolic("HEAD", DEFAULT_BRANCH_REF)?;
        }

        Ok(repo)
    }

    /// Opens an existing repository at `work_dir`.
    pub fn open(work_dir: impl Into<PathBuf>) -> Result<Self> {
        let repo = Self::from_work_dir(work_dir.into());
        if !repo.git_dir.is_dir() {
            return Err(StorageError::NotARepository(
                repo.work_dir.display().to_string(),
            ));
        }
        Ok(repo)
    }

    /// Returns the working directory.
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Returns the `.git` directory.
    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_creates_layout() {
        let temp = TempDir::new().unwrap();
        let repo = Repository::init(temp.path()).unwrap();

        assert!(repo.git_dir().join("objects").is_dir());
        assert!(repo.git_dir().join("refs").is_dir());

        let head = std::fs::read_to_string(repo.git_dir().join("HEAD")).unwrap();
        assert_eq!(head, "ref: refs/heads/main\n");
    }

    #[test]
    fn test_reinit_preserves_head() {
        let temp = TempDir::new().unwrap();
        let repo = Repository::init(temp.path()).unwrap();

        let id = crate::ObjectId::from_bytes([5u8; 20]);
        repo.refs.set("HEAD", id).unwrap();

        Repository::init(temp.path()).unwrap();
        assert_eq!(repo.refs.resolve_head().unwrap(), id);
    }

    #[test]
    fn test_open_requires_git_dir() {
        let temp = TempDir::new().unwrap();
        assert!(matches!(
            Repository::open(temp.path()),
            Err(StorageError::NotARepository(_))
        ));

        Repository::init(temp.path()).unwrap();
        assert!(Repository::open(temp.path()).is_ok());
    }

    #[test]
    fn test_store_and_refs_share_layout() {
        let temp = TempDir::new().unwrap();
        let repo = Repository::init(temp.path()).unwrap();

        let id = repo
            .objects
            .write(crate::ObjectKind::Blob, b"content")
            .unwrap();
        repo.refs.set("refs/heads/main", id).unwrap();

        assert_eq!(repo.refs.resolve_head().unwrap(), id);
        assert_eq!(repo.objects.read(&id).unwrap().data.as_ref(), b"content");
    }
}

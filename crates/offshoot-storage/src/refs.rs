//! File-based reference management.
//!
//! Refs are plain files under the repository's `.git` directory:
//! `refs/heads/main` holds a 40-hex identity, `HEAD` holds either an
//! identity or the symbolic form `ref: <name>\n`.

use crate::{ObjectId, Result, StorageError};
use std::path::{Path, PathBuf};

/// A reference: direct (an object id) or symbolic (another ref name).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    /// Direct reference to an object.
    Direct(ObjectId),
    /// Symbolic reference (e.g., HEAD -> refs/heads/main).
    Symbolic(String),
}

impl Reference {
    /// Returns the object id if this is a direct reference.
    pub fn as_direct(&self) -> Option<ObjectId> {
        match self {
            Self::Direct(id) => Some(*id),
            Self::Symbolic(_) => None,
        }
    }

    /// Renders the on-disk file content for this reference.
    pub fn to_file_content(&self) -> String {
        match self {
            Self::Direct(id) => format!("{}\n", id.to_hex()),
            Self::Symbolic(target) => format!("ref: {target}\n"),
        }
    }

    /// Parses on-disk file content into a reference.
    pub fn from_file_content(content: &str) -> Result<Self> {
        let line = content.trim_end_matches('\n');
        if let Some(target) = line.strip_prefix("ref: ") {
            return Ok(Self::Symbolic(target.to_string()));
        }
        let id = ObjectId::from_hex(line)
            .map_err(|_| StorageError::InvalidRef(format!("unparseable ref content: {line}")))?;
        Ok(Self::Direct(id))
    }
}

/// Reference store rooted at a repository's `.git` directory.
#[derive(Debug, Clone)]
pub struct RefStore {
    git_dir: PathBuf,
}

impl RefStore {
    /// Creates a ref store for the given `.git` directory.
    pub fn new(git_dir: impl Into<PathBuf>) -> Self {
        Self {
            git_dir: git_dir.into(),
        }
    }

    fn ref_path(&self, name: &str) -> PathBuf {
        self.git_dir.join(name)
    }

    /// Reads a reference by name (e.g., `HEAD`, `refs/heads/main`).
    pub fn read(&self, name: &str) -> Result<Reference> {
        let path = self.ref_path(name);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::RefNotFound(name.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        Reference::from_file_content(&content)
    }

    /// Writes a reference, creating parent directories as needed.
    pub fn write(&self, name: &str, reference: &Reference) -> Result<()> {
        let path = self.ref_path(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, reference.to_file_content())?;
        Ok(())
    }

    /// Points a branch ref at an object id.
    pub fn set(&self, name: &str, target: ObjectId) -> Result<()> {
        self.write(name, &Reference::Direct(target))
    }

    /// Points a ref at another ref symbolically.
    pub fn set_symbolic(&self, name: &str, target: &str) -> Result<()> {
        self.write(name, &Reference::Symbolic(target.to_string()))
    }

    /// Resolves HEAD to an object id, following one symbolic hop.
    pub fn resolve_head(&self) -> Result<ObjectId> {
        match self.read("HEAD")? {
            Reference::Direct(id) => Ok(id),
            Reference::Symbolic(target) => match self.read(&target)? {
                Reference::Direct(id) => Ok(id),
                Reference::Symbolic(_) => Err(StorageError::InvalidRef(
                    "nested symbolic refs not supported".to_string(),
                )),
            },
        }
    }

    /// Returns the current branch name, if HEAD is symbolic.
    pub fn current_branch(&self) -> Option<String> {
        match self.read("HEAD").ok()? {
            Reference::Symbolic(target) => {
                target.strip_prefix("refs/heads/").map(|s| s.to_string())
            }
            Reference::Direct(_) => None,
        }
    }

    /// Returns the `.git` directory this store is rooted at.
    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }
}

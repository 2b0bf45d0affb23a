//! Commit object payload codec.
//!
//! A commit payload is text: `tree <id>`, zero or more `parent <id>`,
//! `author` and `committer` identity lines, a blank line, then the
//! message.

use crate::{ObjectId, Result, StorageError};

/// A commit's structured fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    /// Root tree identity.
    pub tree: ObjectId,
    /// Parent commit identities.
    pub parents: Vec<ObjectId>,
    /// Author identity line (name, email, timestamp, timezone).
    pub author: String,
    /// Committer identity line.
    pub committer: String,
    /// Commit message.
    pub message: String,
}

impl Commit {
    /// Serializes the commit into its payload form.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = format!("tree {}\n", self.tree);
        for parent in &self.parents {
            out.push_str(&format!("parent {parent}\n"));
        }
        out.push_str(&format!("author {}\n", self.author));
        out.push_str(&format!("committer {}\n", self.committer));
        out.push('\n');
        out.push_str(&self.message);
        out.into_bytes()
    }

    /// Parses a commit payload.
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(payload)
            .map_err(|_| StorageError::InvalidCommit("non-utf8 payload".to_string()))?;

        let (headers, message) = text
            .split_once("\n\n")
            .unwrap_or((text.trim_end_matches('\n'), ""));

        let mut tree = None;
        let mut parents = Vec::new();
        let mut author = String::new();
        let mut committer = String::new();

        for line in headers.lines() {
            if let Some(hex) = line.strip_prefix("tree ") {
                tree = Some(ObjectId::from_hex(hex)?);
            } else if let Some(hex) = line.strip_prefix("parent ") {
                parents.push(ObjectId::from_hex(hex)?);
            } else if let Some(rest) = line.strip_prefix("author ") {
                author = rest.to_string();
            } else if let Some(rest) = line.strip_prefix("committer ") {
                committer = rest.to_string();
            }
        }

        Ok(Self {
            tree: tree
                .ok_or_else(|| StorageError::InvalidCommit("missing tree line".to_string()))?,
            parents,
            author,
            committer,
            message: message.to_string(),
        })
    }

    /// Extracts just the root tree identity from a commit payload.
    pub fn root_tree(payload: &[u8]) -> Result<ObjectId> {
        Self::parse(payload).map(|c| c.tree)
    }
}

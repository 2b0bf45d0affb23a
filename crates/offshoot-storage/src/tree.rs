//! Tree object payload codec.
//!
//! A tree payload is a concatenation of entries, each serialized as
//! `<mode> <name>\0<20 raw identity bytes>`, ordered bytewise by name.

use crate::{ObjectId, Result, StorageError};

/// File mode of a tree entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryMode {
    /// Subtree (`40000`).
    Directory,
    /// Regular file (`100644`).
    Regular,
    /// Executable file (`100755`).
    Executable,
    /// Symbolic link (`120000`), materialized as a regular file.
    Symlink,
}

impl EntryMode {
    /// Returns the ASCII numeric form used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Directory => "40000",
            Self::Regular => "100644",
            Self::Executable => "100755",
            Self::Symlink => "120000",
        }
    }

    /// Parses a mode from its ASCII numeric form.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "40000" => Ok(Self::Directory),
            "100644" => Ok(Self::Regular),
            "100755" => Ok(Self::Executable),
            "120000" => Ok(Self::Symlink),
            _ => Err(StorageError::InvalidTree(format!("unknown mode: {s}"))),
        }
    }

    /// Returns true for subtree entries.
    pub fn is_directory(&self) -> bool {
        matches!(self, Self::Directory)
    }

    /// Returns the unix permission bits used when materializing a file.
    pub fn unix_permissions(&self) -> u32 {
        match self {
            Self::Executable => 0o755,
            _ => 0o644,
        }
    }
}

/// A single tree entry: mode, name, and child identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    /// Entry mode.
    pub mode: EntryMode,
    /// Entry name (no `/`, no NUL).
    pub name: String,
    /// Identity of the child blob or subtree.
    pub id: ObjectId,
}

impl TreeEntry {
    /// Creates a tree entry, validating the name.
    pub fn new(mode: EntryMode, name: impl Into<String>, id: ObjectId) -> Result<Self> {
        let name = name.into();
        if name.is_empty() || name.contains('/') || name.contains('\0') {
            return Err(StorageError::InvalidTree(format!(
                "invalid entry name: {name:?}"
            )));
        }
        Ok(Self { mode, name, id })
    }
}

/// A decoded tree object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tree {
    /// Entries ordered bytewise by name.
    pub entries: Vec<TreeEntry>,
}

impl Tree {
    /// Builds a tree from entries, sorting them bytewise by name.
    pub fn new(mut entries: Vec<TreeEntry>) -> Self {
        entries.sort_by(|a, b| a.name.as_bytes().cmp(b.name.as_bytes()));
        Self { entries }
    }

    /// Parses a tree payload.
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let mut entries = Vec::new();
        let mut pos = 0;

        while pos < payload.len() {
            let nul = payload[pos..]
                .iter()
                .position(|&b| b == 0)
                .ok_or_else(|| StorageError::InvalidTree("truncated entry header".to_string()))?
                + pos;

            let header = std::str::from_utf8(&payload[pos..nul])
                .map_err(|_| StorageError::InvalidTree("non-utf8 entry header".to_string()))?;
            let (mode_str, name) = header
                .split_once(' ')
                .ok_or_else(|| StorageError::InvalidTree(format!("malformed entry: {header}")))?;

            let id_start = nul + 1;
            let id_end = id_start + 20;
            if id_end > payload.len() {
                return Err(StorageError::InvalidTree("truncated entry id".to_string()));
            }
            let mut id_bytes = [0u8; 20];
            id_bytes.copy_from_slice(&payload[id_start..id_end]);

            entries.push(TreeEntry::new(
                EntryMode::parse(mode_str)?,
                name,
                ObjectId::from_bytes(id_bytes),
            )?);
            pos = id_end;
        }

        Ok(Self { entries })
    }

    /// Serializes the tree into its payload form.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for entry in &self.entries {
            out.extend_from_slice(entry.mode.as_str().as_bytes());
            out.push(b' ');
            out.extend_from_slice(entry.name.as_bytes());
            out.push(0);
            out.extend_from_slice(entry.id.as_bytes());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(mode: EntryMode, name: &str, fill: u8) -> TreeEntry {
        TreeEntry::new(mode, name, ObjectId::from_bytes([fill; 20])).unwrap()
    }

    #[test]
    fn test_serialize_parse_roundtrip() {
        let tree = Tree::new(vec![
            entry(EntryMode::Regular, "README", 1),
            entry(EntryMode::Directory, "src", 2),
            entry(EntryMode::Executable, "build.sh", 3),
        ]);

        let parsed = Tree::parse(&tree.to_bytes()).unwrap();
        assert_eq!(parsed, tree);
    }

    #[test]
    fn test_entries_sorted_bytewise() {
        // Insertion order b then a; serialized order must be a then b.
        let tree = Tree::new(vec![
            entry(EntryMode::Regular, "b", 1),
            entry(EntryMode::Regular, "a", 2),
        ]);

        assert_eq!(tree.entries[0].name, "a");
        assert_eq!(tree.entries[1].name, "b");

        let bytes = tree.to_bytes();
        let a_pos = bytes.windows(2).position(|w| w == b" a").unwrap();
        let b_pos = bytes.windows(2).position(|w| w == b" b").unwrap();
        assert!(a_pos < b_pos);
    }

    #[test]
    fn test_entry_name_validation() {
        let id = ObjectId::from_bytes([0u8; 20]);
        assert!(TreeEntry::new(EntryMode::Regular, "ok.txt", id).is_ok());
        assert!(TreeEntry::new(EntryMode::Regular, "a/b", id).is_err());
        assert!(TreeEntry::new(EntryMode::Regular, "a\0b", id).is_err());
        assert!(TreeEntry::new(EntryMode::Regular, "", id).is_err());
    }

    #[test]
    fn test_mode_roundtrip() {
        for mode in [
            EntryMode::Directory,
            EntryMode::Regular,
            EntryMode::Executable,
            EntryMode::Symlink,
        ] {
            assert_eq!(EntryMode::parse(mode.as_str()).unwrap(), mode);
        }
    }

    #[test]
    fn test_mode_parse_invalid() {
        assert!(EntryMode::parse("100600").is_err());
        assert!(EntryMode::parse("").is_err());
    }

    #[test]
    fn test_parse_empty_tree() {
        let tree = Tree::parse(b"").unwrap();
        assert!(tree.entries.is_empty());
    }

    #[test]
    fn test_parse_truncated_id() {
        let mut bytes = b"100644 f\0".to_vec();
        bytes.extend_from_slice(&[1u8; 10]);
        assert!(Tree::parse(&bytes).is_err());
    }

    #[test]
    fn test_parse_missing_nul() {
        assert!(Tree::parse(b"100644 f").is_err());
    }

    #[test]
    fn test_unix_permissions() {
        assert_eq!(EntryMode::Regular.unix_permissions(), 0o644);
        assert_eq!(EntryMode::Executable.unix_permissions(), 0o755);
        assert_eq!(EntryMode::Symlink.unix_permissions(), 0o644);
    }
}

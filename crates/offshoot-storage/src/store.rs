//! Loose on-disk object store.
//!
//! Objects live under `.git/objects/<first-two-hex>/<remaining-38>`, each
//! file holding the zlib-deflated framed form `"<kind> <len>\0" || payload`.
//! Writes are idempotent: an existing file is already correct by
//! construction and is left untouched.

use crate::{Object, ObjectId, ObjectKind, Result, StorageError};
use bytes::Bytes;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Content-addressed object store backed by loose files.
#[derive(Debug, Clone)]
pub struct ObjectStore {
    objects_dir: PathBuf,
}

impl ObjectStore {
    /// Creates a store rooted at a repository's `objects` directory.
    pub fn new(objects_dir: impl Into<PathBuf>) -> Self {
        Self {
            objects_dir: objects_dir.into(),
        }
    }

    /// Returns the on-disk path for an object id.
    fn object_path(&self, id: &ObjectId) -> PathBuf {
        let hex = id.to_hex();
        self.objects_dir.join(&hex[..2]).join(&hex[2..])
    }

    /// Writes an object and returns its identity.
    ///
    /// The write is skipped when the target file already exists. A new
    /// file becomes visible only after its content is complete: the
    /// deflated bytes are written to a temporary sibling and renamed
    /// into place.
    pub fn write(&self, kind: ObjectKind, payload: &[u8]) -> Result<ObjectId> {
        let id = ObjectId::hash_object(kind, payload);
        let path = self.object_path(&id);

        if path.exists() {
            return Ok(id);
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let compressed = Self::deflate(kind, payload)?;
        let tmp_path = path.with_extension("tmp");
        std::fs::write(&tmp_path, &compressed)?;
        std::fs::rename(&tmp_path, &path)?;

        Ok(id)
    }

    /// Writes an [`Object`] and returns its identity.
    pub fn put(&self, object: &Object) -> Result<ObjectId> {
        self.write(object.kind, &object.data)
    }

    /// Reads an object by identity.
    pub fn read(&self, id: &ObjectId) -> Result<Object> {
        let path = self.object_path(id);
        let compressed = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::ObjectNotFound(id.to_hex()));
            }
            Err(e) => return Err(e.into()),
        };
        Self::inflate(&compressed)
    }

    /// Checks whether an object exists in the store.
    pub fn contains(&self, id: &ObjectId) -> bool {
        self.object_path(id).exists()
    }

    /// Deflates the framed form of an object.
    fn deflate(kind: ObjectKind, payload: &[u8]) -> Result<Vec<u8>> {
        let header = format!("{} {}\0", kind.as_str(), payload.len());
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(header.as_bytes())
            .map_err(|e| StorageError::Compression(e.to_string()))?;
        encoder
            .write_all(payload)
            .map_err(|e| StorageError::Compression(e.to_string()))?;
        encoder
            .finish()
            .map_err(|e| StorageError::Compression(e.to_string()))
    }

    /// Inflates a loose object file and validates its header.
    fn inflate(compressed: &[u8]) -> Result<Object> {
        let mut decoder = ZlibDecoder::new(compressed);
        let mut framed = Vec::new();
        decoder
            .read_to_end(&mut framed)
            .map_err(|e| StorageError::Compression(e.to_string()))?;

        // Header is "<kind> <decimal-len>" up to the first NUL.
        let nul = framed
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| StorageError::CorruptObject("missing NUL in header".to_string()))?;

        let header = std::str::from_utf8(&framed[..nul])
            .map_err(|_| StorageError::CorruptObject("non-utf8 header".to_string()))?;
        let (kind_str, len_str) = header
            .split_once(' ')
            .ok_or_else(|| StorageError::CorruptObject(format!("malformed header: {header}")))?;

        let kind = ObjectKind::parse(kind_str)
            .map_err(|_| StorageError::CorruptObject(format!("unknown kind: {kind_str}")))?;
        let declared: usize = len_str
            .parse()
            .map_err(|_| StorageError::CorruptObject(format!("bad length: {len_str}")))?;

        let payload = &framed[nul + 1..];
        if payload.len() != declared {
            return Err(StorageError::CorruptObject(format!(
                "length mismatch: header says {declared}, payload is {}",
                payload.len()
            )));
        }

        Ok(Object::new(kind, Bytes::from(payload.to_vec())))
    }

    /// Returns the root objects directory.
    pub fn objects_dir(&self) -> &Path {
        &self.objects_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, ObjectStore) {
        let temp = TempDir::new().unwrap();
        let store = ObjectStore::new(temp.path().join("objects"));
        (temp, store)
    }

    #[test]
    fn test_write_read_roundtrip() {
        let (_temp, store) = store();
        let id = store.write(ObjectKind::Blob, b"Hello, World!").unwrap();

        let obj = store.read(&id).unwrap();
        assert_eq!(obj.kind, ObjectKind::Blob);
        assert_eq!(obj.data.as_ref(), b"Hello, World!");
        assert_eq!(obj.id, id);
    }

    #[test]
    fn test_write_computes_framed_identity() {
        let (_temp, store) = store();
        let id = store.write(ObjectKind::Blob, b"hello world\n").unwrap();
        assert_eq!(id.to_hex(), "3b18e512dba79e4c8300dd08aeb37f8e728b8dad");
    }

    #[test]
    fn test_loose_layout() {
        let (temp, store) = store();
        let id = store.write(ObjectKind::Blob, b"layout").unwrap();

        let hex = id.to_hex();
        let path = temp.path().join("objects").join(&hex[..2]).join(&hex[2..]);
        assert!(path.is_file());
    }

    #[test]
    fn test_idempotent_write() {
        let (_temp, store) = store();
        let id1 = store.write(ObjectKind::Blob, b"twice").unwrap();
        let first = std::fs::read(store.object_path(&id1)).unwrap();

        let id2 = store.write(ObjectKind::Blob, b"twice").unwrap();
        let second = std::fs::read(store.object_path(&id2)).unwrap();

        assert_eq!(id1, id2);
        assert_eq!(first, second);
    }

    #[test]
    fn test_read_missing_object() {
        let (_temp, store) = store();
        let id = ObjectId::from_bytes([0u8; 20]);
        assert!(matches!(
            store.read(&id),
            Err(StorageError::ObjectNotFound(_))
        ));
    }

    #[test]
    fn test_contains() {
        let (_temp, store) = store();
        let id = store.write(ObjectKind::Tree, b"").unwrap();
        assert!(store.contains(&id));
        assert!(!store.contains(&ObjectId::from_bytes([0xff; 20])));
    }

    #[test]
    fn test_read_rejects_length_mismatch() {
        let (_temp, store) = store();
        // A framed form whose header claims more bytes than the payload has.
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"blob 10\0short").unwrap();
        let compressed = encoder.finish().unwrap();

        let id = ObjectId::from_bytes([0xaa; 20]);
        let path = store.object_path(&id);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, compressed).unwrap();

        assert!(matches!(
            store.read(&id),
            Err(StorageError::CorruptObject(_))
        ));
    }

    #[test]
    fn test_read_rejects_bad_kind() {
        let (_temp, store) = store();
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"blorb 4\0data").unwrap();
        let compressed = encoder.finish().unwrap();

        let id = ObjectId::from_bytes([0xbb; 20]);
        let path = store.object_path(&id);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, compressed).unwrap();

        assert!(matches!(
            store.read(&id),
            Err(StorageError::CorruptObject(_))
        ));
    }

    #[test]
    fn test_read_rejects_missing_nul() {
        let (_temp, store) = store();
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"blob 4 data").unwrap();
        let compressed = encoder.finish().unwrap();

        let id = ObjectId::from_bytes([0xcc; 20]);
        let path = store.object_path(&id);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, compressed).unwrap();

        assert!(matches!(
            store.read(&id),
            Err(StorageError::CorruptObject(_))
        ));
    }

    #[test]
    fn test_all_kinds_roundtrip() {
        let (_temp, store) = store();
        for kind in [
            ObjectKind::Blob,
            ObjectKind::Tree,
            ObjectKind::Commit,
            ObjectKind::Tag,
        ] {
            let id = store.write(kind, b"payload").unwrap();
            assert_eq!(store.read(&id).unwrap().kind, kind);
        }
    }
}

//! Packfile decoding.
//!
//! A pack is `PACK`, a big-endian version, a big-endian object count, N
//! encoded objects, then a SHA-1 trailer over everything before it.
//! Each object is a variable-length type/size header followed by a zlib
//! stream; the streams abut with no length markers, so the decoder
//! advances by exactly the compressed bytes the inflater consumed.
//! See: https://git-scm.com/docs/pack-format

use crate::{apply_delta, GitError, Result};
use flate2::read::ZlibDecoder;
use offshoot_storage::{ObjectId, ObjectKind, ObjectStore, StorageError};
use sha1::{Digest, Sha1};
use std::io::Read;

const PACK_SIGNATURE: &[u8; 4] = b"PACK";
const PACK_VERSION: u32 = 2;
const TRAILER_LEN: usize = 20;
const HEADER_LEN: usize = 12;

const TYPE_OFS_DELTA: u8 = 6;
const TYPE_REF_DELTA: u8 = 7;

/// Outcome of decoding a pack into a store.
#[derive(Debug, Default)]
pub struct DecodeSummary {
    /// Identities newly written, with their kinds, in stream order.
    pub written: Vec<(ObjectId, ObjectKind)>,
    /// Objects skipped (corrupt, missing base, or unsupported).
    pub skipped: usize,
    /// Whether the trailing SHA-1 matched the stream.
    pub checksum_ok: bool,
}

/// Streaming decoder over a complete pack byte sequence.
pub struct PackDecoder<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> PackDecoder<'a> {
    /// Creates a decoder over pack bytes.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Decodes every object into the store and verifies the trailer.
    ///
    /// Per-object failures (corrupt body, missing delta base, offset
    /// delta) are logged and counted but do not abort the decode; a
    /// trailer mismatch is logged as a warning. Structural failures
    /// (truncated header, undecodable zlib, unknown object type) abort.
    pub fn decode(&mut self, store: &ObjectStore) -> Result<DecodeSummary> {
        if self.data.len() < HEADER_LEN + TRAILER_LEN {
            return Err(GitError::InvalidPack(format!(
                "pack too small: {} bytes",
                self.data.len()
            )));
        }

        if &self.data[0..4] != PACK_SIGNATURE {
            tracing::warn!("pack does not start with PACK signature");
        }
        let version = u32::from_be_bytes([self.data[4], self.data[5], self.data[6], self.data[7]]);
        if version != PACK_VERSION {
            tracing::warn!(version, "unexpected pack version");
        }
        let count =
            u32::from_be_bytes([self.data[8], self.data[9], self.data[10], self.data[11]]) as usize;
        self.pos = HEADER_LEN;

        let body_end = self.data.len() - TRAILER_LEN;
        let mut summary = DecodeSummary::default();

        for decoded in 0..count {
            if self.pos >= body_end {
                tracing::warn!(decoded, expected = count, "pack ended early");
                break;
            }
            self.decode_object(store, &mut summary)?;
        }

        let mut hasher = Sha1::new();
        hasher.update(&self.data[..body_end]);
        summary.checksum_ok = hasher.finalize().as_slice() == &self.data[body_end..];
        if !summary.checksum_ok {
            tracing::warn!("pack checksum mismatch");
        }

        Ok(summary)
    }

    /// Decodes one object at the cursor.
    fn decode_object(&mut self, store: &ObjectStore, summary: &mut DecodeSummary) -> Result<()> {
        let (type_code, declared_size) = self.read_object_header()?;

        match type_code {
            TYPE_OFS_DELTA => {
                let offset = self.read_negative_offset()?;
                let _delta = self.inflate()?;
                tracing::warn!(offset, "skipping offset delta (unsupported)");
                summary.skipped += 1;
            }
            TYPE_REF_DELTA => {
                let base_id = self.read_base_id()?;
                let delta = self.inflate()?;
                if delta.len() != declared_size {
                    tracing::warn!(
                        base = %base_id,
                        declared = declared_size,
                        inflated = delta.len(),
                        "skipping delta with size mismatch"
                    );
                    summary.skipped += 1;
                    return Ok(());
                }
                self.resolve_ref_delta(store, base_id, &delta, summary)?;
            }
            code => {
                let Some(kind) = kind_from_code(code) else {
                    return Err(GitError::Protocol(format!(
                        "unknown pack object type: {code}"
                    )));
                };
                let payload = self.inflate()?;
                if payload.len() != declared_size {
                    tracing::warn!(
                        kind = %kind,
                        declared = declared_size,
                        inflated = payload.len(),
                        "skipping object with size mismatch"
                    );
                    summary.skipped += 1;
                    return Ok(());
                }
                let id = store.write(kind, &payload)?;
                summary.written.push((id, kind));
            }
        }

        Ok(())
    }

    /// Rebuilds a ref-delta object against its base in the store.
    ///
    /// A base that follows its delta in the stream is indistinguishable
    /// from an absent one; both are skipped here.
    fn resolve_ref_delta(
        &mut self,
        store: &ObjectStore,
        base_id: ObjectId,
        delta: &[u8],
        summary: &mut DecodeSummary,
    ) -> Result<()> {
        let base = match store.read(&base_id) {
            Ok(base) => base,
            Err(StorageError::ObjectNotFound(_)) => {
                tracing::warn!(base = %base_id, "skipping delta with missing base");
                summary.skipped += 1;
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        match apply_delta(&base.data, delta) {
            Ok(payload) => {
                let id = store.write(base.kind, &payload)?;
                summary.written.push((id, base.kind));
            }
            Err(e) => {
                tracing::warn!(base = %base_id, error = %e, "skipping unappliable delta");
                summary.skipped += 1;
            }
        }

        Ok(())
    }

    fn read_byte(&mut self) -> Result<u8> {
        let byte = *self
            .data
            .get(self.pos)
            .ok_or_else(|| GitError::InvalidPack("unexpected end of pack".to_string()))?;
        self.pos += 1;
        Ok(byte)
    }

    /// Reads the per-object type/size header.
    ///
    /// Byte 0: continuation bit, 3 type bits, 4 low size bits; further
    /// bytes contribute 7 size bits each.
    fn read_object_header(&mut self) -> Result<(u8, usize)> {
        let first = self.read_byte()?;
        let type_code = (first >> 4) & 0x07;
        let mut size = (first & 0x0f) as usize;
        let mut shift = 4u32;
        let mut more = first & 0x80 != 0;

        while more {
            let byte = self.read_byte()?;
            if shift >= usize::BITS {
                return Err(GitError::InvalidPack(
                    "object size varint overflow".to_string(),
                ));
            }
            size |= ((byte & 0x7f) as usize) << shift;
            shift += 7;
            more = byte & 0x80 != 0;
        }

        Ok((type_code, size))
    }

    /// Reads the offset-delta negative-offset encoding.
    ///
    /// Recorded but never resolved; the object is skipped afterwards.
    fn read_negative_offset(&mut self) -> Result<usize> {
        let first = self.read_byte()?;
        let mut value = (first & 0x7f) as usize;
        let mut more = first & 0x80 != 0;

        while more {
            let byte = self.read_byte()?;
            value = value
                .checked_add(1)
                .and_then(|v| v.checked_shl(7))
                .map(|v| v | (byte & 0x7f) as usize)
                .ok_or_else(|| {
                    GitError::InvalidPack("delta offset varint overflow".to_string())
                })?;
            more = byte & 0x80 != 0;
        }

        Ok(value)
    }

    /// Reads the 20-byte base identity of a ref delta.
    fn read_base_id(&mut self) -> Result<ObjectId> {
        let end = self.pos + 20;
        if end > self.data.len() {
            return Err(GitError::InvalidPack(
                "truncated delta base identity".to_string(),
            ));
        }
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&self.data[self.pos..end]);
        self.pos = end;
        Ok(ObjectId::from_bytes(bytes))
    }

    /// Inflates one zlib stream at the cursor and advances past it.
    ///
    /// The cursor moves by exactly the compressed bytes the inflater
    /// consumed, which is what positions it at the next object header.
    fn inflate(&mut self) -> Result<Vec<u8>> {
        let body_end = self.data.len() - TRAILER_LEN;
        let region = &self.data[self.pos.min(body_end)..body_end];

        let mut decoder = ZlibDecoder::new(region);
        let mut inflated = Vec::new();
        decoder
            .read_to_end(&mut inflated)
            .map_err(|e| GitError::InvalidPack(format!("zlib stream: {e}")))?;

        self.pos += decoder.total_in() as usize;
        Ok(inflated)
    }
}

fn kind_from_code(code: u8) -> Option<ObjectKind> {
    match code {
        1 => Some(ObjectKind::Commit),
        2 => Some(ObjectKind::Tree),
        3 => Some(ObjectKind::Blob),
        4 => Some(ObjectKind::Tag),
        _ => None,
    }
}

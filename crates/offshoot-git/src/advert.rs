//! Ref advertisement parsing.
//!
//! The body of `GET <url>/info/refs?service=git-upload-pack` is a
//! pkt-line stream: a service announcement, a flush, then one ref per
//! record. The first ref line carries a NUL-separated capability list;
//! `symref=<name>:<target>` capabilities recover symbolic refs such as
//! HEAD pointing at the default branch.

use crate::{GitError, PktLine, PktLineReader, Result};
use offshoot_storage::{ObjectId, Reference};
use std::collections::BTreeMap;
use std::io::Cursor;

/// Where the remote's HEAD points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadTarget {
    /// HEAD is symbolic: a default branch plus the commit it holds.
    Branch {
        /// Full ref name, e.g. `refs/heads/main`.
        name: String,
        /// Commit identity the branch points at.
        id: ObjectId,
    },
    /// HEAD is a bare commit identity.
    Detached(ObjectId),
}

/// A parsed ref advertisement.
#[derive(Debug, Clone, Default)]
pub struct Advertisement {
    /// Ref name to reference, symrefs included.
    pub refs: BTreeMap<String, Reference>,
}

impl Advertisement {
    /// Parses an advertisement body.
    pub fn parse(body: &[u8]) -> Result<Self> {
        let mut reader = PktLineReader::new(Cursor::new(body));
        let mut refs = BTreeMap::new();
        let mut seen_ref_section = false;

        loop {
            match reader.read()? {
                None => break,
                Some(PktLine::Flush) => {
                    // The flush after the service announcement precedes
                    // the ref section; the one after it ends the stream.
                    if seen_ref_section {
                        break;
                    }
                }
                Some(PktLine::Data(data)) => {
                    if data.starts_with(b"# service=") {
                        continue;
                    }
                    seen_ref_section = true;
                    Self::parse_ref_record(&data, &mut refs);
                }
            }
        }

        Ok(Self { refs })
    }

    /// Parses one ref record, recording the ref and any symref capabilities.
    ///
    /// Malformed records are skipped rather than failing the whole
    /// advertisement.
    fn parse_ref_record(data: &[u8], refs: &mut BTreeMap<String, Reference>) {
        let Ok(text) = std::str::from_utf8(data) else {
            tracing::warn!("skipping non-utf8 ref record");
            return;
        };
        let line = text.trim_end_matches('\n');

        let (ref_part, caps) = match line.split_once('\0') {
            Some((r, c)) => (r, Some(c)),
            None => (line, None),
        };

        if let Some((hex, name)) = ref_part.split_once(' ') {
            match ObjectId::from_hex(hex) {
                // "capabilities^{}" marks an empty repository; it names
                // no real ref.
                Ok(_) if name == "capabilities^{}" => {}
                Ok(id) => {
                    refs.insert(name.to_string(), Reference::Direct(id));
                }
                Err(_) => tracing::warn!(line = %ref_part, "skipping unparseable ref line"),
            }
        }

        if let Some(caps) = caps {
            for cap in caps.split(' ') {
                if let Some(symref) = cap.strip_prefix("symref=") {
                    if let Some((name, target)) = symref.split_once(':') {
                        refs.insert(name.to_string(), Reference::Symbolic(target.to_string()));
                    }
                }
            }
        }
    }

    /// Resolves where HEAD points.
    pub fn head_target(&self) -> Result<HeadTarget> {
        match self.refs.get("HEAD") {
            Some(Reference::Symbolic(name)) => match self.refs.get(name) {
                Some(Reference::Direct(id)) => Ok(HeadTarget::Branch {
                    name: name.clone(),
                    id: *id,
                }),
                _ => Err(GitError::Protocol(format!(
                    "HEAD points at unadvertised ref: {name}"
                ))),
            },
            Some(Reference::Direct(id)) => Ok(HeadTarget::Detached(*id)),
            None => Err(GitError::Protocol(
                "remote did not advertise HEAD".to_string(),
            )),
        }
    }
}

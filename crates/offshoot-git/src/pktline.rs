//! Pkt-line framing.
//!
//! Every record is a 4-hex-ASCII length prefix followed by `length - 4`
//! payload bytes; the length `0000` is a flush with no payload.
//! See: https://git-scm.com/docs/protocol-common

use crate::{GitError, Result};
use std::io::{Read, Write};

/// Largest payload a single pkt-line can carry.
pub const MAX_PKT_PAYLOAD: usize = 0xFFFF - 4;

/// A single pkt-line record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PktLine {
    /// Data record with payload.
    Data(Vec<u8>),
    /// Flush record (`0000`).
    Flush,
}

impl PktLine {
    /// Creates a data record from a string slice.
    pub fn from_string(s: &str) -> Self {
        Self::Data(s.as_bytes().to_vec())
    }

    /// Encodes the record to bytes.
    pub fn encode(&self) -> Result<Vec<u8>> {
        match self {
            Self::Data(data) => {
                if data.len() > MAX_PKT_PAYLOAD {
                    return Err(GitError::InvalidPktLine(format!(
                        "payload too large: {} bytes",
                        data.len()
                    )));
                }
                let mut out = format!("{:04x}", data.len() + 4).into_bytes();
                out.extend_from_slice(data);
                Ok(out)
            }
            Self::Flush => Ok(b"0000".to_vec()),
        }
    }

    /// Returns the payload, or None for flush.
    pub fn data(&self) -> Option<&[u8]> {
        match self {
            Self::Data(data) => Some(data),
            Self::Flush => None,
        }
    }

    /// Returns true if this is a flush record.
    pub fn is_flush(&self) -> bool {
        matches!(self, Self::Flush)
    }
}

/// Streaming pkt-line reader.
pub struct PktLineReader<R> {
    reader: R,
}

impl<R: Read> PktLineReader<R> {
    /// Creates a reader over an underlying byte stream.
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Reads the next record; `None` at end of stream.
    pub fn read(&mut self) -> Result<Option<PktLine>> {
        let mut len_buf = [0u8; 4];
        match self.reader.read_exact(&mut len_buf) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        }

        let len_str = std::str::from_utf8(&len_buf)
            .map_err(|_| GitError::InvalidPktLine("non-ascii length prefix".to_string()))?;
        let len = usize::from_str_radix(len_str, 16)
            .map_err(|_| GitError::InvalidPktLine(format!("bad length prefix: {len_str:?}")))?;

        if len == 0 {
            return Ok(Some(PktLine::Flush));
        }
        if len < 4 {
            return Err(GitError::InvalidPktLine(format!("length {len} too small")));
        }

        let mut data = vec![0u8; len - 4];
        self.reader
            .read_exact(&mut data)
            .map_err(|_| GitError::InvalidPktLine("record shorter than its length".to_string()))?;

        Ok(Some(PktLine::Data(data)))
    }

    /// Reads records until a flush or end of stream.
    pub fn read_until_flush(&mut self) -> Result<Vec<PktLine>> {
        let mut records = Vec::new();
        loop {
            match self.read()? {
                Some(PktLine::Flush) | None => break,
                Some(pkt) => records.push(pkt),
            }
        }
        Ok(records)
    }

    /// Returns a mutable reference to the inner reader.
    pub fn inner_mut(&mut self) -> &mut R {
        &mut self.reader
    }
}

/// Pkt-line writer.
pub struct PktLineWriter<W> {
    writer: W,
}

impl<W: Write> PktLineWriter<W> {
    /// Creates a writer over an underlying byte sink.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Writes a record.
    pub fn write(&mut self, pkt: &PktLine) -> Result<()> {
        self.writer.write_all(&pkt.encode()?)?;
        Ok(())
    }

    /// Writes a data record.
    pub fn write_data(&mut self, data: &[u8]) -> Result<()> {
        self.write(&PktLine::Data(data.to_vec()))
    }

    /// Writes a text record, appending a newline when absent.
    pub fn write_line(&mut self, s: &str) -> Result<()> {
        let mut data = s.as_bytes().to_vec();
        if !s.ends_with('\n') {
            data.push(b'\n');
        }
        self.write(&PktLine::Data(data))
    }

    /// Writes a flush record.
    pub fn flush_pkt(&mut self) -> Result<()> {
        self.write(&PktLine::Flush)
    }

    /// Consumes the writer and returns the inner sink.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

//! Side-band-64k demultiplexing.
//!
//! Each pkt-line payload in an upload-pack response starts with a band
//! byte: 1 is pack data, 2 is human-readable progress, 3 is a fatal
//! remote error. Band-1 payloads concatenate into the pack stream.
//! Remotes that do not speak side-band send the pack unframed; a
//! literal `PACK` at a record or stream boundary is accepted as-is.

use crate::{GitError, PktLine, PktLineReader, Result};
use std::io::Cursor;

const BAND_PACK: u8 = 1;
const BAND_PROGRESS: u8 = 2;
const BAND_ERROR: u8 = 3;

const PACK_SIGNATURE: &[u8] = b"PACK";

/// Splits an upload-pack response body into the raw pack stream.
///
/// Progress messages are logged; band-3 messages terminate the stream
/// and are carried in the returned error when no pack was received.
pub fn demux(body: &[u8]) -> Result<Vec<u8>> {
    let mut reader = PktLineReader::new(Cursor::new(body));
    let mut pack = Vec::new();
    let mut remote_errors = Vec::new();

    loop {
        // Unframed pack data: everything from here on is raw.
        let pos = reader.inner_mut().position() as usize;
        if body[pos..].starts_with(PACK_SIGNATURE) {
            pack.extend_from_slice(&body[pos..]);
            break;
        }

        match reader.read()? {
            None => break,
            Some(PktLine::Flush) => {
                if !pack.is_empty() {
                    break;
                }
            }
            Some(PktLine::Data(data)) => match data.split_first() {
                Some((&BAND_PACK, rest)) => pack.extend_from_slice(rest),
                Some((&BAND_PROGRESS, rest)) => {
                    let msg = String::from_utf8_lossy(rest);
                    tracing::info!(remote = %msg.trim_end(), "remote progress");
                }
                Some((&BAND_ERROR, rest)) => {
                    let msg = String::from_utf8_lossy(rest).trim_end().to_string();
                    tracing::warn!(remote = %msg, "remote error");
                    remote_errors.push(msg);
                    break;
                }
                _ => {
                    if data.starts_with(PACK_SIGNATURE) {
                        // A whole unframed pack inside one record.
                        pack.extend_from_slice(&data);
                    } else {
                        // NAK/ACK negotiation chatter precedes the pack.
                        tracing::debug!(
                            line = %String::from_utf8_lossy(&data).trim_end(),
                            "negotiation record"
                        );
                    }
                }
            },
        }
    }

    if !pack.starts_with(PACK_SIGNATURE) {
        let detail = if remote_errors.is_empty() {
            "remote sent no pack data".to_string()
        } else {
            format!("remote sent no pack data: {}", remote_errors.join("; "))
        };
        return Err(GitError::Protocol(detail));
    }

    Ok(pack)
}

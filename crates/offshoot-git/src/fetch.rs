//! Fetch request construction.
//!
//! A clone negotiates nothing: the request body lists wants, a flush,
//! and `done`. The first want line carries the capability set the
//! client speaks.

use crate::{GitError, PktLineWriter, Result};
use offshoot_storage::ObjectId;

/// Capabilities declared on the first want line.
///
/// `ofs-delta` is declared even though offset deltas are skipped during
/// decode: remotes commonly emit them regardless, and the decoder's
/// skip policy covers the gap.
const FETCH_CAPABILITIES: &str = "multi_ack_detailed side-band-64k thin-pack ofs-delta";

/// Builds an upload-pack request body for the wanted identities.
pub fn build_fetch_request(wants: &[ObjectId], agent: &str) -> Result<Vec<u8>> {
    let first = wants
        .first()
        .ok_or_else(|| GitError::Precondition("no wants for fetch request".to_string()))?;

    let mut writer = PktLineWriter::new(Vec::new());
    writer.write_line(&format!(
        "want {first} {FETCH_CAPABILITIES} agent={agent}"
    ))?;
    for want in &wants[1..] {
        writer.write_line(&format!("want {want}"))?;
    }
    writer.flush_pkt()?;
    writer.write_line("done")?;
    writer.flush_pkt()?;

    Ok(writer.into_inner())
}

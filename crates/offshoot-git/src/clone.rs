//! Clone orchestration.
//!
//! Composes ref discovery, fetch negotiation, side-band demultiplexing,
//! pack decoding, and checkout. Ordering within a clone: every pack
//! object is stored before any ref is written, the branch ref is
//! written before HEAD points at it, and checkout runs last.

use crate::{
    build_fetch_request, checkout_commit, demux, Advertisement, GitError, HeadTarget,
    HttpTransport, PackDecoder, Result, Transport, USER_AGENT,
};
use offshoot_storage::Repository;
use std::path::{Path, PathBuf};

/// Derives a checkout directory name from a repository URL.
///
/// The last path segment, minus a trailing `.git`.
pub fn target_dir_from_url(url: &str) -> Result<String> {
    let trimmed = url.trim_end_matches('/');
    let last = trimmed.rsplit('/').next().unwrap_or_default();
    let name = last.strip_suffix(".git").unwrap_or(last);
    if name.is_empty() {
        return Err(GitError::Precondition(format!(
            "cannot derive a directory name from url: {url}"
        )));
    }
    Ok(name.to_string())
}

/// Clones a remote repository over HTTP.
///
/// Returns the checkout directory.
pub fn clone(url: &str, target: Option<&Path>) -> Result<PathBuf> {
    let transport = HttpTransport::new(url)?;
    clone_with(&transport, url, target)
}

/// Clones through an arbitrary transport.
pub fn clone_with(transport: &dyn Transport, url: &str, target: Option<&Path>) -> Result<PathBuf> {
    let target = match target {
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(target_dir_from_url(url)?),
    };
    if target.exists() {
        return Err(GitError::Precondition(format!(
            "target directory already exists: {}",
            target.display()
        )));
    }

    tracing::info!(url = %url, target = %target.display(), "cloning");
    std::fs::create_dir_all(&target)?;
    let repo = Repository::init(&target)?;

    let advertisement = Advertisement::parse(&transport.info_refs()?)?;
    let head = advertisement.head_target()?;
    let (branch, commit_id) = match &head {
        HeadTarget::Branch { name, id } => (Some(name.clone()), *id),
        HeadTarget::Detached(id) => (None, *id),
    };
    tracing::debug!(commit = %commit_id, branch = ?branch, "resolved remote HEAD");

    let request = build_fetch_request(&[commit_id], USER_AGENT)?;
    let response = transport.upload_pack(request)?;
    let pack = demux(&response)?;

    let summary = PackDecoder::new(&pack).decode(&repo.objects)?;
    tracing::info!(
        objects = summary.written.len(),
        skipped = summary.skipped,
        "pack decoded"
    );

    match &branch {
        Some(name) => {
            repo.refs.set(name, commit_id)?;
            repo.refs.set_symbolic("HEAD", name)?;
        }
        None => repo.refs.set("HEAD", commit_id)?,
    }

    checkout_commit(&repo, commit_id)?;

    Ok(target)
}

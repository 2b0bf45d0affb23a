//! HTTP smart transport.
//!
//! Two exchanges: `GET <url>/info/refs?service=git-upload-pack` for ref
//! discovery and `POST <url>/git-upload-pack` for the pack itself. The
//! clone pipeline is synchronous, so the blocking client is used.

use crate::{GitError, Result};
use std::time::Duration;

/// User agent sent on every request.
pub const USER_AGENT: &str = concat!("offshoot/", env!("CARGO_PKG_VERSION"));

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// The two smart-HTTP exchanges a clone performs.
///
/// Abstracted so the clone pipeline can run against a fixture remote in
/// tests.
pub trait Transport {
    /// Fetches the ref advertisement body.
    fn info_refs(&self) -> Result<Vec<u8>>;

    /// Posts a fetch request and returns the response body.
    fn upload_pack(&self, body: Vec<u8>) -> Result<Vec<u8>>;
}

/// Transport over plain HTTP.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HttpTransport {
    /// Creates a transport for a repository URL.
    pub fn new(url: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| GitError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: url.trim_end_matches('/').to_string(),
        })
    }

    /// Returns the repository URL this transport talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Transport for HttpTransport {
    fn info_refs(&self) -> Result<Vec<u8>> {
        let url = format!("{}/info/refs?service=git-upload-pack", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| GitError::Transport(e.to_string()))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(GitError::Transport(format!(
                "ref discovery failed with status {status}"
            )));
        }

        let body = response
            .bytes()
            .map_err(|e| GitError::Transport(e.to_string()))?;
        Ok(body.to_vec())
    }

    fn upload_pack(&self, body: Vec<u8>) -> Result<Vec<u8>> {
        let url = format!("{}/git-upload-pack", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/x-git-upload-pack-request")
            .header("Accept", "application/x-git-upload-pack-result")
            .body(body)
            .send()
            .map_err(|e| GitError::Transport(e.to_string()))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(GitError::Transport(format!(
                "upload-pack failed with status {status}"
            )));
        }

        let body = response
            .bytes()
            .map_err(|e| GitError::Transport(e.to_string()))?;
        Ok(body.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let transport = HttpTransport::new("http://example.com/repo.git/").unwrap();
        assert_eq!(transport.base_url(), "http://example.com/repo.git");
    }

    #[test]
    fn test_connection_refused_is_transport_error() {
        // Port 9 (discard) is not listening on loopback in test envs.
        let transport = HttpTransport::new("http://127.0.0.1:9/repo.git").unwrap();
        assert!(matches!(
            transport.info_refs(),
            Err(GitError::Transport(_))
        ));
    }
}

//! # Offshoot Git
//!
//! Client side of the git smart HTTP protocol: ref discovery, fetch
//! negotiation, side-band demultiplexing, packfile decoding with delta
//! reconstruction, and working-tree checkout.
//!
//! See: https://git-scm.com/docs/http-protocol

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod advert;
mod checkout;
mod clone;
mod delta;
mod error;
mod fetch;
mod http;
mod pack;
mod pktline;
mod sideband;

pub use advert::{Advertisement, HeadTarget};
pub use checkout::checkout_commit;
pub use clone::{clone, clone_with, target_dir_from_url};
pub use delta::{apply_delta, DeltaError};
pub use error::GitError;
pub use fetch::build_fetch_request;
pub use http::{HttpTransport, Transport, USER_AGENT};
pub use pack::{DecodeSummary, PackDecoder};
pub use pktline::{PktLine, PktLineReader, PktLineWriter, MAX_PKT_PAYLOAD};
pub use sideband::demux;

/// Result type for git protocol operations.
pub type Result<T> = std::result::Result<T, GitError>;

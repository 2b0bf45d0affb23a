//! Fuzz target for packfile decoding.
//!
//! Tests that the pack decoder handles arbitrary input without panicking.

#![no_main]

use libfuzzer_sys::fuzz_target;
use offshoot_storage::ObjectStore;
use std::sync::OnceLock;
use tempfile::TempDir;

static SCRATCH: OnceLock<TempDir> = OnceLock::new();

fuzz_target!(|data: &[u8]| {
    let scratch = SCRATCH.get_or_init(|| TempDir::new().unwrap());
    let store = ObjectStore::new(scratch.path().join("objects"));

    let _ = offshoot_git::PackDecoder::new(data).decode(&store);
});

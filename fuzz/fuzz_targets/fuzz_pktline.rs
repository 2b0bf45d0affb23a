//! Fuzz target for pkt-line parsing.
//!
//! Tests that the pkt-line reader handles arbitrary input without panicking.

#![no_main]

use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

fuzz_target!(|data: &[u8]| {
    let mut reader = offshoot_git::PktLineReader::new(Cursor::new(data));

    // Read up to 100 records (prevent long loops on crafted input)
    for _ in 0..100 {
        match reader.read() {
            Ok(Some(_)) => continue,
            Ok(None) => break,
            Err(_) => break, // Error is expected for malformed input
        }
    }
});

//! Fuzz target for delta application.
//!
//! Splits the input into a base and a delta and checks that apply_delta
//! never panics or writes out of bounds.

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    let split = (data[0] as usize) % data.len();
    let (base, delta) = data.split_at(split);

    let _ = offshoot_git::apply_delta(base, delta);
});

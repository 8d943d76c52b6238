//! Fuzz target for query repair.
//!
//! This fuzzer tests that repair:
//! 1. Never panics on any input, including broken literals and unbalanced parens
//! 2. Is idempotent: repairing a repaired query changes nothing

#![no_main]

use daxbridge::repair;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Only process reasonable-sized inputs
    if data.len() > 10_000 {
        return;
    }

    if let Ok(raw) = std::str::from_utf8(data) {
        let once = repair(raw);
        let twice = repair(once.as_str());
        assert_eq!(once, twice, "repair is not idempotent for {:?}", raw);
    }
});

//! Fuzz target for model reply parsing and engine error classification.
//!
//! This fuzzer tests that:
//! 1. Reply parsing never panics on malformed JSON or fences
//! 2. Error classification never panics on arbitrary messages

#![no_main]

use daxbridge::{EngineErrorKind, QueryCandidate};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10_000 {
        return;
    }

    if let Ok(reply) = std::str::from_utf8(data) {
        let candidate = QueryCandidate::from_reply(reply);
        let _ = daxbridge::repair(&candidate.text);
        let _ = EngineErrorKind::classify(reply);
    }
});

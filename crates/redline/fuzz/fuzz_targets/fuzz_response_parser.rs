//! Fuzz target for the response parser.
//!
//! Generated text is untrusted. The parser must:
//! 1. Never panic on any input, at any tier
//! 2. Only report the two fixed confidence levels
//! 3. Accept in strict mode only what the lenient parser also labels

#![no_main]

use libfuzzer_sys::fuzz_target;
use redline::IntelligenceTier;
use redline::llm::{ResponseFormat, ResponseParser};

fuzz_target!(|data: &[u8]| {
    if data.len() > 64_000 {
        return;
    }
    let Ok(raw) = std::str::from_utf8(data) else {
        return;
    };

    let parser = ResponseParser::new();
    for tier in IntelligenceTier::ALL {
        let parsed = parser.parse(raw, tier, "The report was written by the team.");
        assert!(parsed.suggestion.confidence == 0.8 || parsed.suggestion.confidence == 0.1);

        if parser.parse_strict(raw, tier).is_ok() {
            assert_eq!(parsed.format, ResponseFormat::Labeled);
        }
    }
});

//! Fuzz target for knowledge base loading.
//!
//! Malformed knowledge files must produce an error, never a panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use redline::KnowledgeBase;

fuzz_target!(|data: &[u8]| {
    if data.len() > 100_000 {
        return;
    }

    if let Ok(json) = std::str::from_utf8(data) {
        if let Ok(knowledge) = KnowledgeBase::from_json(json) {
            for entry in knowledge.entries() {
                let _ = knowledge.get(&entry.issue_type);
            }
        }
    }
});

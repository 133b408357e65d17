//! Fuzz target for the rule-based fallback rewriter.
//!
//! The fallback is the last resort, so it must always return text that
//! differs from the input sentence, whatever the sentence or issue type.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use redline::{FallbackRewriter, FlaggedIssue};

#[derive(Arbitrary, Debug)]
struct Input<'a> {
    sentence: &'a str,
    issue_type: &'a str,
}

fuzz_target!(|input: Input<'_>| {
    if input.sentence.len() > 10_000 {
        return;
    }

    let issue = FlaggedIssue::new(input.sentence, input.issue_type);
    let rewritten = FallbackRewriter::rewrite(&issue);

    assert_ne!(rewritten.trim(), input.sentence.trim());
});

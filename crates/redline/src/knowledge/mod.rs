//! Static per-issue-type guidance used to ground prompts.
//!
//! The knowledge base is loaded once at startup, validated, and shared
//! read-only for the lifetime of the process.

mod base;
mod entry;

pub use base::KnowledgeBase;
pub use entry::{KnowledgeEntry, RewriteExample};

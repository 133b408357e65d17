//! CLI command implementations.

pub mod cache;
pub mod classify;
pub mod kb;
pub mod prompt;
pub mod suggest;

use std::path::Path;

use redline::KnowledgeBase;

/// Load a knowledge base file, or the built-in one.
pub(crate) fn load_knowledge_base(path: Option<&Path>) -> redline::Result<KnowledgeBase> {
    match path {
        Some(path) => KnowledgeBase::load(path),
        None => KnowledgeBase::builtin(),
    }
}

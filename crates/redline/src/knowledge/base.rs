//! Knowledge base loading and lookup.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{RedlineError, Result};
use crate::issue::IssueType;
use crate::routing::IntelligenceTier;

use super::entry::KnowledgeEntry;

/// Knowledge base shipped with the library.
const BUILTIN_KNOWLEDGE_BASE: &str = include_str!("../../data/knowledge_base.json");

/// One record in the knowledge base data file.
#[derive(Debug, Deserialize)]
struct KnowledgeRecord {
    issue: String,
    suggestion: String,
    #[serde(default)]
    rag_context: String,
    #[serde(default)]
    complexity: Option<IntelligenceTier>,
}

/// The versioned wrapper layout. Records stay raw so each one can be
/// reported by index.
#[derive(Debug, Deserialize)]
struct VersionedFile {
    #[serde(default)]
    version: Option<FileVersion>,
    entries: Vec<Value>,
}

/// `"2024.11"` and `3` are both accepted as versions.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FileVersion {
    Text(String),
    Number(serde_json::Number),
}

impl FileVersion {
    fn into_string(self) -> String {
        match self {
            FileVersion::Text(text) => text,
            FileVersion::Number(number) => number.to_string(),
        }
    }
}

/// Read-only issue-type → guidance map.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    version: Option<String>,
    entries: IndexMap<IssueType, KnowledgeEntry>,
}

impl KnowledgeBase {
    /// Create an empty knowledge base.
    pub fn new() -> Self {
        Self::default()
    }

    /// The knowledge base embedded in the library.
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_KNOWLEDGE_BASE)
    }

    /// Load and validate a knowledge base file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| RedlineError::io(path, e))?;
        let kb = Self::from_json(&content)?;

        info!(
            path = %path.display(),
            entries = kb.len(),
            version = kb.version.as_deref().unwrap_or("unversioned"),
            "loaded knowledge base"
        );

        Ok(kb)
    }

    /// Parse and validate knowledge base JSON.
    ///
    /// The file is a bare record array or a `{version, entries}` object.
    /// Any malformed record fails the whole load with its index: a missing
    /// or mistyped field, an unknown complexity, an empty issue or
    /// suggestion, or an issue type that appears twice.
    pub fn from_json(json: &str) -> Result<Self> {
        let (version, records) = match serde_json::from_str::<Value>(json)? {
            Value::Object(map) => {
                let file: VersionedFile = serde_json::from_value(Value::Object(map))?;
                (file.version.map(FileVersion::into_string), file.entries)
            }
            other => (None, serde_json::from_value::<Vec<Value>>(other)?),
        };

        let mut kb = Self {
            version,
            entries: IndexMap::with_capacity(records.len()),
        };

        for (index, value) in records.into_iter().enumerate() {
            let record: KnowledgeRecord =
                serde_json::from_value(value).map_err(|e| RedlineError::KnowledgeBase {
                    index,
                    message: e.to_string(),
                })?;
            let entry = validate_record(index, record)?;
            if kb.entries.contains_key(&entry.issue_type) {
                return Err(RedlineError::KnowledgeBase {
                    index,
                    message: format!("duplicate issue type '{}'", entry.issue_type),
                });
            }
            debug!(
                issue_type = %entry.issue_type,
                examples = entry.examples.len(),
                "knowledge entry"
            );
            kb.entries.insert(entry.issue_type.clone(), entry);
        }

        Ok(kb)
    }

    /// Add or replace an entry.
    pub fn insert(&mut self, entry: KnowledgeEntry) {
        self.entries.insert(entry.issue_type.clone(), entry);
    }

    /// Look up the entry for an issue type.
    pub fn get(&self, issue_type: &IssueType) -> Option<&KnowledgeEntry> {
        self.entries.get(issue_type)
    }

    /// Data file version, if the file declared one.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Entries in file order.
    pub fn entries(&self) -> impl Iterator<Item = &KnowledgeEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn validate_record(index: usize, record: KnowledgeRecord) -> Result<KnowledgeEntry> {
    let issue = record.issue.trim();
    if issue.is_empty() {
        return Err(RedlineError::KnowledgeBase {
            index,
            message: "empty issue type".to_string(),
        });
    }

    let guidance = record.suggestion.trim();
    if guidance.is_empty() {
        return Err(RedlineError::KnowledgeBase {
            index,
            message: format!("issue '{}' has no suggestion text", issue),
        });
    }

    let entry = KnowledgeEntry::new(issue, guidance, record.rag_context.trim())
        .with_declared_complexity(record.complexity.unwrap_or(IntelligenceTier::Standard));

    Ok(entry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_knowledge_base_loads() {
        let kb = KnowledgeBase::builtin().unwrap();

        assert!(kb.version().is_some());
        assert!(kb.len() >= 10);

        let passive = kb.get(&IssueType::new("Passive Voice")).unwrap();
        assert!(!passive.guidance.is_empty());
        assert!(!passive.examples.is_empty());
    }

    #[test]
    fn test_bare_array_layout() {
        let json = r#"[
            {"issue": "Wordiness", "suggestion": "Cut filler.", "rag_context": "\"in order to\" → \"to\"", "complexity": "fast"},
            {"issue": "Jargon", "suggestion": "Use plain words."}
        ]"#;

        let kb = KnowledgeBase::from_json(json).unwrap();

        assert_eq!(kb.len(), 2);
        assert!(kb.version().is_none());
        let wordiness = kb.get(&IssueType::new("wordiness")).unwrap();
        assert_eq!(wordiness.declared_complexity, IntelligenceTier::Fast);
        assert_eq!(wordiness.examples[0].after, "to");
        assert_eq!(
            kb.get(&IssueType::new("jargon")).unwrap().declared_complexity,
            IntelligenceTier::Standard
        );
    }

    #[test]
    fn test_rejects_empty_suggestion() {
        let json = r#"[{"issue": "Jargon", "suggestion": "  "}]"#;

        match KnowledgeBase::from_json(json) {
            Err(RedlineError::KnowledgeBase { index, .. }) => assert_eq!(index, 0),
            other => panic!("expected knowledge base error, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_duplicate_issue_types() {
        let json = r#"[
            {"issue": "passive_voice", "suggestion": "a"},
            {"issue": "Passive Voice", "suggestion": "b"}
        ]"#;

        match KnowledgeBase::from_json(json) {
            Err(RedlineError::KnowledgeBase { index, message }) => {
                assert_eq!(index, 1);
                assert!(message.contains("duplicate"));
            }
            other => panic!("expected knowledge base error, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_unknown_complexity() {
        let json = r#"[
            {"issue": "a", "suggestion": "b"},
            {"issue": "x", "suggestion": "y", "complexity": "extreme"}
        ]"#;

        match KnowledgeBase::from_json(json) {
            Err(RedlineError::KnowledgeBase { index, message }) => {
                assert_eq!(index, 1);
                assert!(message.contains("extreme"));
            }
            other => panic!("expected knowledge base error, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_record_reports_index() {
        let versioned = r#"{"version": "1", "entries": [
            {"issue": "a", "suggestion": "b"},
            {"issue": "c", "suggestion": "d"},
            {"issue": "e"}
        ]}"#;
        match KnowledgeBase::from_json(versioned) {
            Err(RedlineError::KnowledgeBase { index, message }) => {
                assert_eq!(index, 2);
                assert!(message.contains("suggestion"));
            }
            other => panic!("expected knowledge base error, got {:?}", other),
        }

        let mistyped = r#"[{"issue": 7, "suggestion": "b"}]"#;
        assert!(matches!(
            KnowledgeBase::from_json(mistyped),
            Err(RedlineError::KnowledgeBase { index: 0, .. })
        ));
    }

    #[test]
    fn test_numeric_version() {
        let json = r#"{"version": 1, "entries": [{"issue": "a", "suggestion": "b"}]}"#;

        let kb = KnowledgeBase::from_json(json).unwrap();

        assert_eq!(kb.version(), Some("1"));
        assert_eq!(kb.len(), 1);
    }

    #[test]
    fn test_rejects_non_collection_file() {
        assert!(matches!(
            KnowledgeBase::from_json(r#""just a string""#),
            Err(RedlineError::Json(_))
        ));
        assert!(matches!(
            KnowledgeBase::from_json(r#"{"version": "1"}"#),
            Err(RedlineError::Json(_))
        ));
    }
}

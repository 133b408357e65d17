//! Cache file format and atomic writes.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{RedlineError, Result};
use crate::suggestion::ParsedSuggestion;

use super::key::CacheKey;

/// Current on-disk format version.
pub const CACHE_FORMAT_VERSION: u32 = 1;

/// A cached suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub suggestion: ParsedSuggestion,
    pub cached_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(suggestion: ParsedSuggestion) -> Self {
        Self {
            suggestion,
            cached_at: Utc::now(),
        }
    }
}

/// On-disk layout: `{version, entries: {key: entry}}`, oldest first.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct CacheFile {
    pub version: u32,
    #[serde(default)]
    pub entries: IndexMap<CacheKey, CacheEntry>,
}

/// Read a cache file. A missing file is an empty cache.
pub(crate) fn load(path: &Path) -> Result<IndexMap<CacheKey, CacheEntry>> {
    if !path.exists() {
        return Ok(IndexMap::new());
    }

    let file = File::open(path).map_err(|e| {
        RedlineError::Persistence(format!("Failed to open cache '{}': {}", path.display(), e))
    })?;

    let cache: CacheFile = serde_json::from_reader(BufReader::new(file)).map_err(|e| {
        RedlineError::Persistence(format!("Failed to parse cache '{}': {}", path.display(), e))
    })?;

    if cache.version != CACHE_FORMAT_VERSION {
        return Err(RedlineError::Persistence(format!(
            "Unsupported cache version {} in '{}'",
            cache.version,
            path.display()
        )));
    }

    Ok(cache.entries)
}

/// Serialize all entries and write them atomically.
pub(crate) fn save(path: &Path, entries: &IndexMap<CacheKey, CacheEntry>) -> Result<()> {
    #[derive(Serialize)]
    struct CacheFileRef<'a> {
        version: u32,
        entries: &'a IndexMap<CacheKey, CacheEntry>,
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| {
                RedlineError::Persistence(format!(
                    "Failed to create directory '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    let json = serde_json::to_string_pretty(&CacheFileRef {
        version: CACHE_FORMAT_VERSION,
        entries,
    })
    .map_err(|e| RedlineError::Persistence(format!("Failed to serialize cache: {}", e)))?;

    write_atomic(path, &json)
}

/// Write to a sibling temp file, then rename over the target.
fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, content).map_err(|e| {
        RedlineError::Persistence(format!("Failed to write '{}': {}", tmp_path.display(), e))
    })?;

    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(RedlineError::Persistence(format!(
            "Failed to replace '{}': {}",
            path.display(),
            e
        )));
    }
    Ok(())
}

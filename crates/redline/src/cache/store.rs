//! Result cache with batched persistence.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::suggestion::ParsedSuggestion;

use super::key::CacheKey;
use super::persistence::{self, CacheEntry};

/// Cache settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Backing file; `None` keeps the cache in memory.
    pub path: Option<PathBuf>,
    /// Persist after this many insertions.
    pub flush_every: usize,
    /// Oldest entries beyond this count are dropped.
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: None,
            flush_every: 10,
            max_entries: 1000,
        }
    }
}

/// Hit/miss counters and size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub pending_writes: usize,
    pub persistent: bool,
}

impl CacheStats {
    /// Fraction of lookups that hit (0.0 with no lookups).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct CacheState {
    entries: IndexMap<CacheKey, CacheEntry>,
    pending_writes: usize,
    /// Cleared after an IO failure; the session continues in memory.
    persistence_enabled: bool,
    hits: u64,
    misses: u64,
}

/// Suggestion cache keyed by [`CacheKey`].
///
/// Entries are kept in insertion order; re-inserting a key moves it to the
/// end. Writes are persisted every `flush_every` insertions, on
/// [`flush`](Self::flush) and on drop.
pub struct ResultCache {
    config: CacheConfig,
    state: Mutex<CacheState>,
}

impl ResultCache {
    /// Create a cache with no backing file.
    pub fn in_memory() -> Self {
        Self::with_entries(CacheConfig::default(), IndexMap::new(), false)
    }

    /// Open a cache backed by `path`.
    ///
    /// Never fails: an unreadable file is logged and the cache runs in
    /// memory for the rest of the session.
    pub fn open(path: impl AsRef<Path>, config: CacheConfig) -> Self {
        let path = path.as_ref().to_path_buf();
        let config = CacheConfig {
            path: Some(path.clone()),
            ..config
        };

        match persistence::load(&path) {
            Ok(entries) => {
                info!(path = %path.display(), entries = entries.len(), "loaded result cache");
                Self::with_entries(config, entries, true)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cache IO failure, continuing in memory");
                Self::with_entries(config, IndexMap::new(), false)
            }
        }
    }

    /// Build from config: in memory when `config.path` is unset.
    pub fn from_config(config: &CacheConfig) -> Self {
        match &config.path {
            Some(path) => Self::open(path, config.clone()),
            None => Self::with_entries(config.clone(), IndexMap::new(), false),
        }
    }

    fn with_entries(config: CacheConfig, entries: IndexMap<CacheKey, CacheEntry>, persistent: bool) -> Self {
        let mut state = CacheState {
            entries,
            pending_writes: 0,
            persistence_enabled: persistent,
            hits: 0,
            misses: 0,
        };
        truncate(&mut state.entries, config.max_entries);

        Self {
            config,
            state: Mutex::new(state),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn path(&self) -> Option<&Path> {
        self.config.path.as_deref()
    }

    /// Look up a cached suggestion.
    pub fn get(&self, key: &CacheKey) -> Option<ParsedSuggestion> {
        let mut state = self.lock();
        match state.entries.get(key).map(|e| e.suggestion.clone()) {
            Some(hit) => {
                state.hits += 1;
                Some(hit)
            }
            None => {
                state.misses += 1;
                None
            }
        }
    }

    /// Store a suggestion. Last write wins.
    pub fn put(&self, key: CacheKey, suggestion: ParsedSuggestion) {
        let mut state = self.lock();
        state.entries.shift_remove(&key);
        state.entries.insert(key, CacheEntry::new(suggestion));
        truncate(&mut state.entries, self.config.max_entries);
        state.pending_writes += 1;

        if state.pending_writes >= self.config.flush_every.max(1) {
            self.persist(&mut state);
        }
    }

    /// Persist pending writes now.
    pub fn flush(&self) {
        let mut state = self.lock();
        if state.pending_writes > 0 {
            self.persist(&mut state);
        }
    }

    /// Remove every entry, including the persisted copy.
    pub fn clear(&self) -> Result<()> {
        let mut state = self.lock();
        state.entries.clear();
        state.pending_writes = 0;

        if let (Some(path), true) = (&self.config.path, state.persistence_enabled) {
            persistence::save(path, &state.entries)?;
            info!(path = %path.display(), "cleared result cache");
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.lock();
        CacheStats {
            entries: state.entries.len(),
            hits: state.hits,
            misses: state.misses,
            pending_writes: state.pending_writes,
            persistent: state.persistence_enabled,
        }
    }

    /// Write the whole map while holding the lock.
    fn persist(&self, state: &mut CacheState) {
        let Some(path) = &self.config.path else {
            state.pending_writes = 0;
            return;
        };
        if !state.persistence_enabled {
            state.pending_writes = 0;
            return;
        }

        match persistence::save(path, &state.entries) {
            Ok(()) => {
                debug!(path = %path.display(), entries = state.entries.len(), "flushed result cache");
                state.pending_writes = 0;
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cache IO failure, continuing in memory");
                state.persistence_enabled = false;
                state.pending_writes = 0;
            }
        }
    }
}

impl Drop for ResultCache {
    fn drop(&mut self) {
        self.flush();
    }
}

fn truncate(entries: &mut IndexMap<CacheKey, CacheEntry>, max_entries: usize) {
    while entries.len() > max_entries {
        entries.shift_remove_index(0);
    }
}

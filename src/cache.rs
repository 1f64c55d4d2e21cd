//! Fix response cache keyed by error fingerprint.
//!
//! Pure key-value semantics with a bounded capacity (oldest entry evicted
//! first) and optional JSON file backing. Nothing is written to disk unless a
//! cache file path was supplied: cached fix text can embed file paths and
//! code snippets, so persistence is opt-in.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

/// Default maximum number of cached fixes
pub const DEFAULT_CAPACITY: usize = 128;

/// A cached fix for one error fingerprint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheEntry {
    /// Suggested fix text as returned by the provider
    pub fix: String,
    /// Unix timestamp of the successful provider call
    pub created_at: u64,
}

/// In-memory fingerprint → fix map, optionally file-backed
pub struct ResponseCache {
    entries: HashMap<u64, CacheEntry>,
    /// Insertion order, oldest first, for eviction
    order: VecDeque<u64>,
    capacity: usize,
    path: Option<PathBuf>,
}

impl ResponseCache {
    /// Create an in-memory cache. A capacity of zero disables caching.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            capacity,
            path: None,
        }
    }

    /// Create a file-backed cache, loading any existing entries.
    ///
    /// A missing file is an empty cache; a corrupt file is an error rather
    /// than a silent wipe.
    pub fn with_file(capacity: usize, path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut cache = Self::new(capacity);

        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read cache file {}", path.display()))?;
            let stored: HashMap<String, CacheEntry> = serde_json::from_str(&contents)
                .with_context(|| format!("malformed cache file {}", path.display()))?;

            let mut loaded: Vec<(u64, CacheEntry)> = stored
                .into_iter()
                .filter_map(|(key, entry)| u64::from_str_radix(&key, 16).ok().map(|fp| (fp, entry)))
                .collect();
            // Re-insert oldest first so eviction order survives the round-trip
            loaded.sort_by_key(|(_, entry)| entry.created_at);
            for (fingerprint, entry) in loaded {
                cache.insert(fingerprint, entry);
            }
        }

        cache.path = Some(path);
        Ok(cache)
    }

    /// Look up a fix by fingerprint
    pub fn get(&self, fingerprint: u64) -> Option<&CacheEntry> {
        self.entries.get(&fingerprint)
    }

    /// Store a fix under a fingerprint
    pub fn put(&mut self, fingerprint: u64, fix: String) {
        let created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        self.insert(fingerprint, CacheEntry { fix, created_at });
    }

    fn insert(&mut self, fingerprint: u64, entry: CacheEntry) {
        if self.entries.insert(fingerprint, entry).is_none() {
            self.order.push_back(fingerprint);
        }
        while self.entries.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            } else {
                break;
            }
        }
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether this cache persists to disk
    pub fn is_file_backed(&self) -> bool {
        self.path.is_some()
    }

    /// Write the cache to its backing file, if any
    pub fn save(&self) -> Result<()> {
        let Some(ref path) = self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let stored: HashMap<String, &CacheEntry> = self
            .entries
            .iter()
            .map(|(fp, entry)| (format!("{fp:016x}"), entry))
            .collect();
        let contents =
            serde_json::to_string_pretty(&stored).context("failed to serialize cache")?;
        std::fs::write(path, contents)
            .with_context(|| format!("failed to write cache file {}", path.display()))?;
        Ok(())
    }
}

//! Extraction cache: memoizes `SkillSet`s per stored document.
//!
//! A `SkillSet` is a pure function of (text, taxonomy snapshot), so an entry
//! is only served when both the snapshot version and the text fingerprint
//! it was computed from still match.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use lru::LruCache;
use serde::Serialize;

use crate::matching::extractor::SkillSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKey {
    Resume(i64),
    Job(i64),
}

struct CacheEntry {
    taxonomy_version: u64,
    fingerprint: u64,
    skills: Arc<SkillSet>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

pub struct ExtractionCache {
    /// `None` when caching is disabled.
    entries: Option<Mutex<LruCache<DocumentKey, CacheEntry>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ExtractionCache {
    /// A capacity of 0 disables caching.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: NonZeroUsize::new(capacity).map(|cap| Mutex::new(LruCache::new(cap))),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> Option<MutexGuard<'_, LruCache<DocumentKey, CacheEntry>>> {
        self.entries
            .as_ref()
            .map(|entries| entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner()))
    }

    /// Returns the cached set for `key` if it was computed from `text`
    /// under `taxonomy_version`. A hit marks the entry most recently used.
    pub fn get(&self, key: DocumentKey, text: &str, taxonomy_version: u64) -> Option<Arc<SkillSet>> {
        let fingerprint = fingerprint(text);
        let mut hit = None;
        if let Some(mut entries) = self.lock() {
            hit = entries
                .get(&key)
                .filter(|e| e.taxonomy_version == taxonomy_version && e.fingerprint == fingerprint)
                .map(|e| e.skills.clone());
        }

        let counter = if hit.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        hit
    }

    /// Stores `skills` for `key`. When full, entries from older taxonomy
    /// versions go first, then the least recently used one.
    pub fn insert(&self, key: DocumentKey, text: &str, taxonomy_version: u64, skills: Arc<SkillSet>) {
        let Some(mut entries) = self.lock() else {
            return;
        };

        if !entries.contains(&key) && entries.len() >= entries.cap().get() {
            let stale: Vec<DocumentKey> = entries
                .iter()
                .filter(|(_, e)| e.taxonomy_version != taxonomy_version)
                .map(|(k, _)| *k)
                .collect();
            for k in stale {
                entries.pop(&k);
            }
        }

        entries.put(
            key,
            CacheEntry {
                taxonomy_version,
                fingerprint: fingerprint(text),
                skills,
            },
        );
    }

    /// Drops every entry. Called after a taxonomy update.
    pub fn invalidate_all(&self) {
        if let Some(mut entries) = self.lock() {
            entries.clear();
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.lock().map_or(0, |entries| entries.len()),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

fn fingerprint(text: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    hasher.finish()
}

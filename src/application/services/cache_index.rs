//! In-Memory Cache Index
//!
//! CacheStore 条目的内存镜像，只由 `AudioCache` 修改

use dashmap::DashMap;
use std::sync::Arc;

use crate::domain::audio::AudioCacheEntry;

#[derive(Default)]
pub struct CacheIndex {
    entries: DashMap<String, Arc<AudioCacheEntry>>,
}

impl CacheIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Arc<AudioCacheEntry>> {
        self.entries.get(key).map(|e| Arc::clone(e.value()))
    }

    pub fn insert(&self, entry: Arc<AudioCacheEntry>) {
        self.entries.insert(entry.id.clone(), entry);
    }

    pub fn remove(&self, key: &str) -> Option<Arc<AudioCacheEntry>> {
        self.entries.remove(key).map(|(_, entry)| entry)
    }

    pub fn list(&self) -> Vec<Arc<AudioCacheEntry>> {
        self.entries.iter().map(|e| Arc::clone(e.value())).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_bytes(&self) -> u64 {
        self.entries.iter().map(|e| e.size_bytes()).sum()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

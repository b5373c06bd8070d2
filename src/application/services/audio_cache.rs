//! Audio Cache Service
//!
//! CacheStore（持久化）+ CacheIndex（内存镜像）
//!
//! - 读：先查索引，再回落到存储；过期条目读到即删，列表与统计不含过期条目
//! - 写：存储写成功后才更新索引
//! - 容量：写入前按 cachedAt 从旧到新淘汰，critical 条目最后才淘汰

use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

use super::cache_index::CacheIndex;
use crate::application::ports::{CacheError, CacheStorePort};
use crate::domain::audio::{AudioCacheEntry, CacheEntryType, CachePriority};

/// 缓存统计信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub total_entries: usize,
    pub total_size_bytes: u64,
    pub max_size_bytes: u64,
    pub hit_count: u64,
    pub miss_count: u64,
    pub tts_entries: usize,
    pub audio_file_entries: usize,
    pub synthetic_entries: usize,
}

pub struct AudioCache {
    store: Arc<dyn CacheStorePort>,
    index: CacheIndex,
    max_size_bytes: AtomicU64,
    hit_count: AtomicU64,
    miss_count: AtomicU64,
    /// 串行化写路径（淘汰 + 写入）
    write_lock: Mutex<()>,
}

impl AudioCache {
    pub fn new(store: Arc<dyn CacheStorePort>, max_size_bytes: u64) -> Self {
        Self {
            store,
            index: CacheIndex::new(),
            max_size_bytes: AtomicU64::new(max_size_bytes),
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
            write_lock: Mutex::new(()),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 从存储重建索引
    ///
    /// 过期或校验失败的条目会从存储中删除。返回载入的条目数
    pub async fn init(&self) -> Result<usize, CacheError> {
        let _guard = self.write_lock.lock().await;
        let now = Utc::now();
        self.index.clear();

        let mut purged = 0usize;
        for entry in self.store.list_all().await? {
            if entry.is_expired(now) || !entry.verify() {
                self.store.delete(&entry.id).await?;
                purged += 1;
                continue;
            }
            self.index.insert(Arc::new(entry));
        }

        tracing::info!(
            entries = self.index.len(),
            purged = purged,
            total_size_bytes = self.index.total_bytes(),
            "Audio cache index rebuilt"
        );

        Ok(self.index.len())
    }

    pub async fn get(&self, key: &str) -> Result<Option<Arc<AudioCacheEntry>>, CacheError> {
        let now = Utc::now();

        let entry = match self.index.get(key) {
            Some(entry) => Some(entry),
            None => match self.store.get(key).await? {
                Some(entry) if !entry.is_expired(now) && entry.verify() => {
                    let entry = Arc::new(entry);
                    self.index.insert(Arc::clone(&entry));
                    Some(entry)
                }
                Some(_) => {
                    tracing::debug!(cache_key = %key, "Dropping expired or corrupt stored entry");
                    self.store.delete(key).await?;
                    None
                }
                None => None,
            },
        };

        match entry {
            Some(entry) if entry.is_expired(now) => {
                tracing::debug!(cache_key = %key, "Cache entry expired");
                self.delete(key).await?;
                self.miss_count.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
            Some(entry) => {
                tracing::debug!(cache_key = %key, "Cache hit");
                self.hit_count.fetch_add(1, Ordering::Relaxed);
                Ok(Some(entry))
            }
            None => {
                tracing::debug!(cache_key = %key, "Cache miss");
                self.miss_count.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
        }
    }

    /// 写入条目（同 key 覆盖），必要时先淘汰
    pub async fn put(&self, entry: AudioCacheEntry) -> Result<Arc<AudioCacheEntry>, CacheError> {
        let _guard = self.write_lock.lock().await;

        let size = entry.size_bytes();
        let limit = self.max_size_bytes.load(Ordering::Relaxed);
        if size > limit {
            return Err(CacheError::EvictionFailed {
                needed: size,
                limit,
            });
        }

        // 过期条目先于任何淘汰被清掉
        let now = Utc::now();
        for stale in self.index.list().into_iter().filter(|e| e.is_expired(now)) {
            self.store.delete(&stale.id).await?;
            self.index.remove(&stale.id);
        }

        let replaced = self.index.get(&entry.id).map(|e| e.size_bytes()).unwrap_or(0);
        let mut total = self.index.total_bytes() - replaced;

        while total + size > limit {
            let Some(victim) = self.eviction_candidate(&entry.id) else {
                return Err(CacheError::EvictionFailed {
                    needed: total + size,
                    limit,
                });
            };
            self.store.delete(&victim.id).await?;
            self.index.remove(&victim.id);
            total -= victim.size_bytes();
            tracing::debug!(
                cache_key = %victim.id,
                size_bytes = victim.size_bytes(),
                priority = %victim.priority,
                "Evicted cache entry"
            );
        }

        self.store.put(&entry).await?;
        let entry = Arc::new(entry);
        self.index.insert(Arc::clone(&entry));

        tracing::debug!(
            cache_key = %entry.id,
            entry_type = entry.entry_type.as_str(),
            size_bytes = size,
            priority = %entry.priority,
            "Audio cached"
        );

        Ok(entry)
    }

    /// 非 critical 中最旧的条目；没有时才轮到 critical
    fn eviction_candidate(&self, protected_key: &str) -> Option<Arc<AudioCacheEntry>> {
        let candidates: Vec<_> = self
            .live_entries()
            .into_iter()
            .filter(|e| e.id != protected_key)
            .collect();

        let oldest = |critical: bool| {
            candidates
                .iter()
                .filter(|e| (e.priority == CachePriority::Critical) == critical)
                .min_by_key(|e| e.cached_at)
                .cloned()
        };

        oldest(false).or_else(|| oldest(true))
    }

    pub async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.store.delete(key).await?;
        self.index.remove(key);
        Ok(())
    }

    /// 未过期的条目
    pub fn list_all(&self) -> Vec<Arc<AudioCacheEntry>> {
        self.live_entries()
    }

    fn live_entries(&self) -> Vec<Arc<AudioCacheEntry>> {
        let now = Utc::now();
        self.index
            .list()
            .into_iter()
            .filter(|e| !e.is_expired(now))
            .collect()
    }

    /// 批量清理过期条目，返回清理数量
    pub async fn purge_expired(&self) -> Result<usize, CacheError> {
        let _guard = self.write_lock.lock().await;
        let now = Utc::now();

        let mut purged = 0usize;
        for entry in self.store.list_all().await? {
            if entry.is_expired(now) {
                self.store.delete(&entry.id).await?;
                self.index.remove(&entry.id);
                purged += 1;
            }
        }

        if purged > 0 {
            tracing::info!(purged = purged, "Purged expired cache entries");
        }
        Ok(purged)
    }

    pub async fn clear(&self) -> Result<(), CacheError> {
        let _guard = self.write_lock.lock().await;
        self.store.clear().await?;
        self.index.clear();
        tracing::info!("Audio cache cleared");
        Ok(())
    }

    pub async fn flush(&self) -> Result<(), CacheError> {
        self.store.flush().await
    }

    pub fn set_max_size(&self, max_size_bytes: u64) {
        self.max_size_bytes.store(max_size_bytes, Ordering::Relaxed);
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self.live_entries();
        let count = |t: CacheEntryType| entries.iter().filter(|e| e.entry_type == t).count();

        CacheStats {
            total_entries: entries.len(),
            total_size_bytes: entries.iter().map(|e| e.size_bytes()).sum(),
            max_size_bytes: self.max_size_bytes.load(Ordering::Relaxed),
            hit_count: self.hit_count.load(Ordering::Relaxed),
            miss_count: self.miss_count.load(Ordering::Relaxed),
            tts_entries: count(CacheEntryType::Tts),
            audio_file_entries: count(CacheEntryType::AudioFile),
            synthetic_entries: count(CacheEntryType::Synthetic),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::MemoryCacheStore;
    use crate::domain::alarm::VoiceMood;
    use crate::domain::audio::{format, CachePayload};
    use chrono::Duration;

    fn cache_with(store: Arc<MemoryCacheStore>, max: u64) -> AudioCache {
        AudioCache::new(store, max)
    }

    fn entry_at(key: &str, size: usize, age_minutes: i64) -> AudioCacheEntry {
        let mut entry = AudioCacheEntry::audio_file(key, vec![7; size], format::MPEG);
        entry.cached_at = Utc::now() - Duration::minutes(age_minutes);
        entry
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let store = Arc::new(MemoryCacheStore::default());
        let cache = cache_with(store.clone(), 1024);

        cache
            .put(AudioCacheEntry::synthetic("beep", vec![1, 2, 3]))
            .await
            .unwrap();

        let entry = cache.get("beep").await.unwrap().unwrap();
        assert_eq!(entry.payload, CachePayload::Audio(vec![1, 2, 3]));
        assert!(store.contains("beep"));

        let stats = cache.stats();
        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.synthetic_entries, 1);
        assert_eq!(stats.hit_count, 1);
    }

    #[tokio::test]
    async fn test_expired_entry_reads_as_none_and_is_removed() {
        let store = Arc::new(MemoryCacheStore::default());
        let cache = cache_with(store.clone(), 1024);

        let stale = AudioCacheEntry::tts(
            "a1",
            VoiceMood::Gentle,
            "Good morning".to_string(),
            Utc::now() - Duration::hours(25),
        );
        let key = stale.id.clone();
        cache.put(stale).await.unwrap();

        assert!(cache.get(&key).await.unwrap().is_none());
        assert!(!store.contains(&key));
        assert_eq!(cache.stats().miss_count, 1);
    }

    #[tokio::test]
    async fn test_expired_entry_in_store_only_is_removed_on_read() {
        let store = Arc::new(MemoryCacheStore::default());
        let stale = AudioCacheEntry::synthetic("old", vec![1])
            .with_expiry(Utc::now() - Duration::seconds(1));
        store.insert_raw(stale);

        let cache = cache_with(store.clone(), 1024);
        assert!(cache.get("old").await.unwrap().is_none());
        assert!(!store.contains("old"));
    }

    #[tokio::test]
    async fn test_corrupt_entry_in_store_only_is_removed_on_read() {
        let store = Arc::new(MemoryCacheStore::default());
        let mut corrupt = AudioCacheEntry::synthetic("tampered", vec![1, 2, 3]);
        corrupt.payload = CachePayload::Audio(vec![9, 9, 9]);
        store.insert_raw(corrupt);

        let cache = cache_with(store.clone(), 1024);
        assert!(cache.get("tampered").await.unwrap().is_none());
        assert!(!store.contains("tampered"));
        assert!(cache.list_all().is_empty());
        assert_eq!(cache.stats().miss_count, 1);
    }

    #[tokio::test]
    async fn test_expired_entries_hidden_from_list_and_stats() {
        let store = Arc::new(MemoryCacheStore::default());
        let cache = cache_with(store.clone(), 1024);

        cache
            .put(
                AudioCacheEntry::synthetic("stale", vec![1, 2])
                    .with_expiry(Utc::now() - Duration::seconds(5)),
            )
            .await
            .unwrap();

        assert!(cache.list_all().is_empty());
        let stats = cache.stats();
        assert_eq!(stats.total_entries, 0);
        assert_eq!(stats.total_size_bytes, 0);
        assert_eq!(stats.synthetic_entries, 0);

        cache
            .put(AudioCacheEntry::synthetic("fresh", vec![1]))
            .await
            .unwrap();
        let keys: Vec<_> = cache.list_all().iter().map(|e| e.id.clone()).collect();
        assert_eq!(keys, vec!["fresh".to_string()]);
    }

    #[tokio::test]
    async fn test_expired_entries_dropped_before_eviction() {
        let store = Arc::new(MemoryCacheStore::default());
        let cache = cache_with(store.clone(), 20);

        cache.put(entry_at("live", 10, 30)).await.unwrap();
        cache
            .put(entry_at("stale", 10, 10).with_expiry(Utc::now() - Duration::seconds(5)))
            .await
            .unwrap();
        cache.put(entry_at("incoming", 10, 0)).await.unwrap();

        assert!(store.contains("live"));
        assert!(!store.contains("stale"));
        assert!(store.contains("incoming"));
    }

    #[tokio::test]
    async fn test_init_purges_expired_and_corrupt_entries() {
        let store = Arc::new(MemoryCacheStore::default());
        store.insert_raw(AudioCacheEntry::synthetic("fresh", vec![1, 2]));
        store.insert_raw(
            AudioCacheEntry::synthetic("stale", vec![1])
                .with_expiry(Utc::now() - Duration::minutes(1)),
        );
        let mut corrupt = AudioCacheEntry::synthetic("corrupt", vec![1, 2, 3]);
        corrupt.payload = CachePayload::Audio(vec![9, 9, 9]);
        store.insert_raw(corrupt);

        let cache = cache_with(store.clone(), 1024);
        assert_eq!(cache.init().await.unwrap(), 1);
        assert!(store.contains("fresh"));
        assert!(!store.contains("stale"));
        assert!(!store.contains("corrupt"));
    }

    #[tokio::test]
    async fn test_eviction_prefers_oldest_non_critical() {
        let store = Arc::new(MemoryCacheStore::default());
        let cache = cache_with(store.clone(), 30);

        cache
            .put(entry_at("critical-old", 10, 60).with_priority(CachePriority::Critical))
            .await
            .unwrap();
        cache.put(entry_at("low-old", 10, 30)).await.unwrap();
        cache.put(entry_at("low-new", 10, 10)).await.unwrap();

        cache.put(entry_at("incoming", 10, 0)).await.unwrap();

        assert!(store.contains("critical-old"));
        assert!(!store.contains("low-old"));
        assert!(store.contains("low-new"));
        assert!(store.contains("incoming"));
        assert_eq!(cache.stats().total_size_bytes, 30);
    }

    #[tokio::test]
    async fn test_critical_evicted_only_when_nothing_else_remains() {
        let store = Arc::new(MemoryCacheStore::default());
        let cache = cache_with(store.clone(), 20);

        cache
            .put(entry_at("c1", 10, 20).with_priority(CachePriority::Critical))
            .await
            .unwrap();
        cache
            .put(entry_at("c2", 10, 10).with_priority(CachePriority::Critical))
            .await
            .unwrap();
        cache.put(entry_at("new", 10, 0)).await.unwrap();

        assert!(!store.contains("c1"));
        assert!(store.contains("c2"));
    }

    #[tokio::test]
    async fn test_replacing_same_key_does_not_evict_others() {
        let store = Arc::new(MemoryCacheStore::default());
        let cache = cache_with(store.clone(), 20);

        cache.put(entry_at("a", 10, 10)).await.unwrap();
        cache.put(entry_at("b", 10, 5)).await.unwrap();
        cache.put(entry_at("b", 10, 0)).await.unwrap();

        assert!(store.contains("a"));
        assert!(store.contains("b"));
        assert_eq!(cache.stats().total_entries, 2);
    }

    #[tokio::test]
    async fn test_oversize_entry_rejected() {
        let store = Arc::new(MemoryCacheStore::default());
        let cache = cache_with(store.clone(), 5);

        let err = cache.put(entry_at("huge", 10, 0)).await.unwrap_err();
        assert!(matches!(
            err,
            CacheError::EvictionFailed {
                needed: 10,
                limit: 5
            }
        ));
        assert!(!store.contains("huge"));
    }

    #[tokio::test]
    async fn test_purge_expired_and_clear() {
        let store = Arc::new(MemoryCacheStore::default());
        let cache = cache_with(store.clone(), 1024);

        cache
            .put(AudioCacheEntry::synthetic("keep", vec![1]))
            .await
            .unwrap();
        cache
            .put(
                AudioCacheEntry::synthetic("drop", vec![1])
                    .with_expiry(Utc::now() - Duration::seconds(5)),
            )
            .await
            .unwrap();

        assert_eq!(cache.purge_expired().await.unwrap(), 1);
        assert_eq!(cache.list_all().len(), 1);

        cache.clear().await.unwrap();
        assert!(cache.list_all().is_empty());
        assert!(!store.contains("keep"));
    }
}

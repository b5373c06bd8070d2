//! Sled-based Audio Cache Store
//!
//! 每个条目以 `entry:<key>` 存储，值为 bincode 编码的 `AudioCacheEntry`

use async_trait::async_trait;
use sled::Db;
use std::path::Path;
use std::sync::Arc;

use crate::application::ports::{CacheError, CacheStorePort};
use crate::domain::audio::AudioCacheEntry;

const ENTRY_PREFIX: &str = "entry:";

/// Sled 缓存存储
pub struct SledCacheStore {
    db: Db,
}

impl SledCacheStore {
    /// 打开（或创建）缓存数据库
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CacheError> {
        let db = sled::open(path.as_ref()).map_err(|e| CacheError::DatabaseError(e.to_string()))?;

        tracing::info!(
            db_path = %path.as_ref().display(),
            entries = db.scan_prefix(ENTRY_PREFIX).count(),
            "SledCacheStore opened"
        );

        Ok(Self { db })
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    fn entry_key(key: &str) -> String {
        format!("{}{}", ENTRY_PREFIX, key)
    }
}

#[async_trait]
impl CacheStorePort for SledCacheStore {
    async fn get(&self, key: &str) -> Result<Option<AudioCacheEntry>, CacheError> {
        match self.db.get(Self::entry_key(key)) {
            Ok(Some(data)) => {
                let entry = bincode::deserialize(&data)
                    .map_err(|e| CacheError::SerializationError(e.to_string()))?;
                Ok(Some(entry))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(CacheError::DatabaseError(e.to_string())),
        }
    }

    async fn put(&self, entry: &AudioCacheEntry) -> Result<(), CacheError> {
        let bytes =
            bincode::serialize(entry).map_err(|e| CacheError::SerializationError(e.to_string()))?;

        self.db
            .insert(Self::entry_key(&entry.id), bytes)
            .map_err(|e| CacheError::DatabaseError(e.to_string()))?;

        tracing::debug!(
            cache_key = %entry.id,
            size_bytes = entry.size_bytes(),
            "Cache entry stored"
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.db
            .remove(Self::entry_key(key))
            .map_err(|e| CacheError::DatabaseError(e.to_string()))?;
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<AudioCacheEntry>, CacheError> {
        let mut entries = Vec::new();
        for item in self.db.scan_prefix(ENTRY_PREFIX) {
            let (key, value) = item.map_err(|e| CacheError::DatabaseError(e.to_string()))?;
            match bincode::deserialize::<AudioCacheEntry>(&value) {
                Ok(entry) => entries.push(entry),
                // 损坏的记录直接跳过，由上层重建索引时忽略
                Err(e) => tracing::warn!(
                    key = %String::from_utf8_lossy(&key),
                    error = %e,
                    "Skipping undecodable cache record"
                ),
            }
        }
        Ok(entries)
    }

    async fn clear(&self) -> Result<(), CacheError> {
        for item in self.db.scan_prefix(ENTRY_PREFIX).keys() {
            let key = item.map_err(|e| CacheError::DatabaseError(e.to_string()))?;
            self.db
                .remove(key)
                .map_err(|e| CacheError::DatabaseError(e.to_string()))?;
        }
        Ok(())
    }

    async fn flush(&self) -> Result<(), CacheError> {
        self.db
            .flush_async()
            .await
            .map_err(|e| CacheError::DatabaseError(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::alarm::VoiceMood;
    use crate::domain::audio::{format, CachePriority};
    use chrono::Utc;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_put_get_delete() {
        let dir = tempdir().unwrap();
        let store = SledCacheStore::open(dir.path().join("cache.sled")).unwrap();

        let entry = AudioCacheEntry::audio_file("https://x/a.mp3", vec![1, 2, 3], format::MPEG)
            .with_priority(CachePriority::Critical);
        store.put(&entry).await.unwrap();

        let loaded = store.get("https://x/a.mp3").await.unwrap().unwrap();
        assert_eq!(loaded, entry);
        assert!(loaded.verify());

        store.delete("https://x/a.mp3").await.unwrap();
        assert!(store.get("https://x/a.mp3").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_entries_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cache.sled");

        {
            let store = SledCacheStore::open(&path).unwrap();
            let tts = AudioCacheEntry::tts(
                "a1",
                VoiceMood::Gentle,
                "Good morning".to_string(),
                Utc::now(),
            );
            store.put(&tts).await.unwrap();
            store
                .put(&AudioCacheEntry::synthetic("beep", vec![0; 16]))
                .await
                .unwrap();
            store.flush().await.unwrap();
        }

        let store = SledCacheStore::open(&path).unwrap();
        let mut ids: Vec<_> = store
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["beep".to_string(), "tts_a1_gentle".to_string()]);

        let tts = store.get("tts_a1_gentle").await.unwrap().unwrap();
        assert_eq!(tts.payload.text(), Some("Good morning"));
    }

    #[tokio::test]
    async fn test_clear_only_touches_entries() {
        let dir = tempdir().unwrap();
        let store = SledCacheStore::open(dir.path().join("cache.sled")).unwrap();
        store
            .put(&AudioCacheEntry::synthetic("beep", vec![0; 16]))
            .await
            .unwrap();
        store.db.insert("other:key", b"keep".to_vec()).unwrap();

        store.clear().await.unwrap();

        assert!(store.list_all().await.unwrap().is_empty());
        assert!(store.db.contains_key("other:key").unwrap());
    }

    #[tokio::test]
    async fn test_corrupt_record_skipped() {
        let dir = tempdir().unwrap();
        let store = SledCacheStore::open(dir.path().join("cache.sled")).unwrap();
        store.db.insert("entry:broken", b"not bincode".to_vec()).unwrap();
        store
            .put(&AudioCacheEntry::synthetic("beep", vec![0; 16]))
            .await
            .unwrap();

        let entries = store.list_all().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert!(store.get("broken").await.is_err());
    }
}

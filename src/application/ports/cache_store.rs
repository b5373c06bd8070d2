//! Cache Store Port - 持久化 key → 条目存储
//!
//! 定义缓存存储的抽象接口，具体实现使用 Sled

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::audio::AudioCacheEntry;

/// Cache 错误
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache full, eviction failed: need {needed} bytes, limit {limit}")]
    EvictionFailed { needed: u64, limit: u64 },

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// Cache Store Port
///
/// 持久化存储，进程重启后仍然存在；同一 key 至多一个条目
#[async_trait]
pub trait CacheStorePort: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<AudioCacheEntry>, CacheError>;

    /// 写入条目，同 key 覆盖
    async fn put(&self, entry: &AudioCacheEntry) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    async fn list_all(&self) -> Result<Vec<AudioCacheEntry>, CacheError>;

    /// 清空所有条目
    async fn clear(&self) -> Result<(), CacheError> {
        for entry in self.list_all().await? {
            self.delete(&entry.id).await?;
        }
        Ok(())
    }

    /// 刷盘
    async fn flush(&self) -> Result<(), CacheError> {
        Ok(())
    }
}

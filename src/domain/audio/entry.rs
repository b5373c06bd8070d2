//! 音频缓存条目
//!
//! 不变量:
//! - 同一 key 在缓存中至多一个条目
//! - 条目创建后不可变，更新即“删除 + 重建”
//! - `expires_at` 已过期的条目对读操作不可见

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{format, CompressionLevel};
use crate::domain::alarm::VoiceMood;

/// TTS 文案的有效期
pub const TTS_TTL_HOURS: i64 = 24;

/// 条目类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheEntryType {
    Tts,
    AudioFile,
    Synthetic,
}

impl CacheEntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheEntryType::Tts => "tts",
            CacheEntryType::AudioFile => "audio_file",
            CacheEntryType::Synthetic => "synthetic",
        }
    }
}

/// 缓存优先级；critical 仅用于预加载窗口内的资源
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CachePriority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl CachePriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            CachePriority::Low => "low",
            CachePriority::Medium => "medium",
            CachePriority::High => "high",
            CachePriority::Critical => "critical",
        }
    }
}

impl std::fmt::Display for CachePriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 条目负载：音频字节或 TTS 文本
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CachePayload {
    Audio(Vec<u8>),
    Text(String),
}

impl CachePayload {
    pub fn len(&self) -> usize {
        match self {
            CachePayload::Audio(bytes) => bytes.len(),
            CachePayload::Text(text) => text.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            CachePayload::Audio(bytes) => bytes,
            CachePayload::Text(text) => text.as_bytes(),
        }
    }

    pub fn audio(&self) -> Option<&[u8]> {
        match self {
            CachePayload::Audio(bytes) => Some(bytes),
            CachePayload::Text(_) => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            CachePayload::Text(text) => Some(text),
            CachePayload::Audio(_) => None,
        }
    }
}

/// 条目元数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioMetadata {
    pub duration_ms: Option<u64>,
    /// MIME
    pub format: String,
    pub size_bytes: u64,
    pub voice_mood: Option<VoiceMood>,
    pub alarm_id: Option<String>,
    pub is_preloaded: bool,
    pub compression_level: CompressionLevel,
    /// md5(payload)，重建索引时校验
    pub content_hash: String,
}

/// 音频缓存条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioCacheEntry {
    pub id: String,
    pub entry_type: CacheEntryType,
    pub payload: CachePayload,
    pub metadata: AudioMetadata,
    pub cached_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub priority: CachePriority,
}

impl AudioCacheEntry {
    fn build(
        id: String,
        entry_type: CacheEntryType,
        payload: CachePayload,
        format: String,
        now: DateTime<Utc>,
    ) -> Self {
        let metadata = AudioMetadata {
            duration_ms: None,
            format,
            size_bytes: payload.len() as u64,
            voice_mood: None,
            alarm_id: None,
            is_preloaded: false,
            compression_level: CompressionLevel::None,
            content_hash: content_hash(payload.as_bytes()),
        };
        Self {
            id,
            entry_type,
            payload,
            metadata,
            cached_at: now,
            expires_at: None,
            priority: CachePriority::default(),
        }
    }

    /// 网络音频文件条目
    pub fn audio_file(id: impl Into<String>, data: Vec<u8>, format: impl Into<String>) -> Self {
        Self::build(
            id.into(),
            CacheEntryType::AudioFile,
            CachePayload::Audio(data),
            format.into(),
            Utc::now(),
        )
    }

    /// 本地合成的音频条目
    pub fn synthetic(id: impl Into<String>, data: Vec<u8>) -> Self {
        Self::build(
            id.into(),
            CacheEntryType::Synthetic,
            CachePayload::Audio(data),
            format::WAV.to_string(),
            Utc::now(),
        )
    }

    /// TTS 文案条目，24 小时后过期
    pub fn tts(alarm_id: &str, mood: VoiceMood, text: String, now: DateTime<Utc>) -> Self {
        let mut entry = Self::build(
            tts_cache_key(alarm_id, mood),
            CacheEntryType::Tts,
            CachePayload::Text(text),
            format::TEXT.to_string(),
            now,
        );
        entry.expires_at = Some(now + Duration::hours(TTS_TTL_HOURS));
        entry.metadata.voice_mood = Some(mood);
        entry.metadata.alarm_id = Some(alarm_id.to_string());
        entry
    }

    pub fn with_priority(mut self, priority: CachePriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: Option<u64>) -> Self {
        self.metadata.duration_ms = duration_ms;
        self
    }

    pub fn with_alarm(mut self, alarm_id: Option<String>) -> Self {
        self.metadata.alarm_id = alarm_id;
        self
    }

    pub fn with_compression(mut self, level: CompressionLevel) -> Self {
        self.metadata.compression_level = level;
        self
    }

    pub fn preloaded(mut self, is_preloaded: bool) -> Self {
        self.metadata.is_preloaded = is_preloaded;
        self
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|at| at <= now).unwrap_or(false)
    }

    pub fn has_payload(&self) -> bool {
        !self.payload.is_empty()
    }

    pub fn size_bytes(&self) -> u64 {
        self.metadata.size_bytes
    }

    /// 负载是否与记录的哈希一致
    pub fn verify(&self) -> bool {
        self.metadata.size_bytes == self.payload.len() as u64
            && self.metadata.content_hash == content_hash(self.payload.as_bytes())
    }
}

/// TTS 条目的缓存 key: `tts_<alarmId>_<voiceMood>`
pub fn tts_cache_key(alarm_id: &str, mood: VoiceMood) -> String {
    format!("tts_{}_{}", alarm_id, mood)
}

pub fn content_hash(data: &[u8]) -> String {
    format!("{:x}", md5::compute(data))
}

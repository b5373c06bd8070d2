//! Audio Context - 音频缓存条目、PCM 处理与兜底提示音

mod compression;
mod entry;
mod errors;
pub mod format;
mod pcm;
mod progress;
mod tone;
pub mod wav;

pub use compression::{CompressionLevel, CompressionSettings};
pub use entry::{
    content_hash, tts_cache_key, AudioCacheEntry, AudioMetadata, CacheEntryType, CachePayload,
    CachePriority, TTS_TTL_HOURS,
};
pub use errors::AudioError;
pub use pcm::PcmAudio;
pub use progress::AudioLoadProgress;
pub use tone::{BeepPattern, TonePulse, BEEP_FREQUENCY_HZ, BEEP_SAMPLE_RATE, BEEP_SPACING};

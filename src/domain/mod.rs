//! Domain Layer - 领域层
//!
//! 包含两个限界上下文:
//! - Alarm Context: 外部闹钟记录、语音情绪与文案
//! - Audio Context: 缓存条目、PCM/WAV、兜底提示音

pub mod alarm;
pub mod audio;

//! Reveil - 闹钟音频缓存与预加载引擎
//!
//! 架构设计: DDD + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Alarm Context: 外部闹钟记录、语音情绪、文案模板
//! - Audio Context: 缓存条目、PCM/WAV、兜底提示音
//!
//! 应用层 (application/):
//! - Ports: CacheStore、AudioFetcher、AudioCodec、SpeechSynthesizer、AudioOutput
//! - Services: 缓存、加载、压缩、格式优化、预加载调度、TTS、播放、引擎门面
//!
//! 基础设施层 (infrastructure/):
//! - Persistence: Sled 缓存存储
//! - Adapters: reqwest 下载、symphonia 解码、HTTP 语音合成、模拟输出设备

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use application::{AlarmAudioEngine, AlarmSound, EngineDeps};
pub use config::{load_config, AppConfig, AudioPreloadConfig};

//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（CacheStore、AudioFetcher、AudioCodec、SpeechSynthesizer、AudioOutput）
//! - services: 缓存、加载、压缩、格式优化、预加载调度、TTS、播放，以及组装门面
//! - error: 应用层错误定义

pub mod error;
pub mod ports;
pub mod services;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{EngineError, LoadError};

pub use ports::{
    AudioCodecPort, AudioFetcherPort, AudioOutputPort, ByteStream, CacheError, CacheStorePort,
    CodecError, FetchError, FetchResponse, OutputError, SpeechError, SpeechParams,
    SpeechSynthesizerPort, VoiceInfo,
};

pub use services::{
    AlarmAudioEngine, AlarmSound, AudioCache, AudioLoader, CacheStats, CompressionPipeline,
    EngineDeps, FormatOptimizer, LoadOptions, PlaybackEngine, PlaybackHandle, PlaybackOptions,
    PreloadReport, PreloadScheduler, TtsGenerator,
};

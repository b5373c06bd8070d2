//! Application Services - 用例编排
//!
//! 所有服务都通过构造函数注入端口，没有全局单例

mod audio_cache;
mod cache_index;
mod compression;
mod engine;
mod format_optimizer;
mod loader;
mod playback;
mod preload_scheduler;
mod progress;
mod shared_config;
mod tts_generator;

pub use audio_cache::{AudioCache, CacheStats};
pub use cache_index::CacheIndex;
pub use compression::{CompressedAudio, CompressionPipeline};
pub use engine::{AlarmAudioEngine, AlarmSound, EngineDeps};
pub use format_optimizer::{FormatOptimizer, OptimizedAudio};
pub use loader::{AudioLoader, LoadOptions, ProgressCallback};
pub use playback::{EndedCallback, PlaybackEngine, PlaybackHandle, PlaybackOptions};
pub use preload_scheduler::{PreloadReport, PreloadScheduler};
pub use progress::ProgressPublisher;
pub use shared_config::SharedPreloadConfig;
pub use tts_generator::{TtsGenerator, REPEAT_INTERVAL, SPEECH_WATCHDOG};

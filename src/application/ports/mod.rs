//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod audio_codec;
mod audio_fetcher;
mod audio_output;
mod cache_store;
mod speech_synthesizer;

pub use audio_codec::{AudioCodecPort, CodecError};
pub use audio_fetcher::{AudioFetcherPort, ByteStream, FetchError, FetchResponse};
pub use audio_output::{AudioOutputPort, OutputError};
pub use cache_store::{CacheError, CacheStorePort};
pub use speech_synthesizer::{SpeechError, SpeechParams, SpeechSynthesizerPort, VoiceInfo};

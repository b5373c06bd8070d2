//! Audio Codec Port - 解码 / 编码抽象
//!
//! 默认实现只提供最小 WAV 编码；真正的有损编码器（Opus、MP3）可作为其他实现接入

use thiserror::Error;

use crate::domain::audio::PcmAudio;

/// 编解码错误
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("Decoding error: {0}")]
    DecodingError(String),
}

/// Audio Codec Port
///
/// CPU 密集型，调用方负责放到 blocking 线程池执行
pub trait AudioCodecPort: Send + Sync {
    /// 解码为 PCM；`mime_hint` 用于辅助探测容器格式
    fn decode(&self, data: &[u8], mime_hint: Option<&str>) -> Result<PcmAudio, CodecError>;

    /// 编码为指定 MIME 格式
    fn encode(&self, pcm: &PcmAudio, mime: &str) -> Result<Vec<u8>, CodecError>;

    /// 是否能编码为指定格式
    fn can_encode(&self, mime: &str) -> bool;
}

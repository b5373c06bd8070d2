//! Audio Output Port - 输出设备抽象
//!
//! play(buffer) → ended；同时提供平台可播放格式的探测

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::domain::audio::PcmAudio;

/// 输出错误
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Output device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("Playback failed: {0}")]
    PlaybackFailed(String),
}

/// Audio Output Port
#[async_trait]
pub trait AudioOutputPort: Send + Sync {
    /// 平台是否能播放指定 MIME
    fn can_play(&self, mime: &str) -> bool;

    /// 播放 PCM，播放结束或 `stop` 被取消时返回
    ///
    /// `looping` 为 true 时循环播放直到被取消
    async fn play(
        &self,
        audio: PcmAudio,
        looping: bool,
        stop: CancellationToken,
    ) -> Result<(), OutputError>;
}

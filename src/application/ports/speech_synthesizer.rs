//! Speech Synthesizer Port - 语音合成抽象
//!
//! 平台语音合成视为黑盒：speak(text, params) → ended / error

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 语音合成错误
#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("Speech synthesis unavailable: {0}")]
    Unavailable(String),

    #[error("Synthesis failed: {0}")]
    SynthesisFailed(String),

    #[error("Utterance interrupted")]
    Interrupted,
}

/// 平台可用声线
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceInfo {
    pub name: String,
    pub lang: String,
}

/// 单次朗读参数
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeechParams {
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
    pub voice: Option<String>,
    pub lang: String,
}

/// Speech Synthesizer Port
#[async_trait]
pub trait SpeechSynthesizerPort: Send + Sync {
    /// 列出可用声线
    async fn voices(&self) -> Vec<VoiceInfo>;

    /// 朗读文本，直到朗读结束才返回
    async fn speak(&self, text: &str, params: &SpeechParams) -> Result<(), SpeechError>;

    /// 打断当前朗读
    fn cancel(&self) {}
}

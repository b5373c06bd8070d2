//! HTTP Speech Synthesizer - 调用外部 TTS HTTP 服务
//!
//! 实现 SpeechSynthesizerPort：服务端合成 WAV，本地解码后交给输出设备播放
//!
//! 外部 TTS API:
//! POST {base_url}/api/tts/speak
//! Request: {"text": "...", "voice": "...", "lang": "en-US", "rate": 1.0, "pitch": 1.0}  (JSON)
//! Response: audio/wav binary
//!
//! GET {base_url}/api/tts/voices
//! Response: [{"name": "...", "lang": "..."}]

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::application::ports::{
    AudioCodecPort, AudioOutputPort, SpeechError, SpeechParams, SpeechSynthesizerPort, VoiceInfo,
};
use crate::config::TtsConfig;
use crate::domain::audio::format;

/// 合成请求体 (JSON)
#[derive(Debug, Serialize)]
struct SpeakRequest<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    voice: Option<&'a str>,
    lang: &'a str,
    rate: f32,
    pitch: f32,
}

pub struct HttpSpeechSynthesizer {
    client: Client,
    base_url: String,
    codec: Arc<dyn AudioCodecPort>,
    output: Arc<dyn AudioOutputPort>,
    /// 当前朗读的取消令牌，每次 speak 替换
    current: Mutex<CancellationToken>,
}

impl HttpSpeechSynthesizer {
    pub fn new(
        config: &TtsConfig,
        codec: Arc<dyn AudioCodecPort>,
        output: Arc<dyn AudioOutputPort>,
    ) -> Result<Self, SpeechError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SpeechError::Unavailable(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            codec,
            output,
            current: Mutex::new(CancellationToken::new()),
        })
    }

    fn speak_url(&self) -> String {
        format!("{}/api/tts/speak", self.base_url)
    }

    fn voices_url(&self) -> String {
        format!("{}/api/tts/voices", self.base_url)
    }

    /// 开始新的朗读，打断上一段
    fn begin_utterance(&self) -> CancellationToken {
        let token = CancellationToken::new();
        let mut current = self
            .current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        current.cancel();
        *current = token.clone();
        token
    }

    async fn synthesize(&self, text: &str, params: &SpeechParams) -> Result<Vec<u8>, SpeechError> {
        let request = SpeakRequest {
            text,
            voice: params.voice.as_deref(),
            lang: &params.lang,
            rate: params.rate,
            pitch: params.pitch,
        };

        tracing::debug!(
            url = %self.speak_url(),
            text_len = text.len(),
            voice = ?params.voice,
            "Sending speech request"
        );

        let response = self
            .client
            .post(self.speak_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SpeechError::Unavailable("TTS service timeout".to_string())
                } else if e.is_connect() {
                    SpeechError::Unavailable(format!("Cannot connect to TTS service: {}", e))
                } else {
                    SpeechError::SynthesisFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(SpeechError::SynthesisFailed(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| SpeechError::SynthesisFailed(format!("Failed to read audio: {}", e)))?;
        Ok(audio.to_vec())
    }
}

#[async_trait]
impl SpeechSynthesizerPort for HttpSpeechSynthesizer {
    async fn voices(&self) -> Vec<VoiceInfo> {
        let response = match self.client.get(self.voices_url()).send().await {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                tracing::warn!(status = %response.status(), "Voice list request rejected");
                return Vec::new();
            }
            Err(e) => {
                tracing::warn!(error = %e, "Voice list unavailable");
                return Vec::new();
            }
        };

        response.json::<Vec<VoiceInfo>>().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Invalid voice list");
            Vec::new()
        })
    }

    async fn speak(&self, text: &str, params: &SpeechParams) -> Result<(), SpeechError> {
        let token = self.begin_utterance();

        let audio = tokio::select! {
            _ = token.cancelled() => return Err(SpeechError::Interrupted),
            audio = self.synthesize(text, params) => audio?,
        };

        let codec = Arc::clone(&self.codec);
        let mut pcm = tokio::task::spawn_blocking(move || codec.decode(&audio, Some(format::WAV)))
            .await
            .map_err(|e| SpeechError::SynthesisFailed(format!("Decode task panicked: {}", e)))?
            .map_err(|e| SpeechError::SynthesisFailed(e.to_string()))?;
        pcm.apply_gain_envelope(params.volume, None, None);

        tracing::info!(
            duration_ms = pcm.duration_ms(),
            text_len = text.len(),
            "Speaking utterance"
        );

        self.output
            .play(pcm, false, token.clone())
            .await
            .map_err(|e| SpeechError::Unavailable(e.to_string()))?;

        if token.is_cancelled() {
            return Err(SpeechError::Interrupted);
        }
        Ok(())
    }

    fn cancel(&self) {
        let current = self
            .current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        current.cancel();
    }
}

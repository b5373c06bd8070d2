//! Compression Pipeline
//!
//! 解码 → 声道下混 → 最近邻重采样 → 重新编码为 16-bit PCM WAV
//!
//! 压缩属于可降级操作：任何失败都返回原始数据，不向上抛错

use std::sync::Arc;

use crate::application::ports::{AudioCodecPort, CodecError};
use crate::domain::audio::{format, CompressionLevel, CompressionSettings};

/// 压缩结果
#[derive(Debug, Clone, PartialEq)]
pub struct CompressedAudio {
    pub data: Vec<u8>,
    /// 实际生效的等级；回退到原始数据时为 `None`
    pub level: CompressionLevel,
    pub duration_ms: Option<u64>,
}

impl CompressedAudio {
    fn unchanged(data: Vec<u8>) -> Self {
        Self {
            data,
            level: CompressionLevel::None,
            duration_ms: None,
        }
    }

    pub fn is_applied(&self) -> bool {
        self.level != CompressionLevel::None
    }
}

pub struct CompressionPipeline {
    codec: Arc<dyn AudioCodecPort>,
}

impl CompressionPipeline {
    pub fn new(codec: Arc<dyn AudioCodecPort>) -> Self {
        Self { codec }
    }

    /// 按等级压缩，失败返回原始数据
    pub async fn compress_audio(&self, data: Vec<u8>, level: CompressionLevel) -> Vec<u8> {
        self.compress(data, None, level).await.data
    }

    /// 压缩并返回生效等级；`format_hint` 帮助解码器识别容器
    pub async fn compress(
        &self,
        data: Vec<u8>,
        format_hint: Option<&str>,
        level: CompressionLevel,
    ) -> CompressedAudio {
        let Some(settings) = level.settings() else {
            return CompressedAudio::unchanged(data);
        };

        let original = Arc::new(data);
        let input = Arc::clone(&original);
        let codec = Arc::clone(&self.codec);
        let hint = format_hint.map(str::to_string);

        let result = tokio::task::spawn_blocking(move || {
            transcode(codec.as_ref(), &input, hint.as_deref(), settings)
        })
        .await;

        let recover = |original: Arc<Vec<u8>>| {
            Arc::try_unwrap(original).unwrap_or_else(|shared| shared.as_ref().clone())
        };

        match result {
            Ok(Ok((encoded, duration_ms))) if encoded.len() < original.len() => {
                tracing::debug!(
                    level = %level,
                    original_bytes = original.len(),
                    compressed_bytes = encoded.len(),
                    sample_rate = settings.sample_rate,
                    quality = settings.quality,
                    "Audio compressed"
                );
                CompressedAudio {
                    data: encoded,
                    level,
                    duration_ms: Some(duration_ms),
                }
            }
            Ok(Ok(_)) => {
                tracing::debug!(level = %level, "Compression did not shrink audio, keeping original");
                CompressedAudio::unchanged(recover(original))
            }
            Ok(Err(e)) => {
                tracing::warn!(level = %level, error = %e, "Compression failed, keeping original");
                CompressedAudio::unchanged(recover(original))
            }
            Err(e) => {
                tracing::error!(level = %level, error = %e, "Compression task panicked");
                CompressedAudio::unchanged(recover(original))
            }
        }
    }
}

fn transcode(
    codec: &dyn AudioCodecPort,
    data: &[u8],
    hint: Option<&str>,
    settings: CompressionSettings,
) -> Result<(Vec<u8>, u64), CodecError> {
    let pcm = codec.decode(data, hint)?;
    if pcm.samples.is_empty() {
        return Err(CodecError::InvalidInput("no samples decoded".to_string()));
    }

    let target_rate = pcm.sample_rate.min(settings.sample_rate);
    let reduced = pcm.mix_down(settings.channels).resample_nearest(target_rate);
    let encoded = codec.encode(&reduced, format::WAV)?;
    Ok((encoded, reduced.duration_ms()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{sine_wav, WavCodec};
    use crate::domain::audio::wav;

    fn pipeline() -> CompressionPipeline {
        CompressionPipeline::new(Arc::new(WavCodec))
    }

    #[tokio::test]
    async fn test_none_is_noop() {
        let input = sine_wav(0.5, 44_100, 2);
        let output = pipeline().compress_audio(input.clone(), CompressionLevel::None).await;
        assert_eq!(output, input);
    }

    #[tokio::test]
    async fn test_levels_shrink_monotonically() {
        let input = sine_wav(1.0, 44_100, 2);
        let pipeline = pipeline();

        let light = pipeline.compress_audio(input.clone(), CompressionLevel::Light).await;
        let medium = pipeline.compress_audio(input.clone(), CompressionLevel::Medium).await;
        let heavy = pipeline.compress_audio(input.clone(), CompressionLevel::Heavy).await;

        assert!(heavy.len() <= medium.len());
        assert!(medium.len() <= light.len());
        assert!(light.len() <= input.len());
    }

    #[tokio::test]
    async fn test_light_output_is_mono_22k_wav() {
        let input = sine_wav(1.0, 44_100, 2);
        let result = pipeline().compress(input, None, CompressionLevel::Light).await;

        assert!(result.is_applied());
        let info = wav::parse_wav_info(&result.data).unwrap();
        assert_eq!(info.sample_rate, 22_050);
        assert_eq!(info.channels, 1);
        assert_eq!(info.audio_format, 1);
        assert_eq!(result.duration_ms, Some(1000));
    }

    #[tokio::test]
    async fn test_never_upsamples_low_rate_source() {
        let input = sine_wav(1.0, 8_000, 2);
        let result = pipeline().compress(input, None, CompressionLevel::Light).await;

        let info = wav::parse_wav_info(&result.data).unwrap();
        assert_eq!(info.sample_rate, 8_000);
        assert_eq!(info.channels, 1);
    }

    #[tokio::test]
    async fn test_undecodable_input_returned_unchanged() {
        let input = b"ID3 definitely not a wav file".to_vec();
        let result = pipeline().compress(input.clone(), None, CompressionLevel::Heavy).await;

        assert_eq!(result.data, input);
        assert!(!result.is_applied());
    }
}

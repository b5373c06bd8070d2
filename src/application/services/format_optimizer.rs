//! Format Optimizer
//!
//! 根据资源大小与平台播放能力选择容器格式

use std::sync::Arc;

use crate::application::ports::{AudioCodecPort, AudioOutputPort, CodecError};
use crate::domain::audio::format;

const LARGE_ASSET_BYTES: u64 = 5 * 1024 * 1024;
const MEDIUM_ASSET_BYTES: u64 = 1024 * 1024;

/// 大文件优先最高压缩比的格式
const LARGE_TIER: &[&str] = &[
    format::WEBM_OPUS,
    format::OGG_OPUS,
    format::MP4_AAC,
    format::MPEG,
];
const MEDIUM_TIER: &[&str] = &[format::MPEG, format::MP4_AAC, format::OGG_VORBIS];
/// 小文件优先兼容性
const SMALL_TIER: &[&str] = &[format::MPEG, format::WAV];

/// 优化结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizedAudio {
    pub data: Vec<u8>,
    /// 最终数据的 MIME
    pub format: String,
}

pub struct FormatOptimizer {
    codec: Arc<dyn AudioCodecPort>,
    output: Arc<dyn AudioOutputPort>,
}

impl FormatOptimizer {
    pub fn new(codec: Arc<dyn AudioCodecPort>, output: Arc<dyn AudioOutputPort>) -> Self {
        Self { codec, output }
    }

    /// 平台能否播放该格式
    pub fn check_format_support(&self, mime: &str) -> bool {
        self.output.can_play(mime)
    }

    /// 按大小分档挑选首个可播放的格式；都不支持时保留原格式
    pub fn determine_optimal_format(&self, original_format: &str, size_bytes: u64) -> String {
        let tier = if size_bytes > LARGE_ASSET_BYTES {
            LARGE_TIER
        } else if size_bytes > MEDIUM_ASSET_BYTES {
            MEDIUM_TIER
        } else {
            SMALL_TIER
        };

        tier.iter()
            .find(|candidate| self.check_format_support(candidate))
            .map(|candidate| candidate.to_string())
            .unwrap_or_else(|| original_format.to_string())
    }

    /// 转换到目标格式（未指定时自动选择）
    ///
    /// 编解码器不支持目标格式时退回最小 WAV；任何失败返回原始数据
    pub async fn optimize_audio_format(
        &self,
        data: Vec<u8>,
        original_format: &str,
        target_format: Option<&str>,
    ) -> OptimizedAudio {
        let unchanged = |data: Vec<u8>| OptimizedAudio {
            data,
            format: original_format.to_string(),
        };

        let target = match target_format {
            Some(target) => target.to_string(),
            None => self.determine_optimal_format(original_format, data.len() as u64),
        };
        if format::same_format(&target, original_format) {
            return unchanged(data);
        }

        let effective = if self.codec.can_encode(&target) {
            target
        } else {
            format::WAV.to_string()
        };
        if format::same_format(&effective, original_format) {
            return unchanged(data);
        }

        let original = Arc::new(data);
        let input = Arc::clone(&original);
        let codec = Arc::clone(&self.codec);
        let hint = original_format.to_string();
        let mime = effective.clone();
        let result =
            tokio::task::spawn_blocking(move || reencode(codec.as_ref(), &input, &hint, &mime))
                .await;

        let recover = |original: Arc<Vec<u8>>| {
            Arc::try_unwrap(original).unwrap_or_else(|shared| shared.as_ref().clone())
        };

        match result {
            Ok(Ok(converted)) => {
                tracing::debug!(
                    from = %original_format,
                    to = %effective,
                    size_bytes = converted.len(),
                    "Audio format converted"
                );
                OptimizedAudio {
                    data: converted,
                    format: effective,
                }
            }
            Ok(Err(e)) => {
                tracing::warn!(
                    from = %original_format,
                    to = %effective,
                    error = %e,
                    "Format conversion failed, keeping original"
                );
                unchanged(recover(original))
            }
            Err(e) => {
                tracing::error!(error = %e, "Format conversion task panicked");
                unchanged(recover(original))
            }
        }
    }
}

fn reencode(
    codec: &dyn AudioCodecPort,
    data: &[u8],
    hint: &str,
    mime: &str,
) -> Result<Vec<u8>, CodecError> {
    let pcm = codec.decode(data, Some(hint))?;
    codec.encode(&pcm, mime)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{sine_wav, RecordingOutput, WavCodec};

    fn optimizer(formats: &[&str]) -> FormatOptimizer {
        FormatOptimizer::new(Arc::new(WavCodec), Arc::new(RecordingOutput::new(formats)))
    }

    #[test]
    fn test_size_tiers() {
        let all = optimizer(&[
            format::WEBM_OPUS,
            format::OGG_OPUS,
            format::MP4_AAC,
            format::MPEG,
            format::OGG_VORBIS,
            format::WAV,
        ]);
        assert_eq!(
            all.determine_optimal_format(format::WAV, 6 * 1024 * 1024),
            format::WEBM_OPUS
        );
        assert_eq!(
            all.determine_optimal_format(format::WAV, 2 * 1024 * 1024),
            format::MPEG
        );
        assert_eq!(all.determine_optimal_format(format::FLAC, 1000), format::MPEG);
    }

    #[test]
    fn test_tier_filtered_by_platform_support() {
        let safari_like = optimizer(&[format::MP4_AAC, format::WAV]);
        assert_eq!(
            safari_like.determine_optimal_format(format::WAV, 6 * 1024 * 1024),
            format::MP4_AAC
        );
        assert_eq!(safari_like.determine_optimal_format(format::FLAC, 10), format::WAV);

        let nothing = optimizer(&[]);
        assert_eq!(nothing.determine_optimal_format(format::FLAC, 10), format::FLAC);
    }

    #[tokio::test]
    async fn test_same_format_is_noop() {
        let data = sine_wav(0.1, 8_000, 1);
        let result = optimizer(&[format::WAV])
            .optimize_audio_format(data.clone(), "audio/x-wav", Some(format::WAV))
            .await;
        assert_eq!(result.data, data);
        assert_eq!(result.format, "audio/x-wav");
    }

    #[tokio::test]
    async fn test_unencodable_target_falls_back_to_wav() {
        let data = sine_wav(0.1, 8_000, 1);
        let result = optimizer(&[format::WAV, format::MPEG])
            .optimize_audio_format(data.clone(), format::WAV, Some(format::MPEG))
            .await;
        assert_eq!(result.format, format::WAV);
        assert_eq!(result.data, data);
    }

    #[tokio::test]
    async fn test_undecodable_input_kept() {
        let data = b"fLaC not really".to_vec();
        let result = optimizer(&[format::WAV])
            .optimize_audio_format(data.clone(), format::FLAC, Some(format::WAV))
            .await;
        assert_eq!(result.data, data);
        assert_eq!(result.format, format::FLAC);
    }
}

//! Simulated Audio Output
//!
//! 无声卡环境（守护进程、CI）下的输出设备：按缓冲时长计时，不真正发声

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio_util::sync::CancellationToken;

use crate::application::ports::{AudioOutputPort, OutputError};
use crate::config::OutputConfig;
use crate::domain::audio::{format, PcmAudio};

pub struct SimulatedAudioOutput {
    supported_formats: Vec<String>,
    played_ms: AtomicU64,
}

impl SimulatedAudioOutput {
    pub fn new(config: &OutputConfig) -> Self {
        Self {
            supported_formats: config.supported_formats.clone(),
            played_ms: AtomicU64::new(0),
        }
    }

    /// 累计“播放”时长
    pub fn played_ms(&self) -> u64 {
        self.played_ms.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl AudioOutputPort for SimulatedAudioOutput {
    fn can_play(&self, mime: &str) -> bool {
        self.supported_formats
            .iter()
            .any(|supported| format::same_format(supported, mime))
    }

    async fn play(
        &self,
        audio: PcmAudio,
        looping: bool,
        stop: CancellationToken,
    ) -> Result<(), OutputError> {
        if audio.channels == 0 || audio.sample_rate == 0 {
            return Err(OutputError::PlaybackFailed(
                "Buffer without channels or sample rate".to_string(),
            ));
        }

        let duration = audio.duration();
        tracing::debug!(
            duration_ms = audio.duration_ms(),
            sample_rate = audio.sample_rate,
            channels = audio.channels,
            looping = looping,
            "Simulated playback started"
        );

        if duration.is_zero() {
            if looping {
                stop.cancelled().await;
            }
            return Ok(());
        }

        loop {
            tokio::select! {
                _ = stop.cancelled() => break,
                _ = tokio::time::sleep(duration) => {
                    self.played_ms.fetch_add(audio.duration_ms(), Ordering::Relaxed);
                    if !looping {
                        break;
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn output() -> SimulatedAudioOutput {
        SimulatedAudioOutput::new(&OutputConfig {
            supported_formats: vec![format::WAV.to_string(), format::MPEG.to_string()],
        })
    }

    #[test]
    fn test_can_play_normalizes_mime() {
        let output = output();
        assert!(output.can_play("audio/x-wav"));
        assert!(output.can_play("audio/mp3"));
        assert!(!output.can_play(format::WEBM_OPUS));
    }

    #[tokio::test(start_paused = true)]
    async fn test_plays_for_buffer_duration() {
        let output = output();
        let audio = PcmAudio::silence(Duration::from_millis(500), 8_000, 1);

        let start = tokio::time::Instant::now();
        output
            .play(audio, false, CancellationToken::new())
            .await
            .unwrap();

        assert!(start.elapsed() >= Duration::from_millis(500));
        assert_eq!(output.played_ms(), 500);
    }

    #[tokio::test(start_paused = true)]
    async fn test_loops_until_cancelled() {
        let output = std::sync::Arc::new(output());
        let stop = CancellationToken::new();
        let audio = PcmAudio::silence(Duration::from_millis(250), 8_000, 1);

        let task = tokio::spawn({
            let output = output.clone();
            let stop = stop.clone();
            async move { output.play(audio, true, stop).await }
        });

        tokio::time::sleep(Duration::from_millis(1_100)).await;
        stop.cancel();
        task.await.unwrap().unwrap();

        assert_eq!(output.played_ms(), 1_000);
    }

    #[tokio::test]
    async fn test_rejects_empty_format() {
        let output = output();
        let result = output
            .play(PcmAudio::new(vec![], 0, 0), false, CancellationToken::new())
            .await;
        assert!(matches!(result, Err(OutputError::PlaybackFailed(_))));
    }
}

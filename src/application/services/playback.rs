//! Playback Engine
//!
//! 把缓存中的音频渲染到输出设备（音量、淡入淡出、循环），或播放合成的兜底提示音

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::loader::{AudioLoader, LoadOptions};
use crate::application::ports::{AudioCodecPort, AudioOutputPort};
use crate::domain::audio::{BeepPattern, CachePriority, PcmAudio, BEEP_SAMPLE_RATE};

pub type EndedCallback = Box<dyn FnOnce() + Send>;

/// 播放选项
pub struct PlaybackOptions {
    /// 0.0 - 1.0
    pub volume: f32,
    pub looping: bool,
    pub fade_in: Option<Duration>,
    /// 循环播放时忽略
    pub fade_out: Option<Duration>,
    pub on_ended: Option<EndedCallback>,
}

impl Default for PlaybackOptions {
    fn default() -> Self {
        Self {
            volume: 1.0,
            looping: false,
            fade_in: None,
            fade_out: None,
            on_ended: None,
        }
    }
}

/// 正在播放的声音
#[derive(Debug, Clone)]
pub struct PlaybackHandle {
    id: Uuid,
    stop: CancellationToken,
    ended: watch::Receiver<bool>,
}

impl PlaybackHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn stop(&self) {
        self.stop.cancel();
    }

    pub fn is_ended(&self) -> bool {
        *self.ended.borrow()
    }

    /// 等待播放结束（自然结束或被停止）
    pub async fn wait_ended(&self) {
        let mut ended = self.ended.clone();
        let _ = ended.wait_for(|ended| *ended).await;
    }
}

pub struct PlaybackEngine {
    loader: AudioLoader,
    codec: Arc<dyn AudioCodecPort>,
    output: Arc<dyn AudioOutputPort>,
    active: Arc<DashMap<Uuid, CancellationToken>>,
}

impl PlaybackEngine {
    pub fn new(
        loader: AudioLoader,
        codec: Arc<dyn AudioCodecPort>,
        output: Arc<dyn AudioOutputPort>,
    ) -> Self {
        Self {
            loader,
            codec,
            output,
            active: Arc::new(DashMap::new()),
        }
    }

    /// 从缓存（或网络）取得音频并播放
    ///
    /// 加载或解码失败返回 None，调用方负责降级
    pub async fn play_audio_file(
        &self,
        url: &str,
        options: PlaybackOptions,
    ) -> Option<PlaybackHandle> {
        let load_options = LoadOptions {
            priority: CachePriority::High,
            ..LoadOptions::default()
        };
        let entry = match self.loader.load_audio_file(url, load_options).await {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Audio unavailable for playback");
                return None;
            }
        };
        if entry.payload.audio().is_none() {
            tracing::warn!(cache_key = %entry.id, "Cache entry has no audio payload");
            return None;
        }

        let codec = Arc::clone(&self.codec);
        let decoded = tokio::task::spawn_blocking(move || {
            let data = entry.payload.as_bytes();
            codec.decode(data, Some(entry.metadata.format.as_str()))
        })
        .await;

        let pcm = match decoded {
            Ok(Ok(pcm)) => pcm,
            Ok(Err(e)) => {
                tracing::warn!(url = %url, error = %e, "Failed to decode audio for playback");
                return None;
            }
            Err(e) => {
                tracing::error!(url = %url, error = %e, "Decode task panicked");
                return None;
            }
        };

        let segments = render_segments(pcm, &options);
        tracing::info!(
            url = %url,
            volume = options.volume,
            looping = options.looping,
            "Starting audio playback"
        );
        Some(self.start(segments, options.on_ended))
    }

    /// 兜底提示音：纯合成，不依赖缓存、网络或编解码
    pub fn play_fallback_beep(&self, pattern: BeepPattern) -> PlaybackHandle {
        tracing::info!(pulses = pattern.pulse_count(), "Playing fallback beep");
        let pcm = pattern.render(BEEP_SAMPLE_RATE);
        self.start(vec![(pcm, false)], None)
    }

    pub fn stop_all(&self) {
        for sound in self.active.iter() {
            sound.value().cancel();
        }
        self.active.clear();
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    fn start(
        &self,
        segments: Vec<(PcmAudio, bool)>,
        on_ended: Option<EndedCallback>,
    ) -> PlaybackHandle {
        let id = Uuid::new_v4();
        let stop = CancellationToken::new();
        let (ended_tx, ended_rx) = watch::channel(false);
        self.active.insert(id, stop.clone());

        let output = Arc::clone(&self.output);
        let active = Arc::clone(&self.active);
        let token = stop.clone();
        tokio::spawn(async move {
            for (audio, looping) in segments {
                if token.is_cancelled() {
                    break;
                }
                if let Err(e) = output.play(audio, looping, token.clone()).await {
                    tracing::warn!(playback_id = %id, error = %e, "Playback failed");
                    break;
                }
            }

            active.remove(&id);
            if let Some(callback) = on_ended {
                callback();
            }
            let _ = ended_tx.send(true);
            tracing::debug!(playback_id = %id, "Playback ended");
        });

        PlaybackHandle {
            id,
            stop,
            ended: ended_rx,
        }
    }
}

/// 应用增益包络并拆分播放段
///
/// 循环播放时淡入只作用于第一遍，之后循环未处理淡入的缓冲
fn render_segments(pcm: PcmAudio, options: &PlaybackOptions) -> Vec<(PcmAudio, bool)> {
    if options.looping {
        let mut body = pcm;
        body.apply_gain_envelope(options.volume, None, None);
        match options.fade_in {
            Some(fade_in) => {
                let mut intro = body.clone();
                intro.apply_gain_envelope(1.0, Some(fade_in), None);
                vec![(intro, false), (body, true)]
            }
            None => vec![(body, true)],
        }
    } else {
        let mut once = pcm;
        once.apply_gain_envelope(options.volume, options.fade_in, options.fade_out);
        vec![(once, false)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::{
        AudioCache, CompressionPipeline, FormatOptimizer, SharedPreloadConfig,
    };
    use crate::application::testing::{
        sine_wav, FakeFetcher, MemoryCacheStore, RecordingOutput, WavCodec,
    };
    use crate::config::AudioPreloadConfig;
    use crate::domain::audio::{format, BEEP_SPACING};
    use std::sync::atomic::{AtomicBool, Ordering};

    fn engine(fetcher: FakeFetcher, output: Arc<RecordingOutput>) -> PlaybackEngine {
        let config = SharedPreloadConfig::new(AudioPreloadConfig::default());
        let cache = AudioCache::new(Arc::new(MemoryCacheStore::default()), 1024 * 1024).arc();
        let codec = Arc::new(WavCodec);
        let loader = AudioLoader::new(
            cache,
            Arc::new(fetcher),
            Arc::new(CompressionPipeline::new(codec.clone())),
            Arc::new(FormatOptimizer::new(codec.clone(), output.clone())),
            config,
        );
        PlaybackEngine::new(loader, codec, output)
    }

    #[tokio::test(start_paused = true)]
    async fn test_fallback_beep_triple() {
        let output = Arc::new(RecordingOutput::new(&[format::WAV]));
        let engine = engine(FakeFetcher::status(404), output.clone());

        let handle = engine.play_fallback_beep(BeepPattern::Triple);
        handle.wait_ended().await;

        let played = output.played.lock().unwrap();
        assert_eq!(played.len(), 1);
        let (pcm, looping) = &played[0];
        assert!(!looping);
        assert_eq!(pcm.sample_rate, BEEP_SAMPLE_RATE);
        assert_eq!(BeepPattern::Triple.pulses().len(), 3);
        assert_eq!(
            BeepPattern::Triple.pulses()[2].offset,
            BEEP_SPACING * 2
        );
        assert_eq!(engine.active_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_audio_file_applies_volume() {
        let output = Arc::new(RecordingOutput::new(&[format::WAV]));
        let engine = engine(
            FakeFetcher::ok(sine_wav(0.5, 8_000, 1), format::WAV),
            output.clone(),
        );
        let ended = Arc::new(AtomicBool::new(false));
        let flag = ended.clone();

        let handle = engine
            .play_audio_file(
                "https://x/wake.wav",
                PlaybackOptions {
                    volume: 0.5,
                    on_ended: Some(Box::new(move || flag.store(true, Ordering::SeqCst))),
                    ..PlaybackOptions::default()
                },
            )
            .await
            .unwrap();
        handle.wait_ended().await;

        assert!(handle.is_ended());
        assert!(ended.load(Ordering::SeqCst));
        let played = output.played.lock().unwrap();
        assert!(played[0].0.peak() <= 0.26);
    }

    #[tokio::test(start_paused = true)]
    async fn test_looping_plays_until_stopped() {
        let output = Arc::new(RecordingOutput::new(&[format::WAV]));
        let engine = engine(
            FakeFetcher::ok(sine_wav(0.5, 8_000, 1), format::WAV),
            output.clone(),
        );

        let handle = engine
            .play_audio_file(
                "https://x/loop.wav",
                PlaybackOptions {
                    looping: true,
                    fade_in: Some(Duration::from_millis(100)),
                    ..PlaybackOptions::default()
                },
            )
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(!handle.is_ended());
        assert_eq!(engine.active_count(), 1);

        engine.stop_all();
        handle.wait_ended().await;

        let played = output.played.lock().unwrap();
        assert_eq!(played.len(), 2);
        assert!(!played[0].1);
        assert!(played[1].1);
        assert_eq!(played[0].0.samples[0], 0.0);
    }

    #[tokio::test]
    async fn test_unavailable_audio_returns_none() {
        let output = Arc::new(RecordingOutput::new(&[format::WAV]));
        let engine = engine(FakeFetcher::status(503), output.clone());

        let handle = engine
            .play_audio_file("https://x/down.wav", PlaybackOptions::default())
            .await;
        assert!(handle.is_none());
        assert_eq!(output.play_count(), 0);
    }

    #[test]
    fn test_fade_out_ignored_when_looping() {
        let pcm = PcmAudio::new(vec![1.0; 100], 100, 1);
        let segments = render_segments(
            pcm,
            &PlaybackOptions {
                looping: true,
                fade_out: Some(Duration::from_millis(500)),
                ..PlaybackOptions::default()
            },
        );
        assert_eq!(segments.len(), 1);
        assert_eq!(*segments[0].0.samples.last().unwrap(), 1.0);
    }
}

//! Alarm Audio Engine
//!
//! 组装各服务的门面，负责初始化与关闭；由调用方注入所有端口实现

use chrono::NaiveDateTime;
use std::sync::Arc;

use super::audio_cache::AudioCache;
use super::compression::CompressionPipeline;
use super::format_optimizer::FormatOptimizer;
use super::loader::AudioLoader;
use super::playback::{PlaybackEngine, PlaybackHandle, PlaybackOptions};
use super::preload_scheduler::{PreloadReport, PreloadScheduler};
use super::shared_config::SharedPreloadConfig;
use super::tts_generator::TtsGenerator;
use crate::application::error::EngineError;
use crate::application::ports::{
    AudioCodecPort, AudioFetcherPort, AudioOutputPort, CacheStorePort, SpeechSynthesizerPort,
};
use crate::config::AudioPreloadConfig;
use crate::domain::alarm::AlarmRecord;
use crate::domain::audio::BeepPattern;

/// 引擎依赖的端口实现
pub struct EngineDeps {
    pub store: Arc<dyn CacheStorePort>,
    pub fetcher: Arc<dyn AudioFetcherPort>,
    pub codec: Arc<dyn AudioCodecPort>,
    pub synthesizer: Arc<dyn SpeechSynthesizerPort>,
    pub output: Arc<dyn AudioOutputPort>,
    /// 朗读语言，例如 "en-US"
    pub lang: String,
}

/// 闹钟响起时实际播放的声音
#[derive(Debug)]
pub enum AlarmSound {
    /// 用户自定义铃声（循环）
    CustomSound(PlaybackHandle),
    /// 语音文案（每 30 秒重复）
    Voice,
    /// 兜底提示音
    FallbackBeep(PlaybackHandle),
}

pub struct AlarmAudioEngine {
    config: SharedPreloadConfig,
    cache: Arc<AudioCache>,
    loader: AudioLoader,
    tts: Arc<TtsGenerator>,
    scheduler: PreloadScheduler,
    playback: PlaybackEngine,
}

impl AlarmAudioEngine {
    pub fn new(config: AudioPreloadConfig, deps: EngineDeps) -> Self {
        let cache = AudioCache::new(deps.store, config.max_cache_size_bytes).arc();
        let config = SharedPreloadConfig::new(config);

        let compression = Arc::new(CompressionPipeline::new(Arc::clone(&deps.codec)));
        let optimizer = Arc::new(FormatOptimizer::new(
            Arc::clone(&deps.codec),
            Arc::clone(&deps.output),
        ));
        let loader = AudioLoader::new(
            Arc::clone(&cache),
            deps.fetcher,
            compression,
            optimizer,
            config.clone(),
        );
        let tts = TtsGenerator::new(Arc::clone(&cache), deps.synthesizer, deps.lang).arc();
        let scheduler = PreloadScheduler::new(loader.clone(), Arc::clone(&tts), config.clone());
        let playback = PlaybackEngine::new(loader.clone(), deps.codec, deps.output);

        Self {
            config,
            cache,
            loader,
            tts,
            scheduler,
            playback,
        }
    }

    /// 重建缓存索引并清理过期条目
    pub async fn init(&self) -> Result<usize, EngineError> {
        let entries = self.cache.init().await?;
        tracing::info!(entries = entries, "Alarm audio engine initialized");
        Ok(entries)
    }

    /// 停止所有声音、取消进行中的加载并刷盘
    pub async fn shutdown(&self) -> Result<(), EngineError> {
        self.stop_all();
        self.loader.cancel_all();
        self.cache.flush().await?;
        tracing::info!("Alarm audio engine shut down");
        Ok(())
    }

    pub fn config(&self) -> AudioPreloadConfig {
        self.config.snapshot()
    }

    /// 运行时更新配置，下一次操作即生效
    pub fn update_config(&self, config: AudioPreloadConfig) {
        self.cache.set_max_size(config.max_cache_size_bytes);
        tracing::info!(
            preload_distance_minutes = config.preload_distance_minutes,
            max_cache_size_bytes = config.max_cache_size_bytes,
            compression_enabled = config.compression_enabled,
            "Preload config updated"
        );
        self.config.replace(config);
    }

    pub async fn preload_critical_assets(
        &self,
        alarms: &[AlarmRecord],
        now: NaiveDateTime,
    ) -> PreloadReport {
        self.scheduler.preload_critical_assets(alarms, now).await
    }

    /// 闹钟响铃：自定义铃声 → 语音文案 → 兜底提示音，总能发出声音
    pub async fn trigger_alarm(&self, alarm: &AlarmRecord) -> AlarmSound {
        if let Some(url) = &alarm.custom_sound {
            let options = PlaybackOptions {
                looping: true,
                ..PlaybackOptions::default()
            };
            if let Some(handle) = self.playback.play_audio_file(url, options).await {
                return AlarmSound::CustomSound(handle);
            }
            tracing::warn!(alarm_id = %alarm.id, "Custom sound unavailable, falling back to voice");
        }

        if self.tts.play_tts_message(alarm, true).await {
            return AlarmSound::Voice;
        }

        tracing::warn!(alarm_id = %alarm.id, "Voice message failed, playing fallback beep");
        AlarmSound::FallbackBeep(self.playback.play_fallback_beep(BeepPattern::Triple))
    }

    /// 停止所有正在播放的声音与重复朗读
    pub fn stop_all(&self) {
        self.playback.stop_all();
        self.tts.stop_all();
    }

    pub fn cache(&self) -> &Arc<AudioCache> {
        &self.cache
    }

    pub fn loader(&self) -> &AudioLoader {
        &self.loader
    }

    pub fn tts(&self) -> &Arc<TtsGenerator> {
        &self.tts
    }

    pub fn playback(&self) -> &PlaybackEngine {
        &self.playback
    }
}

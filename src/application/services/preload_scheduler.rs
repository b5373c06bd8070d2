//! Preload Scheduler
//!
//! 只决定“哪些资源需要提前就绪”，自身不管理定时器；由调用方周期触发

use chrono::{Duration, NaiveDateTime};
use futures_util::future::{join_all, BoxFuture, FutureExt};
use std::sync::Arc;

use super::loader::{AudioLoader, LoadOptions};
use super::shared_config::SharedPreloadConfig;
use super::tts_generator::TtsGenerator;
use crate::domain::alarm::AlarmRecord;
use crate::domain::audio::CachePriority;

/// 一轮预加载的结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreloadReport {
    /// 落在预加载窗口内的闹钟数
    pub alarms_in_window: usize,
    pub succeeded: usize,
    pub failed: usize,
}

pub struct PreloadScheduler {
    loader: AudioLoader,
    tts: Arc<TtsGenerator>,
    config: SharedPreloadConfig,
}

impl PreloadScheduler {
    pub fn new(loader: AudioLoader, tts: Arc<TtsGenerator>, config: SharedPreloadConfig) -> Self {
        Self {
            loader,
            tts,
            config,
        }
    }

    /// 启用且下次响铃落在 `[now, now + window]` 内的闹钟
    pub fn upcoming_alarms<'a>(
        &self,
        alarms: &'a [AlarmRecord],
        now: NaiveDateTime,
    ) -> Vec<&'a AlarmRecord> {
        let window = Duration::minutes(self.config.snapshot().preload_distance_minutes as i64);
        alarms
            .iter()
            .filter(|alarm| alarm.fires_within(now, window))
            .collect()
    }

    /// 并发预加载窗口内所有闹钟的 TTS 文案与自定义铃声
    ///
    /// 单个资源失败只记录日志，不影响其他资源
    pub async fn preload_critical_assets(
        &self,
        alarms: &[AlarmRecord],
        now: NaiveDateTime,
    ) -> PreloadReport {
        let upcoming = self.upcoming_alarms(alarms, now);
        if upcoming.is_empty() {
            tracing::debug!(total_alarms = alarms.len(), "No alarms inside preload window");
            return PreloadReport::default();
        }

        let mut tasks: Vec<BoxFuture<'_, bool>> = Vec::new();
        for alarm in &upcoming {
            tasks.push(self.preload_tts(alarm).boxed());
            if let Some(url) = &alarm.custom_sound {
                tasks.push(self.preload_sound(alarm, url).boxed());
            }
        }

        let results = join_all(tasks).await;
        let succeeded = results.iter().filter(|ok| **ok).count();
        let report = PreloadReport {
            alarms_in_window: upcoming.len(),
            succeeded,
            failed: results.len() - succeeded,
        };

        tracing::info!(
            alarms_in_window = report.alarms_in_window,
            succeeded = report.succeeded,
            failed = report.failed,
            "Preload cycle finished"
        );
        report
    }

    async fn preload_tts(&self, alarm: &AlarmRecord) -> bool {
        match self
            .tts
            .preload_message(alarm, CachePriority::Critical)
            .await
        {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(alarm_id = %alarm.id, error = %e, "Failed to preload TTS message");
                false
            }
        }
    }

    async fn preload_sound(&self, alarm: &AlarmRecord, url: &str) -> bool {
        let options = LoadOptions {
            priority: CachePriority::Critical,
            preloaded: true,
            alarm_id: Some(alarm.id.clone()),
            ..LoadOptions::default()
        };
        match self.loader.load_audio_file(url, options).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(
                    alarm_id = %alarm.id,
                    url = %url,
                    error = %e,
                    "Failed to preload custom sound"
                );
                false
            }
        }
    }
}

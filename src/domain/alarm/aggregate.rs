//! Alarm Context - 闹钟记录
//!
//! 闹钟由外部调度模块拥有，本引擎只读取，不做修改

use chrono::{Datelike, Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::{AlarmTime, VoiceMood};

/// 闹钟记录
///
/// `days` 使用 0 = 周日 ... 6 = 周六；为空表示每天
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmRecord {
    pub id: String,
    pub time: AlarmTime,
    #[serde(default)]
    pub label: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub days: Vec<u8>,
    pub voice_mood: VoiceMood,
    #[serde(default)]
    pub custom_sound: Option<String>,
}

fn default_enabled() -> bool {
    true
}

impl AlarmRecord {
    pub fn new(id: impl Into<String>, time: AlarmTime, voice_mood: VoiceMood) -> Self {
        Self {
            id: id.into(),
            time,
            label: String::new(),
            enabled: true,
            days: Vec::new(),
            voice_mood,
            custom_sound: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_days(mut self, days: Vec<u8>) -> Self {
        self.days = days;
        self
    }

    pub fn with_custom_sound(mut self, url: impl Into<String>) -> Self {
        self.custom_sound = Some(url.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    fn rings_on(&self, weekday_from_sunday: u32) -> bool {
        self.days.is_empty() || self.days.iter().any(|d| *d as u32 == weekday_from_sunday)
    }

    /// 计算 `now` 之后（含）最近一次响铃时间
    pub fn next_occurrence(&self, now: NaiveDateTime) -> Option<NaiveDateTime> {
        (0..=7).find_map(|offset| {
            let date = now.date() + Duration::days(offset);
            let candidate = date.and_time(self.time.as_naive());
            (candidate >= now && self.rings_on(date.weekday().num_days_from_sunday()))
                .then_some(candidate)
        })
    }

    /// 是否在 `[now, now + window]` 内响铃
    pub fn fires_within(&self, now: NaiveDateTime, window: Duration) -> bool {
        self.enabled
            && self
                .next_occurrence(now)
                .map(|next| next <= now + window)
                .unwrap_or(false)
    }
}

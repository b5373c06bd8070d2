//! Alarm Context - Value Objects

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use super::AlarmError;

/// 语音情绪
///
/// 与 UI 层和闹钟调度器共享的固定 6 值契约
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VoiceMood {
    DrillSergeant,
    SweetAngel,
    AnimeHero,
    SavageRoast,
    Motivational,
    Gentle,
}

impl VoiceMood {
    pub const ALL: [VoiceMood; 6] = [
        VoiceMood::DrillSergeant,
        VoiceMood::SweetAngel,
        VoiceMood::AnimeHero,
        VoiceMood::SavageRoast,
        VoiceMood::Motivational,
        VoiceMood::Gentle,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VoiceMood::DrillSergeant => "drill-sergeant",
            VoiceMood::SweetAngel => "sweet-angel",
            VoiceMood::AnimeHero => "anime-hero",
            VoiceMood::SavageRoast => "savage-roast",
            VoiceMood::Motivational => "motivational",
            VoiceMood::Gentle => "gentle",
        }
    }
}

impl std::fmt::Display for VoiceMood {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for VoiceMood {
    type Err = AlarmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VoiceMood::ALL
            .into_iter()
            .find(|mood| mood.as_str() == s)
            .ok_or_else(|| AlarmError::InvalidVoiceMood(s.to_string()))
    }
}

/// 闹钟时间 ("HH:MM", 24 小时制)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AlarmTime(NaiveTime);

impl AlarmTime {
    pub fn new(hour: u32, minute: u32) -> Result<Self, AlarmError> {
        NaiveTime::from_hms_opt(hour, minute, 0)
            .map(Self)
            .ok_or_else(|| AlarmError::InvalidTime(format!("{:02}:{:02}", hour, minute)))
    }

    pub fn parse(s: &str) -> Result<Self, AlarmError> {
        let (hour, minute) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| AlarmError::InvalidTime(s.to_string()))?;
        let hour: u32 = hour
            .parse()
            .map_err(|_| AlarmError::InvalidTime(s.to_string()))?;
        let minute: u32 = minute
            .parse()
            .map_err(|_| AlarmError::InvalidTime(s.to_string()))?;
        Self::new(hour, minute).map_err(|_| AlarmError::InvalidTime(s.to_string()))
    }

    pub fn as_naive(&self) -> NaiveTime {
        self.0
    }

    /// 12 小时制朗读格式，例如 "7:05 AM"
    pub fn spoken(&self) -> String {
        let (is_pm, hour) = self.0.hour12();
        format!(
            "{}:{:02} {}",
            hour,
            self.0.minute(),
            if is_pm { "PM" } else { "AM" }
        )
    }
}

impl std::fmt::Display for AlarmTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.0.hour(), self.0.minute())
    }
}

impl TryFrom<String> for AlarmTime {
    type Error = AlarmError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AlarmTime> for String {
    fn from(value: AlarmTime) -> Self {
        value.to_string()
    }
}

//! Alarm Context - Errors

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AlarmError {
    #[error("无效的闹钟时间: {0}")]
    InvalidTime(String),

    #[error("无效的语音情绪: {0}")]
    InvalidVoiceMood(String),

    #[error("无效的星期: {0}")]
    InvalidWeekday(u8),
}

//! Alarm Context - 闹钟（外部输入）

mod aggregate;
mod errors;
mod mood;
mod value_objects;

pub use aggregate::AlarmRecord;
pub use errors::AlarmError;
pub use mood::{render_template, MoodProfile, VoicePreference};
pub use value_objects::{AlarmTime, VoiceMood};

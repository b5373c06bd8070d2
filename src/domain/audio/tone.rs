//! 兜底提示音
//!
//! 纯合成、无外部依赖：缓存、网络、TTS 全部失败时仍能发声

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::PcmAudio;

pub const BEEP_FREQUENCY_HZ: f32 = 880.0;
pub const BEEP_PULSE: Duration = Duration::from_millis(200);
pub const BEEP_SPACING: Duration = Duration::from_millis(600);
pub const BEEP_SAMPLE_RATE: u32 = 44_100;
const BEEP_AMPLITUDE: f32 = 0.8;
/// 每个脉冲首尾的渐变，避免爆音
const BEEP_EDGE: Duration = Duration::from_millis(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BeepPattern {
    Single,
    Double,
    #[default]
    Triple,
}

/// 单个提示音脉冲
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TonePulse {
    pub offset: Duration,
    pub duration: Duration,
    pub frequency_hz: f32,
}

impl BeepPattern {
    pub fn pulse_count(&self) -> usize {
        match self {
            BeepPattern::Single => 1,
            BeepPattern::Double => 2,
            BeepPattern::Triple => 3,
        }
    }

    pub fn pulses(&self) -> Vec<TonePulse> {
        (0..self.pulse_count())
            .map(|i| TonePulse {
                offset: BEEP_SPACING * i as u32,
                duration: BEEP_PULSE,
                frequency_hz: BEEP_FREQUENCY_HZ,
            })
            .collect()
    }

    /// 渲染为单声道 PCM
    pub fn render(&self, sample_rate: u32) -> PcmAudio {
        let pulses = self.pulses();
        let total = pulses
            .last()
            .map(|p| p.offset + p.duration)
            .unwrap_or_default();
        let mut pcm = PcmAudio::silence(total, sample_rate, 1);
        let to_frames = |d: Duration| (d.as_secs_f64() * sample_rate as f64).round() as usize;
        let edge = to_frames(BEEP_EDGE).max(1);

        for pulse in pulses {
            let start = to_frames(pulse.offset);
            let len = to_frames(pulse.duration);
            for i in 0..len {
                let Some(sample) = pcm.samples.get_mut(start + i) else {
                    break;
                };
                let t = i as f32 / sample_rate as f32;
                let envelope = (i.min(len - 1 - i) as f32 / edge as f32).min(1.0);
                *sample = (t * pulse.frequency_hz * std::f32::consts::TAU).sin()
                    * BEEP_AMPLITUDE
                    * envelope;
            }
        }

        pcm
    }
}

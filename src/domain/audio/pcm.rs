//! PCM 音频缓冲与简单 DSP
//!
//! - 最近邻重采样
//! - 声道下混（直接丢弃多余声道）
//! - 增益 / 线性淡入淡出

use std::time::Duration;

/// 交错排列的 f32 PCM 样本
#[derive(Debug, Clone, PartialEq)]
pub struct PcmAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl PcmAudio {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    pub fn silence(duration: Duration, sample_rate: u32, channels: u16) -> Self {
        let frames = (duration.as_secs_f64() * sample_rate as f64).round() as usize;
        Self::new(vec![0.0; frames * channels as usize], sample_rate, channels)
    }

    /// 每声道样本数
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames() as f64 / self.sample_rate as f64)
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration().as_millis() as u64
    }

    /// 最近邻重采样
    ///
    /// 输出帧 `i` 取源帧 `floor(i * L_in / L_out)`
    pub fn resample_nearest(&self, target_rate: u32) -> PcmAudio {
        if target_rate == self.sample_rate || self.sample_rate == 0 || target_rate == 0 {
            return self.clone();
        }

        let channels = self.channels as usize;
        let in_frames = self.frames() as u64;
        let out_frames = in_frames * target_rate as u64 / self.sample_rate as u64;
        let mut samples = Vec::with_capacity(out_frames as usize * channels);

        for i in 0..out_frames {
            let src = (i * in_frames / out_frames) as usize;
            let start = src * channels;
            samples.extend_from_slice(&self.samples[start..start + channels]);
        }

        PcmAudio::new(samples, target_rate, self.channels)
    }

    /// 声道下混：保留前 `min(channels, target)` 个声道
    pub fn mix_down(&self, target_channels: u16) -> PcmAudio {
        let keep = self.channels.min(target_channels.max(1));
        if keep == self.channels {
            return self.clone();
        }

        let channels = self.channels as usize;
        let samples = self
            .samples
            .chunks_exact(channels)
            .flat_map(|frame| frame[..keep as usize].iter().copied())
            .collect();

        PcmAudio::new(samples, self.sample_rate, keep)
    }

    /// 应用音量与线性淡入淡出（以播放时钟/样本帧为准）
    pub fn apply_gain_envelope(
        &mut self,
        volume: f32,
        fade_in: Option<Duration>,
        fade_out: Option<Duration>,
    ) {
        let volume = volume.clamp(0.0, 1.0);
        let frames = self.frames();
        let channels = self.channels.max(1) as usize;
        let to_frames = |d: Option<Duration>| {
            d.map(|d| ((d.as_secs_f64() * self.sample_rate as f64) as usize).min(frames))
                .unwrap_or(0)
        };
        let fade_in_frames = to_frames(fade_in);
        let fade_out_frames = to_frames(fade_out);

        // 不足一帧的尾部样本直接静音
        let whole = frames * channels;
        for sample in &mut self.samples[whole..] {
            *sample = 0.0;
        }

        for (index, frame) in self.samples.chunks_exact_mut(channels).enumerate() {
            let mut gain = volume;
            if index < fade_in_frames {
                gain *= index as f32 / fade_in_frames as f32;
            }
            let remaining = frames.saturating_sub(index);
            if remaining <= fade_out_frames {
                gain *= remaining.saturating_sub(1) as f32 / fade_out_frames as f32;
            }
            for sample in frame {
                *sample *= gain;
            }
        }
    }

    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(frames: usize, sample_rate: u32, channels: u16) -> PcmAudio {
        let samples = (0..frames)
            .flat_map(|i| (0..channels).map(move |c| i as f32 + c as f32 * 0.5))
            .collect();
        PcmAudio::new(samples, sample_rate, channels)
    }

    #[test]
    fn test_resample_nearest_index_mapping() {
        let pcm = ramp(10, 10, 1);
        let down = pcm.resample_nearest(5);
        assert_eq!(down.frames(), 5);
        assert_eq!(down.samples, vec![0.0, 2.0, 4.0, 6.0, 8.0]);

        let up = pcm.resample_nearest(20);
        assert_eq!(up.frames(), 20);
        assert_eq!(&up.samples[..4], &[0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_resample_keeps_channel_interleaving() {
        let pcm = ramp(8, 8, 2);
        let down = pcm.resample_nearest(4);
        assert_eq!(down.channels, 2);
        assert_eq!(down.samples, vec![0.0, 0.5, 2.0, 2.5, 4.0, 4.5, 6.0, 6.5]);
    }

    #[test]
    fn test_mix_down_drops_extra_channels() {
        let pcm = ramp(3, 8, 2);
        let mono = pcm.mix_down(1);
        assert_eq!(mono.channels, 1);
        assert_eq!(mono.samples, vec![0.0, 1.0, 2.0]);

        // 目标声道多于源声道时不做任何处理
        let same = mono.mix_down(2);
        assert_eq!(same, mono);
    }

    #[test]
    fn test_gain_envelope_fades() {
        let mut pcm = PcmAudio::new(vec![1.0; 100], 100, 1);
        pcm.apply_gain_envelope(0.5, Some(Duration::from_secs(1)), None);
        assert_eq!(pcm.samples[0], 0.0);
        assert!((pcm.samples[50] - 0.25).abs() < 1e-6);

        let mut pcm = PcmAudio::new(vec![1.0; 100], 100, 1);
        pcm.apply_gain_envelope(1.0, None, Some(Duration::from_millis(100)));
        assert_eq!(pcm.samples[99], 0.0);
        assert!(pcm.samples[0] > 0.98);
    }

    #[test]
    fn test_gain_envelope_partial_frame() {
        let mut pcm = PcmAudio::new(vec![1.0; 401], 100, 2);
        pcm.apply_gain_envelope(
            1.0,
            Some(Duration::from_millis(500)),
            Some(Duration::from_millis(500)),
        );
        assert_eq!(pcm.frames(), 200);
        assert_eq!(pcm.samples[400], 0.0);
        assert_eq!(pcm.samples[398], 0.0);
        assert!(pcm.samples[200] > 0.9);
    }

    #[test]
    fn test_duration() {
        let pcm = PcmAudio::silence(Duration::from_millis(500), 16_000, 2);
        assert_eq!(pcm.frames(), 8_000);
        assert_eq!(pcm.duration_ms(), 500);
    }
}

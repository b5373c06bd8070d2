//! 压缩等级与参数表

use serde::{Deserialize, Serialize};

/// 压缩等级
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CompressionLevel {
    #[default]
    None,
    Light,
    Medium,
    Heavy,
}

/// 单个压缩等级对应的重编码参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressionSettings {
    pub sample_rate: u32,
    pub channels: u16,
    /// 编码质量 (0.0 - 1.0)，仅对可插拔的有损编码器有意义
    pub quality: f32,
}

impl CompressionLevel {
    pub fn settings(&self) -> Option<CompressionSettings> {
        let (sample_rate, channels, quality) = match self {
            CompressionLevel::None => return None,
            CompressionLevel::Light => (22_050, 1, 0.8),
            CompressionLevel::Medium => (16_000, 1, 0.6),
            CompressionLevel::Heavy => (8_000, 1, 0.4),
        };
        Some(CompressionSettings {
            sample_rate,
            channels,
            quality,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CompressionLevel::None => "none",
            CompressionLevel::Light => "light",
            CompressionLevel::Medium => "medium",
            CompressionLevel::Heavy => "heavy",
        }
    }
}

impl std::fmt::Display for CompressionLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

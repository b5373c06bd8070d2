//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;

use crate::domain::audio::format;

/// 应用主配置
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    /// 预加载策略（运行时可修改）
    #[serde(default)]
    pub preload: AudioPreloadConfig,

    /// 预加载调度循环
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// 缓存存储配置
    #[serde(default)]
    pub cache: CacheConfig,

    /// 网络配置
    #[serde(default)]
    pub network: NetworkConfig,

    /// TTS 服务配置
    #[serde(default)]
    pub tts: TtsConfig,

    /// 输出设备配置
    #[serde(default)]
    pub output: OutputConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 预加载配置
///
/// 启动时设置一次，之后可通过引擎修改
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AudioPreloadConfig {
    /// 闹钟响铃前多少分钟开始预加载
    #[serde(default = "default_preload_distance")]
    pub preload_distance_minutes: u32,

    /// 缓存总大小上限（字节）
    #[serde(default = "default_max_cache_size")]
    pub max_cache_size_bytes: u64,

    /// 是否启用自动压缩
    #[serde(default = "default_compression_enabled")]
    pub compression_enabled: bool,

    /// 首选目标格式 (MIME)，为空时自动选择
    #[serde(default)]
    pub preferred_format: Option<String>,

    /// 超过该大小（字节）时自动压缩
    #[serde(default = "default_auto_compress_threshold")]
    pub auto_compress_threshold_bytes: u64,
}

fn default_preload_distance() -> u32 {
    10
}

fn default_max_cache_size() -> u64 {
    100 * 1024 * 1024 // 100 MB
}

fn default_compression_enabled() -> bool {
    true
}

fn default_auto_compress_threshold() -> u64 {
    1024 * 1024 // 1 MB
}

impl Default for AudioPreloadConfig {
    fn default() -> Self {
        Self {
            preload_distance_minutes: default_preload_distance(),
            max_cache_size_bytes: default_max_cache_size(),
            compression_enabled: default_compression_enabled(),
            preferred_format: None,
            auto_compress_threshold_bytes: default_auto_compress_threshold(),
        }
    }
}

/// 预加载调度循环配置
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// 闹钟列表 JSON 文件
    #[serde(default = "default_alarms_file")]
    pub alarms_file: PathBuf,

    /// 调度间隔（秒）
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
}

fn default_alarms_file() -> PathBuf {
    PathBuf::from("data/alarms.json")
}

fn default_interval() -> u64 {
    60
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            alarms_file: default_alarms_file(),
            interval_secs: default_interval(),
        }
    }
}

/// 缓存存储配置
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Sled 数据库路径
    #[serde(default = "default_cache_path")]
    pub db_path: PathBuf,
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("data/audio-cache.sled")
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            db_path: default_cache_path(),
        }
    }
}

/// 网络配置
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    /// 请求超时时间（秒）
    #[serde(default = "default_network_timeout")]
    pub timeout_secs: u64,

    /// 连接超时时间（秒）
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_network_timeout() -> u64 {
    120
}

fn default_connect_timeout() -> u64 {
    10
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_network_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

/// TTS 服务配置
#[derive(Debug, Clone, Deserialize)]
pub struct TtsConfig {
    /// TTS 服务基础 URL
    #[serde(default = "default_tts_url")]
    pub url: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_tts_timeout")]
    pub timeout_secs: u64,

    /// 朗读语言
    #[serde(default = "default_tts_lang")]
    pub lang: String,
}

fn default_tts_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_tts_timeout() -> u64 {
    30
}

fn default_tts_lang() -> String {
    "en-US".to_string()
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            url: default_tts_url(),
            timeout_secs: default_tts_timeout(),
            lang: default_tts_lang(),
        }
    }
}

/// 输出设备配置
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// 平台可播放的格式 (MIME)
    #[serde(default = "default_supported_formats")]
    pub supported_formats: Vec<String>,
}

fn default_supported_formats() -> Vec<String> {
    vec![
        format::WAV.to_string(),
        format::MPEG.to_string(),
        format::MP4_AAC.to_string(),
        format::OGG_VORBIS.to_string(),
    ]
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            supported_formats: default_supported_formats(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

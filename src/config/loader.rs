//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// # 环境变量示例
/// - `REVEIL_PRELOAD__PRELOAD_DISTANCE_MINUTES=15`
/// - `REVEIL_PRELOAD__MAX_CACHE_SIZE_BYTES=52428800`
/// - `REVEIL_TTS__URL=http://tts-server:8000`
/// - `REVEIL_CACHE__DB_PATH=/data/cache.sled`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    builder = builder
        .set_default("preload.preload_distance_minutes", 10)?
        .set_default("preload.max_cache_size_bytes", 100_u64 * 1024 * 1024)?
        .set_default("preload.compression_enabled", true)?
        .set_default("preload.auto_compress_threshold_bytes", 1024 * 1024)?
        .set_default("scheduler.alarms_file", "data/alarms.json")?
        .set_default("scheduler.interval_secs", 60)?
        .set_default("cache.db_path", "data/audio-cache.sled")?
        .set_default("network.timeout_secs", 120)?
        .set_default("network.connect_timeout_secs", 10)?
        .set_default("tts.url", "http://localhost:8000")?
        .set_default("tts.timeout_secs", 30)?
        .set_default("tts.lang", "en-US")?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级）
    // 前缀: REVEIL_，层级分隔符: __
    builder = builder.add_source(
        Environment::with_prefix("REVEIL")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.preload.preload_distance_minutes == 0 {
        return Err(ConfigError::ValidationError(
            "Preload distance cannot be 0".to_string(),
        ));
    }

    if config.preload.max_cache_size_bytes == 0 {
        return Err(ConfigError::ValidationError(
            "Max cache size cannot be 0".to_string(),
        ));
    }

    if config.scheduler.interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "Scheduler interval cannot be 0".to_string(),
        ));
    }

    if config.tts.url.is_empty() {
        return Err(ConfigError::ValidationError(
            "TTS URL cannot be empty".to_string(),
        ));
    }

    if config.output.supported_formats.is_empty() {
        return Err(ConfigError::ValidationError(
            "Output must support at least one format".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Preload Distance: {} min", config.preload.preload_distance_minutes);
    tracing::info!("Max Cache Size: {} bytes", config.preload.max_cache_size_bytes);
    tracing::info!("Compression Enabled: {}", config.preload.compression_enabled);
    if let Some(format) = &config.preload.preferred_format {
        tracing::info!("Preferred Format: {}", format);
    }
    tracing::info!("Alarms File: {:?}", config.scheduler.alarms_file);
    tracing::info!("Scheduler Interval: {}s", config.scheduler.interval_secs);
    tracing::info!("Cache Database: {:?}", config.cache.db_path);
    tracing::info!("TTS URL: {}", config.tts.url);
    tracing::info!("Output Formats: {}", config.output.supported_formats.join(", "));
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_passes_for_valid_config() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_zero_distance() {
        let mut config = AppConfig::default();
        config.preload.preload_distance_minutes = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_zero_cache_size() {
        let mut config = AppConfig::default();
        config.preload.max_cache_size_bytes = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_empty_tts_url() {
        let mut config = AppConfig::default();
        config.tts.url = String::new();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reveil.toml");
        std::fs::write(
            &path,
            r#"
[preload]
preload_distance_minutes = 25
compression_enabled = false
preferred_format = "audio/wav"

[output]
supported_formats = ["audio/wav"]
"#,
        )
        .unwrap();

        let config = load_config_from_path(Some(&path)).unwrap();
        assert_eq!(config.preload.preload_distance_minutes, 25);
        assert!(!config.preload.compression_enabled);
        assert_eq!(config.preload.preferred_format.as_deref(), Some("audio/wav"));
        assert_eq!(config.output.supported_formats, vec!["audio/wav".to_string()]);
        assert_eq!(config.scheduler.interval_secs, 60);
    }
}

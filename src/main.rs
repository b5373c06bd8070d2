//! Reveil - 闹钟音频预加载守护进程
//!
//! 周期读取闹钟列表，提前缓存即将响铃闹钟的语音文案与自定义铃声

use anyhow::Context;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use reveil::config::{load_config, print_config, LogConfig};
use reveil::domain::alarm::AlarmRecord;
use reveil::infrastructure::{
    HttpAudioFetcher, HttpSpeechSynthesizer, SimulatedAudioOutput, SledCacheStore, SymphoniaCodec,
};
use reveil::{AlarmAudioEngine, EngineDeps};

fn init_tracing(log: &LogConfig) {
    let log_filter = format!("{},reveil={}", log.level, log.level);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if log.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// 读取闹钟列表；文件不存在视为没有闹钟
async fn read_alarms(path: &Path) -> anyhow::Result<Vec<AlarmRecord>> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "Alarms file not found");
            return Ok(Vec::new());
        }
        Err(e) => return Err(e).with_context(|| format!("Failed to read {}", path.display())),
    };
    serde_json::from_str(&raw).with_context(|| format!("Invalid alarms file {}", path.display()))
}

async fn preload_cycle(engine: &AlarmAudioEngine, alarms_file: &Path) {
    let alarms = match read_alarms(alarms_file).await {
        Ok(alarms) => alarms,
        Err(e) => {
            tracing::warn!(error = %e, "Skipping preload cycle");
            return;
        }
    };

    let now = chrono::Local::now().naive_local();
    engine.preload_critical_assets(&alarms, now).await;

    match engine.cache().purge_expired().await {
        Ok(0) => {}
        Ok(purged) => tracing::info!(purged = purged, "Expired cache entries purged"),
        Err(e) => tracing::warn!(error = %e, "Failed to purge expired entries"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config.log);

    tracing::info!("Reveil - 闹钟音频预加载守护进程");
    print_config(&config);

    if let Some(parent) = config.cache.db_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let codec = Arc::new(SymphoniaCodec::new());
    let output = Arc::new(SimulatedAudioOutput::new(&config.output));
    let synthesizer = Arc::new(HttpSpeechSynthesizer::new(
        &config.tts,
        codec.clone(),
        output.clone(),
    )?);
    let deps = EngineDeps {
        store: SledCacheStore::open(&config.cache.db_path)?.arc(),
        fetcher: Arc::new(HttpAudioFetcher::new(&config.network)?),
        codec,
        synthesizer,
        output,
        lang: config.tts.lang.clone(),
    };

    let engine = AlarmAudioEngine::new(config.preload.clone(), deps);
    engine.init().await?;

    let mut ticker = tokio::time::interval(Duration::from_secs(config.scheduler.interval_secs));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    tracing::info!(
        alarms_file = %config.scheduler.alarms_file.display(),
        interval_secs = config.scheduler.interval_secs,
        "Preload loop started"
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                preload_cycle(&engine, &config.scheduler.alarms_file).await;
            }
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    tracing::error!(error = %e, "Failed to listen for shutdown signal");
                }
                tracing::info!("Received shutdown signal");
                break;
            }
        }
    }

    engine.shutdown().await?;
    tracing::info!("Shutdown complete");

    Ok(())
}

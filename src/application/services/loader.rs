//! Audio Loader
//!
//! 获取网络音频并写入缓存：
//! 1. 缓存命中（未过期且有负载）直接返回，不做任何 I/O
//! 2. 同一 key 已有加载在进行时，复用同一个结果（请求合并）
//! 3. 流式 GET；已知长度且开启渐进模式时逐块上报进度
//! 4. 格式优化 → 压缩 → 持久化
//!
//! 失败不做自动重试，也不缓存失败结果

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use futures_util::StreamExt;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

use super::audio_cache::AudioCache;
use super::compression::CompressionPipeline;
use super::format_optimizer::FormatOptimizer;
use super::progress::ProgressPublisher;
use super::shared_config::SharedPreloadConfig;
use crate::application::error::LoadError;
use crate::application::ports::{AudioFetcherPort, FetchResponse};
use crate::domain::audio::{
    format, wav, AudioCacheEntry, AudioLoadProgress, CachePriority, CompressionLevel,
};

pub type ProgressCallback = Arc<dyn Fn(&AudioLoadProgress) + Send + Sync>;

type SharedLoad = Shared<BoxFuture<'static, Result<Arc<AudioCacheEntry>, LoadError>>>;

/// 加载选项
#[derive(Clone)]
pub struct LoadOptions {
    pub priority: CachePriority,
    /// 已知长度时逐块读取并上报进度
    pub progressive: bool,
    pub on_progress: Option<ProgressCallback>,
    /// 缓存 key，默认使用 URL
    pub cache_key: Option<String>,
    /// 为 None 时按配置自动决定
    pub compression: Option<CompressionLevel>,
    pub optimize_format: bool,
    pub target_format: Option<String>,
    pub preloaded: bool,
    pub alarm_id: Option<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            priority: CachePriority::Medium,
            progressive: true,
            on_progress: None,
            cache_key: None,
            compression: None,
            optimize_format: true,
            target_format: None,
            preloaded: false,
            alarm_id: None,
        }
    }
}

impl std::fmt::Debug for LoadOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadOptions")
            .field("priority", &self.priority)
            .field("progressive", &self.progressive)
            .field("on_progress", &self.on_progress.is_some())
            .field("cache_key", &self.cache_key)
            .field("compression", &self.compression)
            .field("optimize_format", &self.optimize_format)
            .field("target_format", &self.target_format)
            .field("preloaded", &self.preloaded)
            .field("alarm_id", &self.alarm_id)
            .finish()
    }
}

struct InFlightLoad {
    result: SharedLoad,
    cancel: CancellationToken,
}

/// 音频加载器
///
/// 可廉价克隆，所有克隆共享同一个 in-flight 表
#[derive(Clone)]
pub struct AudioLoader {
    cache: Arc<AudioCache>,
    fetcher: Arc<dyn AudioFetcherPort>,
    compression: Arc<CompressionPipeline>,
    optimizer: Arc<FormatOptimizer>,
    config: SharedPreloadConfig,
    in_flight: Arc<DashMap<String, InFlightLoad>>,
    progress: Arc<ProgressPublisher>,
}

impl AudioLoader {
    pub fn new(
        cache: Arc<AudioCache>,
        fetcher: Arc<dyn AudioFetcherPort>,
        compression: Arc<CompressionPipeline>,
        optimizer: Arc<FormatOptimizer>,
        config: SharedPreloadConfig,
    ) -> Self {
        Self {
            cache,
            fetcher,
            compression,
            optimizer,
            config,
            in_flight: Arc::new(DashMap::new()),
            progress: Arc::new(ProgressPublisher::new()),
        }
    }

    pub async fn load_audio_file(
        &self,
        url: &str,
        options: LoadOptions,
    ) -> Result<Arc<AudioCacheEntry>, LoadError> {
        let key = options.cache_key.clone().unwrap_or_else(|| url.to_string());

        match self.cached(&key).await {
            Ok(Some(entry)) => {
                // 不会再有进度，结束提前订阅的流
                if !self.is_loading(&key) {
                    self.progress.close(&key);
                }
                return Ok(entry);
            }
            Ok(None) => {}
            Err(e) => {
                if !self.is_loading(&key) {
                    self.progress.close(&key);
                }
                return Err(e);
            }
        }

        let shared = match self.in_flight.entry(key.clone()) {
            Entry::Occupied(occupied) => {
                tracing::debug!(cache_key = %key, "Joining in-flight load");
                occupied.get().result.clone()
            }
            Entry::Vacant(vacant) => {
                let cancel = CancellationToken::new();
                let load = self
                    .clone()
                    .run_load(url.to_string(), key.clone(), options, cancel.clone())
                    .boxed()
                    .shared();
                vacant.insert(InFlightLoad {
                    result: load.clone(),
                    cancel,
                });
                load
            }
        };

        shared.await
    }

    /// 取消某个 key 的进行中加载，所有等待者都会收到 `LoadError::Cancelled`
    pub fn cancel(&self, cache_key: &str) -> bool {
        match self.in_flight.get(cache_key) {
            Some(load) => {
                tracing::info!(cache_key = %cache_key, "Cancelling audio load");
                load.cancel.cancel();
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&self) {
        for load in self.in_flight.iter() {
            load.cancel.cancel();
        }
    }

    pub fn is_loading(&self, cache_key: &str) -> bool {
        self.in_flight.contains_key(cache_key)
    }

    /// 订阅加载进度；加载结束或命中缓存时流结束
    pub fn subscribe_progress(
        &self,
        cache_key: &str,
    ) -> futures_util::stream::BoxStream<'static, AudioLoadProgress> {
        self.progress.subscribe(cache_key)
    }

    async fn cached(&self, key: &str) -> Result<Option<Arc<AudioCacheEntry>>, LoadError> {
        Ok(self.cache.get(key).await?.filter(|entry| entry.has_payload()))
    }

    async fn run_load(
        self,
        url: String,
        key: String,
        options: LoadOptions,
        cancel: CancellationToken,
    ) -> Result<Arc<AudioCacheEntry>, LoadError> {
        let started = Instant::now();

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(LoadError::Cancelled(key.clone())),
            result = self.fetch_and_store(&url, &key, &options, started) => result,
        };

        self.in_flight.remove(&key);
        self.progress.close(&key);

        match &result {
            Ok(entry) => tracing::info!(
                cache_key = %key,
                size_bytes = entry.size_bytes(),
                format = %entry.metadata.format,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Audio loaded"
            ),
            Err(e) => tracing::warn!(cache_key = %key, url = %url, error = %e, "Audio load failed"),
        }

        result
    }

    async fn fetch_and_store(
        &self,
        url: &str,
        key: &str,
        options: &LoadOptions,
        started: Instant,
    ) -> Result<Arc<AudioCacheEntry>, LoadError> {
        // 上一个同 key 加载可能刚刚完成
        if let Some(entry) = self.cached(key).await? {
            return Ok(entry);
        }

        tracing::info!(cache_key = %key, url = %url, "Loading audio");

        let response = self.fetcher.fetch(url).await?;
        let content_type = response.content_type.clone();
        let data = match response.content_length {
            Some(total) if options.progressive => {
                self.read_progressive(key, total, response, options, started)
                    .await?
            }
            _ => read_all(response).await?,
        };
        if data.is_empty() {
            return Err(LoadError::EmptyResponse(url.to_string()));
        }

        let original_format = detect_format(content_type.as_deref(), url);
        let config = self.config.snapshot();

        let (data, audio_format) = if options.optimize_format {
            let target = options
                .target_format
                .clone()
                .or(config.preferred_format.clone());
            let optimized = self
                .optimizer
                .optimize_audio_format(data, &original_format, target.as_deref())
                .await;
            (optimized.data, optimized.format)
        } else {
            (data, original_format)
        };

        let level = options.compression.unwrap_or_else(|| {
            if config.compression_enabled
                && data.len() as u64 > config.auto_compress_threshold_bytes
            {
                CompressionLevel::Light
            } else {
                CompressionLevel::None
            }
        });

        let compressed = self
            .compression
            .compress(data, Some(&audio_format), level)
            .await;
        let (audio_format, duration_ms) = if compressed.is_applied() {
            (format::WAV.to_string(), compressed.duration_ms)
        } else {
            let duration_ms = format::same_format(&audio_format, format::WAV)
                .then(|| wav::parse_wav_info(&compressed.data).ok())
                .flatten()
                .map(|info| info.duration_ms);
            (audio_format, duration_ms)
        };

        let entry = AudioCacheEntry::audio_file(key, compressed.data, audio_format)
            .with_priority(options.priority)
            .with_compression(compressed.level)
            .with_duration_ms(duration_ms)
            .with_alarm(options.alarm_id.clone())
            .preloaded(options.preloaded);

        Ok(self.cache.put(entry).await?)
    }

    async fn read_progressive(
        &self,
        key: &str,
        total: u64,
        response: FetchResponse,
        options: &LoadOptions,
        started: Instant,
    ) -> Result<Vec<u8>, LoadError> {
        const MAX_PREALLOCATE: u64 = 16 * 1024 * 1024;

        let mut body = response.body;
        let mut data = Vec::with_capacity(total.min(MAX_PREALLOCATE) as usize);

        while let Some(chunk) = body.next().await {
            data.extend_from_slice(&chunk?);

            let progress =
                AudioLoadProgress::measure(key, data.len() as u64, total, started.elapsed());
            self.progress.publish(&progress);
            if let Some(callback) = &options.on_progress {
                callback(&progress);
            }
        }

        Ok(data)
    }
}

async fn read_all(response: FetchResponse) -> Result<Vec<u8>, LoadError> {
    let mut body = response.body;
    let mut data = Vec::new();
    while let Some(chunk) = body.next().await {
        data.extend_from_slice(&chunk?);
    }
    Ok(data)
}

/// Content-Type 优先；缺失或是通用二进制类型时按扩展名猜测
fn detect_format(content_type: Option<&str>, url: &str) -> String {
    match content_type.map(format::normalize) {
        Some(mime) if mime.starts_with("audio/") => mime,
        _ => format::guess_from_url(url)
            .unwrap_or(format::MPEG)
            .to_string(),
    }
}

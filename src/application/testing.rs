//! 测试替身：各端口的内存实现

use async_trait::async_trait;
use dashmap::DashMap;
use futures_util::stream;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::application::ports::{
    AudioCodecPort, AudioFetcherPort, AudioOutputPort, CacheError, CacheStorePort, CodecError,
    FetchError, FetchResponse, OutputError, SpeechError, SpeechParams, SpeechSynthesizerPort,
    VoiceInfo,
};
use crate::domain::audio::{format, wav, AudioCacheEntry, PcmAudio};

/// 内存缓存存储
#[derive(Default)]
pub struct MemoryCacheStore {
    entries: DashMap<String, AudioCacheEntry>,
    pub puts: AtomicUsize,
}

impl MemoryCacheStore {
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// 绕过缓存层直接写入
    pub fn insert_raw(&self, entry: AudioCacheEntry) {
        self.entries.insert(entry.id.clone(), entry);
    }
}

#[async_trait]
impl CacheStorePort for MemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<AudioCacheEntry>, CacheError> {
        Ok(self.entries.get(key).map(|e| e.clone()))
    }

    async fn put(&self, entry: &AudioCacheEntry) -> Result<(), CacheError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.entries.insert(entry.id.clone(), entry.clone());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.entries.remove(key);
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<AudioCacheEntry>, CacheError> {
        Ok(self.entries.iter().map(|e| e.value().clone()).collect())
    }
}

/// 可编排的网络获取
pub struct FakeFetcher {
    body: Vec<u8>,
    content_type: Option<String>,
    status: Option<u16>,
    chunk_size: usize,
    delay: Duration,
    known_length: bool,
    pub calls: AtomicUsize,
}

impl FakeFetcher {
    pub fn ok(body: Vec<u8>, content_type: &str) -> Self {
        Self {
            body,
            content_type: Some(content_type.to_string()),
            status: None,
            chunk_size: 1024,
            delay: Duration::ZERO,
            known_length: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status: Some(status),
            ..Self::ok(Vec::new(), format::MPEG)
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn without_length(mut self) -> Self {
        self.known_length = false;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AudioFetcherPort for FakeFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if let Some(status) = self.status {
            return Err(FetchError::HttpStatus {
                status,
                url: url.to_string(),
            });
        }

        let chunks: Vec<Result<Vec<u8>, FetchError>> = self
            .body
            .chunks(self.chunk_size)
            .map(|c| Ok(c.to_vec()))
            .collect();

        Ok(FetchResponse {
            content_length: self.known_length.then_some(self.body.len() as u64),
            content_type: self.content_type.clone(),
            body: Box::pin(stream::iter(chunks)),
        })
    }
}

/// 只认识 PCM16 WAV 的编解码器
pub struct WavCodec;

impl AudioCodecPort for WavCodec {
    fn decode(&self, data: &[u8], _mime_hint: Option<&str>) -> Result<PcmAudio, CodecError> {
        wav::decode_wav(data).map_err(|e| CodecError::DecodingError(e.to_string()))
    }

    fn encode(&self, pcm: &PcmAudio, mime: &str) -> Result<Vec<u8>, CodecError> {
        if !format::same_format(mime, format::WAV) {
            return Err(CodecError::UnsupportedFormat(mime.to_string()));
        }
        Ok(wav::encode_wav(pcm))
    }

    fn can_encode(&self, mime: &str) -> bool {
        format::same_format(mime, format::WAV)
    }
}

/// 记录每次播放的输出设备
pub struct RecordingOutput {
    formats: Vec<String>,
    pub played: Mutex<Vec<(PcmAudio, bool)>>,
    fail: AtomicBool,
}

impl RecordingOutput {
    pub fn new(formats: &[&str]) -> Self {
        Self {
            formats: formats.iter().map(|f| f.to_string()).collect(),
            played: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
        }
    }

    pub fn failing(self) -> Self {
        self.fail.store(true, Ordering::SeqCst);
        self
    }

    pub fn play_count(&self) -> usize {
        self.played.lock().unwrap().len()
    }
}

#[async_trait]
impl AudioOutputPort for RecordingOutput {
    fn can_play(&self, mime: &str) -> bool {
        self.formats.iter().any(|f| format::same_format(f, mime))
    }

    async fn play(
        &self,
        audio: PcmAudio,
        looping: bool,
        stop: CancellationToken,
    ) -> Result<(), OutputError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(OutputError::DeviceUnavailable("test".to_string()));
        }
        let duration = audio.duration();
        self.played.lock().unwrap().push((audio, looping));
        if looping {
            stop.cancelled().await;
        } else {
            tokio::select! {
                _ = stop.cancelled() => {}
                _ = tokio::time::sleep(duration) => {}
            }
        }
        Ok(())
    }
}

/// 朗读行为
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechBehavior {
    /// 朗读耗时后正常结束
    Finish(Duration),
    /// 永不结束
    Hang,
    Fail,
}

pub struct ScriptedSynth {
    behavior: SpeechBehavior,
    voices: Vec<VoiceInfo>,
    pub spoken: Mutex<Vec<(String, SpeechParams)>>,
    pub cancels: AtomicUsize,
}

impl ScriptedSynth {
    pub fn new(behavior: SpeechBehavior) -> Self {
        Self {
            behavior,
            voices: vec![
                VoiceInfo {
                    name: "Google Deutsch".to_string(),
                    lang: "de-DE".to_string(),
                },
                VoiceInfo {
                    name: "Daniel".to_string(),
                    lang: "en-GB".to_string(),
                },
                VoiceInfo {
                    name: "Samantha".to_string(),
                    lang: "en-US".to_string(),
                },
            ],
            spoken: Mutex::new(Vec::new()),
            cancels: AtomicUsize::new(0),
        }
    }

    pub fn speak_count(&self) -> usize {
        self.spoken.lock().unwrap().len()
    }
}

#[async_trait]
impl SpeechSynthesizerPort for ScriptedSynth {
    async fn voices(&self) -> Vec<VoiceInfo> {
        self.voices.clone()
    }

    async fn speak(&self, text: &str, params: &SpeechParams) -> Result<(), SpeechError> {
        self.spoken
            .lock()
            .unwrap()
            .push((text.to_string(), params.clone()));
        match self.behavior {
            SpeechBehavior::Finish(duration) => {
                tokio::time::sleep(duration).await;
                Ok(())
            }
            SpeechBehavior::Hang => std::future::pending().await,
            SpeechBehavior::Fail => Err(SpeechError::SynthesisFailed("test".to_string())),
        }
    }

    fn cancel(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
    }
}

/// 生成一段测试用 WAV
pub fn sine_wav(seconds: f32, sample_rate: u32, channels: u16) -> Vec<u8> {
    let frames = (seconds * sample_rate as f32) as usize;
    let samples = (0..frames)
        .flat_map(|i| {
            let v = (i as f32 / sample_rate as f32 * 440.0 * std::f32::consts::TAU).sin() * 0.5;
            std::iter::repeat(v).take(channels as usize)
        })
        .collect();
    wav::encode_wav(&PcmAudio::new(samples, sample_rate, channels))
}

//! TTS Generator
//!
//! 按 voice mood 生成叫醒文案并驱动语音合成
//!
//! - 文案缓存 key 为 `tts_<alarmId>_<voiceMood>`，24 小时过期
//! - 单次朗读有 15 秒看门狗，超时视为失败
//! - 重复模式下每次朗读结束后间隔 30 秒再读，直到被停止
//! - 停止某个闹钟只打断它自己的朗读

use chrono::Utc;
use dashmap::DashMap;
use rand::seq::IndexedRandom;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::audio_cache::AudioCache;
use crate::application::ports::{CacheError, SpeechParams, SpeechSynthesizerPort, VoiceInfo};
use crate::domain::alarm::{render_template, AlarmRecord, VoiceMood, VoicePreference};
use crate::domain::audio::{tts_cache_key, AudioCacheEntry, CachePriority};

pub const SPEECH_WATCHDOG: Duration = Duration::from_secs(15);
pub const REPEAT_INTERVAL: Duration = Duration::from_secs(30);

const FEMALE_HINTS: &[&str] = &[
    "female", "woman", "samantha", "victoria", "karen", "moira", "tessa", "zira", "susan",
    "fiona",
];
const MALE_HINTS: &[&str] = &[
    "male", "daniel", "alex", "fred", "david", "mark", "george", "thomas",
];

struct RepeatHandle {
    generation: u64,
    cancel: CancellationToken,
}

pub struct TtsGenerator {
    cache: Arc<AudioCache>,
    synth: Arc<dyn SpeechSynthesizerPort>,
    lang: String,
    /// alarm_id -> 重复朗读任务
    repeats: Arc<DashMap<String, RepeatHandle>>,
    next_generation: AtomicU64,
    /// 当前正在朗读的 alarm_id
    speaking: Arc<Mutex<Option<String>>>,
}

impl TtsGenerator {
    pub fn new(
        cache: Arc<AudioCache>,
        synth: Arc<dyn SpeechSynthesizerPort>,
        lang: impl Into<String>,
    ) -> Self {
        Self {
            cache,
            synth,
            lang: lang.into(),
            repeats: Arc::new(DashMap::new()),
            next_generation: AtomicU64::new(0),
            speaking: Arc::new(Mutex::new(None)),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 从该 mood 的模板中随机选一条并填充
    pub fn generate_message(&self, alarm: &AlarmRecord) -> String {
        let template = alarm
            .voice_mood
            .templates()
            .choose(&mut rand::rng())
            .copied()
            .unwrap_or("It's {time}. Time for {label}.");
        render_template(template, &alarm.time.spoken(), &alarm.label)
    }

    /// 预生成文案并以指定优先级缓存
    ///
    /// 已有同等或更高优先级的条目时直接返回
    pub async fn preload_message(
        &self,
        alarm: &AlarmRecord,
        priority: CachePriority,
    ) -> Result<Arc<AudioCacheEntry>, CacheError> {
        let key = tts_cache_key(&alarm.id, alarm.voice_mood);
        let existing = self.cache.get(&key).await?;

        if let Some(entry) = &existing {
            if entry.priority >= priority {
                return Ok(Arc::clone(entry));
            }
        }

        let text = existing
            .as_ref()
            .and_then(|entry| entry.payload.text().map(str::to_string))
            .unwrap_or_else(|| self.generate_message(alarm));

        let entry = AudioCacheEntry::tts(&alarm.id, alarm.voice_mood, text, Utc::now())
            .with_priority(priority)
            .preloaded(true);
        let entry = self.cache.put(entry).await?;

        tracing::debug!(
            cache_key = %key,
            alarm_id = %alarm.id,
            priority = %priority,
            "TTS message preloaded"
        );
        Ok(entry)
    }

    /// 朗读叫醒文案
    ///
    /// 合成失败或看门狗超时返回 false，不会抛错
    pub async fn play_tts_message(&self, alarm: &AlarmRecord, repeat: bool) -> bool {
        self.stop(&alarm.id);

        let text = self.message_text(alarm).await;
        let params = self.speech_params(alarm.voice_mood).await;

        tracing::info!(
            alarm_id = %alarm.id,
            voice_mood = %alarm.voice_mood,
            voice = params.voice.as_deref().unwrap_or("default"),
            repeat = repeat,
            "Speaking alarm message"
        );

        if !speak_as(&self.speaking, &alarm.id, self.synth.as_ref(), &text, &params).await {
            return false;
        }

        if repeat {
            self.start_repeat(alarm.id.clone(), text, params);
        }
        true
    }

    /// 停止某个闹钟的重复朗读；正在朗读的若是它，一并打断
    pub fn stop(&self, alarm_id: &str) {
        if let Some((_, handle)) = self.repeats.remove(alarm_id) {
            handle.cancel.cancel();
            tracing::debug!(alarm_id = %alarm_id, "TTS repeat stopped");
        }
        if self.speaking_alarm().as_deref() == Some(alarm_id) {
            self.synth.cancel();
            tracing::debug!(alarm_id = %alarm_id, "TTS utterance interrupted");
        }
    }

    pub fn stop_all(&self) {
        for entry in self.repeats.iter() {
            entry.cancel.cancel();
        }
        self.repeats.clear();
        self.synth.cancel();
    }

    pub fn is_repeating(&self, alarm_id: &str) -> bool {
        self.repeats.contains_key(alarm_id)
    }

    pub fn speaking_alarm(&self) -> Option<String> {
        self.speaking
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    async fn message_text(&self, alarm: &AlarmRecord) -> String {
        let key = tts_cache_key(&alarm.id, alarm.voice_mood);
        match self.cache.get(&key).await {
            Ok(Some(entry)) => {
                if let Some(text) = entry.payload.text() {
                    return text.to_string();
                }
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(cache_key = %key, error = %e, "TTS cache lookup failed"),
        }

        let text = self.generate_message(alarm);
        let entry = AudioCacheEntry::tts(&alarm.id, alarm.voice_mood, text.clone(), Utc::now())
            .with_priority(CachePriority::High);
        if let Err(e) = self.cache.put(entry).await {
            tracing::warn!(cache_key = %key, error = %e, "Failed to cache TTS message");
        }
        text
    }

    async fn speech_params(&self, mood: VoiceMood) -> SpeechParams {
        let profile = mood.profile();
        let voices = self.synth.voices().await;
        SpeechParams {
            rate: profile.rate,
            pitch: profile.pitch,
            volume: profile.volume,
            voice: select_voice(&voices, profile.preference, &self.lang),
            lang: self.lang.clone(),
        }
    }

    fn start_repeat(&self, alarm_id: String, text: String, params: SpeechParams) {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let cancel = CancellationToken::new();
        self.repeats.insert(
            alarm_id.clone(),
            RepeatHandle {
                generation,
                cancel: cancel.clone(),
            },
        );

        let synth = Arc::clone(&self.synth);
        let repeats = Arc::clone(&self.repeats);
        let speaking = Arc::clone(&self.speaking);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(REPEAT_INTERVAL) => {}
                }

                let spoken = tokio::select! {
                    _ = cancel.cancelled() => break,
                    ok = speak_as(&speaking, &alarm_id, synth.as_ref(), &text, &params) => ok,
                };
                if !spoken {
                    tracing::warn!(alarm_id = %alarm_id, "TTS repeat aborted after failed utterance");
                    break;
                }
            }

            repeats.remove_if(&alarm_id, |_, handle| handle.generation == generation);
        });
    }
}

/// 朗读期间把 alarm_id 记为当前朗读者
async fn speak_as(
    speaking: &Mutex<Option<String>>,
    alarm_id: &str,
    synth: &dyn SpeechSynthesizerPort,
    text: &str,
    params: &SpeechParams,
) -> bool {
    set_speaking(speaking, alarm_id, true);
    let spoken = speak_with_watchdog(synth, text, params).await;
    set_speaking(speaking, alarm_id, false);
    spoken
}

fn set_speaking(speaking: &Mutex<Option<String>>, alarm_id: &str, active: bool) {
    let mut current = speaking
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    if active {
        *current = Some(alarm_id.to_string());
    } else if current.as_deref() == Some(alarm_id) {
        *current = None;
    }
}

async fn speak_with_watchdog(
    synth: &dyn SpeechSynthesizerPort,
    text: &str,
    params: &SpeechParams,
) -> bool {
    match tokio::time::timeout(SPEECH_WATCHDOG, synth.speak(text, params)).await {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Speech synthesis failed");
            false
        }
        Err(_) => {
            synth.cancel();
            tracing::warn!(
                timeout_secs = SPEECH_WATCHDOG.as_secs(),
                "Speech synthesis watchdog fired"
            );
            false
        }
    }
}

fn voice_matches(name: &str, preference: VoicePreference) -> bool {
    let name = name.to_ascii_lowercase();
    let female = FEMALE_HINTS.iter().any(|hint| name.contains(hint));
    match preference {
        VoicePreference::Female => female,
        VoicePreference::Male => !female && MALE_HINTS.iter().any(|hint| name.contains(hint)),
        VoicePreference::Any => true,
    }
}

/// 同语言声线中按名字关键词挑选；没有匹配时取同语言的第一个
fn select_voice(voices: &[VoiceInfo], preference: VoicePreference, lang: &str) -> Option<String> {
    let prefix = lang
        .split(['-', '_'])
        .next()
        .unwrap_or(lang)
        .to_ascii_lowercase();
    let same_lang: Vec<&VoiceInfo> = voices
        .iter()
        .filter(|v| v.lang.to_ascii_lowercase().starts_with(&prefix))
        .collect();
    let candidates = if same_lang.is_empty() {
        voices.iter().collect()
    } else {
        same_lang
    };

    candidates
        .iter()
        .find(|v| voice_matches(&v.name, preference))
        .or_else(|| candidates.first())
        .map(|v| v.name.clone())
}

//! TTS Adapter - HTTP 语音合成实现

mod http_speech_synthesizer;

pub use http_speech_synthesizer::HttpSpeechSynthesizer;

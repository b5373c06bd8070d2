//! HTTP Adapter - 网络音频获取

mod audio_fetcher;

pub use audio_fetcher::HttpAudioFetcher;

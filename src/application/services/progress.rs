//! Progress Publisher
//!
//! 每个缓存 key 一个 broadcast 通道，订阅者以 Stream 形式消费加载进度

use dashmap::DashMap;
use futures_util::stream::{self, BoxStream, StreamExt};
use tokio::sync::broadcast;

use crate::domain::audio::AudioLoadProgress;

const PROGRESS_CHANNEL_CAPACITY: usize = 64;

#[derive(Default)]
pub struct ProgressPublisher {
    channels: DashMap<String, broadcast::Sender<AudioLoadProgress>>,
}

impl ProgressPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// 订阅某个 key 的进度；可以早于加载开始
    ///
    /// 加载结束（成功、失败或取消）时流结束
    pub fn subscribe(&self, cache_key: &str) -> BoxStream<'static, AudioLoadProgress> {
        // 订阅者都已离开的通道不再保留
        self.channels.retain(|_, sender| sender.receiver_count() > 0);

        let receiver = self
            .channels
            .entry(cache_key.to_string())
            .or_insert_with(|| broadcast::channel(PROGRESS_CHANNEL_CAPACITY).0)
            .subscribe();

        stream::unfold(receiver, |mut receiver| async move {
            loop {
                match receiver.recv().await {
                    Ok(progress) => return Some((progress, receiver)),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::trace!(skipped = skipped, "Progress subscriber lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        })
        .boxed()
    }

    pub fn publish(&self, progress: &AudioLoadProgress) {
        if let Some(sender) = self.channels.get(&progress.cache_key) {
            // 没有订阅者时发送失败，忽略
            let _ = sender.send(progress.clone());
        }
    }

    /// 关闭通道，结束所有订阅流
    pub fn close(&self, cache_key: &str) {
        self.channels.remove(cache_key);
    }

    pub fn has_channel(&self, cache_key: &str) -> bool {
        self.channels.contains_key(cache_key)
    }
}

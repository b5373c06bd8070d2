//! 运行时可修改的预加载配置

use std::sync::{Arc, RwLock};

use crate::config::AudioPreloadConfig;

/// 各服务共享同一份配置，更新后下一次操作即生效
#[derive(Debug, Clone, Default)]
pub struct SharedPreloadConfig(Arc<RwLock<AudioPreloadConfig>>);

impl SharedPreloadConfig {
    pub fn new(config: AudioPreloadConfig) -> Self {
        Self(Arc::new(RwLock::new(config)))
    }

    pub fn snapshot(&self) -> AudioPreloadConfig {
        match self.0.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn replace(&self, config: AudioPreloadConfig) {
        match self.0.write() {
            Ok(mut guard) => *guard = config,
            Err(poisoned) => *poisoned.into_inner() = config,
        }
    }
}

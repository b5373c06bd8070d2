//! 加载进度（瞬态值，不持久化）

use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AudioLoadProgress {
    pub cache_key: String,
    pub loaded_bytes: u64,
    /// 未知时为 0
    pub total_bytes: u64,
    pub percentage: f64,
    /// 字节/秒
    pub speed_bps: f64,
    /// 预计剩余秒数
    pub eta_secs: Option<f64>,
}

impl AudioLoadProgress {
    /// speed = loaded / elapsed, eta = (total - loaded) / speed
    pub fn measure(cache_key: &str, loaded_bytes: u64, total_bytes: u64, elapsed: Duration) -> Self {
        let elapsed_secs = elapsed.as_secs_f64();
        let speed_bps = if elapsed_secs > 0.0 {
            loaded_bytes as f64 / elapsed_secs
        } else {
            0.0
        };
        let percentage = if total_bytes > 0 {
            (loaded_bytes as f64 / total_bytes as f64 * 100.0).min(100.0)
        } else {
            0.0
        };
        let eta_secs = (total_bytes > 0 && speed_bps > 0.0)
            .then(|| total_bytes.saturating_sub(loaded_bytes) as f64 / speed_bps);

        Self {
            cache_key: cache_key.to_string(),
            loaded_bytes,
            total_bytes,
            percentage,
            speed_bps,
            eta_secs,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.total_bytes > 0 && self.loaded_bytes >= self.total_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure_speed_and_eta() {
        let progress = AudioLoadProgress::measure("k", 500, 2_000, Duration::from_secs(2));
        assert_eq!(progress.percentage, 25.0);
        assert_eq!(progress.speed_bps, 250.0);
        assert_eq!(progress.eta_secs, Some(6.0));
        assert!(!progress.is_complete());
    }

    #[test]
    fn test_measure_unknown_total() {
        let progress = AudioLoadProgress::measure("k", 500, 0, Duration::ZERO);
        assert_eq!(progress.percentage, 0.0);
        assert_eq!(progress.eta_secs, None);
    }
}

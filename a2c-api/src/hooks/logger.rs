use a2c_core::trainer::{EpisodeHook, EpisodeStats};
use candle_core::Result;
use tracing::info;

/// Emits a progress line every `log_interval` episodes. Never stops training.
#[derive(Debug)]
pub struct LoggerHook {
    log_interval: usize,
}

impl LoggerHook {
    pub fn new(log_interval: usize) -> Self {
        Self {
            log_interval: log_interval.max(1),
        }
    }
}

impl EpisodeHook for LoggerHook {
    fn post_episode(&mut self, stats: &EpisodeStats) -> Result<bool> {
        if stats.episode % self.log_interval == 0 {
            info!(
                "episode: {:<5} steps: {:<4} reward: {:<6.1} running reward: {:<7.2} loss: {}",
                stats.episode,
                stats.steps,
                stats.episode_reward,
                stats.running_reward,
                stats
                    .loss
                    .map_or_else(|| "skipped".to_owned(), |loss| format!("{loss:.4}"))
            );
        }
        Ok(false)
    }
}

use a2c_core::trainer::{EpisodeHook, EpisodeStats};
use candle_core::Result;
use std::{cell::RefCell, rc::Rc};

/// Keeps the statistics of every episode, for reward curves after training. Clones share the
/// same storage, so keep one clone and hand the other to the trainer.
#[derive(Debug, Clone, Default)]
pub struct RewardRecorder {
    records: Rc<RefCell<Vec<EpisodeStats>>>,
}

impl RewardRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<EpisodeStats> {
        self.records.borrow().clone()
    }

    pub fn episode_rewards(&self) -> Vec<f32> {
        self.records
            .borrow()
            .iter()
            .map(|stats| stats.episode_reward)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }
}

impl EpisodeHook for RewardRecorder {
    fn post_episode(&mut self, stats: &EpisodeStats) -> Result<bool> {
        self.records.borrow_mut().push(stats.clone());
        Ok(false)
    }
}

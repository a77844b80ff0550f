use candle_core::{Result, bail};
use ringbuffer::{AllocRingBuffer, RingBuffer};

/// Sliding window over the most recent episode rewards with a running sum, so the average is
/// available in constant time.
#[derive(Debug)]
pub struct RewardHistory {
    rewards: AllocRingBuffer<f32>,
    sum: f32,
}

impl RewardHistory {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            bail!("reward history needs a positive capacity");
        }
        Ok(Self {
            rewards: AllocRingBuffer::new(capacity),
            sum: 0.,
        })
    }

    /// Appends `reward`, evicting and returning the oldest entry when the window is full.
    pub fn push(&mut self, reward: f32) -> Option<f32> {
        let evicted = if self.rewards.is_full() {
            self.rewards.front().copied()
        } else {
            None
        };
        let _ = self.rewards.enqueue(reward);
        self.sum += reward - evicted.unwrap_or(0.);
        evicted
    }

    pub fn running_average(&self) -> f32 {
        if self.rewards.is_empty() {
            0.
        } else {
            self.sum / self.rewards.len() as f32
        }
    }

    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.rewards.capacity()
    }

    pub fn is_full(&self) -> bool {
        self.rewards.is_full()
    }

    /// Oldest first.
    pub fn rewards(&self) -> Vec<f32> {
        self.rewards.iter().copied().collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn evicts_the_oldest_reward() -> Result<()> {
        let mut history = RewardHistory::new(3)?;
        for reward in [10., 20., 30.] {
            assert_eq!(history.push(reward), None);
        }
        assert_eq!(history.push(40.), Some(10.));
        assert_eq!(history.rewards(), vec![20., 30., 40.]);
        assert_eq!(history.running_average(), 30.);
        Ok(())
    }

    #[test]
    fn never_exceeds_capacity() -> Result<()> {
        let mut history = RewardHistory::new(5)?;
        for i in 0..100 {
            history.push(i as f32);
            assert!(history.len() <= history.capacity());
        }
        assert!(history.is_full());
        // 95..=99
        assert_eq!(history.running_average(), 97.);
        Ok(())
    }

    #[test]
    fn average_of_partial_window() -> Result<()> {
        let mut history = RewardHistory::new(10)?;
        assert_eq!(history.running_average(), 0.);
        history.push(4.);
        history.push(8.);
        assert_eq!(history.running_average(), 6.);
        assert_eq!(history.len(), 2);
        Ok(())
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert!(RewardHistory::new(0).is_err());
    }
}

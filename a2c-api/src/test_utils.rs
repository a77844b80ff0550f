use a2c_core::env::{Env, EnvironmentDescription, SnapShot, Space};
use candle_core::{Device, Result, Tensor, bail};

/// Terminates after exactly `length` steps whatever the agent does, paying `reward` per step.
/// Observations encode the remaining steps.
#[derive(Debug)]
pub struct FixedLengthEnv {
    pub length: usize,
    pub reward: f32,
    pub actions_taken: Vec<usize>,
    step: usize,
}

impl FixedLengthEnv {
    pub fn new(length: usize, reward: f32) -> Self {
        Self {
            length,
            reward,
            actions_taken: vec![],
            step: 0,
        }
    }

    fn observation(&self) -> Result<Tensor> {
        let remaining = (self.length - self.step) as f32;
        Tensor::new(&[remaining, 1.0], &Device::Cpu)
    }
}

impl Env for FixedLengthEnv {
    fn reset(&mut self, _seed: u64) -> Result<Tensor> {
        self.step = 0;
        self.observation()
    }

    fn step(&mut self, action: usize) -> Result<SnapShot> {
        if action > 1 {
            bail!("invalid action {action}");
        }
        if self.step >= self.length {
            bail!("episode already finished");
        }
        self.actions_taken.push(action);
        self.step += 1;
        Ok(SnapShot {
            state: self.observation()?,
            reward: self.reward,
            terminated: self.step == self.length,
            truncated: false,
        })
    }

    fn env_description(&self) -> EnvironmentDescription {
        EnvironmentDescription::new(Space::Continous { size: 2 }, Space::Discrete(2))
    }
}

/// An env with a continuous action space, which the trainer has to refuse.
#[derive(Debug, Default)]
pub struct ContinuousActionEnv;

impl Env for ContinuousActionEnv {
    fn reset(&mut self, _seed: u64) -> Result<Tensor> {
        Tensor::zeros(1, candle_core::DType::F32, &Device::Cpu)
    }

    fn step(&mut self, _action: usize) -> Result<SnapShot> {
        bail!("continuous env cannot take discrete actions")
    }

    fn env_description(&self) -> EnvironmentDescription {
        EnvironmentDescription::new(Space::Continous { size: 1 }, Space::Continous { size: 1 })
    }
}

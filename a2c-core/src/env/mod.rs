pub mod cartpole;
#[cfg(feature = "gym")]
pub mod gym;

use candle_core::{Result, Tensor};

#[derive(Debug, Clone, PartialEq)]
pub enum Space {
    Discrete(usize),
    Continous { size: usize },
}

impl Space {
    pub fn continous_from_dims(dims: Vec<usize>) -> Self {
        Self::Continous {
            size: dims.iter().product(),
        }
    }

    pub fn size(&self) -> usize {
        match &self {
            Self::Discrete(size) => *size,
            Self::Continous { size } => *size,
        }
    }

    pub fn is_discrete(&self) -> bool {
        matches!(self, Self::Discrete(_))
    }
}

#[derive(Debug, Clone)]
pub struct EnvironmentDescription {
    pub observation_space: Space,
    pub action_space: Space,
}

impl EnvironmentDescription {
    pub fn new(observation_space: Space, action_space: Space) -> Self {
        Self {
            observation_space,
            action_space,
        }
    }

    pub fn action_size(&self) -> usize {
        self.action_space.size()
    }

    pub fn observation_size(&self) -> usize {
        self.observation_space.size()
    }
}

/// The outcome of a single environment step.
#[derive(Debug, Clone)]
pub struct SnapShot {
    pub state: Tensor,
    pub reward: f32,
    pub terminated: bool,
    pub truncated: bool,
}

impl SnapShot {
    pub fn done(&self) -> bool {
        self.terminated || self.truncated
    }
}

pub trait Env {
    /// Starts a new episode and returns the first observation as a flat f32 tensor.
    fn reset(&mut self, seed: u64) -> Result<Tensor>;

    /// Advances the simulation with a discrete action.
    fn step(&mut self, action: usize) -> Result<SnapShot>;

    fn env_description(&self) -> EnvironmentDescription;
}

impl<E: Env + ?Sized> Env for Box<E> {
    fn reset(&mut self, seed: u64) -> Result<Tensor> {
        (**self).reset(seed)
    }

    fn step(&mut self, action: usize) -> Result<SnapShot> {
        (**self).step(action)
    }

    fn env_description(&self) -> EnvironmentDescription {
        (**self).env_description()
    }
}

use a2c_core::env::{Env, cartpole::CartPole};
use anyhow::{Result, bail};
use candle_core::Device;
use std::str::FromStr;

/// Which environment to train on, parsed from `cartpole` or `gym:<name>`.
#[derive(Debug, Clone, PartialEq)]
pub enum EnvType {
    CartPole,
    Gym { name: String },
}

impl FromStr for EnvType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "cartpole" | "CartPole" => Ok(Self::CartPole),
            _ => match s.strip_prefix("gym:") {
                Some(name) if !name.is_empty() => Ok(Self::Gym {
                    name: name.to_owned(),
                }),
                _ => bail!("unknown environment {s:?}, expected `cartpole` or `gym:<name>`"),
            },
        }
    }
}

pub struct EnvBuilder {
    pub env_type: EnvType,
    pub max_episode_steps: usize,
}

impl EnvBuilder {
    pub fn new(env_type: EnvType, max_episode_steps: usize) -> Self {
        Self {
            env_type,
            max_episode_steps,
        }
    }

    pub fn build(&self, device: &Device) -> Result<Box<dyn Env>> {
        match &self.env_type {
            EnvType::CartPole => Ok(Box::new(CartPole::new(
                self.max_episode_steps,
                device.clone(),
            ))),
            #[cfg(feature = "gym")]
            EnvType::Gym { name } => {
                let env = a2c_core::env::gym::GymEnv::new(name, None, device.clone())?;
                Ok(Box::new(env))
            }
            #[cfg(not(feature = "gym"))]
            EnvType::Gym { name } => {
                bail!("gym env {name} requested but the `gym` feature is not enabled")
            }
        }
    }
}

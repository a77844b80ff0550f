use crate::hooks::logger::LoggerHook;
use a2c_core::{
    env::Env,
    model::A2CModel,
    trainer::{Trainer, TrainerConfig},
};
use anyhow::{Result, bail};
use candle_core::Device;
use derive_more::{Deref, DerefMut};

#[derive(Debug, Clone, Deref, DerefMut)]
pub struct A2CBuilder {
    #[deref]
    #[deref_mut]
    pub trainer_config: TrainerConfig,
    pub hidden_layers: Vec<usize>,
    pub learning_rate: f64,
    pub max_grad_norm: Option<f32>,
    /// Episodes between two progress lines, 0 disables them.
    pub log_interval: usize,
    pub device: Device,
}

impl Default for A2CBuilder {
    fn default() -> Self {
        A2CBuilder {
            trainer_config: TrainerConfig::default(),
            hidden_layers: vec![128],
            learning_rate: 0.01,
            max_grad_norm: None,
            log_interval: 10,
            device: Device::Cpu,
        }
    }
}

impl A2CBuilder {
    pub fn build<E: Env>(&self, env: E) -> Result<Trainer<E, A2CModel>> {
        let env_description = env.env_description();
        if !env_description.action_space.is_discrete() {
            bail!(
                "a2c needs a discrete action space, got {:?}",
                env_description.action_space
            );
        }
        let model = A2CModel::new(
            env_description.observation_size(),
            env_description.action_size(),
            &self.hidden_layers,
            self.learning_rate,
            self.max_grad_norm,
            &self.device,
        )?;
        let mut trainer = Trainer::new(env, model, self.trainer_config.clone())?;
        if self.log_interval > 0 {
            trainer.add_hook(LoggerHook::new(self.log_interval));
        }
        Ok(trainer)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use a2c_core::env::cartpole::CartPole;

    #[test]
    fn deref_exposes_trainer_config() -> Result<()> {
        let mut builder = A2CBuilder::default();
        builder.gamma = 0.5;
        builder.max_episodes = 7;
        assert_eq!(builder.trainer_config.gamma, 0.5);
        let trainer = builder.build(CartPole::default())?;
        assert_eq!(trainer.config().max_episodes, 7);
        assert_eq!(trainer.model().learning_rate(), 0.01);
        Ok(())
    }
}

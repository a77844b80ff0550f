use a2c_core::{env::Env, model::PolicyValueModel};
use anyhow::Result;
use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationReport {
    pub episode_rewards: Vec<f32>,
    pub mean_reward: f32,
}

/// Plays a trained model greedily, without touching its parameters.
#[derive(Debug, Clone)]
pub struct Evaluator {
    pub eval_episodes: usize,
    pub max_steps: usize,
    pub seed: u64,
}

impl Evaluator {
    pub fn new(eval_episodes: usize, max_steps: usize, seed: u64) -> Self {
        Self {
            eval_episodes,
            max_steps,
            seed,
        }
    }

    pub fn evaluate<E: Env + ?Sized, M: PolicyValueModel + ?Sized>(
        &self,
        model: &M,
        env: &mut E,
    ) -> Result<EvaluationReport> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut episode_rewards = Vec::with_capacity(self.eval_episodes);
        for _ in 0..self.eval_episodes {
            let mut state = env.reset(rng.random())?;
            let mut episode_reward = 0f32;
            for _ in 0..self.max_steps {
                let action = model.greedy_action(&state)?;
                let snapshot = env.step(action)?;
                episode_reward += snapshot.reward;
                if snapshot.done() {
                    break;
                }
                state = snapshot.state;
            }
            episode_rewards.push(episode_reward);
        }
        let mean_reward = if episode_rewards.is_empty() {
            0.
        } else {
            episode_rewards.iter().sum::<f32>() / episode_rewards.len() as f32
        };
        info!(
            episodes = self.eval_episodes,
            mean_reward, "evaluation finished"
        );
        Ok(EvaluationReport {
            episode_rewards,
            mean_reward,
        })
    }
}

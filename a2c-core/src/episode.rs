use crate::{
    env::{Env, SnapShot},
    model::PolicyValueModel,
    tensors::{ActionProbs, ValuesPred},
};
use candle_core::{D, Error, IndexOp, Result, Tensor, bail};
use candle_nn::ops::softmax;
use rand::{Rng, distr::Distribution, distr::weighted::WeightedIndex};

/// Everything one episode produced that the update needs. The probability and value tensors are
/// still attached to the graph of the model that produced them.
#[derive(Debug, Default)]
pub struct Trajectory {
    action_probs: Vec<Tensor>,
    values: Vec<Tensor>,
    rewards: Vec<f32>,
    terminated: bool,
}

impl Trajectory {
    pub fn push_step(&mut self, action_prob: Tensor, value: Tensor, reward: f32) {
        self.action_probs.push(action_prob);
        self.values.push(value);
        self.rewards.push(reward);
    }

    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }

    pub fn rewards(&self) -> &[f32] {
        &self.rewards
    }

    pub fn total_reward(&self) -> f32 {
        self.rewards.iter().sum()
    }

    /// Whether the environment ended the episode, as opposed to the step cap or a truncation.
    pub fn terminated(&self) -> bool {
        self.terminated
    }

    pub fn action_probs(&self) -> Result<ActionProbs> {
        if self.is_empty() {
            bail!("empty trajectory has no action probabilities");
        }
        Ok(ActionProbs(Tensor::stack(&self.action_probs, 0)?))
    }

    pub fn values(&self) -> Result<ValuesPred> {
        if self.is_empty() {
            bail!("empty trajectory has no value estimates");
        }
        Ok(ValuesPred(Tensor::stack(&self.values, 0)?))
    }
}

/// Samples an action from the softmax of `scores` (shape `[actions]`). Returns the action with
/// its probability as a differentiable scalar.
pub fn sample_action<R: Rng + ?Sized>(scores: &Tensor, rng: &mut R) -> Result<(usize, Tensor)> {
    let probs = softmax(scores, D::Minus1)?;
    let weights: Vec<f32> = probs.to_vec1()?;
    let distribution = WeightedIndex::new(&weights).map_err(Error::wrap)?;
    let action = distribution.sample(rng);
    Ok((action, probs.i(action)?))
}

/// Plays one episode from `initial_state`, for at most `max_steps` steps.
pub fn run_episode<E, M, R>(
    initial_state: Tensor,
    model: &M,
    env: &mut E,
    rng: &mut R,
    max_steps: usize,
) -> Result<Trajectory>
where
    E: Env + ?Sized,
    M: PolicyValueModel + ?Sized,
    R: Rng + ?Sized,
{
    let mut trajectory = Trajectory::default();
    let mut state = initial_state;
    for _ in 0..max_steps {
        let (scores, values) = model.forward(&state.unsqueeze(0)?)?;
        let (action, action_prob) = sample_action(&scores.squeeze(0)?, rng)?;
        let SnapShot {
            state: next_state,
            reward,
            terminated,
            truncated,
        } = env.step(action)?;
        trajectory.push_step(action_prob, values.squeeze(0)?, reward);
        if terminated || truncated {
            trajectory.terminated = terminated;
            break;
        }
        state = next_state;
    }
    Ok(trajectory)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{env::cartpole::CartPole, model::A2CModel};
    use candle_core::Device;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn sampled_probability_matches_softmax() -> Result<()> {
        let scores = Tensor::new(&[0.0f32, 10.0, 0.0], &Device::Cpu)?;
        let mut rng = StdRng::seed_from_u64(3);
        let (action, prob) = sample_action(&scores, &mut rng)?;
        let expected: Vec<f32> = softmax(&scores, 0)?.to_vec1()?;
        assert!((prob.to_scalar::<f32>()? - expected[action]).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn step_cap_bounds_the_trajectory() -> Result<()> {
        let model = A2CModel::new(4, 2, &[16], 0.01, None, &Device::Cpu)?;
        let mut env = CartPole::default();
        let mut rng = StdRng::seed_from_u64(0);
        let state = env.reset(0)?;
        let trajectory = run_episode(state, &model, &mut env, &mut rng, 5)?;
        assert!(trajectory.len() <= 5);
        assert!(!trajectory.is_empty());
        assert_eq!(trajectory.action_probs()?.dims1()?, trajectory.len());
        assert_eq!(trajectory.values()?.dims1()?, trajectory.len());
        assert_eq!(trajectory.total_reward(), trajectory.len() as f32);
        Ok(())
    }

    #[test]
    fn zero_step_cap_yields_empty_trajectory() -> Result<()> {
        let model = A2CModel::new(4, 2, &[8], 0.01, None, &Device::Cpu)?;
        let mut env = CartPole::default();
        let mut rng = StdRng::seed_from_u64(0);
        let state = env.reset(0)?;
        let trajectory = run_episode(state, &model, &mut env, &mut rng, 0)?;
        assert!(trajectory.is_empty());
        assert!(trajectory.action_probs().is_err());
        Ok(())
    }
}

use crate::{
    Algorithm,
    env::Env,
    episode::run_episode,
    loss::a2c_loss,
    model::PolicyValueModel,
    returns::{ReturnOptions, returns_tensor},
    reward_history::RewardHistory,
};
use candle_core::{Result, bail};
use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::{debug, info, warn};

macro_rules! break_on_hook_res {
    ($hook_res:expr) => {
        if $hook_res {
            break;
        }
    };
}

#[derive(Debug, Clone)]
pub struct TrainerConfig {
    pub gamma: f32,
    pub standardize: bool,
    pub eps: f32,
    pub max_steps_per_episode: usize,
    pub max_episodes: usize,
    /// The task counts as solved once the running average exceeds this.
    pub reward_threshold: f32,
    /// Width of the running-average window, and the minimum number of episodes before the
    /// threshold is checked.
    pub min_episodes_criterion: usize,
    pub seed: u64,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            gamma: 0.99,
            standardize: true,
            eps: f32::EPSILON,
            max_steps_per_episode: 500,
            max_episodes: 10000,
            reward_threshold: 475.,
            min_episodes_criterion: 100,
            seed: 42,
        }
    }
}

impl TrainerConfig {
    pub fn return_options(&self) -> ReturnOptions {
        ReturnOptions {
            gamma: self.gamma,
            standardize: self.standardize,
            eps: self.eps,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeStats {
    /// Zero based index of the episode.
    pub episode: usize,
    pub episode_reward: f32,
    pub steps: usize,
    /// `None` when the episode produced no steps and the update was skipped.
    pub loss: Option<f32>,
    pub running_reward: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingOutcome {
    pub episodes: usize,
    pub running_reward: f32,
    pub solved: bool,
}

/// Called after every episode. Returning `true` stops training.
pub trait EpisodeHook {
    fn post_episode(&mut self, stats: &EpisodeStats) -> Result<bool>;
}

impl<F: FnMut(&EpisodeStats) -> Result<bool>> EpisodeHook for F {
    fn post_episode(&mut self, stats: &EpisodeStats) -> Result<bool> {
        self(stats)
    }
}

pub struct Trainer<E: Env, M: PolicyValueModel> {
    env: E,
    model: M,
    config: TrainerConfig,
    history: RewardHistory,
    rng: StdRng,
    episode: usize,
    hooks: Vec<Box<dyn EpisodeHook>>,
}

impl<E: Env, M: PolicyValueModel> Trainer<E, M> {
    pub fn new(env: E, model: M, config: TrainerConfig) -> Result<Self> {
        if !env.env_description().action_space.is_discrete() {
            bail!("a2c trainer needs a discrete action space");
        }
        Ok(Self {
            history: RewardHistory::new(config.min_episodes_criterion)?,
            rng: StdRng::seed_from_u64(config.seed),
            env,
            model,
            config,
            episode: 0,
            hooks: vec![],
        })
    }

    pub fn add_hook(&mut self, hook: impl EpisodeHook + 'static) {
        self.hooks.push(Box::new(hook));
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    pub fn history(&self) -> &RewardHistory {
        &self.history
    }

    pub fn into_parts(self) -> (E, M) {
        (self.env, self.model)
    }

    pub fn is_solved(&self) -> bool {
        self.episode >= self.config.min_episodes_criterion
            && self.history.running_average() > self.config.reward_threshold
    }

    /// Collects one episode and applies one gradient step.
    pub fn train_step(&mut self) -> Result<EpisodeStats> {
        let seed = self.rng.random::<u64>();
        let state = self.env.reset(seed)?;
        let trajectory = run_episode(
            state,
            &self.model,
            &mut self.env,
            &mut self.rng,
            self.config.max_steps_per_episode,
        )?;
        let loss = if trajectory.is_empty() {
            warn!(episode = self.episode, "empty episode, skipping the update");
            None
        } else {
            let action_probs = trajectory.action_probs()?;
            let values = trajectory.values()?;
            let returns = returns_tensor(
                trajectory.rewards(),
                &self.config.return_options(),
                values.device(),
            )?;
            let losses = a2c_loss(&action_probs, &values, &returns)?;
            self.model.update(&losses)?;
            Some(losses.total_scalar()?)
        };
        let episode_reward = trajectory.total_reward();
        self.history.push(episode_reward);
        let stats = EpisodeStats {
            episode: self.episode,
            episode_reward,
            steps: trajectory.len(),
            loss,
            running_reward: self.history.running_average(),
        };
        self.episode += 1;
        debug!(
            episode = stats.episode,
            reward = stats.episode_reward,
            steps = stats.steps,
            loss = ?stats.loss,
            terminated = trajectory.terminated(),
            "episode finished"
        );
        Ok(stats)
    }

    fn call_hooks(&mut self, stats: &EpisodeStats) -> Result<bool> {
        let mut stop = false;
        for hook in self.hooks.iter_mut() {
            stop |= hook.post_episode(stats)?;
        }
        Ok(stop)
    }
}

impl<E: Env, M: PolicyValueModel> Algorithm for Trainer<E, M> {
    type Outcome = TrainingOutcome;

    fn train(&mut self) -> Result<TrainingOutcome> {
        info!(
            max_episodes = self.config.max_episodes,
            reward_threshold = self.config.reward_threshold,
            gamma = self.config.gamma,
            "starting training"
        );
        while self.episode < self.config.max_episodes {
            let stats = self.train_step()?;
            let stop_requested = self.call_hooks(&stats)?;
            if self.is_solved() {
                break;
            }
            break_on_hook_res!(stop_requested);
        }
        let outcome = TrainingOutcome {
            episodes: self.episode,
            running_reward: self.history.running_average(),
            solved: self.is_solved(),
        };
        if outcome.solved {
            info!(
                episodes = outcome.episodes,
                running_reward = outcome.running_reward,
                "solved"
            );
        } else {
            info!(
                episodes = outcome.episodes,
                running_reward = outcome.running_reward,
                "stopped without reaching the reward threshold"
            );
        }
        Ok(outcome)
    }
}

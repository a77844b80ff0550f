use a2c_api::{
    builders::{
        a2c::A2CBuilder,
        env::{EnvBuilder, EnvType},
    },
    hooks::recorder::RewardRecorder,
    utils::evaluator::Evaluator,
};
use a2c_core::Algorithm;
use anyhow::{Context, Result};
use candle_core::Device;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about = "Advantage actor-critic on CartPole")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train until the running reward clears the threshold or the episode budget runs out.
    Train(TrainArgs),
}

#[derive(Parser, Debug, Clone)]
struct TrainArgs {
    /// `cartpole` for the native simulator, `gym:<name>` for a gymnasium env.
    #[arg(long, default_value = "cartpole")]
    env: EnvType,
    #[arg(long, default_value_t = 0.99)]
    gamma: f32,
    #[arg(long, default_value_t = 0.01)]
    learning_rate: f64,
    /// Hidden layer widths of the shared trunk, comma separated.
    #[arg(long, value_delimiter = ',', default_value = "128")]
    hidden: Vec<usize>,
    #[arg(long, default_value_t = 10000)]
    max_episodes: usize,
    #[arg(long, default_value_t = 500)]
    max_steps: usize,
    #[arg(long, default_value_t = 475.)]
    reward_threshold: f32,
    /// Running-average window, also the minimum number of episodes before stopping early.
    #[arg(long, default_value_t = 100)]
    min_episodes: usize,
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Use raw discounted returns instead of standardized ones.
    #[arg(long)]
    no_standardize: bool,
    #[arg(long)]
    max_grad_norm: Option<f32>,
    #[arg(long, default_value_t = 10)]
    log_interval: usize,
    /// Greedy evaluation episodes to run after training, 0 skips evaluation.
    #[arg(long, default_value_t = 10)]
    eval_episodes: usize,
}

impl TrainArgs {
    fn builder(&self) -> A2CBuilder {
        let mut builder = A2CBuilder {
            hidden_layers: self.hidden.clone(),
            learning_rate: self.learning_rate,
            max_grad_norm: self.max_grad_norm,
            log_interval: self.log_interval,
            device: Device::Cpu,
            ..Default::default()
        };
        builder.gamma = self.gamma;
        builder.standardize = !self.no_standardize;
        builder.max_steps_per_episode = self.max_steps;
        builder.max_episodes = self.max_episodes;
        builder.reward_threshold = self.reward_threshold;
        builder.min_episodes_criterion = self.min_episodes;
        builder.seed = self.seed;
        builder
    }
}

fn train(args: &TrainArgs) -> Result<()> {
    let builder = args.builder();
    let env_builder = EnvBuilder::new(args.env.clone(), args.max_steps);
    let env = env_builder
        .build(&builder.device)
        .with_context(|| format!("building environment {:?}", args.env))?;
    let mut trainer = builder.build(env)?;
    let recorder = RewardRecorder::new();
    trainer.add_hook(recorder.clone());
    let outcome = trainer.train().context("training failed")?;
    println!(
        "{} at episode {}: average reward {:.2}",
        if outcome.solved { "Solved" } else { "Stopped" },
        outcome.episodes,
        outcome.running_reward
    );
    if let Some(best) = recorder
        .episode_rewards()
        .into_iter()
        .reduce(f32::max)
    {
        info!(best_episode_reward = best);
    }
    if args.eval_episodes > 0 {
        let (mut env, model) = trainer.into_parts();
        let report = Evaluator::new(args.eval_episodes, args.max_steps, args.seed)
            .evaluate(&model, &mut env)?;
        println!(
            "Greedy evaluation over {} episodes: mean reward {:.2}",
            report.episode_rewards.len(),
            report.mean_reward
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let cli = Cli::parse();
    match &cli.command {
        Command::Train(args) => train(args),
    }
}

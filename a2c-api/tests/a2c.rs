use a2c_api::{
    builders::{
        a2c::A2CBuilder,
        env::{EnvBuilder, EnvType},
    },
    hooks::recorder::RewardRecorder,
    test_utils::{ContinuousActionEnv, FixedLengthEnv},
    utils::evaluator::Evaluator,
};
use a2c_core::{Algorithm, env::cartpole::CartPole};
use anyhow::Result;

fn quiet_builder() -> A2CBuilder {
    let mut builder = A2CBuilder::default();
    builder.hidden_layers = vec![16];
    builder.log_interval = 0;
    builder
}

#[test]
fn every_episode_runs_to_termination() -> Result<()> {
    let mut builder = quiet_builder();
    builder.max_episodes = 6;
    builder.min_episodes_criterion = 4;
    builder.reward_threshold = f32::INFINITY;
    let mut trainer = builder.build(FixedLengthEnv::new(7, 1.0))?;
    let recorder = RewardRecorder::new();
    trainer.add_hook(recorder.clone());
    let outcome = trainer.train()?;
    assert_eq!(outcome.episodes, 6);
    assert!(!outcome.solved);
    assert_eq!(recorder.len(), 6);
    for stats in recorder.records() {
        assert_eq!(stats.steps, 7);
        assert_eq!(stats.episode_reward, 7.0);
        assert!(stats.loss.is_some_and(f32::is_finite));
    }
    assert_eq!(trainer.history().len(), 4);
    let (env, _model) = trainer.into_parts();
    assert_eq!(env.actions_taken.len(), 42);
    Ok(())
}

#[test]
fn stops_after_minimum_episodes_once_threshold_is_met() -> Result<()> {
    let mut builder = quiet_builder();
    builder.max_episodes = 100;
    builder.min_episodes_criterion = 5;
    builder.reward_threshold = 9.0;
    let mut trainer = builder.build(FixedLengthEnv::new(10, 1.0))?;
    let outcome = trainer.train()?;
    assert!(outcome.solved);
    assert_eq!(outcome.episodes, 5);
    assert_eq!(outcome.running_reward, 10.0);
    Ok(())
}

#[test]
fn threshold_must_be_exceeded_not_matched() -> Result<()> {
    let mut builder = quiet_builder();
    builder.max_episodes = 8;
    builder.min_episodes_criterion = 2;
    builder.reward_threshold = 10.0;
    let mut trainer = builder.build(FixedLengthEnv::new(10, 1.0))?;
    let outcome = trainer.train()?;
    assert!(!outcome.solved);
    assert_eq!(outcome.episodes, 8);
    Ok(())
}

#[test]
fn step_cap_truncates_long_episodes() -> Result<()> {
    let mut builder = quiet_builder();
    builder.max_episodes = 3;
    builder.max_steps_per_episode = 4;
    builder.reward_threshold = f32::INFINITY;
    let mut trainer = builder.build(FixedLengthEnv::new(50, 2.0))?;
    let recorder = RewardRecorder::new();
    trainer.add_hook(recorder.clone());
    trainer.train()?;
    assert_eq!(recorder.episode_rewards(), vec![8.0, 8.0, 8.0]);
    Ok(())
}

#[test]
fn continuous_action_space_is_rejected() {
    let builder = quiet_builder();
    assert!(builder.build(ContinuousActionEnv).is_err());
}

#[test]
fn evaluator_reports_greedy_rewards() -> Result<()> {
    let builder = quiet_builder();
    let trainer = builder.build(FixedLengthEnv::new(3, 1.5))?;
    let (mut env, model) = trainer.into_parts();
    let report = Evaluator::new(4, 100, 0).evaluate(&model, &mut env)?;
    assert_eq!(report.episode_rewards, vec![4.5; 4]);
    assert_eq!(report.mean_reward, 4.5);
    Ok(())
}

#[test]
fn boxed_env_from_builder_trains() -> Result<()> {
    let mut builder = quiet_builder();
    builder.max_episodes = 2;
    builder.max_steps_per_episode = 50;
    let env = EnvBuilder::new(EnvType::CartPole, builder.max_steps_per_episode)
        .build(&builder.device)?;
    let mut trainer = builder.build(env)?;
    let outcome = trainer.train()?;
    assert_eq!(outcome.episodes, 2);
    Ok(())
}

// Full training run, slow in debug builds.
#[test]
#[ignore]
fn a2c_cartpole_solves() -> Result<()> {
    let mut builder = A2CBuilder::default();
    builder.reward_threshold = 195.0;
    builder.max_episodes = 3000;
    let mut trainer = builder.build(CartPole::new(500, builder.device.clone()))?;
    let outcome = trainer.train()?;
    assert!(outcome.solved, "{outcome:?}");
    Ok(())
}

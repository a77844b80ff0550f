//! Native cart-pole simulator.
//!
//! A pole is hinged on a cart moving along a frictionless track. The agent pushes the cart left
//! (action 0) or right (action 1) with a fixed force and receives a reward of 1 for every step
//! taken. The episode terminates once the pole leans past 12 degrees or the cart leaves the
//! track, and is truncated after `max_episode_steps`.
//!
//! State layout: `[x, x_dot, theta, theta_dot]`.

use super::{Env, EnvironmentDescription, SnapShot, Space};
use candle_core::{Device, Result, Tensor, bail};
use rand::{Rng, SeedableRng, rngs::StdRng};

const GRAVITY: f32 = 9.8;
const MASS_CART: f32 = 1.0;
const MASS_POLE: f32 = 0.1;
const TOTAL_MASS: f32 = MASS_CART + MASS_POLE;
// half of the pole length
const LENGTH: f32 = 0.5;
const POLE_MASS_LENGTH: f32 = MASS_POLE * LENGTH;
const FORCE_MAG: f32 = 10.0;
const TAU: f32 = 0.02;
const THETA_THRESHOLD: f32 = 12.0 * 2.0 * std::f32::consts::PI / 360.0;
const X_THRESHOLD: f32 = 2.4;
const RESET_BOUND: f32 = 0.05;

pub const OBSERVATION_SIZE: usize = 4;
pub const ACTION_SIZE: usize = 2;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CartPoleState {
    pub x: f32,
    pub x_dot: f32,
    pub theta: f32,
    pub theta_dot: f32,
}

impl CartPoleState {
    pub fn to_vec(&self) -> Vec<f32> {
        vec![self.x, self.x_dot, self.theta, self.theta_dot]
    }

    fn out_of_bounds(&self) -> bool {
        self.x.abs() > X_THRESHOLD || self.theta.abs() > THETA_THRESHOLD
    }
}

#[derive(Debug)]
pub struct CartPole {
    state: CartPoleState,
    steps: usize,
    max_episode_steps: usize,
    finished: bool,
    device: Device,
}

impl CartPole {
    pub fn new(max_episode_steps: usize, device: Device) -> Self {
        Self {
            state: CartPoleState::default(),
            steps: 0,
            max_episode_steps,
            // stepping is only allowed after a reset
            finished: true,
            device,
        }
    }

    pub fn state(&self) -> CartPoleState {
        self.state
    }

    /// Overrides the physical state, mostly useful to set up deterministic scenarios.
    pub fn set_state(&mut self, state: CartPoleState) {
        self.state = state;
        self.steps = 0;
        self.finished = false;
    }

    fn observation(&self) -> Result<Tensor> {
        Tensor::from_vec(self.state.to_vec(), OBSERVATION_SIZE, &self.device)
    }

    // Explicit Euler, positions advance with the velocities of the previous step.
    fn integrate(&mut self, force: f32) {
        let CartPoleState {
            x,
            x_dot,
            theta,
            theta_dot,
        } = self.state;
        let (sin_theta, cos_theta) = theta.sin_cos();
        let temp = (force + POLE_MASS_LENGTH * theta_dot * theta_dot * sin_theta) / TOTAL_MASS;
        let theta_acc = (GRAVITY * sin_theta - cos_theta * temp)
            / (LENGTH * (4.0 / 3.0 - MASS_POLE * cos_theta * cos_theta / TOTAL_MASS));
        let x_acc = temp - POLE_MASS_LENGTH * theta_acc * cos_theta / TOTAL_MASS;
        self.state = CartPoleState {
            x: x + TAU * x_dot,
            x_dot: x_dot + TAU * x_acc,
            theta: theta + TAU * theta_dot,
            theta_dot: theta_dot + TAU * theta_acc,
        };
    }
}

impl Default for CartPole {
    fn default() -> Self {
        Self::new(500, Device::Cpu)
    }
}

impl Env for CartPole {
    fn reset(&mut self, seed: u64) -> Result<Tensor> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut sample = || rng.random_range(-RESET_BOUND..RESET_BOUND);
        self.state = CartPoleState {
            x: sample(),
            x_dot: sample(),
            theta: sample(),
            theta_dot: sample(),
        };
        self.steps = 0;
        self.finished = false;
        self.observation()
    }

    fn step(&mut self, action: usize) -> Result<SnapShot> {
        if self.finished {
            bail!("cart-pole stepped after the episode ended, call reset first");
        }
        let force = match action {
            0 => -FORCE_MAG,
            1 => FORCE_MAG,
            _ => bail!("invalid cart-pole action {action}, expected 0 or 1"),
        };
        self.integrate(force);
        self.steps += 1;
        let terminated = self.state.out_of_bounds();
        let truncated = !terminated && self.steps >= self.max_episode_steps;
        self.finished = terminated || truncated;
        Ok(SnapShot {
            state: self.observation()?,
            reward: 1.0,
            terminated,
            truncated,
        })
    }

    fn env_description(&self) -> EnvironmentDescription {
        EnvironmentDescription::new(
            Space::Continous {
                size: OBSERVATION_SIZE,
            },
            Space::Discrete(ACTION_SIZE),
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn reset_is_small_and_seeded() -> Result<()> {
        let mut env = CartPole::default();
        let first: Vec<f32> = env.reset(7)?.to_vec1()?;
        assert_eq!(first.len(), OBSERVATION_SIZE);
        assert!(first.iter().all(|v| v.abs() <= RESET_BOUND));
        let again: Vec<f32> = env.reset(7)?.to_vec1()?;
        assert_eq!(first, again);
        Ok(())
    }

    #[test]
    fn constant_push_topples_the_pole() -> Result<()> {
        let mut env = CartPole::default();
        env.reset(0)?;
        let mut steps = 0;
        loop {
            let snapshot = env.step(1)?;
            steps += 1;
            assert_eq!(snapshot.reward, 1.0);
            if snapshot.done() {
                assert!(snapshot.terminated);
                assert!(!snapshot.truncated);
                break;
            }
            assert!(steps < 500, "pole should fall well before truncation");
        }
        Ok(())
    }

    #[test]
    fn truncates_at_step_limit() -> Result<()> {
        let mut env = CartPole::new(3, Device::Cpu);
        env.set_state(CartPoleState::default());
        // alternate pushes keep an upright pole alive for three steps
        let actions = [1, 0, 1];
        let mut last = None;
        for action in actions {
            last = Some(env.step(action)?);
        }
        let last = last.unwrap();
        assert!(last.truncated);
        assert!(!last.terminated);
        Ok(())
    }

    #[test]
    fn observation_mirrors_the_physical_state() -> Result<()> {
        let mut env = CartPole::default();
        let observation: Vec<f32> = env.reset(3)?.to_vec1()?;
        assert_eq!(observation, env.state().to_vec());
        env.set_state(CartPoleState::default());
        let observation: Vec<f32> = env.step(1)?.state.to_vec1()?;
        let state = env.state();
        assert_eq!(observation, state.to_vec());
        // the position still uses the velocity from before the push
        assert_eq!(state.x, 0.0);
        assert!(state.x_dot > 0.0);
        Ok(())
    }

    #[test]
    fn rejects_invalid_action_and_stepping_when_done() -> Result<()> {
        let mut env = CartPole::default();
        assert!(env.step(0).is_err(), "step before reset");
        env.reset(1)?;
        assert!(env.step(2).is_err());
        Ok(())
    }

    #[test]
    fn leaning_state_terminates_immediately() -> Result<()> {
        let mut env = CartPole::default();
        env.set_state(CartPoleState {
            theta: 0.5,
            ..Default::default()
        });
        let snapshot = env.step(0)?;
        assert!(snapshot.terminated);
        assert!(env.step(0).is_err());
        Ok(())
    }
}

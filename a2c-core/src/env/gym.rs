use super::{Env, EnvironmentDescription, SnapShot, Space};
use candle_core::{Device, Error, Result, Tensor, bail};
use pyo3::{
    PyObject, PyResult, Python,
    types::{PyAnyMethods, PyDict},
};

/// A gymnasium environment driven through the embedded Python interpreter. Only discrete action
/// spaces are supported, which covers `CartPole-v1` and friends.
pub struct GymEnv {
    env: PyObject,
    action_space: Space,
    observation_space: Space,
    device: Device,
}

impl GymEnv {
    pub fn new(name: &str, render_mode: Option<String>, device: Device) -> Result<GymEnv> {
        Python::with_gil(|py| {
            let gym = py.import("gymnasium")?;
            let kwargs = PyDict::new(py);
            if let Some(render_mode) = render_mode {
                kwargs.set_item("render_mode", render_mode)?;
            }
            let env = gym.getattr("make")?.call((name,), Some(&kwargs))?;
            let gym_spaces = py.import("gymnasium.spaces")?;
            let action_space = env.getattr("action_space")?;
            let action_space = if action_space.is_instance(&gym_spaces.getattr("Discrete")?)? {
                Some(Space::Discrete(action_space.getattr("n")?.extract()?))
            } else {
                None
            };
            let observation_shape: Vec<usize> =
                env.getattr("observation_space")?.getattr("shape")?.extract()?;
            PyResult::Ok((env.unbind(), action_space, observation_shape))
        })
        .map_err(Error::wrap)
        .and_then(|(env, action_space, observation_shape)| {
            let Some(action_space) = action_space else {
                bail!("gym env {name} does not have a discrete action space");
            };
            Ok(GymEnv {
                env,
                action_space,
                observation_space: Space::continous_from_dims(observation_shape),
                device,
            })
        })
    }
}

impl Env for GymEnv {
    fn reset(&mut self, seed: u64) -> Result<Tensor> {
        let state: Vec<f32> = Python::with_gil(|py| {
            let kwargs = PyDict::new(py);
            kwargs.set_item("seed", seed)?;
            let state = self.env.call_method(py, "reset", (), Some(&kwargs))?;
            state.bind(py).get_item(0)?.extract()
        })
        .map_err(Error::wrap)?;
        let size = state.len();
        Tensor::from_vec(state, size, &self.device)
    }

    fn step(&mut self, action: usize) -> Result<SnapShot> {
        let (state, reward, terminated, truncated): (Vec<f32>, f32, bool, bool) =
            Python::with_gil(|py| {
                let step = self.env.call_method(py, "step", (action,), None)?;
                let step = step.bind(py);
                PyResult::Ok((
                    step.get_item(0)?.extract()?,
                    step.get_item(1)?.extract()?,
                    step.get_item(2)?.extract()?,
                    step.get_item(3)?.extract()?,
                ))
            })
            .map_err(Error::wrap)?;
        let size = state.len();
        Ok(SnapShot {
            state: Tensor::from_vec(state, size, &self.device)?,
            reward,
            terminated,
            truncated,
        })
    }

    fn env_description(&self) -> EnvironmentDescription {
        EnvironmentDescription::new(self.observation_space.clone(), self.action_space.clone())
    }
}

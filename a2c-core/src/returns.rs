use crate::tensors::Returns;
use candle_core::{Device, Result, Tensor};

/// Discounted reward-to-go for every step of an episode, computed in a single backward pass.
pub fn discounted_returns(rewards: &[f32], gamma: f32) -> Vec<f32> {
    let mut returns = Vec::with_capacity(rewards.len());
    let mut discounted_sum = 0f32;
    for reward in rewards.iter().rev() {
        discounted_sum = reward + gamma * discounted_sum;
        returns.push(discounted_sum);
    }
    returns.reverse();
    returns
}

/// Shifts and scales `values` in place to zero mean and (almost) unit variance. `eps` keeps the
/// division finite when every value is the same.
pub fn standardize(values: &mut [f32], eps: f32) {
    if values.is_empty() {
        return;
    }
    let len = values.len() as f32;
    let mean = values.iter().sum::<f32>() / len;
    let variance = values.iter().map(|x| (*x - mean).powi(2)).sum::<f32>() / len;
    let std = variance.sqrt() + eps;
    for x in values.iter_mut() {
        *x = (*x - mean) / std;
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ReturnOptions {
    pub gamma: f32,
    pub standardize: bool,
    pub eps: f32,
}

impl Default for ReturnOptions {
    fn default() -> Self {
        Self {
            gamma: 0.99,
            standardize: true,
            eps: f32::EPSILON,
        }
    }
}

pub fn compute_returns(rewards: &[f32], options: &ReturnOptions) -> Vec<f32> {
    let mut returns = discounted_returns(rewards, options.gamma);
    if options.standardize {
        standardize(&mut returns, options.eps);
    }
    returns
}

pub fn returns_tensor(rewards: &[f32], options: &ReturnOptions, device: &Device) -> Result<Returns> {
    let returns = compute_returns(rewards, options);
    let len = returns.len();
    Ok(Returns(Tensor::from_vec(returns, len, device)?))
}

use crate::tensors::{ActionProbs, Advantages, PolicyLoss, Returns, ValueLoss, ValuesPred};
use candle_core::{Result, Tensor, bail};

/// Lower bound applied to action probabilities before taking their logarithm.
pub const MIN_PROB: f64 = 1e-8;

/// Transition point between the quadratic and the linear branch of the critic loss.
pub const HUBER_DELTA: f64 = 1.0;

#[derive(Debug, Clone)]
pub struct A2CLosses {
    pub policy_loss: PolicyLoss,
    pub value_loss: ValueLoss,
    pub total: Tensor,
}

impl A2CLosses {
    pub fn total_scalar(&self) -> Result<f32> {
        self.total.to_scalar::<f32>()
    }
}

/// Summed Huber loss between `pred` and `target`.
///
/// Written as `0.5 * q^2 + delta * (|d| - q)` with `q = min(|d|, delta)`, which is the same
/// piecewise function but stays differentiable through plain tensor ops.
pub fn huber_loss(pred: &Tensor, target: &Tensor, delta: f64) -> Result<Tensor> {
    let abs_diff = pred.sub(target)?.abs()?;
    let quadratic = abs_diff.minimum(delta)?;
    let linear = abs_diff.sub(&quadratic)?;
    let loss = (quadratic.sqr()?.affine(0.5, 0.)? + linear.affine(delta, 0.)?)?;
    loss.sum_all()
}

/// Combines the policy gradient and the critic regression of one episode.
///
/// The advantage `returns - values` is detached, it only weights the log-probabilities. The
/// critic loss is summed over the episode rather than averaged.
pub fn a2c_loss(
    action_probs: &ActionProbs,
    values: &ValuesPred,
    returns: &Returns,
) -> Result<A2CLosses> {
    let len = action_probs.dims1()?;
    if values.dims1()? != len || returns.dims1()? != len {
        bail!(
            "a2c loss expects equal lengths, got {len} probabilities, {} values and {} returns",
            values.dims1()?,
            returns.dims1()?
        );
    }
    let advantages = Advantages(returns.sub(values)?.detach());
    let log_probs = action_probs.clamp(MIN_PROB, 1.0)?.log()?;
    let policy_loss = PolicyLoss(log_probs.mul(&advantages)?.sum_all()?.neg()?);
    let value_loss = ValueLoss(huber_loss(values, returns, HUBER_DELTA)?);
    let total = policy_loss.add(&value_loss)?;
    Ok(A2CLosses {
        policy_loss,
        value_loss,
        total,
    })
}

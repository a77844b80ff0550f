use crate::{loss::A2CLosses, optimizer::OptimizerWithMaxGrad};
use candle_core::{D, DType, Device, Result, Tensor};
use candle_nn::{Activation, Linear, Module, Sequential, VarBuilder, VarMap, linear, ops::softmax, seq};

/// A network that maps a batch of observations to unnormalised action scores and state values,
/// and that can be updated from the losses of one episode.
pub trait PolicyValueModel {
    /// Returns `(scores, values)` with shapes `[batch, actions]` and `[batch]`.
    fn forward(&self, observations: &Tensor) -> Result<(Tensor, Tensor)>;

    fn update(&mut self, losses: &A2CLosses) -> Result<()>;

    fn action_probs(&self, observations: &Tensor) -> Result<Tensor> {
        let (scores, _) = self.forward(observations)?;
        softmax(&scores, D::Minus1)
    }

    /// The most likely action for a single flat observation.
    fn greedy_action(&self, observation: &Tensor) -> Result<usize> {
        let probs = self.action_probs(&observation.unsqueeze(0)?)?;
        let action = probs.squeeze(0)?.argmax(0)?.to_scalar::<u32>()?;
        Ok(action as usize)
    }
}

/// Builds a stack of linear layers, each followed by a ReLU. Returns the stack with the width of
/// its output.
pub fn build_trunk(
    input_dim: usize,
    layers: &[usize],
    vb: &VarBuilder,
    prefix: &str,
) -> Result<(Sequential, usize)> {
    let mut last_dim = input_dim;
    let mut nn = seq();
    for (layer_idx, layer_size) in layers.iter().enumerate() {
        let layer_pp = format!("{prefix}{layer_idx}");
        nn = nn
            .add(linear(last_dim, *layer_size, vb.pp(layer_pp))?)
            .add(Activation::Relu);
        last_dim = *layer_size;
    }
    Ok((nn, last_dim))
}

/// Shared trunk with an actor head and a critic head.
pub struct PolicyValueNet {
    trunk: Sequential,
    actor: Linear,
    critic: Linear,
}

impl PolicyValueNet {
    pub fn build(
        observation_size: usize,
        action_size: usize,
        hidden_layers: &[usize],
        vb: &VarBuilder,
    ) -> Result<Self> {
        let (trunk, hidden) = build_trunk(observation_size, hidden_layers, vb, "common")?;
        let actor = linear(hidden, action_size, vb.pp("actor"))?;
        let critic = linear(hidden, 1, vb.pp("critic"))?;
        Ok(Self {
            trunk,
            actor,
            critic,
        })
    }

    pub fn forward(&self, observations: &Tensor) -> Result<(Tensor, Tensor)> {
        let hidden = self.trunk.forward(observations)?;
        let scores = self.actor.forward(&hidden)?;
        let values = self.critic.forward(&hidden)?.squeeze(1)?;
        Ok((scores, values))
    }
}

/// The policy-value network together with the optimizer that owns its parameters.
pub struct A2CModel {
    net: PolicyValueNet,
    optimizer: OptimizerWithMaxGrad,
}

impl A2CModel {
    pub fn new(
        observation_size: usize,
        action_size: usize,
        hidden_layers: &[usize],
        learning_rate: f64,
        max_grad_norm: Option<f32>,
        device: &Device,
    ) -> Result<Self> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);
        let net = PolicyValueNet::build(observation_size, action_size, hidden_layers, &vb)?;
        let optimizer = OptimizerWithMaxGrad::adam(varmap, learning_rate, max_grad_norm)?;
        Ok(Self { net, optimizer })
    }

    pub fn learning_rate(&self) -> f64 {
        self.optimizer.learning_rate()
    }

    pub fn varmap(&self) -> &VarMap {
        &self.optimizer.varmap
    }
}

impl PolicyValueModel for A2CModel {
    fn forward(&self, observations: &Tensor) -> Result<(Tensor, Tensor)> {
        self.net.forward(observations)
    }

    fn update(&mut self, losses: &A2CLosses) -> Result<()> {
        self.optimizer.backward_step(&losses.total)
    }
}

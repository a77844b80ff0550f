pub mod env;
pub mod episode;
pub mod loss;
pub mod model;
pub mod optimizer;
pub mod returns;
pub mod reward_history;
pub mod tensors;
pub mod trainer;

use candle_core::Result;

/// Something that can be trained to completion. The trainer is the only implementor for now, the
/// trait exists so drivers do not need to name its generic parameters.
pub trait Algorithm {
    type Outcome;

    fn train(&mut self) -> Result<Self::Outcome>;
}

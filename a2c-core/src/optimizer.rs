use candle_core::{Result, Tensor, backprop::GradStore};
use candle_nn::{AdamW, Optimizer, ParamsAdamW, VarMap};
use std::fmt::Debug;

/// Backpropagates `t` and rescales the gradients so that their global L2 norm does not exceed
/// `max_norm`.
pub fn clip_grad(t: &Tensor, varmap: &VarMap, max_norm: f32) -> Result<GradStore> {
    let mut total_norm_squared = 0.0f32;
    let mut grad_store = t.backward()?;
    let all_vars = varmap.all_vars();
    for var in all_vars.iter() {
        if let Some(grad) = grad_store.get(var.as_tensor()) {
            total_norm_squared += grad.sqr()?.sum_all()?.to_scalar::<f32>()?;
        }
    }
    let total_norm = total_norm_squared.sqrt();
    if total_norm > max_norm {
        let clip_coef = (max_norm / (total_norm + 1e-6)) as f64;
        for var in all_vars.iter() {
            let Some(old_grad) = grad_store.get(var.as_tensor()) else {
                continue;
            };
            let new_grad = old_grad.affine(clip_coef, 0.)?;
            grad_store.insert(var.as_tensor(), new_grad);
        }
    }
    Ok(grad_store)
}

pub struct OptimizerWithMaxGrad {
    pub optimizer: AdamW,
    pub max_grad_norm: Option<f32>,
    pub varmap: VarMap,
}

impl Debug for OptimizerWithMaxGrad {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptimizerWithMaxGrad")
            .field("learning_rate", &self.optimizer.learning_rate())
            .field("max_grad_norm", &self.max_grad_norm)
            .finish()
    }
}

impl OptimizerWithMaxGrad {
    pub fn new(optimizer: AdamW, max_grad_norm: Option<f32>, varmap: VarMap) -> Self {
        Self {
            optimizer,
            max_grad_norm,
            varmap,
        }
    }

    /// Plain Adam over every variable of `varmap`: AdamW with the weight decay switched off.
    pub fn adam(varmap: VarMap, learning_rate: f64, max_grad_norm: Option<f32>) -> Result<Self> {
        let params = ParamsAdamW {
            lr: learning_rate,
            weight_decay: 0.,
            ..Default::default()
        };
        let optimizer = AdamW::new(varmap.all_vars(), params)?;
        Ok(Self::new(optimizer, max_grad_norm, varmap))
    }

    pub fn learning_rate(&self) -> f64 {
        self.optimizer.learning_rate()
    }

    pub fn backward_step(&mut self, loss: &Tensor) -> Result<()> {
        let grads = if let Some(max_norm) = self.max_grad_norm {
            clip_grad(loss, &self.varmap, max_norm)?
        } else {
            loss.backward()?
        };
        self.optimizer.step(&grads)?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use candle_core::{DType, Device};
    use candle_nn::Init;

    #[test]
    fn clipping_bounds_the_gradient_norm() -> Result<()> {
        let varmap = VarMap::new();
        let w = varmap.get(4, "w", Init::Const(3.0), DType::F32, &Device::Cpu)?;
        // d/dw sum(w^2) = 2w = 6 per element, norm 12
        let loss = w.sqr()?.sum_all()?;
        let grads = clip_grad(&loss, &varmap, 1.0)?;
        let grad = grads.get(&w).expect("gradient for w");
        let norm = grad.sqr()?.sum_all()?.to_scalar::<f32>()?.sqrt();
        assert!((norm - 1.0).abs() < 1e-4, "norm {norm}");
        Ok(())
    }

    #[test]
    fn backward_step_moves_parameters_downhill() -> Result<()> {
        let varmap = VarMap::new();
        let w = varmap.get(1, "w", Init::Const(1.0), DType::F32, &Device::Cpu)?;
        let mut optimizer = OptimizerWithMaxGrad::adam(varmap, 0.1, None)?;
        let before = w.sum_all()?.to_scalar::<f32>()?;
        optimizer.backward_step(&w.sqr()?.sum_all()?)?;
        let after = w.sum_all()?.to_scalar::<f32>()?;
        assert!(after < before);
        Ok(())
    }
}

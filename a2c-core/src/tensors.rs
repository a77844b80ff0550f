use candle_core::Tensor;
use derive_more::{Deref, DerefMut, Display};

#[derive(Deref, DerefMut, Debug, Display, Clone)]
pub struct Advantages(pub Tensor);

#[derive(Deref, DerefMut, Debug, Display, Clone)]
pub struct Returns(pub Tensor);

#[derive(Deref, DerefMut, Debug, Display, Clone)]
pub struct ActionProbs(pub Tensor);

#[derive(Deref, DerefMut, Debug, Display, Clone)]
pub struct ValuesPred(pub Tensor);

#[derive(Deref, DerefMut, Debug, Display, Clone)]
pub struct PolicyLoss(pub Tensor);

#[derive(Deref, DerefMut, Debug, Display, Clone)]
pub struct ValueLoss(pub Tensor);

use crate::common::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    Linear,
    Relu,
    Leaky,
    LRelu,
    Logistic,
    Tanh,
    Elu,
    Selu,
    Gelu,
    Mish,
    HardMish,
    Swish,
}

impl Default for Activation {
    fn default() -> Self {
        Self::Relu
    }
}

impl nn::Module for Activation {
    fn forward(&self, xs: &Tensor) -> Tensor {
        use Activation::*;

        match *self {
            Linear => xs.shallow_clone(),
            Relu => xs.relu(),
            Leaky => leaky(xs),
            LRelu => leaky_relu_ext(xs, Some(0.2)),
            Logistic => xs.sigmoid(),
            Tanh => xs.tanh(),
            Elu => xs.elu(),
            Selu => xs.selu(),
            Gelu => xs.gelu(),
            Mish => xs.mish(),
            HardMish => hard_mish(xs),
            Swish => swish(xs),
        }
    }
}

pub trait TensorActivationExt {
    fn activation(&self, act: Activation) -> Tensor;
}

impl TensorActivationExt for Tensor {
    fn activation(&self, act: Activation) -> Tensor {
        use nn::Module as _;
        act.forward(self)
    }
}

pub fn leaky(xs: &Tensor) -> Tensor {
    xs.clamp_min(0.0) + xs.clamp_max(0.0) * 0.1
}

pub fn hard_mish(xs: &Tensor) -> Tensor {
    let case1 = xs.clamp(-2.0, 0.0);
    let case2 = xs.clamp_min(0.0);
    (case1.pow(&2i64.into()) / 2.0 + &case1) + case2
}

pub fn swish(xs: &Tensor) -> Tensor {
    xs * xs.sigmoid()
}

pub fn leaky_relu_ext(xs: &Tensor, negative_slope: Option<f64>) -> Tensor {
    xs.maximum(&(xs * negative_slope.unwrap_or(0.01)))
}

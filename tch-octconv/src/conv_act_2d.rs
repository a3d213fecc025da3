use crate::{activation::TensorActivationExt, common::*, Activation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaddingMode {
    Same,
    Valid,
}

impl PaddingMode {
    /// Concrete pad for a kernel of size `k` with dilation `d`.
    pub fn pad(&self, k: usize, d: usize) -> usize {
        match self {
            Self::Same => d * (k - 1) / 2,
            Self::Valid => 0,
        }
    }
}

impl Default for PaddingMode {
    fn default() -> Self {
        Self::Same
    }
}

/// Stride-1 convolution with a fused activation, the sub-operation every
/// octave stage builds its pathway convolutions from.
#[derive(Debug, Clone)]
pub struct ConvAct2DInit {
    pub in_c: usize,
    pub out_c: usize,
    pub k: usize,
    pub padding: PaddingMode,
    pub d: usize,
    pub bias: bool,
    pub activation: Activation,
}

impl ConvAct2DInit {
    pub fn new(in_c: usize, out_c: usize, k: usize) -> Self {
        Self {
            in_c,
            out_c,
            k,
            padding: PaddingMode::Same,
            d: 1,
            bias: false,
            activation: Activation::Relu,
        }
    }

    pub fn build<'p, P>(self, path: P) -> ConvAct2D
    where
        P: Borrow<nn::Path<'p>>,
    {
        let path = path.borrow();

        let Self {
            in_c,
            out_c,
            k,
            padding,
            d,
            bias,
            activation,
        } = self;

        let conv = nn::conv2d(
            path / "conv",
            in_c as i64,
            out_c as i64,
            k as i64,
            nn::ConvConfig {
                stride: 1,
                padding: padding.pad(k, d) as i64,
                dilation: d as i64,
                bias,
                ..Default::default()
            },
        );

        ConvAct2D { conv, activation }
    }
}

#[derive(Debug)]
pub struct ConvAct2D {
    conv: nn::Conv2D,
    activation: Activation,
}

impl nn::Module for ConvAct2D {
    fn forward(&self, xs: &Tensor) -> Tensor {
        let Self {
            ref conv,
            activation,
        } = *self;

        xs.apply(conv).activation(activation)
    }
}

impl ConvAct2D {
    pub fn grad(&self) -> ConvAct2DGrad {
        let Self {
            conv: nn::Conv2D { ws, bs, .. },
            ..
        } = self;

        ConvAct2DGrad {
            ws: ws.grad(),
            bs: bs.as_ref().map(Tensor::grad),
        }
    }
}

#[derive(Debug, TensorLike)]
pub struct ConvAct2DGrad {
    pub ws: Tensor,
    pub bs: Option<Tensor>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::nn::Module as _;

    #[test]
    fn same_padding_preserves_spatial_size() {
        let vs = nn::VarStore::new(Device::Cpu);
        let root = vs.root();
        let xs = Tensor::zeros(&[1, 3, 17, 23], (Kind::Float, Device::Cpu));

        for (k, d) in [(1, 1), (3, 1), (3, 2), (5, 1), (5, 3)] {
            let conv = ConvAct2DInit {
                d,
                ..ConvAct2DInit::new(3, 8, k)
            }
            .build(&root / format!("conv_k{}_d{}", k, d));
            assert_eq!(conv.forward(&xs).size(), vec![1, 8, 17, 23]);
        }
    }

    #[test]
    fn valid_padding_shrinks_by_kernel() {
        let vs = nn::VarStore::new(Device::Cpu);
        let root = vs.root();
        let xs = Tensor::zeros(&[1, 3, 16, 16], (Kind::Float, Device::Cpu));

        let conv = ConvAct2DInit {
            padding: PaddingMode::Valid,
            ..ConvAct2DInit::new(3, 4, 3)
        }
        .build(&root / "conv");
        assert_eq!(conv.forward(&xs).size(), vec![1, 4, 14, 14]);
    }
}

use crate::{
    common::*,
    conv_act_2d::{ConvAct2D, ConvAct2DGrad, ConvAct2DInit},
    pathway::{partition_filters, PathwayPair},
    sample::AvgPool2D,
    Activation, PaddingMode, DEFAULT_ALPHA, DEFAULT_KERNEL_SIZE,
};
use tch::nn::Module as _;

/// Opens an octave stack: one full-resolution tensor in, a
/// [`PathwayPair`] out.
#[derive(Debug, Clone)]
pub struct InitialSplitInit {
    pub in_c: usize,
    pub filters: usize,
    pub k: usize,
    pub s: usize,
    pub alpha: R64,
    pub padding: PaddingMode,
    pub d: usize,
    pub bias: bool,
    pub activation: Activation,
}

impl InitialSplitInit {
    pub fn new(in_c: usize, filters: usize) -> Self {
        Self {
            in_c,
            filters,
            k: DEFAULT_KERNEL_SIZE,
            s: 1,
            alpha: r64(DEFAULT_ALPHA),
            padding: PaddingMode::Same,
            d: 1,
            bias: false,
            activation: Activation::Relu,
        }
    }

    pub fn build<'p, P>(self, path: P) -> Result<InitialSplit>
    where
        P: Borrow<nn::Path<'p>>,
    {
        let path = path.borrow();

        let Self {
            in_c,
            filters,
            k,
            s,
            alpha,
            padding,
            d,
            bias,
            activation,
        } = self;

        ensure!(
            k > 0 && s > 0 && d > 0,
            "kernel, stride and dilation must be positive"
        );
        let (low_c, high_c) = partition_filters(filters, alpha)?;

        let conv_high = ConvAct2DInit {
            padding,
            d,
            bias,
            activation,
            ..ConvAct2DInit::new(in_c, high_c, k)
        }
        .build(path / "conv_high");
        let conv_low = ConvAct2DInit {
            padding,
            d,
            bias,
            activation,
            ..ConvAct2DInit::new(in_c, low_c, k)
        }
        .build(path / "conv_low");

        Ok(InitialSplit {
            conv_high,
            conv_low,
            down_sample: AvgPool2D::octave(),
            s,
        })
    }
}

#[derive(Debug)]
pub struct InitialSplit {
    conv_high: ConvAct2D,
    conv_low: ConvAct2D,
    down_sample: AvgPool2D,
    s: usize,
}

impl InitialSplit {
    pub fn forward(&self, input: &Tensor) -> Result<PathwayPair> {
        let Self {
            ref conv_high,
            ref conv_low,
            ref down_sample,
            s,
        } = *self;

        let input = if s > 1 {
            down_sample.forward(input)?
        } else {
            input.shallow_clone()
        };

        let high = conv_high.forward(&input);
        let low = conv_low.forward(&down_sample.forward(&input)?);
        PathwayPair::new(low, high)
    }

    pub fn grad(&self) -> InitialSplitGrad {
        let Self {
            conv_high,
            conv_low,
            ..
        } = self;

        InitialSplitGrad {
            conv_high: conv_high.grad(),
            conv_low: conv_low.grad(),
        }
    }
}

#[derive(Debug, TensorLike)]
pub struct InitialSplitGrad {
    pub conv_high: ConvAct2DGrad,
    pub conv_low: ConvAct2DGrad,
}

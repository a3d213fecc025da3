use crate::{
    common::*,
    conv_act_2d::{ConvAct2D, ConvAct2DGrad, ConvAct2DInit},
    pathway::PathwayPair,
    sample::{AvgPool2D, UpSample2D},
    Activation, PaddingMode, DEFAULT_KERNEL_SIZE,
};
use tch::nn::Module as _;

/// Closes an octave stack: a [`PathwayPair`] in, one full-resolution
/// tensor with `filters` channels out. No alpha here, both paths feed
/// the single unified output.
#[derive(Debug, Clone)]
pub struct FinalMergeInit {
    pub low_in_c: usize,
    pub high_in_c: usize,
    pub filters: usize,
    pub k: usize,
    pub s: usize,
    pub padding: PaddingMode,
    pub d: usize,
    pub bias: bool,
    pub activation: Activation,
}

impl FinalMergeInit {
    pub fn new(low_in_c: usize, high_in_c: usize, filters: usize) -> Self {
        Self {
            low_in_c,
            high_in_c,
            filters,
            k: DEFAULT_KERNEL_SIZE,
            s: 1,
            padding: PaddingMode::Same,
            d: 1,
            bias: false,
            activation: Activation::Relu,
        }
    }

    pub fn build<'p, P>(self, path: P) -> Result<FinalMerge>
    where
        P: Borrow<nn::Path<'p>>,
    {
        let path = path.borrow();

        let Self {
            low_in_c,
            high_in_c,
            filters,
            k,
            s,
            padding,
            d,
            bias,
            activation,
        } = self;

        ensure!(
            k > 0 && s > 0 && d > 0,
            "kernel, stride and dilation must be positive"
        );
        ensure!(filters > 0, "filters must be positive");

        let conv_high_high = ConvAct2DInit {
            padding,
            d,
            bias,
            activation,
            ..ConvAct2DInit::new(high_in_c, filters, k)
        }
        .build(path / "conv_high_high");
        let conv_low_high = ConvAct2DInit {
            padding,
            d,
            bias,
            activation,
            ..ConvAct2DInit::new(low_in_c, filters, k)
        }
        .build(path / "conv_low_high");

        Ok(FinalMerge {
            conv_high_high,
            conv_low_high,
            up_sample: UpSample2D::octave(),
            down_sample: AvgPool2D::octave(),
            s,
        })
    }
}

#[derive(Debug)]
pub struct FinalMerge {
    conv_high_high: ConvAct2D,
    conv_low_high: ConvAct2D,
    up_sample: UpSample2D,
    down_sample: AvgPool2D,
    s: usize,
}

impl FinalMerge {
    pub fn forward(&self, inputs: &PathwayPair) -> Result<Tensor> {
        let Self {
            ref conv_high_high,
            ref conv_low_high,
            ref up_sample,
            ref down_sample,
            s,
        } = *self;

        let (low, high) = if s > 1 {
            (
                down_sample.forward(inputs.low())?,
                down_sample.forward(inputs.high())?,
            )
        } else {
            (inputs.low().shallow_clone(), inputs.high().shallow_clone())
        };

        let high_high = conv_high_high.forward(&high);
        let low_high = up_sample.forward(&conv_low_high.forward(&low))?;
        let output = high_high.f_add(&low_high)?;
        Ok(output)
    }

    pub fn grad(&self) -> FinalMergeGrad {
        let Self {
            conv_high_high,
            conv_low_high,
            ..
        } = self;

        FinalMergeGrad {
            conv_high_high: conv_high_high.grad(),
            conv_low_high: conv_low_high.grad(),
        }
    }
}

#[derive(Debug, TensorLike)]
pub struct FinalMergeGrad {
    pub conv_high_high: ConvAct2DGrad,
    pub conv_low_high: ConvAct2DGrad,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::initial_split::InitialSplitInit;

    #[test]
    fn merges_to_full_resolution() -> Result<()> {
        let vs = nn::VarStore::new(Device::Cpu);
        let root = vs.root();

        let split = InitialSplitInit::new(3, 64).build(&root / "initial")?;
        let xs = Tensor::zeros(&[1, 3, 32, 32], (Kind::Float, Device::Cpu));
        let pair = split.forward(&xs)?;

        let merge = FinalMergeInit::new(32, 32, 3).build(&root / "final")?;
        let output = merge.forward(&pair)?;
        assert_eq!(output.size(), vec![1, 3, 32, 32]);
        Ok(())
    }

    #[test]
    fn stride_two_merge_halves_resolution() -> Result<()> {
        let vs = nn::VarStore::new(Device::Cpu);
        let root = vs.root();

        let split = InitialSplitInit::new(3, 16).build(&root / "initial")?;
        let xs = Tensor::zeros(&[1, 3, 32, 32], (Kind::Float, Device::Cpu));
        let pair = split.forward(&xs)?;

        let merge = FinalMergeInit {
            s: 2,
            ..FinalMergeInit::new(8, 8, 4)
        }
        .build(&root / "final")?;
        let output = merge.forward(&pair)?;
        assert_eq!(output.size(), vec![1, 4, 16, 16]);
        Ok(())
    }
}

use crate::{
    common::*,
    conv_act_2d::{ConvAct2D, ConvAct2DGrad, ConvAct2DInit},
    pathway::{partition_filters, PathwayPair},
    sample::{AvgPool2D, UpSample2D},
    Activation, PaddingMode, DEFAULT_ALPHA, DEFAULT_KERNEL_SIZE,
};
use tch::nn::Module as _;

/// The repeatable octave building block: a [`PathwayPair`] in, a mixed
/// [`PathwayPair`] out.
///
/// Each output pathway sums a same-resolution path and a resampled
/// cross-resolution path, which is where the two frequency bands
/// exchange information.
#[derive(Debug, Clone)]
pub struct DualPathwayBlockInit {
    pub low_in_c: usize,
    pub high_in_c: usize,
    pub filters: usize,
    pub k: usize,
    pub s: usize,
    pub alpha: R64,
    pub padding: PaddingMode,
    pub d: usize,
    pub bias: bool,
    pub activation: Activation,
}

impl DualPathwayBlockInit {
    pub fn new(low_in_c: usize, high_in_c: usize, filters: usize) -> Self {
        Self {
            low_in_c,
            high_in_c,
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

    pub fn build<'p, P>(self, path: P) -> Result<DualPathwayBlock>
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

        // The low->low and high->low paths share the low budget, and the
        // high->high and low->high paths share the high budget, so each
        // output sum adds tensors of equal channel count.
        let (low_c, high_c) = partition_filters(filters, alpha)?;

        let conv = |in_c, out_c, name: &str| {
            ConvAct2DInit {
                padding,
                d,
                bias,
                activation,
                ..ConvAct2DInit::new(in_c, out_c, k)
            }
            .build(path / name)
        };

        let conv_high_high = conv(high_in_c, high_c, "conv_high_high");
        let conv_low_high = conv(low_in_c, high_c, "conv_low_high");
        let conv_low_low = conv(low_in_c, low_c, "conv_low_low");
        let conv_high_low = conv(high_in_c, low_c, "conv_high_low");

        Ok(DualPathwayBlock {
            conv_high_high,
            conv_low_high,
            conv_low_low,
            conv_high_low,
            up_sample: UpSample2D::octave(),
            down_sample: AvgPool2D::octave(),
            s,
        })
    }
}

#[derive(Debug)]
pub struct DualPathwayBlock {
    conv_high_high: ConvAct2D,
    conv_low_high: ConvAct2D,
    conv_low_low: ConvAct2D,
    conv_high_low: ConvAct2D,
    up_sample: UpSample2D,
    down_sample: AvgPool2D,
    s: usize,
}

impl DualPathwayBlock {
    pub fn forward(&self, inputs: &PathwayPair) -> Result<PathwayPair> {
        let Self {
            ref conv_high_high,
            ref conv_low_high,
            ref conv_low_low,
            ref conv_high_low,
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
        let high_out = high_high.f_add(&low_high)?;

        let low_low = conv_low_low.forward(&low);
        let high_low = conv_high_low.forward(&down_sample.forward(&high)?);
        let low_out = low_low.f_add(&high_low)?;

        PathwayPair::new(low_out, high_out)
    }

    pub fn grad(&self) -> DualPathwayBlockGrad {
        let Self {
            conv_high_high,
            conv_low_high,
            conv_low_low,
            conv_high_low,
            ..
        } = self;

        DualPathwayBlockGrad {
            conv_high_high: conv_high_high.grad(),
            conv_low_high: conv_low_high.grad(),
            conv_low_low: conv_low_low.grad(),
            conv_high_low: conv_high_low.grad(),
        }
    }
}

#[derive(Debug, TensorLike)]
pub struct DualPathwayBlockGrad {
    pub conv_high_high: ConvAct2DGrad,
    pub conv_low_high: ConvAct2DGrad,
    pub conv_low_low: ConvAct2DGrad,
    pub conv_high_low: ConvAct2DGrad,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::initial_split::InitialSplitInit;

    fn sample_pair(vs: &nn::VarStore, filters: usize, alpha: f64) -> Result<PathwayPair> {
        let root = vs.root();
        let split = InitialSplitInit {
            alpha: r64(alpha),
            ..InitialSplitInit::new(3, filters)
        }
        .build(&root / "initial")?;
        let xs = Tensor::zeros(&[1, 3, 32, 32], (Kind::Float, Device::Cpu));
        split.forward(&xs)
    }

    #[test]
    fn stride_one_preserves_spatial_size() -> Result<()> {
        let vs = nn::VarStore::new(Device::Cpu);
        let root = vs.root();
        let pair = sample_pair(&vs, 64, 0.5)?;

        let block = DualPathwayBlockInit::new(32, 32, 64).build(&root / "block")?;
        let out = block.forward(&pair)?;

        assert_eq!(out.low().size(), pair.low().size());
        assert_eq!(out.high().size(), pair.high().size());
        Ok(())
    }

    #[test]
    fn stride_two_halves_both_pathways() -> Result<()> {
        let vs = nn::VarStore::new(Device::Cpu);
        let root = vs.root();
        let pair = sample_pair(&vs, 64, 0.5)?;

        let block = DualPathwayBlockInit {
            s: 2,
            ..DualPathwayBlockInit::new(32, 32, 64)
        }
        .build(&root / "block")?;
        let out = block.forward(&pair)?;

        assert_eq!(out.high().size(), vec![1, 32, 16, 16]);
        assert_eq!(out.low().size(), vec![1, 32, 8, 8]);
        Ok(())
    }

    // Pins the coupled partition: with filters = 10 and alpha = 0.25 both
    // low-producing paths get round(2.5) = 3 channels and both
    // high-producing paths get 7, otherwise the elementwise sums inside
    // forward would already fail on channel mismatch.
    #[test]
    fn partition_is_coupled_across_paths() -> Result<()> {
        let vs = nn::VarStore::new(Device::Cpu);
        let root = vs.root();
        let pair = sample_pair(&vs, 16, 0.5)?;

        let block = DualPathwayBlockInit {
            alpha: r64(0.25),
            ..DualPathwayBlockInit::new(8, 8, 10)
        }
        .build(&root / "block")?;
        let (low_c, high_c) = block.forward(&pair)?.channels()?;

        assert_eq!((low_c, high_c), (3, 7));
        Ok(())
    }

    #[test]
    fn alpha_change_repartitions_output() -> Result<()> {
        let vs = nn::VarStore::new(Device::Cpu);
        let root = vs.root();
        let pair = sample_pair(&vs, 64, 0.5)?;

        let block = DualPathwayBlockInit {
            alpha: r64(0.75),
            ..DualPathwayBlockInit::new(32, 32, 64)
        }
        .build(&root / "block")?;
        let (low_c, high_c) = block.forward(&pair)?.channels()?;

        assert_eq!((low_c, high_c), (48, 16));
        Ok(())
    }
}

use crate::common::*;
use tch_octconv::{
    partition_filters, Activation, DualPathwayBlock, DualPathwayBlockGrad, DualPathwayBlockInit,
    FinalMerge, FinalMergeGrad, FinalMergeInit, InitialSplit, InitialSplitGrad, InitialSplitInit,
    PaddingMode, DEFAULT_ALPHA, DEFAULT_KERNEL_SIZE,
};

/// Published configuration: 64 hidden filters split evenly between the
/// pathways, two mixing blocks, 3x3 kernels throughout.
pub fn oct_srcnn_init(in_c: usize, out_c: usize) -> OctSrcnnInit {
    OctSrcnnInit {
        in_c,
        out_c,
        filters: 64,
        alpha: r64(DEFAULT_ALPHA),
        num_blocks: 2,
        k: DEFAULT_KERNEL_SIZE,
        padding: PaddingMode::Same,
        bias: false,
        activation: Activation::Relu,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OctSrcnnInit {
    pub in_c: usize,
    pub out_c: usize,
    pub filters: usize,
    pub alpha: R64,
    pub num_blocks: usize,
    pub k: usize,
    pub padding: PaddingMode,
    pub bias: bool,
    pub activation: Activation,
}

impl OctSrcnnInit {
    pub fn load_json(file: impl AsRef<std::path::Path>) -> Result<Self> {
        let file = file.as_ref();
        let text = std::fs::read_to_string(file)
            .with_context(|| format!("failed to read model config '{}'", file.display()))?;
        let init: Self = serde_json::from_str(&text)
            .with_context(|| format!("malformed model config '{}'", file.display()))?;
        Ok(init)
    }

    pub fn build<'p, P>(self, path: P) -> Result<OctSrcnn>
    where
        P: Borrow<nn::Path<'p>>,
    {
        let path = path.borrow();

        let Self {
            in_c,
            out_c,
            filters,
            alpha,
            num_blocks,
            k,
            padding,
            bias,
            activation,
        } = self;

        let initial = InitialSplitInit {
            k,
            alpha,
            padding,
            bias,
            activation,
            ..InitialSplitInit::new(in_c, filters)
        }
        .build(path / "initial")?;

        // every block keeps the (low, high) split of the stage before it
        let (low_c, high_c) = partition_filters(filters, alpha)?;
        let blocks = (0..num_blocks)
            .map(|index| {
                DualPathwayBlockInit {
                    k,
                    alpha,
                    padding,
                    bias,
                    activation,
                    ..DualPathwayBlockInit::new(low_c, high_c, filters)
                }
                .build(path / format!("block_{}", index))
            })
            .collect::<Result<Vec<_>>>()?;

        // linear reconstruction head, the output must not be clamped
        let final_merge = FinalMergeInit {
            k,
            padding,
            bias,
            activation: Activation::Linear,
            ..FinalMergeInit::new(low_c, high_c, out_c)
        }
        .build(path / "final")?;

        debug!(
            "built oct-srcnn: {} -> {} channels, {} filters, {} blocks",
            in_c, out_c, filters, num_blocks
        );

        Ok(OctSrcnn {
            initial,
            blocks,
            final_merge,
        })
    }
}

#[derive(Debug)]
pub struct OctSrcnn {
    initial: InitialSplit,
    blocks: Vec<DualPathwayBlock>,
    final_merge: FinalMerge,
}

impl OctSrcnn {
    pub fn forward(&self, input: &Tensor) -> Result<Tensor> {
        let Self {
            initial,
            blocks,
            final_merge,
        } = self;

        let mut pair = initial.forward(input)?;
        for block in blocks {
            pair = block.forward(&pair)?;
        }
        final_merge.forward(&pair)
    }

    pub fn grad(&self) -> OctSrcnnGrad {
        let Self {
            initial,
            blocks,
            final_merge,
        } = self;

        OctSrcnnGrad {
            initial: initial.grad(),
            blocks: blocks.iter().map(DualPathwayBlock::grad).collect(),
            final_merge: final_merge.grad(),
        }
    }
}

#[derive(Debug, TensorLike)]
pub struct OctSrcnnGrad {
    pub initial: InitialSplitGrad,
    pub blocks: Vec<DualPathwayBlockGrad>,
    pub final_merge: FinalMergeGrad,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oct_srcnn_serde_test() -> Result<()> {
        let init = oct_srcnn_init(3, 3);
        let text = serde_json::to_string_pretty(&init)?;
        let recovered = serde_json::from_str(&text)?;
        assert_eq!(init, recovered);
        Ok(())
    }

    #[test]
    fn oct_srcnn_init_test() -> Result<()> {
        let vs = nn::VarStore::new(Device::Cpu);
        let root = vs.root();
        oct_srcnn_init(3, 3).build(&root / "model")?;
        Ok(())
    }
}

//! Octave-convolution building blocks on top of `tch`.
//!
//! A feature map is split into a full-resolution high-frequency pathway
//! and a half-resolution low-frequency pathway, mixed by repeatable
//! dual-pathway blocks, and merged back into a single tensor:
//! [`InitialSplit`] -> N x [`DualPathwayBlock`] -> [`FinalMerge`].

mod common;

pub mod activation;
pub mod conv_act_2d;
pub mod dual_pathway_block;
pub mod final_merge;
pub mod initial_split;
pub mod pathway;
pub mod sample;

pub use activation::{Activation, TensorActivationExt};
pub use conv_act_2d::{ConvAct2D, ConvAct2DGrad, ConvAct2DInit, PaddingMode};
pub use dual_pathway_block::{DualPathwayBlock, DualPathwayBlockGrad, DualPathwayBlockInit};
pub use final_merge::{FinalMerge, FinalMergeGrad, FinalMergeInit};
pub use initial_split::{InitialSplit, InitialSplitGrad, InitialSplitInit};
pub use pathway::{partition_filters, PathwayPair};
pub use sample::{AvgPool2D, UpSample2D, OCTAVE_FACTOR};

/// Kernel size the stage constructors default to.
pub const DEFAULT_KERNEL_SIZE: usize = 3;

/// Fraction of filters the stage constructors route to the low pathway.
pub const DEFAULT_ALPHA: f64 = 0.5;

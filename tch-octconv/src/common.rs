pub use anyhow::{ensure, Result};
pub use log::warn;
pub use noisy_float::prelude::*;
pub use serde::{Deserialize, Serialize};
pub use std::borrow::Borrow;
pub use tch::{nn, Device, Kind, Tensor};
pub use tch_tensor_like::TensorLike;

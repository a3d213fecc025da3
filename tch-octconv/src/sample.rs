use crate::common::*;

/// Spatial factor between the two pathways.
pub const OCTAVE_FACTOR: i64 = 2;

/// Average-pool subsampling, the octave downsampling primitive.
#[derive(Debug, Clone)]
pub struct AvgPool2D {
    factor: i64,
}

impl AvgPool2D {
    pub fn new(factor: i64) -> Result<Self> {
        ensure!(factor >= 1, "invalid pooling factor {}", factor);
        Ok(Self { factor })
    }

    pub fn octave() -> Self {
        Self {
            factor: OCTAVE_FACTOR,
        }
    }

    pub fn forward(&self, input: &Tensor) -> Result<Tensor> {
        let Self { factor } = *self;
        let output = input.f_avg_pool2d(
            &[factor, factor],
            &[factor, factor],
            &[0, 0],
            false,
            true,
            None,
        )?;
        Ok(output)
    }
}

/// Nearest-neighbor upsampling for the low-to-high cross path.
#[derive(Debug, Clone)]
pub struct UpSample2D {
    factor: i64,
}

impl UpSample2D {
    pub fn new(factor: i64) -> Result<Self> {
        ensure!(factor >= 1, "invalid upsampling factor {}", factor);
        Ok(Self { factor })
    }

    pub fn octave() -> Self {
        Self {
            factor: OCTAVE_FACTOR,
        }
    }

    pub fn forward(&self, input: &Tensor) -> Result<Tensor> {
        let Self { factor } = *self;
        let (_b, _c, in_h, in_w) = input.size4()?;
        let output = input.f_upsample_nearest2d(&[in_h * factor, in_w * factor], None, None)?;
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn octave_resampling_round_trip_shapes() -> Result<()> {
        let xs = Tensor::zeros(&[2, 3, 32, 32], (Kind::Float, Device::Cpu));

        let pooled = AvgPool2D::octave().forward(&xs)?;
        assert_eq!(pooled.size(), vec![2, 3, 16, 16]);

        let restored = UpSample2D::octave().forward(&pooled)?;
        assert_eq!(restored.size(), vec![2, 3, 32, 32]);
        Ok(())
    }

    #[test]
    fn pooling_averages_each_window() -> Result<()> {
        let xs = Tensor::of_slice(&[1.0f32, 3.0, 5.0, 7.0]).reshape(&[1, 1, 2, 2]);
        let pooled = AvgPool2D::octave().forward(&xs)?;
        assert_eq!(Vec::<f32>::from(&pooled.flatten(0, -1)), vec![4.0]);
        Ok(())
    }

    #[test]
    fn rejects_degenerate_factor() {
        assert!(AvgPool2D::new(0).is_err());
        assert!(UpSample2D::new(0).is_err());
    }
}

use crate::common::*;

/// Dual-resolution pair carried between octave stages.
///
/// `high` holds the full-resolution pathway and `low` the same feature
/// map at exactly half the spatial size. The constructor checks the 2x
/// ratio, so a swapped or mismatched pair cannot circulate.
#[derive(Debug)]
pub struct PathwayPair {
    low: Tensor,
    high: Tensor,
}

impl PathwayPair {
    pub fn new(low: Tensor, high: Tensor) -> Result<Self> {
        let (_, _, low_h, low_w) = low.size4()?;
        let (_, _, high_h, high_w) = high.size4()?;
        ensure!(
            high_h == low_h * 2 && high_w == low_w * 2,
            "pathway resolution mismatch: high is {}x{} but low is {}x{}",
            high_h,
            high_w,
            low_h,
            low_w
        );
        Ok(Self { low, high })
    }

    pub fn low(&self) -> &Tensor {
        &self.low
    }

    pub fn high(&self) -> &Tensor {
        &self.high
    }

    /// Channel counts as `(low, high)`.
    pub fn channels(&self) -> Result<(i64, i64)> {
        let (_, low_c, _, _) = self.low.size4()?;
        let (_, high_c, _, _) = self.high.size4()?;
        Ok((low_c, high_c))
    }

    pub fn shallow_clone(&self) -> Self {
        Self {
            low: self.low.shallow_clone(),
            high: self.high.shallow_clone(),
        }
    }

    pub fn into_tensors(self) -> (Tensor, Tensor) {
        let Self { low, high } = self;
        (low, high)
    }
}

/// Splits a filter budget between the two pathways.
///
/// Returns `(low, high)` output channel counts with
/// `low == round(alpha * filters)` and `low + high == filters`.
pub fn partition_filters(filters: usize, alpha: R64) -> Result<(usize, usize)> {
    ensure!(filters > 0, "filters must be positive");
    ensure!(
        (0.0..=1.0).contains(&alpha.raw()),
        "alpha must lie in [0, 1], got {}",
        alpha
    );

    let low = (alpha.raw() * filters as f64).round() as usize;
    let high = filters - low;
    if low == 0 || high == 0 {
        warn!(
            "alpha {} leaves the {} pathway without channels for {} filters",
            alpha,
            if low == 0 { "low" } else { "high" },
            filters
        );
    }
    Ok((low, high))
}

//! Box spaces and the linear maps between raw and normalized units.

/// Maps `raw` from `[low, high]` onto `[scaled_low, scaled_high]`.
pub fn to_scaled(raw: f64, low: f64, high: f64, scaled_low: f64, scaled_high: f64) -> f64 {
    scaled_low + (raw - low) * (scaled_high - scaled_low) / (high - low)
}

/// Maps `scaled` from `[scaled_low, scaled_high]` back onto `[low, high]`.
pub fn to_raw(scaled: f64, low: f64, high: f64, scaled_low: f64, scaled_high: f64) -> f64 {
    low + (scaled - scaled_low) * (high - low) / (scaled_high - scaled_low)
}

/// A box-shaped space with per-dimension bounds. Bounds may be infinite.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxSpace {
    low: Vec<f64>,
    high: Vec<f64>,
}

impl BoxSpace {
    /// # Panics
    ///
    /// Panics if the bound vectors differ in length or any `low > high`.
    pub fn new(low: Vec<f64>, high: Vec<f64>) -> Self {
        assert_eq!(low.len(), high.len(), "bound dimensions differ");
        assert!(low.iter().zip(&high).all(|(l, h)| l <= h), "low must be <= high");
        Self { low, high }
    }

    /// One-dimensional box `[low, high]`.
    pub fn scalar(low: f64, high: f64) -> Self {
        Self::new(vec![low], vec![high])
    }

    pub fn low(&self) -> &[f64] {
        &self.low
    }

    pub fn high(&self) -> &[f64] {
        &self.high
    }

    pub fn dim(&self) -> usize {
        self.low.len()
    }

    /// Returns `true` if `point` has the right dimension and lies inside.
    pub fn contains(&self, point: &[f64]) -> bool {
        point.len() == self.dim()
            && point
                .iter()
                .zip(self.low.iter().zip(&self.high))
                .all(|(x, (l, h))| *l <= *x && *x <= *h)
    }
}

/// Linear map between a raw interval and its normalized counterpart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rescaler {
    pub raw: (f64, f64),
    pub scaled: (f64, f64),
}

impl Rescaler {
    pub fn new(raw: (f64, f64), scaled: (f64, f64)) -> Self {
        Self { raw, scaled }
    }

    pub fn to_scaled(&self, raw: f64) -> f64 {
        to_scaled(raw, self.raw.0, self.raw.1, self.scaled.0, self.scaled.1)
    }

    pub fn to_raw(&self, scaled: f64) -> f64 {
        to_raw(scaled, self.raw.0, self.raw.1, self.scaled.0, self.scaled.1)
    }

    /// The space an agent sees: the normalized interval when `rescale` is
    /// set, the raw one otherwise.
    pub fn space(&self, rescale: bool) -> BoxSpace {
        let (low, high) = if rescale { self.scaled } else { self.raw };
        BoxSpace::scalar(low, high)
    }
}

//! Random initial-condition sampling for devices.

use rand::Rng;
use rand_distr::StandardNormal;

/// Draws from a standard normal truncated to `[-bound, bound]` by rejection.
///
/// # Panics
///
/// Panics if `bound` is not positive.
pub fn truncated_standard_normal<R: Rng + ?Sized>(rng: &mut R, bound: f64) -> f64 {
    assert!(bound > 0.0, "truncation bound must be > 0");
    loop {
        let z: f64 = rng.sample(StandardNormal);
        if (-bound..=bound).contains(&z) {
            return z;
        }
    }
}

/// Samples an initial stored energy as `z * std + mean`, with `z` drawn from
/// a standard normal truncated to one standard deviation.
///
/// The result is bounded by `mean ± std` regardless of the device's physical
/// storage range.
pub fn initial_storage<R: Rng + ?Sized>(rng: &mut R, mean: f64, std: f64) -> f64 {
    if std <= 0.0 {
        return mean;
    }
    truncated_standard_normal(rng, 1.0) * std + mean
}

//! Kahan compensated summation.
//!
//! Naive summation of the allocator's per-round rate increments drifts
//! perceptibly over long simulations with many waterfilling rounds;
//! preserved from the original algorithm verbatim (see Design Note
//! "Kahan summation").

/// Sums `values` with Kahan compensation for lost low-order bits.
pub fn kahan_sum(values: &[f64]) -> f64 {
    let mut sum = 0.0;
    let mut c = 0.0;
    for &s in values {
        let y = s - c;
        let t = sum + y;
        c = (t - sum) - y;
        sum = t;
    }
    sum
}

//! Step-derived activity estimates.
//!
//! Both estimates are linear in the step count and rounded to two decimals,
//! matching what the backend stores for a day.

/// Kilocalories burned per step.
pub const CALORIES_PER_STEP: f64 = 0.04;

/// Kilometres covered per step.
pub const KM_PER_STEP: f64 = 0.0008;

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn calories_for(step_count: u64) -> f64 {
    round2(step_count as f64 * CALORIES_PER_STEP)
}

pub fn distance_km_for(step_count: u64) -> f64 {
    round2(step_count as f64 * KM_PER_STEP)
}

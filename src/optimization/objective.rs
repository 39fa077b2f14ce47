//! Cost of a simulated barrel against an [`OptimizationTarget`].

use super::types::{CostWeights, OptimizationTarget};
use crate::error::{BoreError, Result};
use crate::simulation::AcousticResult;

/// Relative first-resonance error `|f1 - target| / target`.
pub fn relative_f1_error(computed: f64, target: f64) -> f64 {
    if target == 0.0 {
        return f64::INFINITY;
    }
    (computed - target).abs() / target
}

/// Mean squared difference between two curves of equal length.
///
/// A length mismatch is a configuration error on the target side.
pub fn impedance_error(computed: &[f64], target: &[f64]) -> Result<f64> {
    if computed.len() != target.len() {
        return Err(BoreError::invalid_config(
            "target.impedance_curve",
            format!(
                "has {} points but the simulation returns {}",
                target.len(),
                computed.len()
            ),
        ));
    }
    if computed.is_empty() {
        return Ok(0.0);
    }
    let sum: f64 = computed
        .iter()
        .zip(target)
        .map(|(z, t)| (z - t).powi(2))
        .sum();
    Ok(sum / computed.len() as f64)
}

/// `w1·|f1 - f1*|/f1* + w2·mean((Z - Z*)²)`, the second term only when the
/// target carries an impedance curve.
pub fn compute_cost(result: &AcousticResult, target: &OptimizationTarget, weights: &CostWeights) -> Result<f64> {
    let f1_term = relative_f1_error(result.first_resonance_hz(), target.first_resonance_hz);
    let z_term = match &target.impedance_curve {
        Some(curve) => impedance_error(result.impedance_curve(), curve)?,
        None => 0.0,
    };
    Ok(weights.f1 * f1_term + weights.impedance * z_term)
}

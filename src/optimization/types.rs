//! Type definitions for barrel optimization.

use serde::{Deserialize, Serialize};

use super::surrogate::SurrogateConfig;
use crate::error::{BoreError, Result};
use crate::simulation::AcousticResult;
use crate::types::{BoreShape, ExteriorShape, Resolution};

/// Number of search variables (entry diameter, exit diameter, length).
pub const NUM_VARIABLES: usize = 3;

/// Shape parameters of a barrel, in mm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarrelParams {
    pub bore_shape: BoreShape,
    pub exterior_shape: ExteriorShape,
    pub entry_diam: f64,
    pub exit_diam: f64,
    pub length: f64,
    pub sample_count: usize,
}

impl BarrelParams {
    pub fn new(entry_diam: f64, exit_diam: f64, length: f64) -> Self {
        Self {
            bore_shape: BoreShape::default(),
            exterior_shape: ExteriorShape::default(),
            entry_diam,
            exit_diam,
            length,
            sample_count: Resolution::default().sample_count(),
        }
    }

    pub fn with_shapes(mut self, bore_shape: BoreShape, exterior_shape: ExteriorShape) -> Self {
        self.bore_shape = bore_shape;
        self.exterior_shape = exterior_shape;
        self
    }

    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.sample_count = resolution.sample_count();
        self
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("entry_diam", self.entry_diam),
            ("exit_diam", self.exit_diam),
            ("length", self.length),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(BoreError::InvalidGeometry(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Search vector `[entry, exit, length]`.
    pub fn to_vector(&self) -> [f64; NUM_VARIABLES] {
        [self.entry_diam, self.exit_diam, self.length]
    }

    /// Same shapes and resolution with new search variables.
    pub fn with_vector(&self, x: &[f64]) -> Self {
        Self {
            entry_diam: x[0],
            exit_diam: x[1],
            length: x[2],
            ..self.clone()
        }
    }
}

impl Default for BarrelParams {
    /// Typical B♭ barrel: 14.8 → 15.2 mm over 66 mm.
    fn default() -> Self {
        Self::new(14.8, 15.2, 66.0)
    }
}

/// Fractional search window around the initial value of each variable.
///
/// A window of 0.2 lets the variable range over `[0.8·x0, 1.2·x0]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundsPolicy {
    pub entry_window: f64,
    pub exit_window: f64,
    pub length_window: f64,
}

impl Default for BoundsPolicy {
    fn default() -> Self {
        Self {
            entry_window: 0.20,
            exit_window: 0.30,
            length_window: 0.10,
        }
    }
}

impl BoundsPolicy {
    /// Absolute `(min, max)` bounds around `params`.
    pub fn bounds_for(&self, params: &BarrelParams) -> [(f64, f64); NUM_VARIABLES] {
        let window = |x: f64, w: f64| (x * (1.0 - w), x * (1.0 + w));
        [
            window(params.entry_diam, self.entry_window),
            window(params.exit_diam, self.exit_window),
            window(params.length, self.length_window),
        ]
    }

    pub fn validate(&self) -> Result<()> {
        for (key, w) in [
            ("optimizer.bounds.entry_window", self.entry_window),
            ("optimizer.bounds.exit_window", self.exit_window),
            ("optimizer.bounds.length_window", self.length_window),
        ] {
            if !(w.is_finite() && (0.0..1.0).contains(&w)) {
                return Err(BoreError::invalid_config(key, format!("must be in [0, 1), got {w}")));
            }
        }
        Ok(())
    }
}

/// Weights of the two cost terms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostWeights {
    /// Weight of the relative f1 error
    pub f1: f64,
    /// Weight of the mean squared impedance error
    pub impedance: f64,
}

impl Default for CostWeights {
    fn default() -> Self {
        Self {
            f1: 0.7,
            impedance: 0.3,
        }
    }
}

impl CostWeights {
    pub fn validate(&self) -> Result<()> {
        if !(self.f1.is_finite() && self.f1 >= 0.0) {
            return Err(BoreError::invalid_config("optimizer.weights.f1", "must be >= 0"));
        }
        if !(self.impedance.is_finite() && self.impedance >= 0.0) {
            return Err(BoreError::invalid_config("optimizer.weights.impedance", "must be >= 0"));
        }
        Ok(())
    }
}

/// All optimizer settings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    pub weights: CostWeights,
    pub bounds: BoundsPolicy,
    pub search: SurrogateConfig,
}

impl OptimizerConfig {
    pub fn validate(&self) -> Result<()> {
        self.weights.validate()?;
        self.bounds.validate()?;
        self.search.validate()
    }
}

/// What the optimizer aims for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationTarget {
    /// Target first resonance (Hz)
    pub first_resonance_hz: f64,
    /// Optional target impedance curve on the adapter's frequency axis
    pub impedance_curve: Option<Vec<f64>>,
}

impl OptimizationTarget {
    pub fn new(first_resonance_hz: f64) -> Self {
        Self {
            first_resonance_hz,
            impedance_curve: None,
        }
    }

    pub fn with_impedance(mut self, curve: Vec<f64>) -> Self {
        self.impedance_curve = Some(curve);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.first_resonance_hz.is_finite() && self.first_resonance_hz > 0.0) {
            return Err(BoreError::invalid_config(
                "target.first_resonance_hz",
                format!("must be > 0, got {}", self.first_resonance_hz),
            ));
        }
        if let Some(curve) = &self.impedance_curve {
            if curve.iter().any(|z| !z.is_finite()) {
                return Err(BoreError::invalid_config(
                    "target.impedance_curve",
                    "contains non-finite values",
                ));
            }
        }
        Ok(())
    }
}

/// Result of an optimization run.
#[derive(Debug, Clone)]
pub struct OptimizationOutcome {
    /// Best parameters found (the initial ones if every evaluation failed)
    pub best_params: BarrelParams,
    pub best_cost: f64,
    /// Simulation of `best_params`, when it succeeded
    pub best_result: Option<AcousticResult>,
    pub evaluations: usize,
    /// Whether `best_cost <= convergence_tol`
    pub success: bool,
    /// Best cost after each evaluation
    pub cost_history: Vec<f64>,
}

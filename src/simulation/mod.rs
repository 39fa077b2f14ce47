//! Acoustic simulation boundary.
//!
//! Every adapter turns a bore profile, a body material, an average wall
//! thickness and the ambient conditions into an [`AcousticResult`]. Two
//! adapters ship with the crate:
//!
//! - [`PlaceholderSimulationAdapter`]: seeded pseudo-random metrics around
//!   nominal values. Non-physical, for wiring and downstream tests only.
//! - [`PhysicsSimulationAdapter`]: delegates to an [`ImpedanceEngine`] (by
//!   default the plane-wave [`TransferMatrixEngine`]) and derives the metrics
//!   from the computed input impedance.

pub mod engine;
pub mod physics;
pub mod placeholder;
pub mod spectrum;

use serde::{Deserialize, Serialize};

use crate::error::{BoreError, Result};
use crate::geometry::ProfileCurve;
use crate::materials::Material;
use crate::types::{Environment, MIN_SAMPLE_COUNT};

pub use engine::{EngineError, EngineRequest, EngineResponse, ImpedanceEngine, TransferMatrixEngine};
pub use physics::PhysicsSimulationAdapter;
pub use placeholder::PlaceholderSimulationAdapter;

/// Relative tolerance when checking `admittance == 1/impedance` on load.
const ADMITTANCE_REL_TOL: f64 = 1e-9;

/// Contract shared by all simulation back ends.
pub trait SimulationAdapter {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Evaluate one bore profile.
    ///
    /// Profiles with fewer than two samples are rejected with
    /// [`BoreError::InvalidGeometry`] before any computation. A back end
    /// whose output breaks the [`AcousticResult`] contract reports
    /// [`BoreError::SimulationFailure`] with the profile attached.
    fn evaluate(
        &self,
        profile: &ProfileCurve,
        material: &Material,
        avg_thickness: f64,
        environment: &Environment,
    ) -> Result<AcousticResult>;
}

impl<T: SimulationAdapter + ?Sized> SimulationAdapter for &T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn evaluate(
        &self,
        profile: &ProfileCurve,
        material: &Material,
        avg_thickness: f64,
        environment: &Environment,
    ) -> Result<AcousticResult> {
        (**self).evaluate(profile, material, avg_thickness, environment)
    }
}

/// Reject profiles too short to simulate.
pub(crate) fn check_profile(profile: &ProfileCurve) -> Result<()> {
    if profile.len() < MIN_SAMPLE_COUNT {
        return Err(BoreError::InvalidGeometry(format!(
            "profile needs at least {MIN_SAMPLE_COUNT} samples, got {}",
            profile.len()
        )));
    }
    Ok(())
}

/// Scalar metrics of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AcousticMetrics {
    /// First impedance resonance (Hz)
    pub first_resonance_hz: f64,
    /// Cutoff frequency (Hz)
    pub cutoff_hz: f64,
    /// Blowing resistance, 0 (free) to 100 (stuffy)
    pub resistance_score: f64,
    /// Overtone alignment, 0 to 1
    pub harmonicity: f64,
    /// Spectral brightness, 0 (dark) to 1 (bright)
    pub brightness: f64,
}

impl AcousticMetrics {
    fn validate(&self) -> Result<()> {
        if !(self.first_resonance_hz.is_finite() && self.cutoff_hz.is_finite()) {
            return Err(BoreError::InvalidResult(format!(
                "non-finite resonance metrics (f1 {}, cutoff {})",
                self.first_resonance_hz, self.cutoff_hz
            )));
        }
        check_range("resistance_score", self.resistance_score, 100.0)?;
        check_range("harmonicity", self.harmonicity, 1.0)?;
        check_range("brightness", self.brightness, 1.0)?;
        Ok(())
    }
}

fn check_range(field: &str, value: f64, max: f64) -> Result<()> {
    if (0.0..=max).contains(&value) {
        Ok(())
    } else {
        Err(BoreError::InvalidResult(format!(
            "{field} {value} outside [0, {max}]"
        )))
    }
}

/// Output of one simulation.
///
/// The three curves always have equal length, every impedance value is
/// finite and positive, and `admittance_curve[i] == 1 / impedance_curve[i]`.
/// Both [`AcousticResult::new`] and deserialization enforce this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "AcousticResultRecord")]
pub struct AcousticResult {
    first_resonance_hz: f64,
    cutoff_hz: f64,
    resistance_score: f64,
    harmonicity: f64,
    brightness: f64,
    frequency_axis: Vec<f64>,
    impedance_curve: Vec<f64>,
    admittance_curve: Vec<f64>,
}

impl AcousticResult {
    /// Build a result, deriving the admittance curve from the impedance curve.
    pub fn new(
        metrics: AcousticMetrics,
        frequency_axis: Vec<f64>,
        impedance_curve: Vec<f64>,
    ) -> Result<Self> {
        metrics.validate()?;
        if frequency_axis.len() != impedance_curve.len() {
            return Err(BoreError::InvalidResult(format!(
                "frequency axis has {} points but impedance curve has {}",
                frequency_axis.len(),
                impedance_curve.len()
            )));
        }
        if let Some(z) = impedance_curve.iter().find(|z| !(z.is_finite() && **z > 0.0)) {
            return Err(BoreError::InvalidResult(format!(
                "impedance values must be finite and positive, got {z}"
            )));
        }

        let admittance_curve = impedance_curve.iter().map(|z| 1.0 / z).collect();
        Ok(Self {
            first_resonance_hz: metrics.first_resonance_hz,
            cutoff_hz: metrics.cutoff_hz,
            resistance_score: metrics.resistance_score,
            harmonicity: metrics.harmonicity,
            brightness: metrics.brightness,
            frequency_axis,
            impedance_curve,
            admittance_curve,
        })
    }

    pub fn metrics(&self) -> AcousticMetrics {
        AcousticMetrics {
            first_resonance_hz: self.first_resonance_hz,
            cutoff_hz: self.cutoff_hz,
            resistance_score: self.resistance_score,
            harmonicity: self.harmonicity,
            brightness: self.brightness,
        }
    }

    pub fn first_resonance_hz(&self) -> f64 {
        self.first_resonance_hz
    }

    pub fn cutoff_hz(&self) -> f64 {
        self.cutoff_hz
    }

    pub fn resistance_score(&self) -> f64 {
        self.resistance_score
    }

    pub fn harmonicity(&self) -> f64 {
        self.harmonicity
    }

    pub fn brightness(&self) -> f64 {
        self.brightness
    }

    pub fn frequency_axis(&self) -> &[f64] {
        &self.frequency_axis
    }

    pub fn impedance_curve(&self) -> &[f64] {
        &self.impedance_curve
    }

    pub fn admittance_curve(&self) -> &[f64] {
        &self.admittance_curve
    }

    /// Number of frequency points.
    pub fn len(&self) -> usize {
        self.frequency_axis.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequency_axis.is_empty()
    }

    /// Mean of the impedance curve, `None` for an empty axis.
    pub fn average_impedance(&self) -> Option<f64> {
        if self.impedance_curve.is_empty() {
            None
        } else {
            Some(self.impedance_curve.iter().sum::<f64>() / self.impedance_curve.len() as f64)
        }
    }
}

/// Wire form of [`AcousticResult`], checked on conversion.
#[derive(Debug, Deserialize)]
struct AcousticResultRecord {
    first_resonance_hz: f64,
    cutoff_hz: f64,
    resistance_score: f64,
    harmonicity: f64,
    brightness: f64,
    frequency_axis: Vec<f64>,
    impedance_curve: Vec<f64>,
    admittance_curve: Vec<f64>,
}

impl TryFrom<AcousticResultRecord> for AcousticResult {
    type Error = BoreError;

    fn try_from(record: AcousticResultRecord) -> Result<Self> {
        let metrics = AcousticMetrics {
            first_resonance_hz: record.first_resonance_hz,
            cutoff_hz: record.cutoff_hz,
            resistance_score: record.resistance_score,
            harmonicity: record.harmonicity,
            brightness: record.brightness,
        };
        let result = AcousticResult::new(metrics, record.frequency_axis, record.impedance_curve)?;

        if record.admittance_curve.len() != result.admittance_curve.len() {
            return Err(BoreError::InvalidResult(format!(
                "admittance curve has {} points, expected {}",
                record.admittance_curve.len(),
                result.admittance_curve.len()
            )));
        }
        let consistent = record
            .admittance_curve
            .iter()
            .zip(&result.admittance_curve)
            .all(|(stored, derived)| (stored - derived).abs() <= ADMITTANCE_REL_TOL * derived.abs());
        if !consistent {
            return Err(BoreError::InvalidResult(
                "admittance curve is not the reciprocal of the impedance curve".to_string(),
            ));
        }
        Ok(result)
    }
}

/// Frequency sweep and back-end switches shared by the adapters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// Lowest frequency of the sweep (Hz)
    pub freq_min_hz: f64,
    /// Highest frequency of the sweep (Hz), inclusive
    pub freq_max_hz: f64,
    /// Sweep step (Hz)
    pub freq_step_hz: f64,
    /// Include visco-thermal wall losses
    pub losses: bool,
    /// Seed of the placeholder adapter
    pub placeholder_seed: u64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            freq_min_hz: 100.0,
            freq_max_hz: 4000.0,
            freq_step_hz: 5.0,
            losses: true,
            placeholder_seed: 42,
        }
    }
}

impl SimulationSettings {
    pub fn validate(&self) -> Result<()> {
        if !(self.freq_min_hz.is_finite() && self.freq_min_hz > 0.0) {
            return Err(BoreError::invalid_config(
                "simulation.freq_min_hz",
                format!("must be > 0, got {}", self.freq_min_hz),
            ));
        }
        if !(self.freq_max_hz.is_finite() && self.freq_max_hz > self.freq_min_hz) {
            return Err(BoreError::invalid_config(
                "simulation.freq_max_hz",
                format!("must exceed freq_min_hz ({}), got {}", self.freq_min_hz, self.freq_max_hz),
            ));
        }
        if !(self.freq_step_hz.is_finite() && self.freq_step_hz > 0.0) {
            return Err(BoreError::invalid_config(
                "simulation.freq_step_hz",
                format!("must be > 0, got {}", self.freq_step_hz),
            ));
        }
        Ok(())
    }

    /// Sweep frequencies from `freq_min_hz` up to and including `freq_max_hz`.
    pub fn frequency_axis(&self) -> Vec<f64> {
        frequency_range(self.freq_min_hz, self.freq_max_hz, self.freq_step_hz)
    }
}

/// `start, start + step, …` while `<= stop` (with a small tolerance).
pub fn frequency_range(start: f64, stop: f64, step: f64) -> Vec<f64> {
    if !(step > 0.0) || stop < start {
        return Vec::new();
    }
    let count = ((stop - start) / step + 1e-9).floor() as usize + 1;
    (0..count).map(|i| start + i as f64 * step).collect()
}

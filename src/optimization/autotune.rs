//! Brute-force grid tuning of entry/exit diameters.
//!
//! Every candidate replaces the base profile's diameters with a linear ramp
//! from entry to exit (by sample index) and keeps its positions. The score is
//! the impedance magnitude in the frequency bin nearest the target; the
//! highest score wins and the first candidate wins ties.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::sampling::grid_sample;
use crate::error::{BoreError, Result};
use crate::geometry::ProfileCurve;
use crate::materials::Material;
use crate::simulation::spectrum::nearest_bin;
use crate::simulation::{check_profile, AcousticResult, SimulationAdapter};
use crate::types::Environment;

/// Diameter ranges (mm) and grid density.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutotuneConfig {
    pub entry_min: f64,
    pub entry_max: f64,
    pub exit_min: f64,
    pub exit_max: f64,
    /// Grid points per axis
    pub steps: usize,
}

impl Default for AutotuneConfig {
    fn default() -> Self {
        Self {
            entry_min: 12.5,
            entry_max: 15.0,
            exit_min: 12.5,
            exit_max: 15.0,
            steps: 10,
        }
    }
}

impl AutotuneConfig {
    pub fn validate(&self) -> Result<()> {
        for (key, lo, hi) in [
            ("autotune.entry", self.entry_min, self.entry_max),
            ("autotune.exit", self.exit_min, self.exit_max),
        ] {
            if !(lo.is_finite() && hi.is_finite() && lo > 0.0 && lo <= hi) {
                return Err(BoreError::invalid_config(
                    key,
                    format!("range [{lo}, {hi}] must be positive and ordered"),
                ));
            }
        }
        if self.steps == 0 {
            return Err(BoreError::invalid_config("autotune.steps", "must be > 0"));
        }
        Ok(())
    }
}

/// Winning candidate of a grid sweep.
#[derive(Debug, Clone)]
pub struct AutotuneOutcome {
    pub entry_diam: f64,
    pub exit_diam: f64,
    pub profile: ProfileCurve,
    pub result: AcousticResult,
    /// Impedance magnitude at the bin nearest the target
    pub score: f64,
    /// Candidates that simulated successfully
    pub candidates_evaluated: usize,
}

/// Sweep the entry/exit grid and keep the candidate with the strongest
/// impedance at `target_freq`.
pub fn autotune<A: SimulationAdapter + ?Sized>(
    adapter: &A,
    base_profile: &ProfileCurve,
    target_freq: f64,
    material: &Material,
    avg_thickness: f64,
    environment: &Environment,
    config: &AutotuneConfig,
) -> Result<AutotuneOutcome> {
    check_profile(base_profile)?;
    config.validate()?;
    if !(target_freq.is_finite() && target_freq > 0.0) {
        return Err(BoreError::invalid_config(
            "autotune.target_freq",
            format!("must be > 0, got {target_freq}"),
        ));
    }

    let n = base_profile.len();
    // Exit first so that the entry diameter is the slow (outer) axis.
    let grid = grid_sample(
        &[(config.exit_min, config.exit_max), (config.entry_min, config.entry_max)],
        config.steps,
    );
    info!(
        adapter = adapter.name(),
        target_freq,
        candidates = grid.len(),
        "starting autotune sweep"
    );

    let mut best: Option<AutotuneOutcome> = None;
    let mut evaluated = 0;

    for point in grid {
        let (exit, entry) = (point[0], point[1]);
        let diameters: Vec<f64> = (0..n)
            .map(|i| entry + (exit - entry) * i as f64 / (n - 1) as f64)
            .collect();
        let profile = base_profile.with_diameters(&diameters)?;

        let result = match adapter.evaluate(&profile, material, avg_thickness, environment) {
            Ok(result) => result,
            Err(err) => {
                warn!(error = %err, entry, exit, "autotune candidate failed");
                continue;
            }
        };
        evaluated += 1;

        let Some(bin) = nearest_bin(result.frequency_axis(), target_freq) else {
            continue;
        };
        let score = result.impedance_curve()[bin];
        debug!(entry, exit, score, "autotune candidate");

        if best.as_ref().map_or(true, |b| score > b.score) {
            best = Some(AutotuneOutcome {
                entry_diam: entry,
                exit_diam: exit,
                profile,
                result,
                score,
                candidates_evaluated: 0,
            });
        }
    }

    let mut outcome = best.ok_or_else(|| BoreError::SimulationFailure {
        reason: "no autotune candidate could be simulated".to_string(),
        geometry: base_profile.clone(),
    })?;
    outcome.candidates_evaluated = evaluated;
    info!(
        entry = outcome.entry_diam,
        exit = outcome.exit_diam,
        score = outcome.score,
        "autotune finished"
    );
    Ok(outcome)
}

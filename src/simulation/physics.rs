//! Adapter backed by an input-impedance engine.

use tracing::debug;

use super::engine::{AirProperties, EngineRequest, EngineResponse, ImpedanceEngine, TransferMatrixEngine};
use super::spectrum::{argmax, centroid, find_peaks, refine_peak};
use super::{check_profile, AcousticMetrics, AcousticResult, SimulationAdapter, SimulationSettings};
use crate::error::{BoreError, Result};
use crate::geometry::ProfileCurve;
use crate::materials::Material;
use crate::types::{Environment, MIN_IMPEDANCE, MM_PER_M};

/// First non-planar (1,1) duct mode: `f = MODE_11 · c / (2π a)`.
pub const MODE_11: f64 = 1.8412;
/// Reference bore diameter for the resistance score (mm).
pub const REFERENCE_BORE_MM: f64 = 15.0;
/// Harmonicity reported when the sweep shows a single resonance.
pub const NEUTRAL_HARMONICITY: f64 = 0.80;

/// Evaluates profiles through an [`ImpedanceEngine`].
#[derive(Debug, Clone)]
pub struct PhysicsSimulationAdapter<E = TransferMatrixEngine> {
    engine: E,
    settings: SimulationSettings,
}

impl PhysicsSimulationAdapter {
    /// Built-in transfer-matrix engine with the given sweep.
    pub fn with_settings(settings: SimulationSettings) -> Self {
        Self::new(TransferMatrixEngine, settings)
    }
}

impl Default for PhysicsSimulationAdapter {
    fn default() -> Self {
        Self::with_settings(SimulationSettings::default())
    }
}

impl<E: ImpedanceEngine> PhysicsSimulationAdapter<E> {
    pub fn new(engine: E, settings: SimulationSettings) -> Self {
        Self { engine, settings }
    }

    pub fn settings(&self) -> &SimulationSettings {
        &self.settings
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    fn request(
        &self,
        profile: &ProfileCurve,
        material: &Material,
        environment: &Environment,
    ) -> EngineRequest {
        EngineRequest {
            bore: profile.to_pairs(MM_PER_M),
            temperature: environment.temperature,
            humidity: environment.humidity,
            losses: self.settings.losses,
            kinematic_viscosity: material.kinematic_viscosity,
            frequencies: self.settings.frequency_axis(),
        }
    }

    /// Turn the complex response into the fixed metric set.
    fn derive_result(&self, profile: &ProfileCurve, response: EngineResponse) -> Result<AcousticResult> {
        let failure = |reason: String| BoreError::SimulationFailure {
            reason,
            geometry: profile.clone(),
        };

        if response.impedance.len() != response.frequencies.len() {
            return Err(failure(format!(
                "engine returned {} impedance values for {} frequencies",
                response.impedance.len(),
                response.frequencies.len()
            )));
        }

        let air = AirProperties {
            speed_of_sound: response.speed_of_sound,
            density: response.air_density,
        };
        let diameters: Vec<f64> = profile.diameters().map(|d| d / MM_PER_M).collect();
        let (entry, mean, narrowest) = match (diameters.first(), profile.mean_diameter(), profile.min_diameter()) {
            (Some(&entry), Some(mean), Some(min)) => (entry, mean / MM_PER_M, min / MM_PER_M),
            _ => return Err(failure("empty profile".to_string())),
        };

        let zc_entry = air.characteristic_impedance(entry / 2.0);
        let impedance: Vec<f64> = response
            .impedance
            .iter()
            .map(|z| (z.norm() / zc_entry).max(MIN_IMPEDANCE))
            .collect();
        if impedance.iter().any(|z| !z.is_finite()) {
            return Err(failure("normalised impedance is not finite".to_string()));
        }

        let axis = &response.frequencies;
        let peaks = find_peaks(&impedance);
        let first_resonance_hz = match peaks.first() {
            Some(&i) => refine_peak(axis, &impedance, i),
            None => argmax(&impedance)
                .map(|i| axis[i])
                .ok_or_else(|| failure("no frequency points".to_string()))?,
        };

        let cutoff_hz = MODE_11 * air.speed_of_sound / (2.0 * std::f64::consts::PI * mean / 2.0);

        let reference = air.characteristic_impedance(REFERENCE_BORE_MM / MM_PER_M / 2.0);
        let narrow = air.characteristic_impedance(narrowest / 2.0);
        let resistance_score = (50.0 + 100.0 * (narrow / reference).log10()).clamp(0.0, 100.0);

        let harmonicity = match peaks.get(1) {
            Some(&i) if first_resonance_hz > 0.0 => {
                let f2 = refine_peak(axis, &impedance, i);
                1.0 - ((f2 / (3.0 * first_resonance_hz)) - 1.0).abs().min(1.0)
            }
            _ => NEUTRAL_HARMONICITY,
        };

        let brightness = match (axis.first(), axis.last(), centroid(axis, &impedance)) {
            (Some(&lo), Some(&hi), Some(c)) if hi > lo => ((c - lo) / (hi - lo)).clamp(0.0, 1.0),
            _ => 0.5,
        };

        let metrics = AcousticMetrics {
            first_resonance_hz,
            cutoff_hz,
            resistance_score,
            harmonicity,
            brightness,
        };
        AcousticResult::new(metrics, response.frequencies, impedance).map_err(|e| failure(e.to_string()))
    }
}

impl<E: ImpedanceEngine> SimulationAdapter for PhysicsSimulationAdapter<E> {
    fn name(&self) -> &str {
        "transfer-matrix"
    }

    fn evaluate(
        &self,
        profile: &ProfileCurve,
        material: &Material,
        avg_thickness: f64,
        environment: &Environment,
    ) -> Result<AcousticResult> {
        check_profile(profile)?;
        if !(avg_thickness.is_finite() && avg_thickness >= 0.0) {
            return Err(BoreError::InvalidGeometry(format!(
                "average thickness must be >= 0, got {avg_thickness}"
            )));
        }
        self.settings.validate()?;

        let request = self.request(profile, material, environment);
        let response = self
            .engine
            .compute(&request)
            .map_err(|e| BoreError::SimulationFailure {
                reason: e.to_string(),
                geometry: profile.clone(),
            })?;

        let result = self.derive_result(profile, response)?;
        debug!(
            adapter = self.name(),
            samples = profile.len(),
            material = %material.name,
            f1 = result.first_resonance_hz(),
            cutoff = result.cutoff_hz(),
            "physics evaluation"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::ProfileGenerator;
    use crate::simulation::engine::{EngineError, UNFLANGED_END_CORRECTION};
    use crate::types::BoreShape;

    struct FailingEngine;

    impl ImpedanceEngine for FailingEngine {
        fn compute(&self, _request: &EngineRequest) -> std::result::Result<EngineResponse, EngineError> {
            Err(EngineError::NonFinite { frequency: 440.0 })
        }
    }

    fn cylinder(length: f64) -> ProfileCurve {
        ProfileGenerator::default()
            .generate(BoreShape::Cylindrical, 15.0, 15.0, length, 20)
            .unwrap()
    }

    #[test]
    fn cylinder_first_resonance_is_quarter_wave() {
        let adapter = PhysicsSimulationAdapter::with_settings(SimulationSettings::default());
        let env = Environment::new(20.0, 0.0);
        let result = adapter.evaluate(&cylinder(300.0), &Material::default(), 3.0, &env).unwrap();

        let c = AirProperties::at(20.0, 0.0).unwrap().speed_of_sound;
        let expected = c / (4.0 * (0.3 + UNFLANGED_END_CORRECTION * 0.0075));
        assert!(
            (result.first_resonance_hz() - expected).abs() < 10.0,
            "f1 {} vs {}",
            result.first_resonance_hz(),
            expected
        );
        // Odd harmonics only in a closed-open cylinder.
        assert!(result.harmonicity() > 0.9);
        // 15 mm bore is the resistance reference.
        assert!((result.resistance_score() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn narrower_bore_is_more_resistant() {
        let adapter = PhysicsSimulationAdapter::with_settings(SimulationSettings::default());
        let env = Environment::default();
        let narrow = ProfileGenerator::default()
            .generate(BoreShape::Cylindrical, 14.0, 14.0, 66.0, 10)
            .unwrap();
        let result = adapter.evaluate(&narrow, &Material::default(), 1.0, &env).unwrap();
        assert!(result.resistance_score() > 50.0);
        assert!(result.cutoff_hz() > 0.0);
        assert!((0.0..=1.0).contains(&result.brightness()));
    }

    #[test]
    fn engine_errors_become_simulation_failures() {
        let adapter = PhysicsSimulationAdapter::new(FailingEngine, SimulationSettings::default());
        let profile = cylinder(66.0);
        let err = adapter
            .evaluate(&profile, &Material::default(), 1.0, &Environment::default())
            .unwrap_err();
        match err {
            BoreError::SimulationFailure { reason, geometry } => {
                assert!(reason.contains("440"));
                assert_eq!(geometry, profile);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn short_profile_never_reaches_engine() {
        let adapter = PhysicsSimulationAdapter::new(FailingEngine, SimulationSettings::default());
        let err = adapter
            .evaluate(&ProfileCurve::default(), &Material::default(), 1.0, &Environment::default())
            .unwrap_err();
        assert!(matches!(err, BoreError::InvalidGeometry(_)));
    }
}

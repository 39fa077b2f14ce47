//! Non-physical stand-in adapter.
//!
//! Produces plausible-looking metrics by perturbing nominal values with a
//! seeded RNG. The RNG is re-seeded on every call from the adapter seed and an
//! FNV-1a digest of the inputs, so identical inputs always give identical
//! results and call order never matters. Do not draw acoustic conclusions
//! from it.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use super::{check_profile, frequency_range, AcousticMetrics, AcousticResult, SimulationAdapter};
use crate::error::{BoreError, Result};
use crate::geometry::ProfileCurve;
use crate::materials::Material;
use crate::types::Environment;

/// Nominal first resonance before perturbation (Hz).
pub const NOMINAL_F1_HZ: f64 = 450.0;
/// Half-width of the uniform f1 perturbation (Hz).
pub const F1_SPREAD_HZ: f64 = 30.0;
/// `cutoff = CUTOFF_RATIO · f1`
pub const CUTOFF_RATIO: f64 = 2.2;

const AXIS_START_HZ: f64 = 100.0;
const AXIS_STOP_HZ: f64 = 2000.0;
const AXIS_STEP_HZ: f64 = 50.0;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// 64-bit FNV-1a over the raw bits of the inputs.
#[derive(Debug, Clone, Copy)]
struct InputDigest(u64);

impl InputDigest {
    fn new() -> Self {
        Self(FNV_OFFSET_BASIS)
    }

    fn bytes(mut self, bytes: &[u8]) -> Self {
        for &byte in bytes {
            self.0 ^= u64::from(byte);
            self.0 = self.0.wrapping_mul(FNV_PRIME);
        }
        self
    }

    fn float(self, value: f64) -> Self {
        self.bytes(&value.to_bits().to_le_bytes())
    }

    fn text(self, value: &str) -> Self {
        // 0xff never occurs in UTF-8 and terminates the string
        self.bytes(value.as_bytes()).bytes(&[0xff])
    }

    fn finish(self) -> u64 {
        self.0
    }
}

/// Seeded pseudo-random adapter.
#[derive(Debug, Clone)]
pub struct PlaceholderSimulationAdapter {
    seed: u64,
}

impl PlaceholderSimulationAdapter {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Scale applied to f1 for a given body material.
    pub fn material_factor(material: &Material) -> f64 {
        match material.name.as_str() {
            "African Blackwood" => 1.05,
            "Hard Rubber" => 0.95,
            _ => 1.0,
        }
    }

    fn rng_for(
        &self,
        profile: &ProfileCurve,
        material: &Material,
        avg_thickness: f64,
        environment: &Environment,
    ) -> StdRng {
        let digest = profile
            .samples()
            .iter()
            .fold(InputDigest::new(), |digest, sample| {
                digest.float(sample.position).float(sample.diameter)
            })
            .text(&material.name)
            .float(avg_thickness)
            .float(environment.temperature)
            .float(environment.humidity);
        StdRng::seed_from_u64(self.seed ^ digest.finish())
    }
}

impl Default for PlaceholderSimulationAdapter {
    fn default() -> Self {
        Self::new(42)
    }
}

impl SimulationAdapter for PlaceholderSimulationAdapter {
    fn name(&self) -> &str {
        "placeholder"
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

        let mut rng = self.rng_for(profile, material, avg_thickness, environment);

        let f1 = (NOMINAL_F1_HZ + rng.gen_range(-F1_SPREAD_HZ..=F1_SPREAD_HZ))
            * Self::material_factor(material);
        let resistance = rng.gen_range(20.0..=80.0);

        let frequency_axis = frequency_range(AXIS_START_HZ, AXIS_STOP_HZ, AXIS_STEP_HZ);
        let thickness_factor = 1.0 + 0.01 * avg_thickness;
        let impedance_curve: Vec<f64> = frequency_axis
            .iter()
            .map(|_| rng.gen_range(0.5..=1.5) * thickness_factor)
            .collect();

        let metrics = AcousticMetrics {
            first_resonance_hz: f1,
            cutoff_hz: CUTOFF_RATIO * f1,
            resistance_score: resistance,
            harmonicity: rng.gen_range(0.70..=0.95),
            brightness: rng.gen_range(0.30..=0.80),
        };

        debug!(
            adapter = self.name(),
            samples = profile.len(),
            material = %material.name,
            f1 = metrics.first_resonance_hz,
            "placeholder evaluation"
        );

        AcousticResult::new(metrics, frequency_axis, impedance_curve).map_err(|e| {
            BoreError::SimulationFailure {
                reason: e.to_string(),
                geometry: profile.clone(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::ProfileGenerator;
    use crate::types::BoreShape;

    fn profile() -> ProfileCurve {
        ProfileGenerator::default()
            .generate(BoreShape::Tapered, 14.8, 15.2, 66.0, 30)
            .unwrap()
    }

    #[test]
    fn identical_inputs_identical_results() {
        let adapter = PlaceholderSimulationAdapter::new(7);
        let env = Environment::default();
        let a = adapter.evaluate(&profile(), &Material::mopane(), 1.2, &env).unwrap();
        let b = adapter.evaluate(&profile(), &Material::mopane(), 1.2, &env).unwrap();
        assert_eq!(a, b);

        let c = adapter.evaluate(&profile(), &Material::mopane(), 1.3, &env).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn metrics_within_declared_ranges() {
        let adapter = PlaceholderSimulationAdapter::default();
        let env = Environment::default();
        let result = adapter
            .evaluate(&profile(), &Material::african_blackwood(), 0.4, &env)
            .unwrap();

        let f1 = result.first_resonance_hz();
        assert!(f1 >= 420.0 * 1.05 - 1e-9 && f1 <= 480.0 * 1.05 + 1e-9);
        assert!((result.cutoff_hz() - 2.2 * f1).abs() < 1e-9);
        assert!((20.0..=80.0).contains(&result.resistance_score()));
        assert!((0.70..=0.95).contains(&result.harmonicity()));
        assert!((0.30..=0.80).contains(&result.brightness()));
        assert_eq!(result.len(), 39);
        for (z, y) in result.impedance_curve().iter().zip(result.admittance_curve()) {
            assert!(*z >= 0.5 && *z <= 1.5 * 1.004 + 1e-12);
            assert!((z * y - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn input_digest_is_fnv1a() {
        assert_eq!(InputDigest::new().finish(), 0xcbf2_9ce4_8422_2325);
        assert_eq!(InputDigest::new().bytes(b"a").finish(), 0xaf63_dc4c_8601_ec8c);
        assert_ne!(
            InputDigest::new().text("ab").text("c").finish(),
            InputDigest::new().text("a").text("bc").finish()
        );
    }

    #[test]
    fn seed_changes_results() {
        let env = Environment::default();
        let a = PlaceholderSimulationAdapter::new(1)
            .evaluate(&profile(), &Material::mopane(), 1.2, &env)
            .unwrap();
        let b = PlaceholderSimulationAdapter::new(2)
            .evaluate(&profile(), &Material::mopane(), 1.2, &env)
            .unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn hard_rubber_scales_down() {
        assert_eq!(PlaceholderSimulationAdapter::material_factor(&Material::hard_rubber()), 0.95);
        assert_eq!(PlaceholderSimulationAdapter::material_factor(&Material::composite()), 1.0);
    }

    #[test]
    fn rejects_short_profile() {
        let adapter = PlaceholderSimulationAdapter::default();
        let err = adapter
            .evaluate(&ProfileCurve::default(), &Material::default(), 1.0, &Environment::default())
            .unwrap_err();
        assert!(matches!(err, BoreError::InvalidGeometry(_)));
    }
}

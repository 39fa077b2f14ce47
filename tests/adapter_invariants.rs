//! Result invariants that every simulation adapter must uphold.

use clarinet_bore::materials::{get_all_materials, Material};
use clarinet_bore::profile::ProfileGenerator;
use clarinet_bore::simulation::{
    AcousticResult, PhysicsSimulationAdapter, PlaceholderSimulationAdapter, SimulationAdapter,
    SimulationSettings,
};
use clarinet_bore::types::{BoreShape, Environment};
use clarinet_bore::{BoreError, ProfileCurve};
use proptest::prelude::*;

fn assert_result_invariants(result: &AcousticResult) {
    let n = result.frequency_axis().len();
    assert_eq!(result.impedance_curve().len(), n);
    assert_eq!(result.admittance_curve().len(), n);
    for (z, y) in result.impedance_curve().iter().zip(result.admittance_curve()) {
        assert!(*z != 0.0);
        assert!((z * y - 1.0).abs() < 1e-9, "z·y = {}", z * y);
    }
    assert!((0.0..=100.0).contains(&result.resistance_score()));
    assert!((0.0..=1.0).contains(&result.harmonicity()));
    assert!((0.0..=1.0).contains(&result.brightness()));
    assert!(result.first_resonance_hz() > 0.0);
    assert!(result.cutoff_hz() > 0.0);
}

fn adapters() -> Vec<Box<dyn SimulationAdapter>> {
    vec![
        Box::new(PlaceholderSimulationAdapter::new(17)),
        Box::new(PhysicsSimulationAdapter::with_settings(SimulationSettings {
            freq_step_hz: 20.0,
            ..Default::default()
        })),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn every_adapter_returns_consistent_curves(
        shape in prop::sample::select(BoreShape::ALL.to_vec()),
        entry in 12.0f64..17.0,
        exit in 12.0f64..17.0,
        length in 40.0f64..80.0,
        n in 2usize..40,
        thickness in 0.5f64..8.0,
    ) {
        let profile = ProfileGenerator::default().generate(shape, entry, exit, length, n).unwrap();
        for adapter in adapters() {
            let result = adapter
                .evaluate(&profile, &Material::default(), thickness, &Environment::default())
                .unwrap();
            assert_result_invariants(&result);
        }
    }
}

#[test]
fn every_material_is_accepted() {
    let profile = ProfileGenerator::default()
        .generate(BoreShape::Tapered, 14.8, 15.2, 66.0, 30)
        .unwrap();
    for adapter in adapters() {
        for (_, material) in get_all_materials() {
            let result = adapter
                .evaluate(&profile, &material, 3.0, &Environment::new(18.0, 80.0))
                .unwrap();
            assert_result_invariants(&result);
        }
    }
}

#[test]
fn empty_profile_is_rejected_before_simulation() {
    for adapter in adapters() {
        let err = adapter
            .evaluate(&ProfileCurve::default(), &Material::default(), 3.0, &Environment::default())
            .unwrap_err();
        assert!(matches!(err, BoreError::InvalidGeometry(_)), "{}: {err}", adapter.name());
    }
}

#[test]
fn placeholder_is_deterministic_per_input() {
    let adapter = PlaceholderSimulationAdapter::new(5);
    let profile = ProfileGenerator::default()
        .generate(BoreShape::Cylindrical, 15.0, 15.0, 66.0, 10)
        .unwrap();
    let env = Environment::default();

    let a = adapter.evaluate(&profile, &Material::mopane(), 3.0, &env).unwrap();
    let _ = adapter.evaluate(&profile, &Material::cocobolo(), 3.0, &env).unwrap();
    let b = adapter.evaluate(&profile, &Material::mopane(), 3.0, &env).unwrap();
    assert_eq!(a, b);
}

#[test]
fn longer_bore_resonates_lower() {
    let adapter = PhysicsSimulationAdapter::default();
    let generator = ProfileGenerator::default();
    let env = Environment::default();
    let material = Material::default();

    let short = generator.generate(BoreShape::Cylindrical, 15.0, 15.0, 300.0, 20).unwrap();
    let long = generator.generate(BoreShape::Cylindrical, 15.0, 15.0, 600.0, 20).unwrap();
    let f_short = adapter.evaluate(&short, &material, 3.0, &env).unwrap().first_resonance_hz();
    let f_long = adapter.evaluate(&long, &material, 3.0, &env).unwrap().first_resonance_hz();
    assert!(f_long < f_short, "{f_long} !< {f_short}");
}

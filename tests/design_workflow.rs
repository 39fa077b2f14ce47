//! End-to-end checks across generation, simulation, assessment, comparison,
//! optimization and session storage.

use clarinet_bore::comparison::{ComparisonEntry, ComparisonHistory};
use clarinet_bore::evaluation::{evaluate_attributes, summarize};
use clarinet_bore::geometry::{BoreSegment, FingeringEntry, Geometry, HoleState, SectionType, ToneHole};
use clarinet_bore::materials::Material;
use clarinet_bore::optimization::{
    autotune, AutotuneConfig, BarrelParams, OptimizationTarget, OptimizerConfig, SurrogateConfig,
};
use clarinet_bore::profile::sample_segments;
use clarinet_bore::session::{Design, DesignStore, SessionCodec};
use clarinet_bore::simulation::{AcousticMetrics, AcousticResult, PhysicsSimulationAdapter, SimulationAdapter};
use clarinet_bore::types::{BoreShape, Environment, ExteriorShape};
use clarinet_bore::{BoreError, DesignerConfig, Optimizer};
use tempfile::tempdir;

fn result_with(resistance: f64, brightness: f64, harmonicity: f64) -> AcousticResult {
    AcousticResult::new(
        AcousticMetrics {
            first_resonance_hz: 440.0,
            cutoff_hz: 1500.0,
            resistance_score: resistance,
            harmonicity,
            brightness,
        },
        vec![400.0, 440.0, 480.0],
        vec![1.0, 2.0, 1.5],
    )
    .unwrap()
}

fn three_segment_geometry() -> Geometry {
    Geometry {
        segments: vec![
            BoreSegment::new(0.0, 20.0, 14.6, 14.8),
            BoreSegment::new(20.0, 45.0, 14.8, 14.8).with_section(SectionType::Exponential, None),
            BoreSegment::new(45.0, 66.0, 14.8, 15.2).with_section(SectionType::Bessel, Some(0.6)),
        ],
        holes: vec![ToneHole::new("register", 30.0, 2.5, 3.2)],
        fingerings: vec![FingeringEntry::new("throat A")
            .with_hole("register", HoleState::Open)
            .with_note("A4")],
    }
}

#[test]
fn history_keeps_the_five_latest_designs() {
    let mut history = ComparisonHistory::default();
    for i in 1..=6 {
        history.add(ComparisonEntry::from_result(
            format!("D{i}"),
            &result_with(40.0, 0.5, 0.8),
        ));
    }
    let window = history.current();
    let names: Vec<&str> = window.iter().map(|e| e.name()).collect();
    assert_eq!(names, vec!["D2", "D3", "D4", "D5", "D6"]);
}

#[test]
fn evaluator_boundaries_are_lower_bound_inclusive() {
    let lines = evaluate_attributes(&result_with(30.0, 0.4, 0.80));
    assert_eq!(lines, vec!["Moderate resistance", "Moderately bright tone"]);

    let lines = evaluate_attributes(&result_with(70.0, 0.6, 0.85));
    assert_eq!(lines, vec!["High resistance", "Bright tone", "Overtones align well"]);

    let lines = evaluate_attributes(&result_with(29.9, 0.39, 0.7499));
    assert_eq!(
        lines,
        vec![
            "Very free-blowing (low resistance)",
            "Dark/warm tone",
            "Overtones mismatched"
        ]
    );
}

#[test]
fn session_round_trip_through_a_file() {
    let geometry = three_segment_geometry();
    let profile = sample_segments(&geometry.segments, 8).unwrap();
    let result = PhysicsSimulationAdapter::default()
        .evaluate(&profile, &Material::cocobolo(), 3.0, &Environment::default())
        .unwrap();
    let notes = "Ream 0.1 mm wider at the tenon.\nTry \"warm\" blank, façade ✓";
    let design = Design::new("Barrel B", profile)
        .with_geometry(geometry.clone())
        .with_material(Material::cocobolo())
        .with_environment(Environment::new(20.5, 65.0))
        .with_notes(notes)
        .with_result(result);

    let dir = tempdir().unwrap();
    let path = dir.path().join("barrel_b.json");
    SessionCodec::save_to_path(&design, &path).unwrap();
    let loaded = SessionCodec::load_from_path(&path).unwrap();

    assert_eq!(loaded.notes, notes);
    assert_eq!(loaded.name, "Barrel B");
    assert_eq!(loaded.geometry.segments.len(), 3);
    for (a, b) in loaded.geometry.segments.iter().zip(&geometry.segments) {
        assert!((a.start_pos - b.start_pos).abs() < 1e-6);
        assert!((a.end_pos - b.end_pos).abs() < 1e-6);
        assert!((a.start_diam - b.start_diam).abs() < 1e-6);
        assert!((a.end_diam - b.end_diam).abs() < 1e-6);
        assert_eq!(a.section_type, b.section_type);
        assert_eq!(a.param, b.param);
    }
    assert_eq!(loaded.geometry.holes, geometry.holes);
    assert_eq!(loaded.geometry.fingerings, geometry.fingerings);
    assert_eq!(loaded.bore_profile, design.bore_profile);
    assert_eq!(loaded.last_result, design.last_result);
    assert_eq!(loaded.material, Material::cocobolo());
    assert!(loaded.saved_at.is_some());
}

#[test]
fn malformed_session_leaves_store_untouched() {
    let mut store = DesignStore::new();
    store
        .save(Design::new("Keeper", sample_segments(&three_segment_geometry().segments, 4).unwrap()))
        .unwrap();
    let before = store.get("Keeper").cloned();

    for text in ["", "[]", r#"{"design_name": "Keeper", "bore_profile": "x"}"#] {
        assert!(matches!(store.load_session(text), Err(BoreError::MalformedSession(_))));
    }
    assert_eq!(store.len(), 1);
    assert_eq!(store.get("Keeper").cloned(), before);
}

#[test]
fn optimizer_accepts_an_already_met_target() {
    let optimizer = Optimizer::new(PhysicsSimulationAdapter::default()).with_config(OptimizerConfig {
        search: SurrogateConfig::fast(),
        ..Default::default()
    });
    let initial = BarrelParams::default().with_shapes(BoreShape::Tapered, ExteriorShape::Hourglass);
    let (initial_cost, initial_result) = optimizer
        .evaluate(&initial, &OptimizationTarget::new(440.0))
        .unwrap();
    assert!(initial_cost.is_finite());

    let target = OptimizationTarget::new(initial_result.first_resonance_hz());
    let (met_cost, _) = optimizer.evaluate(&initial, &target).unwrap();
    let outcome = optimizer.optimize(&initial, &target).unwrap();

    assert!(outcome.success);
    assert!(outcome.best_cost <= met_cost);
    assert_eq!(outcome.best_params, initial);
}

#[test]
fn configured_pipeline_runs_end_to_end() {
    let mut config = DesignerConfig::default();
    config.comparison_capacity = 2;
    config.optimizer.search = SurrogateConfig {
        initial_samples: 3,
        max_evaluations: 6,
        candidate_pool_size: 100,
        ..Default::default()
    };
    config.autotune = AutotuneConfig {
        steps: 2,
        ..Default::default()
    };
    config.validate().unwrap();

    let generator = config.generator();
    let params = BarrelParams::default();
    let profile = generator
        .generate(params.bore_shape, params.entry_diam, params.exit_diam, params.length, params.sample_count)
        .unwrap();
    let thickness = generator.exterior_thickness(&profile, params.exterior_shape).unwrap();

    let adapter = config.placeholder_adapter();
    let env = Environment::default();
    let material = Material::default();
    let result = adapter.evaluate(&profile, &material, thickness.average(), &env).unwrap();
    assert!(summarize(&result).to_string().contains("Hz"));

    let mut history = config.comparison_history();
    history.add_result("", Some(&result)).unwrap();
    history.add_result("second", Some(&result)).unwrap();
    let window = history.add_result("third", Some(&result)).unwrap();
    assert_eq!(window.len(), 2);
    assert_eq!(window[0].name(), "second");

    let outcome = config
        .optimizer(&adapter)
        .optimize(&params, &OptimizationTarget::new(5000.0))
        .unwrap();
    assert!(!outcome.success);
    assert_eq!(outcome.evaluations, 6);

    let tuned = autotune(&adapter, &profile, 440.0, &material, thickness.average(), &env, &config.autotune).unwrap();
    assert_eq!(tuned.candidates_evaluated, 4);
}

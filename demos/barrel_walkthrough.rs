//! Walkthrough of the barrel design pipeline.
//!
//! Generates a tapered 66 mm barrel, simulates it with the transfer-matrix
//! adapter, prints the assessment, compares it with a reverse-tapered
//! variant, searches for parameters that put f1 on a target and finally
//! saves the session to a temporary file.
//!
//! Usage:
//!   RUST_LOG=clarinet_bore=debug cargo run --example barrel_walkthrough --release

use clarinet_bore::evaluation::{evaluate_attributes, summarize};
use clarinet_bore::materials::lookup_material;
use clarinet_bore::optimization::{BarrelParams, OptimizationTarget, SurrogateConfig};
use clarinet_bore::outline::build_outline;
use clarinet_bore::session::{Design, DesignStore, SessionCodec};
use clarinet_bore::simulation::SimulationAdapter;
use clarinet_bore::types::{BoreShape, Environment, ExteriorShape};
use clarinet_bore::{BoreSegment, DesignerConfig, Geometry};
use std::time::Instant;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> clarinet_bore::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with(fmt::layer().with_target(true))
        .init();

    let mut config = DesignerConfig::default();
    config.optimizer.search = SurrogateConfig::fast();

    let generator = config.generator();
    let adapter = config.physics_adapter();
    let material = lookup_material("african_blackwood")?;
    let environment = Environment::new(22.0, 50.0);

    // ========================================================================
    // Design A: tapered bore, standard exterior
    // ========================================================================
    let params = BarrelParams::new(14.8, 15.2, 66.0)
        .with_shapes(BoreShape::Tapered, ExteriorShape::Standard);
    let profile = generator.generate(
        params.bore_shape,
        params.entry_diam,
        params.exit_diam,
        params.length,
        params.sample_count,
    )?;
    let thickness = generator.exterior_thickness(&profile, params.exterior_shape)?;

    println!("Barrel A ({} / {})", params.bore_shape, params.exterior_shape);
    println!("  samples:        {}", profile.len());
    println!("  mean bore:      {:.3} mm", profile.mean_diameter().unwrap_or(0.0));
    println!("  mean wall:      {:.3} mm", thickness.average());

    let start = Instant::now();
    let result_a = adapter.evaluate(&profile, &material, thickness.average(), &environment)?;
    println!("  simulated in {:.1} ms", start.elapsed().as_secs_f64() * 1000.0);
    println!("{}", summarize(&result_a));
    for line in evaluate_attributes(&result_a) {
        println!("  - {line}");
    }

    // ========================================================================
    // Design B: reverse taper for comparison
    // ========================================================================
    let profile_b = generator.generate(BoreShape::ReverseTapered, 14.8, 15.2, 66.0, params.sample_count)?;
    let thickness_b = generator.exterior_thickness(&profile_b, ExteriorShape::Hourglass)?;
    let result_b = adapter.evaluate(&profile_b, &material, thickness_b.average(), &environment)?;

    let mut history = config.comparison_history();
    history.add_result("Tapered", Some(&result_a));
    let window = history.add_result("", Some(&result_b)).unwrap_or_default();

    println!("\n{:<12} {:>10} {:>10} {:>8} {:>8} {:>8}", "design", "f1 (Hz)", "cutoff", "resist", "bright", "harm");
    for entry in &window {
        println!(
            "{:<12} {:>10.1} {:>10.1} {:>8.1} {:>8.3} {:>8.3}",
            entry.name(),
            entry.f1(),
            entry.cutoff(),
            entry.resistance(),
            entry.brightness(),
            entry.harmonicity()
        );
    }

    // ========================================================================
    // Optimization towards a lower first resonance
    // ========================================================================
    let target = OptimizationTarget::new(result_a.first_resonance_hz() * 0.97);
    println!("\nSearching for f1 = {:.1} Hz", target.first_resonance_hz);

    let start = Instant::now();
    let outcome = config.optimizer(&adapter).optimize(&params, &target)?;
    println!(
        "  {} after {} evaluations in {:.2} s",
        if outcome.success { "converged" } else { "best effort" },
        outcome.evaluations,
        start.elapsed().as_secs_f64()
    );
    println!(
        "  entry {:.3} mm, exit {:.3} mm, length {:.3} mm, cost {:.5}",
        outcome.best_params.entry_diam,
        outcome.best_params.exit_diam,
        outcome.best_params.length,
        outcome.best_cost
    );

    // ========================================================================
    // Session
    // ========================================================================
    let geometry = Geometry {
        segments: vec![BoreSegment::new(0.0, params.length, params.entry_diam, params.exit_diam)],
        ..Default::default()
    };
    println!("\nOutline has {} points", build_outline(&geometry.segments)?.len());

    let design = Design::new("Tapered A", profile)
        .with_geometry(geometry)
        .with_material(material)
        .with_environment(environment)
        .with_notes("Walkthrough design")
        .with_result(result_a);

    let mut store = DesignStore::new();
    store.save(design)?;
    let text = store.export_session("Tapered A")?;

    let path = std::env::temp_dir().join("barrel_walkthrough_session.json");
    if let Some(saved) = store.get("Tapered A") {
        SessionCodec::save_to_path(saved, &path)?;
    }
    let reloaded = SessionCodec::load_from_path(&path)?;
    println!(
        "Session written to {} ({} bytes), reloaded '{}'",
        path.display(),
        text.len(),
        reloaded.name
    );

    Ok(())
}

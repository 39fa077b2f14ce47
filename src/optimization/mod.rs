//! Barrel optimization against a target first resonance.
//!
//! Two strategies are provided:
//!
//! - [`Optimizer`]: bounded RBF-surrogate search over entry diameter, exit
//!   diameter and length, driven by a weighted f1/impedance cost.
//! - [`autotune`]: exhaustive entry/exit grid over an existing profile,
//!   keeping the candidate with the strongest impedance at the target.
//!
//! # Example
//!
//! ```
//! use clarinet_bore::optimization::{
//!     BarrelParams, OptimizationTarget, Optimizer, OptimizerConfig, SurrogateConfig,
//! };
//! use clarinet_bore::simulation::PlaceholderSimulationAdapter;
//!
//! let config = OptimizerConfig {
//!     search: SurrogateConfig::fast(),
//!     ..Default::default()
//! };
//! let optimizer = Optimizer::new(PlaceholderSimulationAdapter::new(42)).with_config(config);
//! let outcome = optimizer
//!     .optimize(&BarrelParams::default(), &OptimizationTarget::new(450.0))
//!     .unwrap();
//!
//! println!(
//!     "entry {:.2} mm, exit {:.2} mm, length {:.2} mm (cost {:.4})",
//!     outcome.best_params.entry_diam,
//!     outcome.best_params.exit_diam,
//!     outcome.best_params.length,
//!     outcome.best_cost,
//! );
//! ```

pub mod autotune;
pub mod objective;
pub mod optimizer;
pub mod sampling;
pub mod surrogate;
pub mod types;

pub use autotune::{autotune, AutotuneConfig, AutotuneOutcome};
pub use objective::{compute_cost, impedance_error, relative_f1_error};
pub use optimizer::Optimizer;
pub use sampling::{grid_sample, latin_hypercube_sample};
pub use surrogate::{
    run_surrogate_optimization, AlphaSchedule, RbfKernel, SurrogateConfig, SurrogateModel,
    SurrogateResult,
};
pub use types::{
    BarrelParams, BoundsPolicy, CostWeights, OptimizationOutcome, OptimizationTarget,
    OptimizerConfig,
};

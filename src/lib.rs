//! Clarinet barrel and bore design.
//!
//! The pipeline runs from parameters to a sampled bore profile
//! ([`profile::ProfileGenerator`]), through a swappable acoustic back end
//! ([`simulation::SimulationAdapter`]) to a plain-language assessment
//! ([`evaluation`]) and, optionally, a search for parameters that hit a
//! target first resonance ([`optimization`]). Designs are saved and restored
//! as JSON sessions ([`session`]).
//!
//! All lengths are millimetres unless a field says otherwise.
//!
//! # Example
//!
//! ```
//! use clarinet_bore::evaluation::evaluate_attributes;
//! use clarinet_bore::materials::Material;
//! use clarinet_bore::profile::ProfileGenerator;
//! use clarinet_bore::simulation::{PhysicsSimulationAdapter, SimulationAdapter};
//! use clarinet_bore::types::{BoreShape, Environment, ExteriorShape};
//!
//! let generator = ProfileGenerator::default();
//! let profile = generator.generate(BoreShape::Tapered, 14.8, 15.2, 66.0, 30).unwrap();
//! let thickness = generator.exterior_thickness(&profile, ExteriorShape::Standard).unwrap();
//!
//! let adapter = PhysicsSimulationAdapter::default();
//! let result = adapter
//!     .evaluate(&profile, &Material::default(), thickness.average(), &Environment::default())
//!     .unwrap();
//! for line in evaluate_attributes(&result) {
//!     println!("{line}");
//! }
//! ```

pub mod comparison;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod geometry;
pub mod materials;
pub mod optimization;
pub mod outline;
pub mod profile;
pub mod session;
pub mod simulation;
pub mod types;

pub use comparison::{ComparisonEntry, ComparisonHistory};
pub use config::DesignerConfig;
pub use error::{BoreError, Result};
pub use geometry::{BoreSegment, FingeringEntry, Geometry, ProfileCurve, ThicknessCurve, ToneHole};
pub use materials::Material;
pub use optimization::{BarrelParams, OptimizationOutcome, OptimizationTarget, Optimizer};
pub use profile::ProfileGenerator;
pub use session::{Design, DesignStore, SessionCodec};
pub use simulation::{
    AcousticResult, PhysicsSimulationAdapter, PlaceholderSimulationAdapter, SimulationAdapter,
};
pub use types::{BoreShape, Environment, ExteriorShape, Resolution};

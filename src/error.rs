//! Error types for bore design, simulation and session handling.
//!
//! Non-convergence of the optimizer is deliberately absent: it is reported
//! through `OptimizationOutcome::success` together with the best candidate.

use std::io;
use thiserror::Error;

use crate::geometry::ProfileCurve;

/// Errors surfaced by the design pipeline.
#[derive(Error, Debug)]
pub enum BoreError {
    /// Geometry rejected before any simulation call.
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// The acoustic engine could not produce a result for this profile.
    #[error("Simulation failed: {reason} (profile with {} samples)", .geometry.len())]
    SimulationFailure {
        /// Why the engine gave up.
        reason: String,
        /// The last geometry attempted.
        geometry: ProfileCurve,
    },

    /// Metrics or curves that break the result contract.
    #[error("Invalid result: {0}")]
    InvalidResult(String),

    /// A session payload could not be loaded.
    #[error("Malformed session: {0}")]
    MalformedSession(String),

    /// A configuration constant is out of its valid range.
    #[error("Invalid configuration '{key}': {reason}")]
    InvalidConfig { key: String, reason: String },

    /// No material with this key or name exists.
    #[error("Unknown material: {0}")]
    UnknownMaterial(String),

    /// No stored design with this name exists.
    #[error("Unknown design: {0}")]
    UnknownDesign(String),

    /// I/O error while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl BoreError {
    pub(crate) fn invalid_config(key: &str, reason: impl Into<String>) -> Self {
        BoreError::InvalidConfig {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, BoreError>;

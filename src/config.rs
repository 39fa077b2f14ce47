//! Designer configuration.
//!
//! Every tunable constant of the pipeline lives here, grouped by the
//! component that consumes it. Files may be JSON or TOML; missing sections
//! and fields fall back to their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::comparison::{ComparisonHistory, DEFAULT_CAPACITY};
use crate::error::{BoreError, Result};
use crate::optimization::{AutotuneConfig, Optimizer, OptimizerConfig};
use crate::profile::{ExteriorConstants, ProfileConstants, ProfileGenerator};
use crate::simulation::{PhysicsSimulationAdapter, PlaceholderSimulationAdapter, SimulationAdapter, SimulationSettings};

/// Complete designer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignerConfig {
    /// Entries kept by the comparison history
    pub comparison_capacity: usize,
    /// Bore shape modifiers
    pub profile: ProfileConstants,
    /// Exterior outer-diameter factors
    pub exterior: ExteriorConstants,
    /// Frequency sweep and placeholder seed
    pub simulation: SimulationSettings,
    /// Cost weights, search bounds and surrogate settings
    pub optimizer: OptimizerConfig,
    /// Entry/exit grid for autotune
    pub autotune: AutotuneConfig,
}

impl Default for DesignerConfig {
    fn default() -> Self {
        Self {
            comparison_capacity: DEFAULT_CAPACITY,
            profile: ProfileConstants::default(),
            exterior: ExteriorConstants::default(),
            simulation: SimulationSettings::default(),
            optimizer: OptimizerConfig::default(),
            autotune: AutotuneConfig::default(),
        }
    }
}

impl DesignerConfig {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        let config: Self = match Format::of(path)? {
            Format::Json => serde_json::from_str(&content)
                .map_err(|e| BoreError::invalid_config("file", format!("invalid JSON config: {e}")))?,
            Format::Toml => toml::from_str(&content)
                .map_err(|e| BoreError::invalid_config("file", format!("invalid TOML config: {e}")))?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        self.validate()?;

        let content = match Format::of(path)? {
            Format::Json => serde_json::to_string_pretty(self)
                .map_err(|e| BoreError::invalid_config("file", format!("failed to serialize config: {e}")))?,
            Format::Toml => toml::to_string_pretty(self)
                .map_err(|e| BoreError::invalid_config("file", format!("failed to serialize config: {e}")))?,
        };

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.profile.validate()?;
        self.exterior.validate()?;
        self.simulation.validate()?;
        self.optimizer.validate()?;
        self.autotune.validate()?;

        if self.comparison_capacity == 0 {
            return Err(BoreError::invalid_config("comparison_capacity", "must be > 0"));
        }
        Ok(())
    }

    pub fn generator(&self) -> ProfileGenerator {
        ProfileGenerator::new(self.profile, self.exterior)
    }

    pub fn comparison_history(&self) -> ComparisonHistory {
        ComparisonHistory::new(self.comparison_capacity)
    }

    pub fn placeholder_adapter(&self) -> PlaceholderSimulationAdapter {
        PlaceholderSimulationAdapter::new(self.simulation.placeholder_seed)
    }

    pub fn physics_adapter(&self) -> PhysicsSimulationAdapter {
        PhysicsSimulationAdapter::with_settings(self.simulation.clone())
    }

    /// Optimizer over `adapter` using this config's generator and search settings.
    pub fn optimizer<A: SimulationAdapter>(&self, adapter: A) -> Optimizer<A> {
        Optimizer::new(adapter)
            .with_generator(self.generator())
            .with_config(self.optimizer.clone())
    }
}

enum Format {
    Json,
    Toml,
}

impl Format {
    fn of(path: &Path) -> Result<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Format::Json),
            Some("toml") => Ok(Format::Toml),
            _ => Err(BoreError::invalid_config(
                "file",
                format!("config file must be .json or .toml: {}", path.display()),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        let config = DesignerConfig::new();
        assert!(config.validate().is_ok());
        assert_eq!(config.comparison_capacity, 5);
        assert_eq!(config.comparison_history().capacity(), 5);
    }

    #[test]
    fn test_json_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("designer.json");

        let mut config = DesignerConfig::default();
        config.profile.taper = 0.12;
        config.comparison_capacity = 8;
        config.save_to_file(&path).unwrap();

        let loaded = DesignerConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_toml_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("designer.toml");

        let mut config = DesignerConfig::default();
        config.exterior.flare_gain = 0.3;
        config.autotune.steps = 4;
        config.save_to_file(&path).unwrap();

        let loaded = DesignerConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "comparison_capacity = 3\n\n[profile]\nstep_factor = 1.1\n").unwrap();

        let loaded = DesignerConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.comparison_capacity, 3);
        assert_eq!(loaded.profile.step_factor, 1.1);
        assert_eq!(loaded.profile.taper, ProfileConstants::default().taper);
        assert_eq!(loaded.simulation, SimulationSettings::default());
    }

    #[test]
    fn test_rejects_unknown_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("designer.yaml");
        let err = DesignerConfig::default().save_to_file(&path).unwrap_err();
        assert!(matches!(err, BoreError::InvalidConfig { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn test_rejects_zero_capacity() {
        let config = DesignerConfig {
            comparison_capacity: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, BoreError::InvalidConfig { ref key, .. } if key == "comparison_capacity"));
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            DesignerConfig::load_from_file(&path),
            Err(BoreError::InvalidConfig { .. })
        ));

        let missing = dir.path().join("missing.json");
        assert!(matches!(DesignerConfig::load_from_file(&missing), Err(BoreError::Io(_))));
    }
}

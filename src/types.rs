//! Shared enums, constants and the acoustic environment.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BoreError;

/// Millimetres per metre. Geometry is entered in mm, engines work in m.
pub const MM_PER_M: f64 = 1000.0;

/// Smallest number of samples a profile curve may carry.
pub const MIN_SAMPLE_COUNT: usize = 2;

/// Floor applied to impedance magnitudes so admittance stays finite.
pub const MIN_IMPEDANCE: f64 = 1e-9;

/// Default room temperature (°C) used when a session omits it.
pub const DEFAULT_TEMPERATURE_C: f64 = 22.0;

/// Default relative humidity (%) used when a session omits it.
pub const DEFAULT_HUMIDITY: f64 = 50.0;

/// Interior bore shape selecting the multiplicative profile modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BoreShape {
    #[default]
    #[serde(alias = "cylindrical")]
    Cylindrical,
    #[serde(alias = "tapered")]
    Tapered,
    #[serde(rename = "Reverse Tapered", alias = "reverse_tapered")]
    ReverseTapered,
    #[serde(alias = "parabolic")]
    Parabolic,
    #[serde(alias = "stepped")]
    Stepped,
}

impl BoreShape {
    pub const ALL: [BoreShape; 5] = [
        BoreShape::Cylindrical,
        BoreShape::Tapered,
        BoreShape::ReverseTapered,
        BoreShape::Parabolic,
        BoreShape::Stepped,
    ];

    /// Display label, matching the serialized form.
    pub fn label(&self) -> &'static str {
        match self {
            BoreShape::Cylindrical => "Cylindrical",
            BoreShape::Tapered => "Tapered",
            BoreShape::ReverseTapered => "Reverse Tapered",
            BoreShape::Parabolic => "Parabolic",
            BoreShape::Stepped => "Stepped",
        }
    }
}

impl fmt::Display for BoreShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for BoreShape {
    type Err = BoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_label(s);
        BoreShape::ALL
            .into_iter()
            .find(|shape| normalize_label(shape.label()) == wanted)
            .ok_or_else(|| BoreError::InvalidConfig {
                key: "bore_shape".to_string(),
                reason: format!("unknown bore shape '{s}'"),
            })
    }
}

/// Exterior profile of the barrel body, which sets the wall thickness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ExteriorShape {
    #[default]
    #[serde(rename = "Standard (parallel exterior)", alias = "Standard")]
    Standard,
    #[serde(rename = "Hourglass (waist tapered)", alias = "Hourglass")]
    Hourglass,
    #[serde(
        rename = "Bell-like Flare (tuned for resonance)",
        alias = "Bell-like Flare (tuned)",
        alias = "Bell-like Flare"
    )]
    BellFlare,
    #[serde(rename = "Reverse Taper (bulged center)", alias = "Reverse Taper")]
    ReverseTaper,
    #[serde(rename = "User-Defined")]
    UserDefined,
}

impl ExteriorShape {
    pub const ALL: [ExteriorShape; 5] = [
        ExteriorShape::Standard,
        ExteriorShape::Hourglass,
        ExteriorShape::BellFlare,
        ExteriorShape::ReverseTaper,
        ExteriorShape::UserDefined,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ExteriorShape::Standard => "Standard (parallel exterior)",
            ExteriorShape::Hourglass => "Hourglass (waist tapered)",
            ExteriorShape::BellFlare => "Bell-like Flare (tuned for resonance)",
            ExteriorShape::ReverseTaper => "Reverse Taper (bulged center)",
            ExteriorShape::UserDefined => "User-Defined",
        }
    }

    /// Label up to the first parenthesis, e.g. "Hourglass".
    fn short_label(&self) -> &'static str {
        let label = self.label();
        label.split(" (").next().unwrap_or(label)
    }
}

impl fmt::Display for ExteriorShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ExteriorShape {
    type Err = BoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_label(s);
        ExteriorShape::ALL
            .into_iter()
            .find(|shape| {
                normalize_label(shape.label()) == wanted
                    || normalize_label(shape.short_label()) == wanted
            })
            .ok_or_else(|| BoreError::InvalidConfig {
                key: "exterior_shape".to_string(),
                reason: format!("unknown exterior shape '{s}'"),
            })
    }
}

/// Sampling density presets offered by the design form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Resolution {
    Low,
    #[default]
    Medium,
    High,
}

impl Resolution {
    pub fn sample_count(&self) -> usize {
        match self {
            Resolution::Low => 10,
            Resolution::Medium => 30,
            Resolution::High => 60,
        }
    }
}

/// Ambient conditions of the air column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    /// Air temperature (°C)
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Relative humidity (%)
    #[serde(default = "default_humidity")]
    pub humidity: f64,
}

impl Environment {
    pub fn new(temperature: f64, humidity: f64) -> Self {
        Self {
            temperature,
            humidity,
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPERATURE_C, DEFAULT_HUMIDITY)
    }
}

fn default_temperature() -> f64 {
    DEFAULT_TEMPERATURE_C
}

fn default_humidity() -> f64 {
    DEFAULT_HUMIDITY
}

fn normalize_label(s: &str) -> String {
    s.trim()
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

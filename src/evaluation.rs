//! Qualitative reading of an [`AcousticResult`].
//!
//! Bucket edges are inclusive on the lower bound: a value sitting exactly on
//! an edge falls into the bucket that starts there.

use std::fmt;

use serde::Serialize;

use crate::simulation::AcousticResult;

pub const RESISTANCE_FREE_BELOW: f64 = 30.0;
pub const RESISTANCE_HIGH_FROM: f64 = 70.0;
pub const BRIGHTNESS_DARK_BELOW: f64 = 0.4;
pub const BRIGHTNESS_BRIGHT_FROM: f64 = 0.6;
pub const HARMONICITY_MISMATCHED_BELOW: f64 = 0.75;
pub const HARMONICITY_ALIGNED_FROM: f64 = 0.85;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResistanceClass {
    VeryFree,
    Moderate,
    High,
}

impl ResistanceClass {
    pub fn classify(score: f64) -> Self {
        if score < RESISTANCE_FREE_BELOW {
            ResistanceClass::VeryFree
        } else if score < RESISTANCE_HIGH_FROM {
            ResistanceClass::Moderate
        } else {
            ResistanceClass::High
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ResistanceClass::VeryFree => "Very free-blowing (low resistance)",
            ResistanceClass::Moderate => "Moderate resistance",
            ResistanceClass::High => "High resistance",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BrightnessClass {
    Dark,
    ModeratelyBright,
    Bright,
}

impl BrightnessClass {
    pub fn classify(brightness: f64) -> Self {
        if brightness < BRIGHTNESS_DARK_BELOW {
            BrightnessClass::Dark
        } else if brightness < BRIGHTNESS_BRIGHT_FROM {
            BrightnessClass::ModeratelyBright
        } else {
            BrightnessClass::Bright
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            BrightnessClass::Dark => "Dark/warm tone",
            BrightnessClass::ModeratelyBright => "Moderately bright tone",
            BrightnessClass::Bright => "Bright tone",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HarmonicityClass {
    Mismatched,
    Unremarkable,
    Aligned,
}

impl HarmonicityClass {
    pub fn classify(harmonicity: f64) -> Self {
        if harmonicity >= HARMONICITY_ALIGNED_FROM {
            HarmonicityClass::Aligned
        } else if harmonicity < HARMONICITY_MISMATCHED_BELOW {
            HarmonicityClass::Mismatched
        } else {
            HarmonicityClass::Unremarkable
        }
    }

    /// `None` for the middle bucket, which produces no remark.
    pub fn description(&self) -> Option<&'static str> {
        match self {
            HarmonicityClass::Aligned => Some("Overtones align well"),
            HarmonicityClass::Mismatched => Some("Overtones mismatched"),
            HarmonicityClass::Unremarkable => None,
        }
    }
}

/// All three classifications of one result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Assessment {
    pub resistance: ResistanceClass,
    pub brightness: BrightnessClass,
    pub harmonicity: HarmonicityClass,
}

impl Assessment {
    pub fn of(result: &AcousticResult) -> Self {
        Self {
            resistance: ResistanceClass::classify(result.resistance_score()),
            brightness: BrightnessClass::classify(result.brightness()),
            harmonicity: HarmonicityClass::classify(result.harmonicity()),
        }
    }

    /// Human-readable lines, resistance then brightness then harmonicity.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            self.resistance.description().to_string(),
            self.brightness.description().to_string(),
        ];
        if let Some(line) = self.harmonicity.description() {
            lines.push(line.to_string());
        }
        lines
    }
}

/// Describe a result as a short list of qualitative remarks.
///
/// # Example
/// ```
/// use clarinet_bore::evaluation::evaluate_attributes;
/// use clarinet_bore::simulation::{AcousticMetrics, AcousticResult};
///
/// let metrics = AcousticMetrics {
///     first_resonance_hz: 440.0,
///     cutoff_hz: 950.0,
///     resistance_score: 30.0,
///     brightness: 0.4,
///     harmonicity: 0.80,
/// };
/// let result = AcousticResult::new(metrics, vec![], vec![]).unwrap();
/// assert_eq!(
///     evaluate_attributes(&result),
///     vec!["Moderate resistance", "Moderately bright tone"]
/// );
/// ```
pub fn evaluate_attributes(result: &AcousticResult) -> Vec<String> {
    Assessment::of(result).lines()
}

/// Numeric digest of a result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultSummary {
    pub first_resonance_hz: f64,
    pub cutoff_hz: f64,
    pub point_count: usize,
    pub average_impedance: Option<f64>,
}

impl fmt::Display for ResultSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "First resonance (f1): {:.2} Hz", self.first_resonance_hz)?;
        writeln!(f, "Cutoff frequency: {:.2} Hz", self.cutoff_hz)?;
        writeln!(f, "Measured over {} frequency points.", self.point_count)?;
        match self.average_impedance {
            Some(z) => write!(f, "Average impedance: {z:.2}"),
            None => write!(f, "No impedances found."),
        }
    }
}

pub fn summarize(result: &AcousticResult) -> ResultSummary {
    ResultSummary {
        first_resonance_hz: result.first_resonance_hz(),
        cutoff_hz: result.cutoff_hz(),
        point_count: result.len(),
        average_impedance: result.average_impedance(),
    }
}

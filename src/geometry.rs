//! Bore geometry records and sampled profile curves.
//!
//! A bore is described two ways: as a table of discrete [`BoreSegment`]s
//! (what the user edits) and as a sampled [`ProfileCurve`] (what the
//! generator produces and the simulation consumes). Tone holes and
//! fingerings share the axial coordinate space but are otherwise independent.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{BoreError, Result};
use crate::types::MIN_SAMPLE_COUNT;

/// Shape of the wall between the two ends of a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionType {
    /// Circular arc; `param` is the signed arc radius.
    Circle,
    /// Straight cone (linear diameter).
    #[default]
    Cone,
    /// Geometric diameter change.
    Exponential,
    /// Bessel horn; `param` is the flare exponent.
    Bessel,
}

/// One piecewise section of the internal bore (all lengths in mm).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoreSegment {
    pub start_pos: f64,
    pub end_pos: f64,
    #[serde(alias = "start_dia")]
    pub start_diam: f64,
    #[serde(alias = "end_dia")]
    pub end_diam: f64,
    #[serde(default)]
    pub section_type: SectionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub param: Option<f64>,
}

impl BoreSegment {
    /// Create a conical segment.
    pub fn new(start_pos: f64, end_pos: f64, start_diam: f64, end_diam: f64) -> Self {
        Self {
            start_pos,
            end_pos,
            start_diam,
            end_diam,
            section_type: SectionType::Cone,
            param: None,
        }
    }

    pub fn with_section(mut self, section_type: SectionType, param: Option<f64>) -> Self {
        self.section_type = section_type;
        self.param = param;
        self
    }

    pub fn length(&self) -> f64 {
        self.end_pos - self.start_pos
    }

    /// Reject degenerate or non-physical segments.
    pub fn validate(&self) -> Result<()> {
        let values = [self.start_pos, self.end_pos, self.start_diam, self.end_diam];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(BoreError::InvalidGeometry(format!(
                "segment {:.3}..{:.3} has non-finite values",
                self.start_pos, self.end_pos
            )));
        }
        if self.start_pos >= self.end_pos {
            return Err(BoreError::InvalidGeometry(format!(
                "segment start_pos {:.3} must be < end_pos {:.3}",
                self.start_pos, self.end_pos
            )));
        }
        if self.start_diam <= 0.0 || self.end_diam <= 0.0 {
            return Err(BoreError::InvalidGeometry(format!(
                "segment {:.3}..{:.3} has non-positive diameter",
                self.start_pos, self.end_pos
            )));
        }
        Ok(())
    }
}

/// Validate every segment and return them sorted by `start_pos`.
///
/// Input order is never trusted; gaps and overlaps between neighbours are
/// left for the caller to interpret.
pub fn sorted_segments(segments: &[BoreSegment]) -> Result<Vec<BoreSegment>> {
    for segment in segments {
        segment.validate()?;
    }
    let mut sorted = segments.to_vec();
    sorted.sort_by(|a, b| a.start_pos.total_cmp(&b.start_pos));
    Ok(sorted)
}

/// Open/closed state of a tone hole in a fingering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HoleState {
    Open,
    Closed,
}

/// A side hole along the bore (mm).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToneHole {
    pub label: String,
    pub position: f64,
    #[serde(alias = "chimney")]
    pub chimney_height: f64,
    pub diameter: f64,
}

impl ToneHole {
    pub fn new(label: impl Into<String>, position: f64, chimney_height: f64, diameter: f64) -> Self {
        Self {
            label: label.into(),
            position,
            chimney_height,
            diameter,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.position.is_finite() || !self.chimney_height.is_finite() {
            return Err(BoreError::InvalidGeometry(format!(
                "hole '{}' has non-finite values",
                self.label
            )));
        }
        if self.diameter <= 0.0 || !self.diameter.is_finite() {
            return Err(BoreError::InvalidGeometry(format!(
                "hole '{}' must have a positive diameter",
                self.label
            )));
        }
        if self.chimney_height < 0.0 {
            return Err(BoreError::InvalidGeometry(format!(
                "hole '{}' has a negative chimney height",
                self.label
            )));
        }
        Ok(())
    }
}

/// Which holes are open or closed to sound a note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FingeringEntry {
    #[serde(alias = "finger_label")]
    pub label: String,
    #[serde(default)]
    pub hole_states: BTreeMap<String, HoleState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl FingeringEntry {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            hole_states: BTreeMap::new(),
            note: None,
        }
    }

    pub fn with_hole(mut self, hole: impl Into<String>, state: HoleState) -> Self {
        self.hole_states.insert(hole.into(), state);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Editable geometry tables of a design.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Geometry {
    #[serde(default, alias = "bore")]
    pub segments: Vec<BoreSegment>,
    #[serde(default)]
    pub holes: Vec<ToneHole>,
    #[serde(default)]
    pub fingerings: Vec<FingeringEntry>,
}

impl Geometry {
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty() && self.holes.is_empty() && self.fingerings.is_empty()
    }

    /// Check segments, hole label uniqueness and fingering references.
    pub fn validate(&self) -> Result<()> {
        for segment in &self.segments {
            segment.validate()?;
        }

        let mut labels = HashSet::new();
        for hole in &self.holes {
            hole.validate()?;
            if !labels.insert(hole.label.as_str()) {
                return Err(BoreError::InvalidGeometry(format!(
                    "duplicate hole label '{}'",
                    hole.label
                )));
            }
        }

        for fingering in &self.fingerings {
            if let Some(unknown) = fingering
                .hole_states
                .keys()
                .find(|label| !labels.contains(label.as_str()))
            {
                return Err(BoreError::InvalidGeometry(format!(
                    "fingering '{}' references unknown hole '{}'",
                    fingering.label, unknown
                )));
            }
        }
        Ok(())
    }
}

/// One `(axial_position, bore_diameter)` sample, in mm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfileSample {
    pub position: f64,
    pub diameter: f64,
}

impl ProfileSample {
    pub fn new(position: f64, diameter: f64) -> Self {
        Self { position, diameter }
    }
}

/// Sampled bore diameter curve with strictly increasing positions.
///
/// A non-empty curve always has at least two samples and positive
/// diameters. The empty curve stands for "no profile".
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<ProfileSample>", into = "Vec<ProfileSample>")]
pub struct ProfileCurve {
    samples: Vec<ProfileSample>,
}

impl ProfileCurve {
    pub fn new(samples: Vec<ProfileSample>) -> Result<Self> {
        if samples.is_empty() {
            return Ok(Self::default());
        }
        if samples.len() < MIN_SAMPLE_COUNT {
            return Err(BoreError::InvalidGeometry(format!(
                "profile needs at least {} samples, got {}",
                MIN_SAMPLE_COUNT,
                samples.len()
            )));
        }
        for sample in &samples {
            if !sample.position.is_finite() || !sample.diameter.is_finite() {
                return Err(BoreError::InvalidGeometry(
                    "profile contains non-finite values".to_string(),
                ));
            }
            if sample.diameter <= 0.0 {
                return Err(BoreError::InvalidGeometry(format!(
                    "non-positive diameter {:.4} at position {:.4}",
                    sample.diameter, sample.position
                )));
            }
        }
        if let Some(pair) = samples.windows(2).find(|w| w[1].position <= w[0].position) {
            return Err(BoreError::InvalidGeometry(format!(
                "profile positions must increase ({:.4} follows {:.4})",
                pair[1].position, pair[0].position
            )));
        }
        Ok(Self { samples })
    }

    /// Build from parallel position and diameter slices.
    pub fn from_vectors(positions: &[f64], diameters: &[f64]) -> Result<Self> {
        if positions.len() != diameters.len() {
            return Err(BoreError::InvalidGeometry(format!(
                "{} positions but {} diameters",
                positions.len(),
                diameters.len()
            )));
        }
        Self::new(
            positions
                .iter()
                .zip(diameters)
                .map(|(&x, &d)| ProfileSample::new(x, d))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[ProfileSample] {
        &self.samples
    }

    pub fn positions(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|s| s.position)
    }

    pub fn diameters(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|s| s.diameter)
    }

    /// Distance between first and last sample (0 for the empty curve).
    pub fn axis_length(&self) -> f64 {
        match (self.samples.first(), self.samples.last()) {
            (Some(first), Some(last)) => last.position - first.position,
            _ => 0.0,
        }
    }

    pub fn mean_diameter(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        Some(self.diameters().sum::<f64>() / self.samples.len() as f64)
    }

    pub fn min_diameter(&self) -> Option<f64> {
        self.diameters().reduce(f64::min)
    }

    /// `(position, diameter)` pairs divided by `scale` (1000 gives metres).
    pub fn to_pairs(&self, scale: f64) -> Vec<(f64, f64)> {
        self.samples
            .iter()
            .map(|s| (s.position / scale, s.diameter / scale))
            .collect()
    }

    /// Same positions with new diameters.
    pub fn with_diameters(&self, diameters: &[f64]) -> Result<Self> {
        let positions: Vec<f64> = self.positions().collect();
        Self::from_vectors(&positions, diameters)
    }
}

impl TryFrom<Vec<ProfileSample>> for ProfileCurve {
    type Error = BoreError;

    fn try_from(samples: Vec<ProfileSample>) -> Result<Self> {
        Self::new(samples)
    }
}

impl From<ProfileCurve> for Vec<ProfileSample> {
    fn from(curve: ProfileCurve) -> Self {
        curve.samples
    }
}

/// Wall thickness per sample of a [`ProfileCurve`] (mm, never negative).
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ThicknessCurve {
    values: Vec<f64>,
}

impl ThicknessCurve {
    pub(crate) fn new(values: Vec<f64>) -> Result<Self> {
        if let Some(bad) = values.iter().find(|t| **t < 0.0 || !t.is_finite()) {
            return Err(BoreError::InvalidGeometry(format!(
                "wall thickness {bad} is negative or non-finite"
            )));
        }
        Ok(Self { values })
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Mean thickness, 0 for an empty curve.
    pub fn average(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.values.iter().sum::<f64>() / self.values.len() as f64
    }

    pub fn min(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::min)
    }
}

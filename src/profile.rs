//! Parametric bore profile generation and wall-thickness mapping.
//!
//! The generator produces a linear entry→exit ramp and applies a
//! multiplicative shape modifier on top of it. The modifier constants are
//! tunable ([`ProfileConstants`]); the defaults are the ones used by the
//! barrel designer form.

use serde::{Deserialize, Serialize};

use crate::error::{BoreError, Result};
use crate::geometry::{sorted_segments, BoreSegment, ProfileCurve, ProfileSample, SectionType, ThicknessCurve};
use crate::types::{BoreShape, ExteriorShape, MIN_SAMPLE_COUNT};

/// Default Bessel flare exponent when a segment carries no `param`.
pub const DEFAULT_BESSEL_ALPHA: f64 = 0.7;

/// Shape-modifier constants for [`BoreShape`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConstants {
    /// k in `1 + k·frac` (Tapered)
    pub taper: f64,
    /// k in `1 + k·(1 - frac)` (Reverse Tapered)
    pub reverse_taper: f64,
    /// k in `1 + k·(frac - 0.5)²` (Parabolic)
    pub parabolic: f64,
    /// Multiplier applied past the midpoint (Stepped)
    pub step_factor: f64,
}

impl Default for ProfileConstants {
    fn default() -> Self {
        Self {
            taper: 0.10,
            reverse_taper: 0.10,
            parabolic: 0.15,
            step_factor: 1.05,
        }
    }
}

impl ProfileConstants {
    pub fn validate(&self) -> Result<()> {
        for (key, value) in [
            ("profile.taper", self.taper),
            ("profile.reverse_taper", self.reverse_taper),
            ("profile.parabolic", self.parabolic),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(BoreError::invalid_config(key, format!("must be >= 0, got {value}")));
            }
        }
        if !(self.step_factor.is_finite() && self.step_factor > 1.0) {
            return Err(BoreError::invalid_config(
                "profile.step_factor",
                format!("must be > 1, got {}", self.step_factor),
            ));
        }
        Ok(())
    }
}

/// Outer-diameter factors for each [`ExteriorShape`].
///
/// Every factor is a ratio outer/bore diameter and must stay >= 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExteriorConstants {
    pub standard_factor: f64,
    /// Factor at the midpoint of an hourglass body
    pub hourglass_waist: f64,
    /// Factor at both ends of an hourglass body
    pub hourglass_ends: f64,
    /// Gain of `1 + g·frac` (bell flare)
    pub flare_gain: f64,
    /// Gain of `1 + g·(1 - (frac - 0.5)²)` (bulged center)
    pub bulge_gain: f64,
    /// Gain of `1 + g·frac` (user-defined ramp)
    pub user_ramp: f64,
}

impl Default for ExteriorConstants {
    fn default() -> Self {
        Self {
            standard_factor: 1.05,
            hourglass_waist: 1.05,
            hourglass_ends: 1.15,
            flare_gain: 0.20,
            bulge_gain: 0.25,
            user_ramp: 0.05,
        }
    }
}

impl ExteriorConstants {
    /// Outer factor at fractional position `frac` along the axis.
    pub fn outer_factor(&self, shape: ExteriorShape, frac: f64) -> f64 {
        match shape {
            ExteriorShape::Standard => self.standard_factor,
            ExteriorShape::Hourglass => {
                let from_center = 2.0 * (frac - 0.5).abs();
                self.hourglass_waist + (self.hourglass_ends - self.hourglass_waist) * from_center
            }
            ExteriorShape::BellFlare => 1.0 + self.flare_gain * frac,
            ExteriorShape::ReverseTaper => 1.0 + self.bulge_gain * (1.0 - (frac - 0.5).powi(2)),
            ExteriorShape::UserDefined => 1.0 + self.user_ramp * frac,
        }
    }

    pub fn validate(&self) -> Result<()> {
        for shape in ExteriorShape::ALL {
            for frac in [0.0, 0.5, 1.0] {
                let factor = self.outer_factor(shape, frac);
                if !(factor.is_finite() && factor >= 1.0) {
                    return Err(BoreError::invalid_config(
                        "exterior",
                        format!("{shape} yields outer factor {factor:.4} < 1 at frac {frac}"),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Builds bore curves from shape parameters.
#[derive(Debug, Clone, Default)]
pub struct ProfileGenerator {
    pub constants: ProfileConstants,
    pub exterior: ExteriorConstants,
}

impl ProfileGenerator {
    pub fn new(constants: ProfileConstants, exterior: ExteriorConstants) -> Self {
        Self { constants, exterior }
    }

    /// Multiplicative modifier for `shape` at fractional progress `frac`.
    pub fn shape_modifier(&self, shape: BoreShape, frac: f64) -> f64 {
        let k = &self.constants;
        match shape {
            BoreShape::Cylindrical => 1.0,
            BoreShape::Tapered => 1.0 + k.taper * frac,
            BoreShape::ReverseTapered => 1.0 + k.reverse_taper * (1.0 - frac),
            BoreShape::Parabolic => 1.0 + k.parabolic * (frac - 0.5).powi(2),
            BoreShape::Stepped => {
                if frac > 0.5 {
                    k.step_factor
                } else {
                    1.0
                }
            }
        }
    }

    /// Sample `sample_count` points from 0 to `length` (inclusive).
    ///
    /// `sample_count` below 2 is raised to 2.
    ///
    /// # Example
    /// ```
    /// use clarinet_bore::profile::ProfileGenerator;
    /// use clarinet_bore::types::BoreShape;
    ///
    /// let generator = ProfileGenerator::default();
    /// let curve = generator.generate(BoreShape::Cylindrical, 15.0, 15.0, 66.0, 5).unwrap();
    /// assert_eq!(curve.len(), 5);
    /// assert!(curve.diameters().all(|d| d == 15.0));
    /// ```
    pub fn generate(
        &self,
        shape: BoreShape,
        entry_diam: f64,
        exit_diam: f64,
        length: f64,
        sample_count: usize,
    ) -> Result<ProfileCurve> {
        if !(entry_diam.is_finite() && entry_diam > 0.0 && exit_diam.is_finite() && exit_diam > 0.0) {
            return Err(BoreError::InvalidGeometry(format!(
                "diameters must be positive (entry {entry_diam}, exit {exit_diam})"
            )));
        }
        if !(length.is_finite() && length > 0.0) {
            return Err(BoreError::InvalidGeometry(format!(
                "length must be positive, got {length}"
            )));
        }

        let n = sample_count.max(MIN_SAMPLE_COUNT);
        let step = length / (n - 1) as f64;

        let samples = (0..n)
            .map(|i| {
                let frac = i as f64 / (n - 1) as f64;
                let base = entry_diam + frac * (exit_diam - entry_diam);
                let position = if i == n - 1 { length } else { i as f64 * step };
                ProfileSample::new(position, base * self.shape_modifier(shape, frac))
            })
            .collect();

        ProfileCurve::new(samples)
    }

    /// Wall thickness per sample for the given exterior profile.
    ///
    /// An outer factor below 1 would mean a wall thinner than the bore and is
    /// rejected as a configuration error.
    pub fn exterior_thickness(
        &self,
        curve: &ProfileCurve,
        exterior_shape: ExteriorShape,
    ) -> Result<ThicknessCurve> {
        if curve.is_empty() {
            return Ok(ThicknessCurve::default());
        }

        let start = curve.samples()[0].position;
        let axis = curve.axis_length();

        let mut values = Vec::with_capacity(curve.len());
        for sample in curve.samples() {
            let frac = if axis > 0.0 { (sample.position - start) / axis } else { 0.0 };
            let factor = self.exterior.outer_factor(exterior_shape, frac);
            if !(factor.is_finite() && factor >= 1.0) {
                return Err(BoreError::invalid_config(
                    "exterior",
                    format!("{exterior_shape} outer factor {factor:.4} < 1 at position {:.3}", sample.position),
                ));
            }
            values.push(sample.diameter * (factor - 1.0) / 2.0);
        }

        ThicknessCurve::new(values)
    }

    /// Outer diameter per sample (`bore + 2·thickness`).
    pub fn outer_diameters(&self, curve: &ProfileCurve, thickness: &ThicknessCurve) -> Vec<f64> {
        curve
            .diameters()
            .zip(thickness.values())
            .map(|(d, t)| d + 2.0 * t)
            .collect()
    }
}

/// Sample a segment table into a single profile curve.
///
/// Segments are sorted by `start_pos`; each contributes
/// `samples_per_segment` points (at least 2) shaped by its section type.
/// Points that do not advance past the previous position (overlaps, shared
/// end points) are dropped so the result stays strictly increasing.
pub fn sample_segments(segments: &[BoreSegment], samples_per_segment: usize) -> Result<ProfileCurve> {
    let sorted = sorted_segments(segments)?;
    let n = samples_per_segment.max(MIN_SAMPLE_COUNT);

    let mut samples: Vec<ProfileSample> = Vec::with_capacity(sorted.len() * n);
    for segment in &sorted {
        for i in 0..n {
            let t = i as f64 / (n - 1) as f64;
            let x = segment.start_pos + t * segment.length();
            if samples.last().is_some_and(|last| x <= last.position) {
                continue;
            }
            samples.push(ProfileSample::new(x, section_diameter(segment, t)));
        }
    }

    ProfileCurve::new(samples)
}

/// Diameter at fractional position `t` inside a segment.
fn section_diameter(segment: &BoreSegment, t: f64) -> f64 {
    let d0 = segment.start_diam;
    let d1 = segment.end_diam;
    let linear = d0 + t * (d1 - d0);

    match segment.section_type {
        SectionType::Cone => linear,
        SectionType::Exponential => d0 * (d1 / d0).powf(t),
        SectionType::Bessel => {
            let alpha = segment.param.unwrap_or(DEFAULT_BESSEL_ALPHA);
            bessel_diameter(d0, d1, segment.length(), alpha, t).unwrap_or(linear)
        }
        SectionType::Circle => segment
            .param
            .and_then(|radius| arc_diameter(d0, d1, segment.length(), radius, t))
            .unwrap_or(linear),
    }
}

/// Bessel horn `r(x) = b·(x0 - x)^-alpha` through both end radii.
fn bessel_diameter(d0: f64, d1: f64, length: f64, alpha: f64, t: f64) -> Option<f64> {
    if alpha <= 0.0 || d1 <= d0 {
        return None;
    }
    let ratio = (d0 / d1).powf(1.0 / alpha);
    let x0 = length / (1.0 - ratio);
    let b = d0 * x0.powf(alpha);
    let value = b * (x0 - t * length).powf(-alpha);
    value.is_finite().then_some(value)
}

/// Circular arc of signed `radius` through `(0, d0/2)` and `(L, d1/2)`.
///
/// Positive radius bulges outward (wider bore), negative bulges inward.
fn arc_diameter(d0: f64, d1: f64, length: f64, radius: f64, t: f64) -> Option<f64> {
    let (r0, r1) = (d0 / 2.0, d1 / 2.0);
    let chord = ((length).powi(2) + (r1 - r0).powi(2)).sqrt();
    let big_r = radius.abs();
    if big_r < chord / 2.0 || chord == 0.0 {
        return None;
    }

    let (mx, my) = (length / 2.0, (r0 + r1) / 2.0);
    let h = (big_r * big_r - chord * chord / 4.0).sqrt();
    // Unit normal to the chord pointing towards larger radius.
    let (nx, ny) = (-(r1 - r0) / chord, length / chord);
    // Centre sits opposite to the bulge.
    let sign = if radius > 0.0 { -1.0 } else { 1.0 };
    let (cx, cy) = (mx + sign * h * nx, my + sign * h * ny);

    let x = t * length;
    let under = big_r * big_r - (x - cx).powi(2);
    if under < 0.0 {
        return None;
    }
    let r = cy - sign * under.sqrt();
    (r > 0.0).then_some(2.0 * r)
}

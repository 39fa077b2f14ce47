//! Unfolded 2D outline of the bore, for plotting.
//!
//! The outline is a closed polygon: the top edge runs left to right at
//! `+d/2`, the bottom edge runs right to left at `-d/2`. Each segment
//! contributes only its end points; curved sections are not refined here.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::geometry::{sorted_segments, BoreSegment, ToneHole};

/// A point in the unfolded drawing plane (mm).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for Point2D {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

/// Upper edge, left to right: `(start, d0/2), (end, d1/2)` per segment.
pub fn build_top_edge(segments: &[BoreSegment]) -> Result<Vec<Point2D>> {
    let sorted = sorted_segments(segments)?;
    Ok(sorted
        .iter()
        .flat_map(|seg| {
            [
                Point2D::new(seg.start_pos, seg.start_diam / 2.0),
                Point2D::new(seg.end_pos, seg.end_diam / 2.0),
            ]
        })
        .collect())
}

/// Closed outline polygon: top edge followed by the mirrored bottom edge.
///
/// An empty segment list gives an empty outline.
///
/// # Example
/// ```
/// use clarinet_bore::geometry::BoreSegment;
/// use clarinet_bore::outline::{build_outline, Point2D};
///
/// let outline = build_outline(&[BoreSegment::new(0.0, 10.0, 4.0, 4.0)]).unwrap();
/// assert_eq!(
///     outline,
///     vec![
///         Point2D::new(0.0, 2.0),
///         Point2D::new(10.0, 2.0),
///         Point2D::new(10.0, -2.0),
///         Point2D::new(0.0, -2.0),
///     ]
/// );
/// ```
pub fn build_outline(segments: &[BoreSegment]) -> Result<Vec<Point2D>> {
    let top = build_top_edge(segments)?;
    let bottom = top.iter().rev().map(|p| Point2D::new(p.x, -p.y));
    Ok(top.iter().copied().chain(bottom).collect())
}

/// Two points per hole: `(position, 0)` then `(position, -diameter)`.
pub fn build_hole_markers(holes: &[ToneHole]) -> Result<Vec<Point2D>> {
    let mut points = Vec::with_capacity(holes.len() * 2);
    for hole in holes {
        hole.validate()?;
        points.push(Point2D::new(hole.position, 0.0));
        points.push(Point2D::new(hole.position, -hole.diameter));
    }
    Ok(points)
}

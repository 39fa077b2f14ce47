//! Helpers for reading resonances off a sampled impedance curve.

use std::cmp::Ordering;

/// Index of the axis point closest to `target`. Ties go to the lower index.
///
/// # Example
/// ```
/// use clarinet_bore::simulation::spectrum::nearest_bin;
///
/// let axis = [100.0, 150.0, 200.0];
/// assert_eq!(nearest_bin(&axis, 160.0), Some(1));
/// assert_eq!(nearest_bin(&axis, 175.0), Some(1));
/// assert_eq!(nearest_bin(&[], 175.0), None);
/// ```
pub fn nearest_bin(axis: &[f64], target: f64) -> Option<usize> {
    axis.iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            (*a - target)
                .abs()
                .partial_cmp(&(*b - target).abs())
                .unwrap_or(Ordering::Equal)
        })
        .map(|(i, _)| i)
}

/// Indices of interior local maxima (`v[i-1] < v[i] >= v[i+1]`).
pub fn find_peaks(values: &[f64]) -> Vec<usize> {
    if values.len() < 3 {
        return Vec::new();
    }
    (1..values.len() - 1)
        .filter(|&i| values[i] > values[i - 1] && values[i] >= values[i + 1])
        .collect()
}

/// Index of the largest value (first one on ties).
pub fn argmax(values: &[f64]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, &v)| match best {
            Some((_, b)) if v <= b => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}

/// Sub-bin peak location from a parabola through the peak and its neighbours.
///
/// Falls back to `axis[index]` at the ends of the axis or on a flat top.
pub fn refine_peak(axis: &[f64], values: &[f64], index: usize) -> f64 {
    if index == 0 || index + 1 >= values.len() || index + 1 >= axis.len() {
        return axis.get(index).copied().unwrap_or(f64::NAN);
    }
    let (y0, y1, y2) = (values[index - 1], values[index], values[index + 1]);
    let denom = y0 - 2.0 * y1 + y2;
    if denom.abs() < f64::EPSILON * y1.abs().max(1.0) {
        return axis[index];
    }
    let offset = (0.5 * (y0 - y2) / denom).clamp(-0.5, 0.5);
    let step = if offset >= 0.0 {
        axis[index + 1] - axis[index]
    } else {
        axis[index] - axis[index - 1]
    };
    axis[index] + offset * step
}

/// Magnitude-weighted mean frequency, `None` when all weights vanish.
pub fn centroid(axis: &[f64], weights: &[f64]) -> Option<f64> {
    let total: f64 = weights.iter().sum();
    if !(total > 0.0) {
        return None;
    }
    let weighted: f64 = axis.iter().zip(weights).map(|(f, w)| f * w).sum();
    Some(weighted / total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_peaks() {
        let values = [0.0, 1.0, 3.0, 2.0, 2.5, 2.5, 1.0];
        assert_eq!(find_peaks(&values), vec![2, 4]);
        assert!(find_peaks(&[1.0, 2.0]).is_empty());
    }

    #[test]
    fn test_argmax_first_wins() {
        assert_eq!(argmax(&[1.0, 5.0, 5.0, 2.0]), Some(1));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn test_refine_symmetric_peak() {
        let axis = [10.0, 20.0, 30.0];
        assert!((refine_peak(&axis, &[1.0, 2.0, 1.0], 1) - 20.0).abs() < 1e-12);
        // Parabola y = -(x - 22)² sampled at 10, 20, 30.
        let values: Vec<f64> = axis.iter().map(|x| -(x - 22.0_f64).powi(2)).collect();
        assert!((refine_peak(&axis, &values, 1) - 22.0).abs() < 1e-9);
        assert_eq!(refine_peak(&axis, &values, 0), 10.0);
    }

    #[test]
    fn test_centroid() {
        let axis = [100.0, 200.0, 300.0];
        assert!((centroid(&axis, &[1.0, 1.0, 1.0]).unwrap() - 200.0).abs() < 1e-12);
        assert!((centroid(&axis, &[0.0, 0.0, 2.0]).unwrap() - 300.0).abs() < 1e-12);
        assert!(centroid(&axis, &[0.0, 0.0, 0.0]).is_none());
    }
}

//! Space-filling designs for seeding the search and for grid sweeps.
//!
//! Every sampler that draws random numbers takes the caller's RNG so a
//! seeded run is reproducible end to end.

use rand::seq::SliceRandom;
use rand::Rng;

/// Latin Hypercube samples within `bounds`.
///
/// Each dimension is split into `n_samples` equal intervals and every
/// interval receives exactly one sample.
///
/// # Arguments
/// * `bounds` - Parameter bounds [(min, max), ...]
/// * `n_samples` - Number of samples to generate
/// * `rng` - Source of randomness
pub fn latin_hypercube_sample<R: Rng + ?Sized>(
    bounds: &[(f64, f64)],
    n_samples: usize,
    rng: &mut R,
) -> Vec<Vec<f64>> {
    if n_samples == 0 || bounds.is_empty() {
        return Vec::new();
    }

    let permutations: Vec<Vec<usize>> = bounds
        .iter()
        .map(|_| {
            let mut perm: Vec<usize> = (0..n_samples).collect();
            perm.shuffle(rng);
            perm
        })
        .collect();

    (0..n_samples)
        .map(|i| {
            permutations
                .iter()
                .zip(bounds)
                .map(|(perm, &(lo, hi))| {
                    let interval_size = (hi - lo) / n_samples as f64;
                    let interval_lo = lo + perm[i] as f64 * interval_size;
                    interval_lo + rng.gen_range(0.0..1.0) * interval_size
                })
                .collect()
        })
        .collect()
}

/// Uniform random point inside `bounds`. Degenerate ranges return `lo`.
pub fn random_point<R: Rng + ?Sized>(bounds: &[(f64, f64)], rng: &mut R) -> Vec<f64> {
    bounds
        .iter()
        .map(|&(lo, hi)| if hi > lo { rng.gen_range(lo..hi) } else { lo })
        .collect()
}

/// Full factorial grid with `points_per_dim` values per dimension.
///
/// Dimension 0 varies fastest. A single point per dimension sits at the
/// midpoint.
pub fn grid_sample(bounds: &[(f64, f64)], points_per_dim: usize) -> Vec<Vec<f64>> {
    if bounds.is_empty() || points_per_dim == 0 {
        return Vec::new();
    }

    let n_dims = bounds.len();
    let mut samples = Vec::with_capacity(points_per_dim.pow(n_dims as u32));

    let mut indices = vec![0usize; n_dims];
    loop {
        samples.push(
            indices
                .iter()
                .zip(bounds)
                .map(|(&idx, &(lo, hi))| {
                    if points_per_dim == 1 {
                        (lo + hi) / 2.0
                    } else {
                        lo + idx as f64 * (hi - lo) / (points_per_dim - 1) as f64
                    }
                })
                .collect(),
        );

        // Count in base `points_per_dim`.
        let mut carry = true;
        for index in indices.iter_mut() {
            *index += 1;
            if *index < points_per_dim {
                carry = false;
                break;
            }
            *index = 0;
        }
        if carry {
            break;
        }
    }

    samples
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_latin_hypercube_stratification() {
        let mut rng = StdRng::seed_from_u64(3);
        let bounds = vec![(0.0, 10.0), (0.0, 1.0)];
        let samples = latin_hypercube_sample(&bounds, 10, &mut rng);
        assert_eq!(samples.len(), 10);

        let mut intervals = [false; 10];
        for sample in &samples {
            assert!(sample[1] >= 0.0 && sample[1] <= 1.0);
            let interval = (sample[0].floor() as usize).min(9);
            assert!(!intervals[interval], "Multiple samples in interval {interval}");
            intervals[interval] = true;
        }
        assert!(intervals.iter().all(|&x| x));
    }

    #[test]
    fn test_latin_hypercube_is_reproducible() {
        let bounds = vec![(0.0, 1.0); 3];
        let a = latin_hypercube_sample(&bounds, 6, &mut StdRng::seed_from_u64(11));
        let b = latin_hypercube_sample(&bounds, 6, &mut StdRng::seed_from_u64(11));
        assert_eq!(a, b);
    }

    #[test]
    fn test_grid_sample_order() {
        let samples = grid_sample(&[(0.0, 1.0), (10.0, 20.0)], 3);
        assert_eq!(samples.len(), 9);
        assert_eq!(samples[0], vec![0.0, 10.0]);
        assert_eq!(samples[1], vec![0.5, 10.0]);
        assert_eq!(samples[3], vec![0.0, 15.0]);
        assert_eq!(samples[8], vec![1.0, 20.0]);
        assert_eq!(grid_sample(&[(2.0, 4.0)], 1), vec![vec![3.0]]);
    }

    #[test]
    fn test_empty_inputs() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(latin_hypercube_sample(&[], 10, &mut rng).is_empty());
        assert!(latin_hypercube_sample(&[(0.0, 1.0)], 0, &mut rng).is_empty());
        assert!(grid_sample(&[], 3).is_empty());
        assert_eq!(random_point(&[(1.0, 1.0)], &mut rng), vec![1.0]);
    }
}

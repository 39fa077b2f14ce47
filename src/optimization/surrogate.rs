//! Surrogate optimization using Radial Basis Function (RBF) interpolation.
//!
//! The search alternates between:
//! 1. fitting an RBF interpolant through every evaluated point, and
//! 2. picking the next point to evaluate by minimising a merit function that
//!    trades the interpolant's prediction against distance to known samples.
//!
//! Each real evaluation runs a full acoustic simulation, so the aim is to
//! reach the target in tens of evaluations rather than thousands. All random
//! draws come from one RNG seeded from [`SurrogateConfig::seed`].

use nalgebra::{DMatrix, DVector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::sampling::{latin_hypercube_sample, random_point};
use crate::error::{BoreError, Result};

/// Standard deviation of local perturbations, as a fraction of each range.
const LOCAL_STEP: f64 = 0.1;
/// Diagonal jitter keeping the interpolation matrix invertible.
const RBF_REGULARIZATION: f64 = 1e-10;

/// Radial basis function kernel types.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum RbfKernel {
    /// φ(r) = r³
    #[default]
    Cubic,
    /// φ(r) = r² ln(r)
    ThinPlateSpline,
    /// φ(r) = exp(-r²/σ²)
    Gaussian(f64),
    /// φ(r) = sqrt(r² + c²)
    Multiquadric(f64),
    /// φ(r) = r
    Linear,
}

impl RbfKernel {
    /// Evaluate the radial basis function at distance r.
    pub fn evaluate(&self, r: f64) -> f64 {
        match self {
            RbfKernel::Cubic => r.powi(3),
            RbfKernel::ThinPlateSpline => {
                if r > 1e-14 {
                    r * r * r.ln()
                } else {
                    0.0
                }
            }
            RbfKernel::Gaussian(sigma) => (-r * r / (sigma * sigma)).exp(),
            RbfKernel::Multiquadric(c) => (r * r + c * c).sqrt(),
            RbfKernel::Linear => r,
        }
    }
}

/// RBF interpolant `s(x) = Σᵢ βᵢ φ(‖x - xᵢ‖)` over the evaluated samples.
///
/// Failed evaluations are stored with an infinite value. For fitting they are
/// replaced by a finite penalty above the worst finite value so the linear
/// system stays solvable while the region still looks unattractive.
#[derive(Debug, Clone)]
pub struct SurrogateModel {
    samples: Vec<Vec<f64>>,
    values: Vec<f64>,
    coefficients: DVector<f64>,
    kernel: RbfKernel,
    bounds: Vec<(f64, f64)>,
}

impl SurrogateModel {
    pub fn new(bounds: Vec<(f64, f64)>, kernel: RbfKernel) -> Self {
        Self {
            samples: Vec::new(),
            values: Vec::new(),
            coefficients: DVector::zeros(0),
            kernel,
            bounds,
        }
    }

    pub fn with_bounds(bounds: Vec<(f64, f64)>) -> Self {
        Self::new(bounds, RbfKernel::Cubic)
    }

    pub fn num_samples(&self) -> usize {
        self.samples.len()
    }

    pub fn bounds(&self) -> &[(f64, f64)] {
        &self.bounds
    }

    /// Best (minimum) value found so far.
    pub fn best_value(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::min)
    }

    /// Sample point with the best (minimum) value.
    pub fn best_sample(&self) -> Option<&Vec<f64>> {
        self.values
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(i, _)| &self.samples[i])
    }

    /// Add a sample point and refit the model.
    pub fn add_sample(&mut self, params: Vec<f64>, value: f64) {
        self.samples.push(params);
        self.values.push(value);
        self.refit();
    }

    /// Values used for fitting: non-finite entries become a penalty.
    fn fit_values(&self) -> Vec<f64> {
        let (min, max) = self.value_range();
        let penalty = if max.is_finite() {
            max + (max - min).max(1.0)
        } else {
            1.0
        };
        self.values
            .iter()
            .map(|&v| if v.is_finite() { v } else { penalty })
            .collect()
    }

    /// Refit RBF coefficients by solving Φβ = f.
    fn refit(&mut self) {
        let m = self.samples.len();
        if m == 0 {
            self.coefficients = DVector::zeros(0);
            return;
        }

        let phi = self.build_rbf_matrix();
        let f = DVector::from_vec(self.fit_values());

        if let Some(solution) = phi.clone().lu().solve(&f) {
            self.coefficients = solution;
        } else if let Ok(solution) = phi.svd(true, true).solve(&f, 1e-10) {
            // Ill-conditioned: fall back to the SVD least-squares solution.
            self.coefficients = solution;
        } else {
            self.coefficients = DVector::zeros(m);
        }
    }

    fn build_rbf_matrix(&self) -> DMatrix<f64> {
        let m = self.samples.len();
        let mut phi = DMatrix::zeros(m, m);
        for i in 0..m {
            for j in 0..m {
                let dist = euclidean_distance(&self.samples[i], &self.samples[j]);
                phi[(i, j)] = self.kernel.evaluate(dist);
            }
            phi[(i, i)] += RBF_REGULARIZATION;
        }
        phi
    }

    /// Predict surrogate value at a new point.
    pub fn predict(&self, x: &[f64]) -> f64 {
        if self.samples.is_empty() || self.coefficients.is_empty() {
            return f64::INFINITY;
        }

        self.samples
            .iter()
            .enumerate()
            .map(|(i, sample)| self.coefficients[i] * self.kernel.evaluate(euclidean_distance(x, sample)))
            .sum()
    }

    /// Minimum distance from x to any evaluated sample.
    pub fn min_distance_to_samples(&self, x: &[f64]) -> f64 {
        self.samples
            .iter()
            .map(|s| euclidean_distance(x, s))
            .fold(f64::INFINITY, f64::min)
    }

    /// Range (min, max) of the finite objective values.
    pub fn value_range(&self) -> (f64, f64) {
        self.values
            .iter()
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
    }

    /// Merit M(x) = α·S(x) + (1-α)·D(x), both terms normalised to [0, 1].
    ///
    /// # Arguments
    /// * `x` - Point to evaluate
    /// * `alpha` - Weight factor (0-1). Higher = more exploitation, lower = more exploration.
    pub fn merit(&self, x: &[f64], alpha: f64) -> f64 {
        if self.samples.is_empty() {
            return f64::INFINITY;
        }

        let s_x = self.predict(x);
        let d_x = self.min_distance_to_samples(x);

        let (s_min, s_max) = self.value_range();
        let d_max: f64 = self
            .bounds
            .iter()
            .map(|(lo, hi)| (hi - lo).powi(2))
            .sum::<f64>()
            .sqrt();

        let s_norm = if s_max.is_finite() && s_max > s_min + 1e-14 {
            (s_x - s_min) / (s_max - s_min)
        } else {
            0.5
        };

        // Inverted so that points close to known samples score worse.
        let d_norm = if d_max > 1e-14 {
            (d_max - d_x) / d_max
        } else {
            0.5
        };

        alpha * s_norm + (1.0 - alpha) * d_norm
    }

    /// Best of `num_candidates` uniform random points under the merit function.
    pub fn suggest_next<R: Rng + ?Sized>(&self, num_candidates: usize, alpha: f64, rng: &mut R) -> Vec<f64> {
        self.suggest_next_enhanced(num_candidates, alpha, 0.0, rng)
    }

    /// Merit-guided search mixing global random points with Gaussian
    /// perturbations of the current best sample.
    pub fn suggest_next_enhanced<R: Rng + ?Sized>(
        &self,
        num_candidates: usize,
        alpha: f64,
        local_fraction: f64,
        rng: &mut R,
    ) -> Vec<f64> {
        let num_local = (num_candidates as f64 * local_fraction.clamp(0.0, 1.0)) as usize;
        let num_global = num_candidates - num_local;

        let mut best_candidate = random_point(&self.bounds, rng);
        let mut best_merit = self.merit(&best_candidate, alpha);

        let consider = |candidate: Vec<f64>, best_merit: &mut f64, best: &mut Vec<f64>| {
            let merit = self.merit(&candidate, alpha);
            if merit < *best_merit {
                *best_merit = merit;
                *best = candidate;
            }
        };

        for _ in 0..num_global {
            let candidate = random_point(&self.bounds, rng);
            consider(candidate, &mut best_merit, &mut best_candidate);
        }

        if let Some(best_sample) = self.best_sample() {
            for _ in 0..num_local {
                let candidate: Vec<f64> = best_sample
                    .iter()
                    .zip(&self.bounds)
                    .map(|(&x, &(lo, hi))| {
                        let step = Normal::new(0.0, LOCAL_STEP * (hi - lo))
                            .map(|normal| normal.sample(rng))
                            .unwrap_or(0.0);
                        (x + step).clamp(lo, hi)
                    })
                    .collect();
                consider(candidate, &mut best_merit, &mut best_candidate);
            }
        }

        best_candidate
    }
}

fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// Alpha schedule for balancing exploration vs exploitation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "params", rename_all = "snake_case")]
pub enum AlphaSchedule {
    Constant(f64),
    /// Linear increase from start to end (more exploitation over time)
    Linear { start: f64, end: f64 },
    Cosine { min: f64, max: f64 },
}

impl Default for AlphaSchedule {
    fn default() -> Self {
        AlphaSchedule::Linear {
            start: 0.3,
            end: 0.95,
        }
    }
}

impl AlphaSchedule {
    /// Alpha for the current iteration.
    pub fn get_alpha(&self, iteration: usize, max_iterations: usize) -> f64 {
        let progress = if max_iterations > 0 {
            iteration as f64 / max_iterations as f64
        } else {
            0.0
        };

        match self {
            AlphaSchedule::Constant(alpha) => *alpha,
            AlphaSchedule::Linear { start, end } => start + (end - start) * progress,
            AlphaSchedule::Cosine { min, max } => {
                let cos_val = (std::f64::consts::PI * progress).cos();
                min + (max - min) * (1.0 - cos_val) / 2.0
            }
        }
    }
}

/// Configuration for surrogate optimization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurrogateConfig {
    /// Number of space-filling samples before the surrogate takes over
    pub initial_samples: usize,
    /// Maximum number of expensive evaluations (initial point included)
    pub max_evaluations: usize,
    /// Stop as soon as a cost <= this value is found
    pub convergence_tol: f64,
    pub alpha_schedule: AlphaSchedule,
    /// Candidate points scored per iteration
    pub candidate_pool_size: usize,
    /// Fraction of candidates drawn around the current best (0-1)
    pub local_search_fraction: f64,
    pub kernel: RbfKernel,
    /// RNG seed; identical seeds give identical searches
    pub seed: u64,
    /// Point evaluated before anything else
    #[serde(skip)]
    pub initial_point: Option<Vec<f64>>,
}

impl Default for SurrogateConfig {
    fn default() -> Self {
        Self {
            initial_samples: 10,
            max_evaluations: 40,
            convergence_tol: 1e-3,
            alpha_schedule: AlphaSchedule::default(),
            candidate_pool_size: 2000,
            local_search_fraction: 0.3,
            kernel: RbfKernel::Cubic,
            seed: 7,
            initial_point: None,
        }
    }
}

impl SurrogateConfig {
    /// Fewer evaluations, looser tolerance.
    pub fn fast() -> Self {
        Self {
            initial_samples: 6,
            max_evaluations: 20,
            convergence_tol: 5e-3,
            candidate_pool_size: 1000,
            ..Default::default()
        }
    }

    pub fn thorough() -> Self {
        Self {
            initial_samples: 15,
            max_evaluations: 80,
            convergence_tol: 1e-4,
            candidate_pool_size: 5000,
            local_search_fraction: 0.4,
            ..Default::default()
        }
    }

    pub fn with_initial_point(mut self, point: Vec<f64>) -> Self {
        self.initial_point = Some(point);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_evaluations == 0 {
            return Err(BoreError::invalid_config("optimizer.search.max_evaluations", "must be > 0"));
        }
        if self.initial_samples > self.max_evaluations {
            return Err(BoreError::invalid_config(
                "optimizer.search.initial_samples",
                format!(
                    "{} exceeds max_evaluations {}",
                    self.initial_samples, self.max_evaluations
                ),
            ));
        }
        if !(self.convergence_tol.is_finite() && self.convergence_tol >= 0.0) {
            return Err(BoreError::invalid_config(
                "optimizer.search.convergence_tol",
                format!("must be >= 0, got {}", self.convergence_tol),
            ));
        }
        if !(0.0..=1.0).contains(&self.local_search_fraction) {
            return Err(BoreError::invalid_config(
                "optimizer.search.local_search_fraction",
                format!("must be in [0, 1], got {}", self.local_search_fraction),
            ));
        }
        Ok(())
    }
}

/// Result of surrogate optimization.
#[derive(Debug, Clone)]
pub struct SurrogateResult {
    pub best_params: Vec<f64>,
    pub best_fitness: f64,
    pub evaluations: usize,
    /// Best fitness after each evaluation
    pub fitness_history: Vec<f64>,
    pub all_samples: Vec<(Vec<f64>, f64)>,
    /// Whether a fitness <= `convergence_tol` was reached
    pub converged: bool,
}

/// Run surrogate optimization.
///
/// The configured initial point (if any) is evaluated first; the search stops
/// at the first evaluation whose fitness is within `convergence_tol`.
///
/// # Arguments
/// * `config` - Surrogate optimization configuration
/// * `bounds` - Parameter bounds [(min, max), ...]
/// * `evaluate_fn` - Expensive objective function to minimize
pub fn run_surrogate_optimization<F>(
    config: &SurrogateConfig,
    bounds: Vec<(f64, f64)>,
    mut evaluate_fn: F,
) -> SurrogateResult
where
    F: FnMut(&[f64]) -> f64,
{
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut surrogate = SurrogateModel::new(bounds.clone(), config.kernel);
    let mut fitness_history = Vec::with_capacity(config.max_evaluations);
    let mut all_samples: Vec<(Vec<f64>, f64)> = Vec::with_capacity(config.max_evaluations);

    let mut best_fitness = f64::INFINITY;
    let mut best_params: Vec<f64> = Vec::new();

    let initial_points = match &config.initial_point {
        Some(point) => {
            let mut points =
                latin_hypercube_sample(&bounds, config.initial_samples.saturating_sub(1), &mut rng);
            points.insert(0, point.clone());
            points
        }
        None => latin_hypercube_sample(&bounds, config.initial_samples, &mut rng),
    };
    let seeded = initial_points.len();

    let mut record = |point: Vec<f64>,
                      fitness: f64,
                      surrogate: &mut SurrogateModel,
                      best_fitness: &mut f64,
                      best_params: &mut Vec<f64>| {
        all_samples.push((point.clone(), fitness));
        surrogate.add_sample(point.clone(), fitness);
        if best_params.is_empty() || fitness < *best_fitness {
            *best_fitness = fitness;
            *best_params = point;
        }
        fitness_history.push(*best_fitness);
        fitness <= config.convergence_tol
    };

    let mut converged = false;
    for (i, point) in initial_points.into_iter().take(config.max_evaluations).enumerate() {
        let fitness = evaluate_fn(&point);
        debug!(sample = i + 1, of = seeded, fitness, "surrogate initial sample");
        if record(point, fitness, &mut surrogate, &mut best_fitness, &mut best_params) {
            converged = true;
            break;
        }
    }

    if !converged {
        let start = surrogate.num_samples();
        let remaining = config.max_evaluations.saturating_sub(start);
        for step in 0..remaining {
            let alpha = config.alpha_schedule.get_alpha(step, remaining);
            let candidate = surrogate.suggest_next_enhanced(
                config.candidate_pool_size,
                alpha,
                config.local_search_fraction,
                &mut rng,
            );

            let fitness = evaluate_fn(&candidate);
            let done = record(candidate, fitness, &mut surrogate, &mut best_fitness, &mut best_params);
            debug!(
                eval = start + step + 1,
                max = config.max_evaluations,
                fitness,
                best = best_fitness,
                alpha,
                "surrogate evaluation"
            );
            if done {
                converged = true;
                break;
            }
        }
    }

    SurrogateResult {
        best_params,
        best_fitness,
        evaluations: all_samples.len(),
        fitness_history,
        all_samples,
        converged,
    }
}

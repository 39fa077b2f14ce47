//! Target-resonance search over entry diameter, exit diameter and length.

use tracing::{debug, info, warn};

use super::objective::compute_cost;
use super::surrogate::run_surrogate_optimization;
use super::types::{BarrelParams, OptimizationOutcome, OptimizationTarget, OptimizerConfig, NUM_VARIABLES};
use crate::error::{BoreError, Result};
use crate::materials::Material;
use crate::profile::ProfileGenerator;
use crate::simulation::{AcousticResult, SimulationAdapter};
use crate::types::Environment;

/// Searches barrel parameters that bring the simulated f1 onto a target.
///
/// The search runs in the unit cube mapped onto the [`BoundsPolicy`]
/// windows, starting from the initial parameters (the cube centre).
///
/// [`BoundsPolicy`]: super::types::BoundsPolicy
///
/// # Example
/// ```
/// use clarinet_bore::optimization::{BarrelParams, OptimizationTarget, Optimizer};
/// use clarinet_bore::simulation::PlaceholderSimulationAdapter;
///
/// let optimizer = Optimizer::new(PlaceholderSimulationAdapter::new(1));
/// let outcome = optimizer
///     .optimize(&BarrelParams::default(), &OptimizationTarget::new(460.0))
///     .unwrap();
/// assert!(outcome.evaluations >= 1);
/// ```
#[derive(Debug, Clone)]
pub struct Optimizer<A> {
    adapter: A,
    generator: ProfileGenerator,
    material: Material,
    environment: Environment,
    config: OptimizerConfig,
}

impl<A: SimulationAdapter> Optimizer<A> {
    pub fn new(adapter: A) -> Self {
        Self {
            adapter,
            generator: ProfileGenerator::default(),
            material: Material::default(),
            environment: Environment::default(),
            config: OptimizerConfig::default(),
        }
    }

    pub fn with_generator(mut self, generator: ProfileGenerator) -> Self {
        self.generator = generator;
        self
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_config(mut self, config: OptimizerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Generate, simulate and score one candidate.
    pub fn evaluate(&self, params: &BarrelParams, target: &OptimizationTarget) -> Result<(f64, AcousticResult)> {
        let profile = self.generator.generate(
            params.bore_shape,
            params.entry_diam,
            params.exit_diam,
            params.length,
            params.sample_count,
        )?;
        let thickness = self.generator.exterior_thickness(&profile, params.exterior_shape)?;
        let result = self
            .adapter
            .evaluate(&profile, &self.material, thickness.average(), &self.environment)?;
        let cost = compute_cost(&result, target, &self.config.weights)?;
        Ok((cost, result))
    }

    /// Run the search.
    ///
    /// Invalid initial parameters, target or configuration fail before any
    /// simulation. A target impedance curve whose length does not match the
    /// adapter's frequency axis fails after the first evaluation. Failed
    /// candidates cost `+∞` and the search continues. Not reaching
    /// `convergence_tol` is not an error: the best candidate is returned with
    /// `success = false`.
    pub fn optimize(&self, initial: &BarrelParams, target: &OptimizationTarget) -> Result<OptimizationOutcome> {
        initial.validate()?;
        target.validate()?;
        self.config.validate()?;

        let bounds = self.config.bounds.bounds_for(initial);
        info!(
            adapter = self.adapter.name(),
            target_hz = target.first_resonance_hz,
            entry = initial.entry_diam,
            exit = initial.exit_diam,
            length = initial.length,
            max_evaluations = self.config.search.max_evaluations,
            "starting barrel optimization"
        );

        let first = match self.evaluate(initial, target) {
            Ok(evaluated) => Some(evaluated),
            Err(err @ BoreError::InvalidConfig { .. }) => return Err(err),
            Err(err) => {
                warn!(error = %err, "initial parameters failed to simulate");
                None
            }
        };

        let to_params = |u: &[f64]| {
            let x: Vec<f64> = u
                .iter()
                .zip(&bounds)
                .map(|(&t, &(lo, hi))| lo + t * (hi - lo))
                .collect();
            initial.with_vector(&x)
        };

        let search = self
            .config
            .search
            .clone()
            .with_initial_point(vec![0.5; NUM_VARIABLES]);

        let mut pending_initial = Some(first);
        let mut best: Option<(f64, BarrelParams, AcousticResult)> = None;

        let run = run_surrogate_optimization(&search, vec![(0.0, 1.0); NUM_VARIABLES], |u| {
            let (params, evaluated) = match pending_initial.take() {
                Some(first) => (initial.clone(), first),
                None => {
                    let params = to_params(u);
                    match self.evaluate(&params, target) {
                        Ok(evaluated) => (params, Some(evaluated)),
                        Err(err) => {
                            warn!(
                                error = %err,
                                entry = params.entry_diam,
                                exit = params.exit_diam,
                                length = params.length,
                                "candidate evaluation failed"
                            );
                            (params, None)
                        }
                    }
                }
            };

            let Some((cost, result)) = evaluated else {
                return f64::INFINITY;
            };
            let cost = if cost.is_nan() { f64::INFINITY } else { cost };
            debug!(
                cost,
                f1 = result.first_resonance_hz(),
                entry = params.entry_diam,
                exit = params.exit_diam,
                length = params.length,
                "optimizer evaluation"
            );
            if best.as_ref().map_or(true, |(best_cost, _, _)| cost < *best_cost) {
                best = Some((cost, params, result));
            }
            cost
        });

        let (best_cost, best_params, best_result) = match best {
            Some((cost, params, result)) => (cost, params, Some(result)),
            None => (f64::INFINITY, initial.clone(), None),
        };
        let success = best_cost <= self.config.search.convergence_tol;

        info!(
            evaluations = run.evaluations,
            best_cost,
            success,
            entry = best_params.entry_diam,
            exit = best_params.exit_diam,
            length = best_params.length,
            "barrel optimization finished"
        );

        Ok(OptimizationOutcome {
            best_params,
            best_cost,
            best_result,
            evaluations: run.evaluations,
            success,
            cost_history: run.fitness_history,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::surrogate::SurrogateConfig;
    use crate::simulation::PlaceholderSimulationAdapter;

    fn fast_config() -> OptimizerConfig {
        OptimizerConfig {
            search: SurrogateConfig {
                initial_samples: 4,
                max_evaluations: 8,
                candidate_pool_size: 200,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_met_target_stops_after_initial_point() {
        let optimizer = Optimizer::new(PlaceholderSimulationAdapter::new(3)).with_config(fast_config());
        let initial = BarrelParams::default();
        let target = OptimizationTarget::new(440.0);
        let (_, result) = optimizer.evaluate(&initial, &target).unwrap();

        let met = OptimizationTarget::new(result.first_resonance_hz());
        let outcome = optimizer.optimize(&initial, &met).unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.evaluations, 1);
        assert_eq!(outcome.best_params, initial);
        assert!(outcome.best_cost.abs() < 1e-12);
    }

    #[test]
    fn test_unreachable_target_is_not_an_error() {
        let optimizer = Optimizer::new(PlaceholderSimulationAdapter::new(3)).with_config(fast_config());
        let outcome = optimizer
            .optimize(&BarrelParams::default(), &OptimizationTarget::new(5000.0))
            .unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.evaluations, 8);
        assert!(outcome.best_result.is_some());
        assert_eq!(outcome.cost_history.len(), 8);

        let bounds = optimizer.config().bounds.bounds_for(&BarrelParams::default());
        let best = outcome.best_params.to_vector();
        for (x, (lo, hi)) in best.iter().zip(bounds) {
            assert!(*x >= lo - 1e-9 && *x <= hi + 1e-9);
        }
    }

    #[test]
    fn test_invalid_initial_params_fail_fast() {
        let optimizer = Optimizer::new(PlaceholderSimulationAdapter::default());
        let err = optimizer
            .optimize(&BarrelParams::new(-1.0, 15.0, 66.0), &OptimizationTarget::new(440.0))
            .unwrap_err();
        assert!(matches!(err, BoreError::InvalidGeometry(_)));
    }

    #[test]
    fn test_impedance_length_mismatch_is_config_error() {
        let optimizer = Optimizer::new(PlaceholderSimulationAdapter::default()).with_config(fast_config());
        let target = OptimizationTarget::new(440.0).with_impedance(vec![1.0; 3]);
        let err = optimizer.optimize(&BarrelParams::default(), &target).unwrap_err();
        assert!(matches!(err, BoreError::InvalidConfig { .. }));
    }
}

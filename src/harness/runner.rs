//! Seeded end-to-end runs.

use super::config::{ConfigError, GaaConfig};
use super::record::{InstanceMetrics, RunRecord};
use crate::eval::{Evaluator, TrainingSet, TrainingSetError};
use crate::generator::{GenError, Generator};
use crate::problem::{BestKnownTable, Problem};
use crate::random::derive_seed;
use crate::registry::OperatorRegistry;
use crate::search::{SearchError, SearchRunner};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Fatal run failures.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    TrainingSet(#[from] TrainingSetError),
    #[error("training instance '{0}' was not supplied")]
    UnknownInstance(String),
    #[error(transparent)]
    Generation(#[from] GenError),
    #[error(transparent)]
    Search(#[from] SearchError),
}

/// Runs one seeded search and returns its record.
///
/// The run seed drives the outer search; replica `r` interprets with
/// `derive_seed(seed, r + 1)`, so evaluation is independent of the
/// search's draw history.
///
/// # Examples
///
/// ```
/// use u_gaa::domains::registry_for;
/// use u_gaa::generator::Strategy;
/// use u_gaa::harness::{run, GaaConfig};
/// use u_gaa::problem::{BestKnown, BestKnownTable, Problem, ProblemFamily};
///
/// let registry = registry_for(ProblemFamily::GraphColoring).unwrap();
/// let c4 = Problem::graph_coloring("c4", 4, &[(0, 1), (1, 2), (2, 3), (3, 0)]).unwrap();
/// let table = BestKnownTable::new().with_entry(
///     ProblemFamily::GraphColoring,
///     "c4",
///     BestKnown::primary(2.0),
/// );
/// let config = GaaConfig::default()
///     .with_strategy(Strategy::FixedSkeleton)
///     .with_max_iter(100)
///     .with_seed(42);
///
/// let record = run(&config, &registry, &[c4], &table).unwrap();
/// assert_eq!(record.metrics[0].primary, 2.0);
/// assert_eq!(record.metrics[0].gap, Some(0.0));
/// ```
pub fn run(
    config: &GaaConfig,
    registry: &OperatorRegistry,
    instances: &[Problem],
    best_known: &BestKnownTable,
) -> Result<RunRecord, RunError> {
    run_with_cancel(config, registry, instances, best_known, None)
}

/// Like [`run`], with an optional cancellation token.
pub fn run_with_cancel(
    config: &GaaConfig,
    registry: &OperatorRegistry,
    instances: &[Problem],
    best_known: &BestKnownTable,
    cancel: Option<Arc<AtomicBool>>,
) -> Result<RunRecord, RunError> {
    config.validate()?;
    let seed = config.seed.unwrap_or_else(rand::random);
    let config = config.clone().with_seed(seed);
    let training = training_set(&config, instances, best_known)?;

    let generator = Generator::new(config.generator_config(), registry)?;
    let eval_seeds = (0..config.replicas_per_instance)
        .map(|r| derive_seed(seed, r as u64 + 1))
        .collect();
    let evaluator = Evaluator::new(
        registry,
        config.interpreter_config(),
        eval_seeds,
        config.cost_signal,
    );

    let started_at_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);
    let start = Instant::now();
    tracing::info!(
        seed,
        family = %training.family(),
        instances = training.len(),
        replicas = config.replicas_per_instance,
        "run started"
    );

    let result = SearchRunner::run_with_cancel(
        &generator,
        &evaluator,
        &training,
        &config.search_config(),
        cancel,
    )?;

    let metrics = InstanceMetrics::from_evaluation(training.family(), &result.best_evaluation);
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    tracing::info!(
        seed,
        termination = ?result.termination,
        primary = result.best_fitness.primary,
        elapsed_ms,
        "run finished"
    );

    Ok(RunRecord {
        seed,
        started_at_ms,
        elapsed_ms,
        family: training.family(),
        termination: result.termination,
        iterations: result.iterations,
        candidates_evaluated: result.candidates_evaluated,
        accepted_moves: result.accepted_moves,
        restarts: result.restarts,
        operator_calls: result.operator_calls,
        best_fitness: result.best_fitness,
        best_pseudocode: result.best.to_pseudocode(),
        best_program: result.best.to_serialized(),
        trace: result.trace,
        metrics,
        config,
    })
}

/// Runs one independent search per seed.
///
/// Runs share nothing mutable; with the `parallel` feature they execute
/// on the rayon pool. Results are in `seeds` order either way.
pub fn run_seeds(
    config: &GaaConfig,
    registry: &OperatorRegistry,
    instances: &[Problem],
    best_known: &BestKnownTable,
    seeds: &[u64],
) -> Vec<Result<RunRecord, RunError>> {
    let run_one =
        |&seed: &u64| run(&config.clone().with_seed(seed), registry, instances, best_known);

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        seeds.par_iter().map(run_one).collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        seeds.iter().map(run_one).collect()
    }
}

/// Selects the configured training instances and attaches BKS values.
fn training_set(
    config: &GaaConfig,
    instances: &[Problem],
    best_known: &BestKnownTable,
) -> Result<TrainingSet, RunError> {
    let selected = if config.training_instances.is_empty() {
        instances.to_vec()
    } else {
        config
            .training_instances
            .iter()
            .map(|id| {
                instances
                    .iter()
                    .find(|p| p.instance_id() == id)
                    .cloned()
                    .ok_or_else(|| RunError::UnknownInstance(id.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?
    };
    Ok(TrainingSet::new(selected)?.with_best_known(best_known))
}

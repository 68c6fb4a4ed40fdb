//! Outer search loop over program space.

use super::config::{Acceptance, SearchConfig};
use super::crossover::crossover;
use super::mutation::{legalize, mutate};
use super::population::{Member, Population};
use super::trace::{ConvergencePoint, ConvergenceTrace};
use crate::ast::AlgorithmProgram;
use crate::eval::{Evaluation, Evaluator, Fitness, TrainingSet};
use crate::generator::{GenError, Generator};
use crate::interp::{Budget, InterpretError, StopCause};
use crate::problem::ProblemFamily;
use crate::random::{create_rng, GaaRng};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Why a search stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    MaxIterations,
    TimeLimit,
    EvaluationBudget,
    /// Every training instance reached its best-known primary.
    Optimum,
    Cancelled,
}

/// Search failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SearchError {
    #[error("invalid search configuration: {0}")]
    InvalidConfig(String),
    #[error("registry serves {registry} but the training set is {training}")]
    FamilyMismatch {
        registry: ProblemFamily,
        training: ProblemFamily,
    },
    #[error(transparent)]
    Generation(#[from] GenError),
    #[error(transparent)]
    Interpret(#[from] InterpretError),
}

/// Result of a search run.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The best program found.
    pub best: AlgorithmProgram,

    /// Fitness of the best program.
    pub best_fitness: Fitness,

    /// Per-instance outcomes of the best program.
    pub best_evaluation: Evaluation,

    /// Outer iterations executed.
    pub iterations: u64,

    /// Programs evaluated, including the initial population and restarts.
    pub candidates_evaluated: u64,

    /// Accepted candidates (including improvements).
    pub accepted_moves: u64,

    /// Accepted candidates that became the new best.
    pub improving_moves: u64,

    pub restarts: u64,

    /// Proposals dropped because they stayed invalid after repair.
    pub skipped_proposals: u64,

    /// Operator invocations across all interpretations.
    pub operator_calls: u64,

    /// Metropolis temperature when the search stopped.
    pub final_temperature: f64,

    pub termination: Termination,

    /// Whether cancelled externally.
    pub cancelled: bool,

    pub trace: ConvergenceTrace,

    /// Best primary fitness after initialization and after every iteration.
    pub cost_history: Vec<f64>,

    /// Final elite set, best first.
    pub elites: Vec<Member>,
}

/// Executes the outer search.
///
/// One iteration proposes a child of the incumbent (crossover with an
/// elite with probability `p_crossover`, otherwise a mutation), legalizes
/// it, evaluates it on the training set and applies the acceptance rule.
/// A stagnating incumbent is replaced by a fresh generator draw.
pub struct SearchRunner;

impl SearchRunner {
    /// Runs the search.
    pub fn run(
        generator: &Generator<'_>,
        evaluator: &Evaluator<'_>,
        training: &TrainingSet,
        config: &SearchConfig,
    ) -> Result<SearchResult, SearchError> {
        Self::run_with_cancel(generator, evaluator, training, config, None)
    }

    /// Runs the search with an optional cancellation token.
    ///
    /// The flag is read once per iteration; a set flag stops the search
    /// and returns the best program found so far.
    pub fn run_with_cancel(
        generator: &Generator<'_>,
        evaluator: &Evaluator<'_>,
        training: &TrainingSet,
        config: &SearchConfig,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<SearchResult, SearchError> {
        config.validate().map_err(SearchError::InvalidConfig)?;
        let registry_family = generator.registry().problem_family();
        if registry_family != training.family() {
            return Err(SearchError::FamilyMismatch {
                registry: registry_family,
                training: training.family(),
            });
        }

        let seed = config.seed.unwrap_or_else(rand::random);
        let mut rng = create_rng(seed);
        let start = Instant::now();
        let mut budget = Budget::unlimited();
        if let Some(n) = config.max_evaluations {
            budget = budget.with_max_evaluations(n);
        }
        if let Some(limit) = config.time_limit {
            budget = budget.with_deadline(start + limit);
        }

        let mut elites = Population::new(config.elite_size);
        let mut candidates_evaluated = 0u64;

        // 1. Initial population; the best draw becomes the incumbent
        let mut current = generator.generate_nth(0, &mut rng)?;
        let mut current_eval = evaluator.evaluate(&current, training, &mut budget)?;
        candidates_evaluated += 1;
        elites.offer(&current, current_eval.fitness);
        for i in 1..config.pop_size {
            let program = generator.generate_nth(i as u64, &mut rng)?;
            let evaluation = evaluator.evaluate(&program, training, &mut budget)?;
            candidates_evaluated += 1;
            elites.offer(&program, evaluation.fitness);
            if evaluation.fitness < current_eval.fitness {
                current = program;
                current_eval = evaluation;
            }
        }
        let mut best = current.clone();
        let mut best_eval = current_eval.clone();

        tracing::info!(
            seed,
            family = %training.family(),
            instances = training.len(),
            primary = best_eval.fitness.primary,
            "search started"
        );

        let mut trace = ConvergenceTrace::new();
        trace.record(ConvergencePoint {
            iteration: 0,
            elapsed_ms: elapsed_ms(start),
            primary_best_so_far: best_eval.fitness.primary,
            secondary_best_so_far: best_eval.fitness.secondary,
            accepted: true,
        });
        let mut cost_history = vec![best_eval.fitness.primary];

        let mut temperature = config.initial_temperature;
        let mut iteration = 0u64;
        let mut stagnation = 0u64;
        let mut accepted_moves = 0u64;
        let mut improving_moves = 0u64;
        let mut restarts = 0u64;
        let mut skipped_proposals = 0u64;
        let mut cancelled = false;

        let termination = loop {
            if best_eval.reaches_best_known() {
                break Termination::Optimum;
            }
            if iteration >= config.max_iter {
                break Termination::MaxIterations;
            }
            if let Some(ref flag) = cancel {
                if flag.load(Ordering::Relaxed) {
                    cancelled = true;
                    break Termination::Cancelled;
                }
            }
            if let Some(cause) = budget.exhausted() {
                break termination_for(cause);
            }

            // 2. Propose a legal child
            let mut child = None;
            for _ in 0..config.mutation_attempts {
                let use_crossover =
                    config.p_crossover > 0.0 && rng.random_bool(config.p_crossover);
                let proposal = if use_crossover {
                    let donor = elites.random(&mut rng).map(|m| m.program.clone());
                    donor.and_then(|d| crossover(&current, &d, &mut rng))
                } else {
                    mutate(&current, generator, &mut rng)
                };
                match proposal.and_then(|p| legalize(p, generator, &mut rng)) {
                    Some(p) => {
                        child = Some(p);
                        break;
                    }
                    None => skipped_proposals += 1,
                }
            }

            // 3. Evaluate and accept
            let mut accepted = false;
            let mut new_best = false;
            if let Some(child) = child {
                let evaluation = evaluator.evaluate(&child, training, &mut budget)?;
                candidates_evaluated += 1;
                if let Some(cause) = budget.exhausted() {
                    // The child ran on a partial budget and is not comparable.
                    break termination_for(cause);
                }
                accepted = match config.acceptance {
                    Acceptance::Greedy => evaluation.fitness < current_eval.fitness,
                    Acceptance::Metropolis => metropolis(
                        &evaluation.fitness,
                        &current_eval.fitness,
                        temperature,
                        &mut rng,
                    ),
                };
                if accepted {
                    accepted_moves += 1;
                    elites.offer(&child, evaluation.fitness);
                    if evaluation.fitness > current_eval.fitness {
                        tracing::debug!(
                            iteration,
                            primary = evaluation.fitness.primary,
                            temperature,
                            "accepted worse candidate"
                        );
                    }
                    if !evaluation.fitness.is_worst() && evaluation.fitness < best_eval.fitness {
                        improving_moves += 1;
                        new_best = true;
                        best = child.clone();
                        best_eval = evaluation.clone();
                        tracing::info!(
                            iteration,
                            primary = best_eval.fitness.primary,
                            secondary = best_eval.fitness.secondary,
                            "new best program"
                        );
                    }
                    current = child;
                    current_eval = evaluation;
                }
            }

            if new_best {
                stagnation = 0;
            } else {
                stagnation += 1;
            }

            // 4. Restart a stagnating incumbent
            if stagnation >= config.restart_threshold {
                // restarts continue the ramp where the population left off
                let draw = config.pop_size as u64 + restarts;
                let program = generator.generate_nth(draw, &mut rng)?;
                let evaluation = evaluator.evaluate(&program, training, &mut budget)?;
                candidates_evaluated += 1;
                restarts += 1;
                stagnation = 0;
                tracing::debug!(iteration, primary = evaluation.fitness.primary, "restart");
                elites.offer(&program, evaluation.fitness);
                if !evaluation.fitness.is_worst() && evaluation.fitness < best_eval.fitness {
                    best = program.clone();
                    best_eval = evaluation.clone();
                }
                current = program;
                current_eval = evaluation;
            }

            iteration += 1;
            temperature *= config.alpha;
            trace.record(ConvergencePoint {
                iteration,
                elapsed_ms: elapsed_ms(start),
                primary_best_so_far: best_eval.fitness.primary,
                secondary_best_so_far: best_eval.fitness.secondary,
                accepted,
            });
            cost_history.push(best_eval.fitness.primary);
        };

        tracing::info!(
            iterations = iteration,
            termination = ?termination,
            primary = best_eval.fitness.primary,
            "search finished"
        );

        Ok(SearchResult {
            best_fitness: best_eval.fitness,
            best,
            best_evaluation: best_eval,
            iterations: iteration,
            candidates_evaluated,
            accepted_moves,
            improving_moves,
            restarts,
            skipped_proposals,
            operator_calls: budget.evaluations(),
            final_temperature: temperature,
            termination,
            cancelled,
            trace,
            cost_history,
            elites: elites.into_members(),
        })
    }
}

/// Metropolis rule on the primary component.
fn metropolis(child: &Fitness, current: &Fitness, temperature: f64, rng: &mut GaaRng) -> bool {
    if child < current {
        return true;
    }
    let delta = (child.primary - current.primary).max(0.0);
    if !delta.is_finite() || temperature <= 0.0 {
        return false;
    }
    rng.random_range(0.0..1.0) < (-delta / temperature).exp()
}

fn termination_for(cause: StopCause) -> Termination {
    match cause {
        StopCause::EvaluationBudget => Termination::EvaluationBudget,
        _ => Termination::TimeLimit,
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

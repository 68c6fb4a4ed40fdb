//! Program evaluation over a training set.

use super::fitness::{CostSignal, Fitness};
use super::types::{Evaluation, InstanceOutcome, TrainingSet};
use crate::ast::AlgorithmProgram;
use crate::interp::{Budget, InterpretError, Interpreter, InterpreterConfig};
use crate::problem::Solution;
use crate::random::{create_rng, derive_seed};
use crate::registry::OperatorRegistry;

/// Runs programs on every training instance and aggregates a [`Fitness`].
///
/// Replica `r` on the `i`-th instance (in id order) interprets with seed
/// `derive_seed(seeds[r], i)`, so every candidate faces the same random
/// streams and a program always receives the same fitness.
#[derive(Debug, Clone)]
pub struct Evaluator<'r> {
    interpreter: Interpreter<'r>,
    seeds: Vec<u64>,
    cost_signal: CostSignal,
}

impl<'r> Evaluator<'r> {
    /// Creates an evaluator with one replica per seed.
    ///
    /// An empty `seeds` list falls back to a single replica with seed 0.
    pub fn new(
        registry: &'r OperatorRegistry,
        config: InterpreterConfig,
        seeds: Vec<u64>,
        cost_signal: CostSignal,
    ) -> Self {
        let seeds = if seeds.is_empty() { vec![0] } else { seeds };
        Self {
            interpreter: Interpreter::new(registry, config),
            seeds,
            cost_signal,
        }
    }

    pub fn replicas(&self) -> usize {
        self.seeds.len()
    }

    pub fn cost_signal(&self) -> CostSignal {
        self.cost_signal
    }

    /// Evaluates `program` on every instance of `training`.
    ///
    /// Instances are visited sequentially in id order. Each replica scores
    /// the final state of its interpretation; infeasible final states carry
    /// the uniform infeasibility penalty in the primary component. When
    /// [`Interpreter::is_deterministic`] holds, every replica after the
    /// first reuses its outcome without spending budget.
    pub fn evaluate(
        &self,
        program: &AlgorithmProgram,
        training: &TrainingSet,
        budget: &mut Budget,
    ) -> Result<Evaluation, InterpretError> {
        let mut outcomes = Vec::with_capacity(training.len() * self.seeds.len());
        let deterministic = self.interpreter.is_deterministic(program);

        for (index, problem) in training.instances().iter().enumerate() {
            let mut first: Option<InstanceOutcome> = None;
            for (replica, &base) in self.seeds.iter().enumerate() {
                let seed = derive_seed(base, index as u64);
                // Seed-independent programs replay the first replica.
                if let Some(done) = first.as_ref().filter(|_| deterministic) {
                    outcomes.push(InstanceOutcome {
                        replica,
                        seed,
                        ..done.clone()
                    });
                    continue;
                }
                let mut rng = create_rng(seed);
                let result = self.interpreter.interpret(
                    program,
                    problem,
                    Solution::empty(problem),
                    budget,
                    &mut rng,
                )?;
                let outcome = InstanceOutcome {
                    instance_id: problem.instance_id().to_string(),
                    replica,
                    seed,
                    final_state: result.final_state,
                    best_known: problem.best_known(),
                    actions: result.trace.actions,
                    infeasible_breaches: result.trace.infeasible_breaches,
                    elapsed_ms: result.trace.elapsed_ms,
                    stop: result.trace.stop,
                    fault: result.trace.fault,
                };
                if first.is_none() {
                    first = Some(outcome.clone());
                }
                outcomes.push(outcome);
            }
        }

        let faults = outcomes.iter().filter(|o| o.fault.is_some()).count();
        let fitness = if !outcomes.is_empty() && faults == outcomes.len() {
            tracing::warn!(replicas = faults, "every replica faulted, assigning worst fitness");
            Fitness::worst()
        } else {
            self.aggregate(&outcomes)
        };

        Ok(Evaluation {
            fitness,
            outcomes,
            faults,
        })
    }

    fn aggregate(&self, outcomes: &[InstanceOutcome]) -> Fitness {
        if outcomes.is_empty() {
            return Fitness::worst();
        }
        let primary = mean(outcomes, |o| o.final_state.penalized_primary());
        let secondary = mean(outcomes, |o| o.final_state.secondary());
        let tertiary = match self.cost_signal {
            CostSignal::Evaluations => mean(outcomes, |o| o.actions as f64),
            CostSignal::WallTime => mean(outcomes, |o| o.elapsed_ms),
        };
        Fitness::new(primary, secondary, tertiary)
    }
}

fn mean(outcomes: &[InstanceOutcome], f: impl Fn(&InstanceOutcome) -> f64) -> f64 {
    outcomes.iter().map(f).sum::<f64>() / outcomes.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{SizeCaps, TreeBuilder};
    use crate::domains;
    use crate::problem::{BestKnown, Problem, ProblemFamily, INFEASIBLE_PENALTY};
    use crate::registry::{OpParams, OperatorDescriptor, OperatorFamily, OperatorFault};
    use crate::random::GaaRng;

    fn program(build: impl FnOnce(&mut TreeBuilder) -> crate::ast::NodeId) -> AlgorithmProgram {
        let mut b = TreeBuilder::new();
        let root = build(&mut b);
        AlgorithmProgram::new(
            b.build(root),
            ProblemFamily::GraphColoring,
            0,
            SizeCaps {
                max_depth: 5,
                max_size: 25,
            },
        )
        .unwrap()
    }

    fn training() -> TrainingSet {
        TrainingSet::new(vec![
            Problem::graph_coloring("c4", 4, &[(0, 1), (1, 2), (2, 3), (3, 0)])
                .unwrap()
                .with_best_known(BestKnown::primary(2.0)),
            Problem::graph_coloring("k3", 3, &[(0, 1), (1, 2), (0, 2)])
                .unwrap()
                .with_best_known(BestKnown::primary(3.0)),
        ])
        .unwrap()
    }

    #[test]
    fn test_mean_fitness() {
        let reg = domains::registry_for(ProblemFamily::GraphColoring).unwrap();
        let eval = Evaluator::new(
            &reg,
            InterpreterConfig::default(),
            vec![1, 2],
            CostSignal::Evaluations,
        );
        let p = program(|b| b.constructive("dsatur"));
        let result = eval.evaluate(&p, &training(), &mut Budget::unlimited()).unwrap();

        assert_eq!(result.outcomes.len(), 4);
        assert_eq!(result.outcomes[0].instance_id, "c4");
        assert_eq!(result.outcomes[3].instance_id, "k3");
        // (2 + 2 + 3 + 3) / 4
        assert_eq!(result.fitness.primary, 2.5);
        assert_eq!(result.fitness.secondary, 0.0);
        assert_eq!(result.fitness.tertiary, 1.0);
        assert!(result.reaches_best_known());
        assert_eq!(result.feasible_ratio(), 1.0);
    }

    #[test]
    fn test_same_program_same_fitness() {
        let reg = domains::registry_for(ProblemFamily::GraphColoring).unwrap();
        let eval = Evaluator::new(
            &reg,
            InterpreterConfig::default(),
            vec![9],
            CostSignal::Evaluations,
        );
        let p = program(|b| {
            let c = b.constructive("random_greedy");
            let pert = b.perturbation("random_recolor", Some(0.5));
            b.seq(vec![c, pert])
        });
        let set = training();
        let a = eval.evaluate(&p, &set, &mut Budget::unlimited()).unwrap();
        let b = eval.evaluate(&p, &set, &mut Budget::unlimited()).unwrap();
        assert_eq!(a.fitness, b.fitness);
    }

    #[test]
    fn test_infeasible_is_penalized() {
        let mut b = OperatorRegistry::builder(ProblemFamily::GraphColoring);
        b.register(
            OperatorFamily::Constructive,
            "mono",
            OperatorDescriptor::new(
                |p: &Problem, _: &Solution, _: &OpParams, _: &mut GaaRng| -> Result<Solution, OperatorFault> {
                    let n = p.graph().map_or(0, |g| g.num_vertices());
                    Ok(Solution::new(
                        p,
                        crate::problem::Assignment::Coloring(vec![Some(0); n]),
                    ))
                },
            ),
        )
        .unwrap();
        let reg = b.build().unwrap();
        let eval = Evaluator::new(&reg, InterpreterConfig::default(), vec![], CostSignal::Evaluations);
        let set = TrainingSet::new(vec![
            Problem::graph_coloring("k3", 3, &[(0, 1), (1, 2), (0, 2)]).unwrap(),
        ])
        .unwrap();
        let result = eval
            .evaluate(&program(|b| b.constructive("mono")), &set, &mut Budget::unlimited())
            .unwrap();
        assert_eq!(eval.replicas(), 1);
        assert!(result.fitness.primary >= INFEASIBLE_PENALTY);
        assert!(!result.reaches_best_known());
    }

    #[test]
    fn test_deterministic_program_replays_replicas() {
        let reg = domains::registry_for(ProblemFamily::GraphColoring).unwrap();
        let eval = Evaluator::new(
            &reg,
            InterpreterConfig::default(),
            vec![1, 2, 3],
            CostSignal::Evaluations,
        );

        let mut budget = Budget::unlimited();
        let det = eval
            .evaluate(&program(|b| b.constructive("dsatur")), &training(), &mut budget)
            .unwrap();
        assert_eq!(det.outcomes.len(), 6);
        // one interpretation per instance
        assert_eq!(budget.evaluations(), 2);
        assert_eq!(det.outcomes[2].replica, 2);
        assert_ne!(det.outcomes[0].seed, det.outcomes[1].seed);
        assert_eq!(det.outcomes[0].final_state, det.outcomes[2].final_state);
        assert_eq!(det.fitness.tertiary, 1.0);

        let mut budget = Budget::unlimited();
        eval.evaluate(&program(|b| b.constructive("random_greedy")), &training(), &mut budget)
            .unwrap();
        assert_eq!(budget.evaluations(), 6);
    }

    #[test]
    fn test_trailing_destruction_is_scored() {
        let reg = domains::registry_for(ProblemFamily::GraphColoring).unwrap();
        let eval = Evaluator::new(&reg, InterpreterConfig::default(), vec![3], CostSignal::Evaluations);
        let set = TrainingSet::new(vec![
            Problem::graph_coloring("k3", 3, &[(0, 1), (1, 2), (0, 2)]).unwrap(),
        ])
        .unwrap();

        let clean = program(|b| b.constructive("dsatur"));
        let broken = program(|b| {
            let c = b.constructive("dsatur");
            let merge = b.perturbation("class_merge", None);
            let f = b.for_loop(2, merge);
            b.seq(vec![c, f])
        });
        let good = eval.evaluate(&clean, &set, &mut Budget::unlimited()).unwrap();
        let bad = eval.evaluate(&broken, &set, &mut Budget::unlimited()).unwrap();

        assert_eq!(good.fitness.primary, 3.0);
        assert!(!bad.outcomes[0].feasible());
        assert!(bad.fitness.primary >= INFEASIBLE_PENALTY);
        assert!(good.fitness.is_better_than(&bad.fitness));
    }

    #[test]
    fn test_all_faults_give_worst() {
        let mut b = OperatorRegistry::builder(ProblemFamily::GraphColoring);
        b.register(
            OperatorFamily::Constructive,
            "boom",
            OperatorDescriptor::new(
                |_: &Problem, _: &Solution, _: &OpParams, _: &mut GaaRng| -> Result<Solution, OperatorFault> {
                    Err(OperatorFault::new("boom"))
                },
            ),
        )
        .unwrap();
        let reg = b.build().unwrap();
        let eval = Evaluator::new(&reg, InterpreterConfig::default(), vec![1, 2], CostSignal::WallTime);
        let result = eval
            .evaluate(&program(|b| b.constructive("boom")), &training(), &mut Budget::unlimited())
            .unwrap();
        assert!(result.all_faulted());
        assert!(result.fitness.is_worst());
        assert_eq!(result.faults, 4);
    }
}

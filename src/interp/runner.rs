//! Tree-walking interpreter.

use super::types::{
    Budget, ExecTrace, InterpretError, Interpretation, InterpreterConfig, StopCause,
};
use crate::ast::{AlgorithmProgram, Arena, Node, NodeId};
use crate::problem::{Problem, Solution};
use crate::random::{child_rng, GaaRng};
use crate::registry::{OpParams, OperatorDescriptor, OperatorFamily, OperatorRegistry};
use std::time::Instant;

/// Executes programs against problem instances through a registry.
///
/// # Examples
///
/// ```
/// use u_gaa::ast::{AlgorithmProgram, SizeCaps, TreeBuilder};
/// use u_gaa::domains;
/// use u_gaa::interp::{Budget, Interpreter, InterpreterConfig};
/// use u_gaa::problem::{Problem, ProblemFamily, Solution};
/// use u_gaa::random::create_rng;
///
/// let registry = domains::registry_for(ProblemFamily::GraphColoring).unwrap();
/// let problem = Problem::graph_coloring("c4", 4, &[(0, 1), (1, 2), (2, 3), (3, 0)]).unwrap();
///
/// let mut b = TreeBuilder::new();
/// let c = b.constructive("dsatur");
/// let program = AlgorithmProgram::new(
///     b.build(c),
///     ProblemFamily::GraphColoring,
///     0,
///     SizeCaps { max_depth: 5, max_size: 25 },
/// )
/// .unwrap();
///
/// let interpreter = Interpreter::new(&registry, InterpreterConfig::default());
/// let result = interpreter
///     .interpret(
///         &program,
///         &problem,
///         Solution::empty(&problem),
///         &mut Budget::unlimited(),
///         &mut create_rng(42),
///     )
///     .unwrap();
/// assert!(result.final_state.is_feasible());
/// assert_eq!(result.final_state.primary(), 2.0);
/// ```
#[derive(Debug, Clone)]
pub struct Interpreter<'r> {
    registry: &'r OperatorRegistry,
    config: InterpreterConfig,
}

impl<'r> Interpreter<'r> {
    pub fn new(registry: &'r OperatorRegistry, config: InterpreterConfig) -> Self {
        Self { registry, config }
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    /// Whether every interpretation of `program` follows the same path
    /// regardless of the RNG seed.
    ///
    /// True when no reachable operator is stochastic and no `TimeLimit`
    /// condition reads the clock. Unknown keys count as stochastic.
    pub fn is_deterministic(&self, program: &AlgorithmProgram) -> bool {
        let registry = self.registry;
        program.arena().nodes().iter().all(|node| {
            let descriptor = match node {
                Node::Constructive(op) => registry.get(OperatorFamily::Constructive, op),
                Node::LocalSearch { op, .. } => registry.get(OperatorFamily::LocalSearch, op),
                Node::Perturbation { op, .. } => registry.get(OperatorFamily::Perturbation, op),
                Node::Repair(Some(op)) => registry.get(OperatorFamily::Repair, op),
                Node::Repair(None) => match registry.default_repair() {
                    Some((_, descriptor)) => Some(descriptor),
                    None => return true,
                },
                Node::TimeLimit(_) => return false,
                _ => return true,
            };
            descriptor.is_some_and(|d| !d.is_stochastic())
        })
    }

    /// Runs `program` on `problem` starting from `initial`.
    ///
    /// Operator faults and budget exhaustion end the run early and are
    /// reported on the trace. Only an operator key missing from the
    /// registry is returned as an error.
    pub fn interpret(
        &self,
        program: &AlgorithmProgram,
        problem: &Problem,
        initial: Solution,
        budget: &mut Budget,
        rng: &mut GaaRng,
    ) -> Result<Interpretation, InterpretError> {
        let mut exec = Execution {
            interpreter: self,
            arena: program.arena(),
            problem,
            budget,
            rng,
            start: Instant::now(),
            best_primary: f64::INFINITY,
            state: initial,
            last_improved: false,
            since_best: 0,
            actions: 0,
            improvements: 0,
            infeasible_breaches: 0,
            halt: None,
            fault: None,
        };
        exec.halt = exec.budget.exhausted();
        exec.run(program.root())?;

        let stop = exec.halt.unwrap_or(StopCause::Completed);
        let trace = ExecTrace {
            actions: exec.actions,
            improvements: exec.improvements,
            infeasible_breaches: exec.infeasible_breaches,
            stop,
            fault: exec.fault,
            final_violations: exec.state.violations().to_vec(),
            elapsed_ms: exec.start.elapsed().as_secs_f64() * 1000.0,
        };
        tracing::trace!(
            actions = trace.actions,
            stop = ?trace.stop,
            improvements = trace.improvements,
            "interpretation finished"
        );
        Ok(Interpretation {
            final_state: exec.state,
            trace,
        })
    }
}

/// Mutable state of one interpretation.
struct Execution<'a, 'r> {
    interpreter: &'a Interpreter<'r>,
    arena: &'a Arena,
    problem: &'a Problem,
    budget: &'a mut Budget,
    rng: &'a mut GaaRng,
    start: Instant,
    state: Solution,
    /// Lowest penalized primary produced by an action so far.
    best_primary: f64,
    /// Whether the most recent action strictly lowered the penalized primary.
    last_improved: bool,
    /// Actions since the best penalized primary last improved.
    since_best: u32,
    actions: u64,
    improvements: u64,
    /// Feasible inputs turned infeasible by operators not flagged for it.
    infeasible_breaches: u64,
    halt: Option<StopCause>,
    fault: Option<InterpretError>,
}

impl Execution<'_, '_> {
    fn run(&mut self, id: NodeId) -> Result<(), InterpretError> {
        if self.halt.is_some() {
            return Ok(());
        }
        let arena = self.arena;
        match arena.node(id) {
            Node::Seq(children) => {
                for &child in children {
                    if self.halt.is_some() {
                        break;
                    }
                    self.run(child)?;
                }
            }
            Node::If {
                cond,
                then,
                otherwise,
            } => {
                if self.condition(*cond) {
                    self.run(*then)?;
                } else if let Some(e) = otherwise {
                    self.run(*e)?;
                }
            }
            Node::While {
                cond,
                body,
                max_iter,
            } => {
                let config = &self.interpreter.config;
                let cap = (*max_iter).min(config.loop_cap);
                let stagnation_limit = config.stagnation_limit;
                let mut stale = 0u32;
                for _ in 0..cap {
                    if self.halt.is_some() || !self.condition(*cond) {
                        break;
                    }
                    let before = self.state.penalized_primary();
                    self.run(*body)?;
                    if self.state.penalized_primary() < before {
                        stale = 0;
                    } else {
                        stale += 1;
                        if stale >= stagnation_limit {
                            break;
                        }
                    }
                }
            }
            Node::For { n, body } => {
                let times = (*n).min(self.interpreter.config.loop_cap);
                for _ in 0..times {
                    if self.halt.is_some() {
                        break;
                    }
                    self.run(*body)?;
                }
            }
            Node::Constructive(op) => {
                self.action(OperatorFamily::Constructive, op, OpParams::default())?;
            }
            Node::LocalSearch { op, max_iter } => {
                let params = OpParams {
                    max_iter: *max_iter,
                    intensity: None,
                };
                self.action(OperatorFamily::LocalSearch, op, params)?;
            }
            Node::Perturbation { op, intensity } => {
                let params = OpParams {
                    max_iter: None,
                    intensity: *intensity,
                };
                self.action(OperatorFamily::Perturbation, op, params)?;
            }
            Node::Repair(Some(op)) => {
                self.action(OperatorFamily::Repair, op, OpParams::default())?;
            }
            Node::Repair(None) => {
                let registry = self.interpreter.registry;
                match registry.default_repair() {
                    Some((key, descriptor)) => self.invoke(key, descriptor, OpParams::default()),
                    // Identity.
                    None => self.last_improved = false,
                }
            }
            // A bare condition in action position leaves the state untouched.
            Node::Improves | Node::Feasible | Node::StagnationCount(_) | Node::TimeLimit(_) => {}
        }
        Ok(())
    }

    fn condition(&self, id: NodeId) -> bool {
        match self.arena.node(id) {
            Node::Improves => self.last_improved,
            Node::Feasible => self.state.is_feasible(),
            Node::StagnationCount(k) => self.since_best >= *k,
            Node::TimeLimit(ms) => self.start.elapsed().as_millis() > u128::from(*ms),
            _ => false,
        }
    }

    fn action(
        &mut self,
        family: OperatorFamily,
        name: &str,
        params: OpParams,
    ) -> Result<(), InterpretError> {
        let registry = self.interpreter.registry;
        let descriptor =
            registry
                .get(family, name)
                .ok_or_else(|| InterpretError::UnknownOperator {
                    family,
                    name: name.to_string(),
                })?;
        self.invoke(name, descriptor, params);
        Ok(())
    }

    fn invoke(&mut self, name: &str, descriptor: &OperatorDescriptor, params: OpParams) {
        let mut op_rng = child_rng(self.rng);
        self.budget.record();
        self.actions += 1;

        match descriptor.apply(self.problem, &self.state, &params, &mut op_rng) {
            Ok(next) => {
                let before = self.state.penalized_primary();
                let after = next.penalized_primary();
                self.last_improved = after < before;
                if self.last_improved {
                    self.improvements += 1;
                }
                if !descriptor.may_return_infeasible()
                    && self.state.is_feasible()
                    && !next.is_feasible()
                {
                    tracing::warn!(op = name, "operator returned an undeclared infeasible state");
                    self.infeasible_breaches += 1;
                }
                if after < self.best_primary {
                    self.best_primary = after;
                    self.since_best = 0;
                } else {
                    self.since_best = self.since_best.saturating_add(1);
                }
                tracing::trace!(
                    op = name,
                    primary = next.primary(),
                    feasible = next.is_feasible(),
                    improved = self.last_improved,
                    "action"
                );
                self.state = next;
            }
            Err(fault) => {
                tracing::warn!(op = name, cause = %fault, "operator failed");
                self.last_improved = false;
                self.fault = Some(InterpretError::OperatorFailed {
                    name: name.to_string(),
                    cause: fault.to_string(),
                });
                self.halt = Some(StopCause::OperatorFailed);
                return;
            }
        }

        if self.actions >= self.interpreter.config.max_actions {
            self.halt = Some(StopCause::ActionLimit);
        } else if let Some(cause) = self.budget.exhausted() {
            self.halt = Some(cause);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{SizeCaps, TreeBuilder};
    use crate::problem::{Assignment, ProblemFamily};
    use crate::random::create_rng;
    use crate::registry::{OperatorDescriptor, OperatorFault};

    type OpResult = Result<Solution, OperatorFault>;

    fn all_zero(p: &Problem, _: &Solution, _: &OpParams, _: &mut GaaRng) -> OpResult {
        let n = p.graph().map_or(0, |g| g.num_vertices());
        Ok(Solution::new(p, Assignment::Coloring(vec![Some(0); n])))
    }

    fn proper(p: &Problem, _: &Solution, _: &OpParams, _: &mut GaaRng) -> OpResult {
        let n = p.graph().map_or(0, |g| g.num_vertices());
        Ok(Solution::new(p, Assignment::Coloring((0..n).map(Some).collect())))
    }

    fn noop(_: &Problem, s: &Solution, _: &OpParams, _: &mut GaaRng) -> OpResult {
        Ok(s.clone())
    }

    fn broken(_: &Problem, _: &Solution, _: &OpParams, _: &mut GaaRng) -> OpResult {
        Err(OperatorFault::new("boom"))
    }

    fn slow(_: &Problem, s: &Solution, _: &OpParams, _: &mut GaaRng) -> OpResult {
        std::thread::sleep(std::time::Duration::from_millis(5));
        Ok(s.clone())
    }

    fn registry(with_repair: bool) -> OperatorRegistry {
        let mut b = OperatorRegistry::builder(ProblemFamily::GraphColoring);
        b.register(
            OperatorFamily::Constructive,
            "all_zero",
            OperatorDescriptor::new(all_zero).with_infeasible_output(true),
        )
        .unwrap()
        .register(OperatorFamily::Constructive, "proper", OperatorDescriptor::new(proper))
        .unwrap()
        .register(OperatorFamily::LocalSearch, "noop", OperatorDescriptor::new(noop))
        .unwrap()
        .register(
            OperatorFamily::Perturbation,
            "broken",
            OperatorDescriptor::new(broken),
        )
        .unwrap()
        .register(OperatorFamily::LocalSearch, "slow", OperatorDescriptor::new(slow))
        .unwrap()
        // Both return the all_zero coloring; only shatter declares it infeasible.
        .register(OperatorFamily::LocalSearch, "collapse", OperatorDescriptor::new(all_zero))
        .unwrap()
        .register(
            OperatorFamily::Perturbation,
            "shatter",
            OperatorDescriptor::new(all_zero)
                .with_infeasible_output(true)
                .with_stochastic(true),
        )
        .unwrap();
        if with_repair {
            b.register(OperatorFamily::Repair, "proper", OperatorDescriptor::new(proper))
                .unwrap()
                .default_repair("proper");
        }
        b.build().unwrap()
    }

    fn path3() -> Problem {
        Problem::graph_coloring("p3", 3, &[(0, 1), (1, 2)]).unwrap()
    }

    fn program(b: TreeBuilder, root: NodeId) -> AlgorithmProgram {
        AlgorithmProgram::new(
            b.build(root),
            ProblemFamily::GraphColoring,
            0,
            SizeCaps {
                max_depth: 10,
                max_size: 100,
            },
        )
        .unwrap()
    }

    fn run_with(
        reg: &OperatorRegistry,
        config: InterpreterConfig,
        p: &AlgorithmProgram,
        budget: &mut Budget,
    ) -> Result<Interpretation, InterpretError> {
        let problem = path3();
        Interpreter::new(reg, config).interpret(
            p,
            &problem,
            Solution::empty(&problem),
            budget,
            &mut create_rng(42),
        )
    }

    fn run(reg: &OperatorRegistry, p: &AlgorithmProgram) -> Interpretation {
        run_with(reg, InterpreterConfig::default(), p, &mut Budget::unlimited()).unwrap()
    }

    // ---- Control flow ----

    #[test]
    fn test_for_runs_exactly_n_times() {
        let reg = registry(false);
        let mut b = TreeBuilder::new();
        let c = b.constructive("all_zero");
        let ls = b.local_search("noop", None);
        let f = b.for_loop(3, ls);
        let root = b.seq(vec![c, f]);
        let out = run(&reg, &program(b, root));
        assert_eq!(out.trace.actions, 4);
        assert_eq!(out.trace.stop, StopCause::Completed);
    }

    #[test]
    fn test_for_respects_loop_cap() {
        let reg = registry(false);
        let mut b = TreeBuilder::new();
        let ls = b.local_search("noop", None);
        let f = b.for_loop(50, ls);
        let config = InterpreterConfig::default().with_loop_cap(7);
        let out = run_with(&reg, config, &program(b, f), &mut Budget::unlimited()).unwrap();
        assert_eq!(out.trace.actions, 7);
    }

    #[test]
    fn test_while_stops_on_stagnation() {
        let reg = registry(false);
        let mut b = TreeBuilder::new();
        let c = b.constructive("all_zero");
        let cond = b.stagnation_count(0);
        let ls = b.local_search("noop", None);
        let w = b.while_loop(cond, ls, 100);
        let root = b.seq(vec![c, w]);
        let out = run(&reg, &program(b, root));
        // 1 constructor + stagnation_limit (10) idle iterations
        assert_eq!(out.trace.actions, 11);
    }

    #[test]
    fn test_while_capped_by_loop_cap() {
        let reg = registry(false);
        let mut b = TreeBuilder::new();
        let cond = b.stagnation_count(0);
        let ls = b.local_search("noop", None);
        let w = b.while_loop(cond, ls, 100);
        let config = InterpreterConfig::default()
            .with_loop_cap(5)
            .with_stagnation_limit(50);
        let out = run_with(&reg, config, &program(b, w), &mut Budget::unlimited()).unwrap();
        assert_eq!(out.trace.actions, 5);
    }

    #[test]
    fn test_while_false_condition_skips_body() {
        let reg = registry(false);
        let mut b = TreeBuilder::new();
        let c = b.constructive("all_zero");
        let cond = b.feasible();
        let ls = b.local_search("noop", None);
        let w = b.while_loop(cond, ls, 10);
        let root = b.seq(vec![c, w]);
        let out = run(&reg, &program(b, root));
        assert_eq!(out.trace.actions, 1);
        assert!(!out.final_state.is_feasible());
        assert!(!out.trace.final_violations.is_empty());
    }

    #[test]
    fn test_if_without_else_is_identity() {
        let reg = registry(false);
        let mut b = TreeBuilder::new();
        let c = b.constructive("all_zero");
        let cond = b.feasible();
        let ls = b.local_search("noop", None);
        let branch = b.if_then(cond, ls);
        let root = b.seq(vec![c, branch]);
        let out = run(&reg, &program(b, root));
        assert_eq!(out.trace.actions, 1);
    }

    // ---- Conditions ----

    #[test]
    fn test_improves_reflects_last_action() {
        let reg = registry(false);
        // proper improves on the empty coloring, noop does not.
        let mut b = TreeBuilder::new();
        let c = b.constructive("proper");
        let cond = b.improves();
        let ls = b.local_search("noop", None);
        let w = b.while_loop(cond, ls, 10);
        let root = b.seq(vec![c, w]);
        let out = run(&reg, &program(b, root));
        assert_eq!(out.trace.actions, 2);
        assert_eq!(out.trace.improvements, 1);
    }

    #[test]
    fn test_stagnation_count_threshold() {
        let reg = registry(false);
        let build = |idle: usize| {
            let mut b = TreeBuilder::new();
            let mut children = vec![b.constructive("all_zero")];
            for _ in 0..idle {
                children.push(b.local_search("noop", None));
            }
            let cond = b.stagnation_count(2);
            let ls = b.local_search("noop", None);
            children.push(b.if_then(cond, ls));
            let root = b.seq(children);
            program(b, root)
        };
        assert_eq!(run(&reg, &build(1)).trace.actions, 2);
        assert_eq!(run(&reg, &build(2)).trace.actions, 4);
    }

    #[test]
    fn test_time_limit_not_reached() {
        let reg = registry(false);
        let mut b = TreeBuilder::new();
        let cond = b.time_limit(u64::MAX);
        let ls = b.local_search("noop", None);
        let branch = b.if_then(cond, ls);
        let out = run(&reg, &program(b, branch));
        assert_eq!(out.trace.actions, 0);
    }

    #[test]
    fn test_time_limit_reached() {
        let reg = registry(false);
        let mut b = TreeBuilder::new();
        let wait = b.local_search("slow", None);
        let cond = b.time_limit(1);
        let ls = b.local_search("noop", None);
        let branch = b.if_then(cond, ls);
        let root = b.seq(vec![wait, branch]);
        let out = run(&reg, &program(b, root));
        assert_eq!(out.trace.actions, 2);
        assert_eq!(out.trace.stop, StopCause::Completed);
    }

    // ---- Descriptor flags ----

    #[test]
    fn test_undeclared_infeasibility_is_counted() {
        let reg = registry(false);
        let build = |breaker: &str| {
            let mut b = TreeBuilder::new();
            let c = b.constructive("proper");
            let x = if breaker == "collapse" {
                b.local_search(breaker, None)
            } else {
                b.perturbation(breaker, None)
            };
            let root = b.seq(vec![c, x]);
            program(b, root)
        };

        let undeclared = run(&reg, &build("collapse"));
        assert!(!undeclared.final_state.is_feasible());
        assert_eq!(undeclared.trace.infeasible_breaches, 1);

        let declared = run(&reg, &build("shatter"));
        assert!(!declared.final_state.is_feasible());
        assert_eq!(declared.trace.infeasible_breaches, 0);
    }

    #[test]
    fn test_determinism_follows_descriptors() {
        let reg = registry(true);
        let interp = Interpreter::new(&reg, InterpreterConfig::default());

        let mut b = TreeBuilder::new();
        let c = b.constructive("proper");
        let r = b.repair(None);
        let root = b.seq(vec![c, r]);
        assert!(interp.is_deterministic(&program(b, root)));

        let mut b = TreeBuilder::new();
        let c = b.constructive("proper");
        let p = b.perturbation("shatter", None);
        let root = b.seq(vec![c, p]);
        assert!(!interp.is_deterministic(&program(b, root)));

        let mut b = TreeBuilder::new();
        let cond = b.time_limit(10);
        let ls = b.local_search("noop", None);
        let root = b.if_then(cond, ls);
        assert!(!interp.is_deterministic(&program(b, root)));
    }

    // ---- Repair ----

    #[test]
    fn test_default_repair_restores_feasibility() {
        let reg = registry(true);
        let mut b = TreeBuilder::new();
        let c = b.constructive("all_zero");
        let r = b.repair(None);
        let root = b.seq(vec![c, r]);
        let out = run(&reg, &program(b, root));
        assert!(out.final_state.is_feasible());
        // all_zero uses one color but conflicts, which is no better than empty.
        assert_eq!(out.trace.improvements, 1);
        assert!(out.trace.final_violations.is_empty());
    }

    #[test]
    fn test_missing_default_repair_is_identity() {
        let reg = registry(false);
        let mut b = TreeBuilder::new();
        let c = b.constructive("all_zero");
        let r = b.repair(None);
        let root = b.seq(vec![c, r]);
        let out = run(&reg, &program(b, root));
        assert_eq!(out.trace.actions, 1);
    }

    // ---- Failures and budgets ----

    #[test]
    fn test_operator_fault_keeps_last_good_state() {
        let reg = registry(false);
        let mut b = TreeBuilder::new();
        let c = b.constructive("all_zero");
        let p = b.perturbation("broken", None);
        let ls = b.local_search("noop", None);
        let root = b.seq(vec![c, p, ls]);
        let out = run(&reg, &program(b, root));
        assert_eq!(out.trace.stop, StopCause::OperatorFailed);
        assert_eq!(out.trace.actions, 2);
        assert_eq!(
            out.trace.fault,
            Some(InterpretError::OperatorFailed {
                name: "broken".into(),
                cause: "boom".into()
            })
        );
        assert_eq!(out.final_state.primary(), 1.0);
    }

    #[test]
    fn test_unknown_operator_is_an_error() {
        let reg = registry(false);
        let mut b = TreeBuilder::new();
        let ls = b.local_search("missing", None);
        let err = run_with(
            &reg,
            InterpreterConfig::default(),
            &program(b, ls),
            &mut Budget::unlimited(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            InterpretError::UnknownOperator {
                family: OperatorFamily::LocalSearch,
                name: "missing".into()
            }
        );
    }

    #[test]
    fn test_evaluation_budget_short_circuits_loops() {
        let reg = registry(false);
        let mut b = TreeBuilder::new();
        let ls = b.local_search("noop", None);
        let f = b.for_loop(10, ls);
        let mut budget = Budget::unlimited().with_max_evaluations(3);
        let out = run_with(&reg, InterpreterConfig::default(), &program(b, f), &mut budget)
            .unwrap();
        assert_eq!(out.trace.actions, 3);
        assert_eq!(out.trace.stop, StopCause::EvaluationBudget);
        assert_eq!(budget.evaluations(), 3);
    }

    #[test]
    fn test_exhausted_budget_runs_nothing() {
        let reg = registry(false);
        let mut b = TreeBuilder::new();
        let c = b.constructive("all_zero");
        let mut budget = Budget::unlimited().with_deadline(Instant::now());
        let out = run_with(&reg, InterpreterConfig::default(), &program(b, c), &mut budget)
            .unwrap();
        assert_eq!(out.trace.actions, 0);
        assert_eq!(out.trace.stop, StopCause::Deadline);
    }

    #[test]
    fn test_action_limit() {
        let reg = registry(false);
        let mut b = TreeBuilder::new();
        let ls = b.local_search("noop", None);
        let f = b.for_loop(10, ls);
        let config = InterpreterConfig::default().with_max_actions(4);
        let out = run_with(&reg, config, &program(b, f), &mut Budget::unlimited()).unwrap();
        assert_eq!(out.trace.actions, 4);
        assert_eq!(out.trace.stop, StopCause::ActionLimit);
    }

    // ---- Reference operators ----

    #[test]
    fn test_stock_registry_is_deterministic() {
        let reg = crate::domains::registry_for(ProblemFamily::GraphColoring).unwrap();
        let problem =
            Problem::graph_coloring("c5", 5, &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 0)]).unwrap();
        let mut b = TreeBuilder::new();
        let c = b.constructive("random_greedy");
        let p = b.perturbation("random_recolor", Some(0.4));
        let ls = b.local_search("min_conflicts", Some(20));
        let body = b.seq(vec![p, ls]);
        let f = b.for_loop(3, body);
        let root = b.seq(vec![c, f]);
        let prog = program(b, root);
        let interp = Interpreter::new(&reg, InterpreterConfig::default());
        let go = || {
            interp
                .interpret(
                    &prog,
                    &problem,
                    Solution::empty(&problem),
                    &mut Budget::unlimited(),
                    &mut create_rng(7),
                )
                .unwrap()
        };
        let (a, b) = (go(), go());
        assert_eq!(a.final_state, b.final_state);
        assert_eq!(a.trace.actions, 7);
    }
}

//! Interpreter configuration, budgets and traces.

use crate::problem::{Solution, Violation};
use crate::registry::OperatorFamily;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Configuration for [`super::Interpreter`].
#[derive(Debug, Clone, PartialEq)]
pub struct InterpreterConfig {
    /// Upper bound on the iterations of any `While` or `For`.
    pub loop_cap: u32,

    /// A `While` stops after this many consecutive iterations without a
    /// strict improvement of the (penalized) primary objective.
    pub stagnation_limit: u32,

    /// Operator invocations allowed in one interpretation.
    pub max_actions: u64,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            loop_cap: 20,
            stagnation_limit: 10,
            max_actions: 10_000,
        }
    }
}

impl InterpreterConfig {
    pub fn with_loop_cap(mut self, cap: u32) -> Self {
        self.loop_cap = cap;
        self
    }

    pub fn with_stagnation_limit(mut self, n: u32) -> Self {
        self.stagnation_limit = n;
        self
    }

    pub fn with_max_actions(mut self, n: u64) -> Self {
        self.max_actions = n;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.loop_cap == 0 {
            return Err("loop_cap must be positive".into());
        }
        if self.stagnation_limit == 0 {
            return Err("stagnation_limit must be positive".into());
        }
        if self.max_actions == 0 {
            return Err("max_actions must be positive".into());
        }
        Ok(())
    }
}

/// Why an interpretation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopCause {
    /// The tree ran to the end.
    Completed,
    /// The per-interpretation action cap was reached.
    ActionLimit,
    /// The shared evaluation budget ran out.
    EvaluationBudget,
    /// The shared wall-clock deadline passed.
    Deadline,
    /// An operator faulted; the last good state was kept.
    OperatorFailed,
}

/// Shared run budget, owned by the caller and lent to each interpretation.
///
/// Exhaustion is not an error: the running action completes, enclosing
/// loops short-circuit and the partial state is returned.
#[derive(Debug, Clone, Default)]
pub struct Budget {
    evaluations: u64,
    max_evaluations: Option<u64>,
    deadline: Option<Instant>,
}

impl Budget {
    /// A budget with no evaluation cap and no deadline.
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn with_max_evaluations(mut self, n: u64) -> Self {
        self.max_evaluations = Some(n);
        self
    }

    pub fn with_deadline(mut self, at: Instant) -> Self {
        self.deadline = Some(at);
        self
    }

    pub fn with_time_limit(self, limit: Duration) -> Self {
        self.with_deadline(Instant::now() + limit)
    }

    /// Operator invocations recorded so far.
    pub fn evaluations(&self) -> u64 {
        self.evaluations
    }

    pub(crate) fn record(&mut self) {
        self.evaluations += 1;
    }

    /// The exhausted budget, if any.
    pub fn exhausted(&self) -> Option<StopCause> {
        if self.max_evaluations.is_some_and(|m| self.evaluations >= m) {
            return Some(StopCause::EvaluationBudget);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Some(StopCause::Deadline);
        }
        None
    }
}

/// Interpretation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum InterpretError {
    /// A key missing from the registry; validation should have caught it.
    #[error("unknown {family} operator '{name}'")]
    UnknownOperator { family: OperatorFamily, name: String },
    #[error("operator '{name}' failed: {cause}")]
    OperatorFailed { name: String, cause: String },
}

/// Execution summary of one interpretation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecTrace {
    /// Operator invocations, including a faulting one.
    pub actions: u64,
    /// Actions that strictly improved the penalized primary.
    pub improvements: u64,
    /// Actions that broke feasibility without declaring
    /// `may_return_infeasible`.
    #[serde(default)]
    pub infeasible_breaches: u64,
    pub stop: StopCause,
    /// The contained operator fault, if any.
    pub fault: Option<InterpretError>,
    /// Violations of the final state (empty when feasible).
    pub final_violations: Vec<Violation>,
    pub elapsed_ms: f64,
}

/// Result of interpreting a program on one instance.
#[derive(Debug, Clone)]
pub struct Interpretation {
    /// State after the last executed action; this is what the program returns.
    pub final_state: Solution,
    pub trace: ExecTrace,
}

//! Run records and per-instance metrics.

use super::config::GaaConfig;
use crate::ast::SerializedProgram;
use crate::eval::{Evaluation, Fitness, InstanceOutcome, BKS_EPS};
use crate::interp::StopCause;
use crate::problem::{BestKnown, ProblemFamily, Violation};
use crate::search::{ConvergenceTrace, Termination};
use serde::{Deserialize, Serialize};

/// Relative gap of `(primary, secondary)` to a best-known value.
///
/// `(primary - bks) / |bks|`, negative when the BKS is beaten. On count
/// axes (colors, vehicles) a worse primary is `+∞`. When the primaries
/// match, the gap falls through to the secondary BKS if one is given and
/// is `0` otherwise. A zero BKS primary yields `None`.
///
/// # Examples
///
/// ```
/// use u_gaa::harness::gap;
/// use u_gaa::problem::{BestKnown, ProblemFamily};
///
/// let bks = BestKnown::primary(-12.0);
/// assert_eq!(gap(ProblemFamily::Knapsack, -12.0, 0.0, &bks), Some(0.0));
/// assert_eq!(gap(ProblemFamily::Knapsack, -13.0, 0.0, &bks), Some(-1.0 / 12.0));
/// assert_eq!(
///     gap(ProblemFamily::GraphColoring, 4.0, 0.0, &BestKnown::primary(3.0)),
///     Some(f64::INFINITY)
/// );
/// ```
pub fn gap(family: ProblemFamily, primary: f64, secondary: f64, bks: &BestKnown) -> Option<f64> {
    if bks.primary.abs() <= BKS_EPS || !bks.primary.is_finite() {
        return None;
    }
    let diff = primary - bks.primary;
    if diff.abs() <= BKS_EPS {
        return Some(match bks.secondary {
            Some(s) if s.abs() > BKS_EPS => (secondary - s) / s.abs(),
            _ => 0.0,
        });
    }
    if diff > 0.0 && family.primary_is_count() {
        return Some(f64::INFINITY);
    }
    Some(diff / bks.primary.abs())
}

/// Final metrics of the best program on one training instance.
///
/// Objective values come from the final state of the best replica;
/// infeasible final states have an infinite gap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceMetrics {
    pub instance_id: String,
    pub primary: f64,
    pub secondary: f64,
    pub feasible: bool,
    pub violations: Vec<Violation>,
    pub best_known: Option<BestKnown>,
    /// `None` without a usable BKS. Serialized as `null` when infinite.
    pub gap: Option<f64>,
    pub replicas: usize,
    pub feasible_replicas: usize,
    pub faults: usize,
    /// Undeclared feasibility breaches summed over replicas.
    #[serde(default)]
    pub infeasible_breaches: u64,
    pub mean_actions: f64,
    /// Stop cause of the best replica.
    pub stop: StopCause,
}

impl InstanceMetrics {
    /// Groups an evaluation's outcomes by instance.
    pub fn from_evaluation(family: ProblemFamily, evaluation: &Evaluation) -> Vec<Self> {
        let mut metrics = Vec::new();
        let outcomes = &evaluation.outcomes;
        let mut start = 0;
        while start < outcomes.len() {
            let id = &outcomes[start].instance_id;
            let end = outcomes[start..]
                .iter()
                .position(|o| &o.instance_id != id)
                .map_or(outcomes.len(), |n| start + n);
            metrics.extend(Self::from_replicas(family, &outcomes[start..end]));
            start = end;
        }
        metrics
    }

    fn from_replicas(family: ProblemFamily, replicas: &[InstanceOutcome]) -> Option<Self> {
        let best = replicas.iter().reduce(|a, b| {
            if b.final_state.is_better_than(&a.final_state) {
                b
            } else {
                a
            }
        })?;
        let state = &best.final_state;
        let instance_gap = best.best_known.and_then(|bks| {
            if state.is_feasible() {
                gap(family, state.primary(), state.secondary(), &bks)
            } else {
                Some(f64::INFINITY)
            }
        });
        Some(Self {
            instance_id: best.instance_id.clone(),
            primary: state.primary(),
            secondary: state.secondary(),
            feasible: state.is_feasible(),
            violations: state.violations().to_vec(),
            best_known: best.best_known,
            gap: instance_gap,
            replicas: replicas.len(),
            feasible_replicas: replicas.iter().filter(|o| o.feasible()).count(),
            faults: replicas.iter().filter(|o| o.fault.is_some()).count(),
            infeasible_breaches: replicas.iter().map(|o| o.infeasible_breaches).sum(),
            mean_actions: replicas.iter().map(|o| o.actions as f64).sum::<f64>()
                / replicas.len() as f64,
            stop: best.stop,
        })
    }
}

/// Everything a run produced, in one self-describing record.
#[derive(Debug, Clone, Serialize)]
pub struct RunRecord {
    pub seed: u64,
    pub config: GaaConfig,
    /// Milliseconds since the Unix epoch.
    pub started_at_ms: u64,
    pub elapsed_ms: f64,
    pub family: ProblemFamily,
    pub termination: Termination,
    pub iterations: u64,
    pub candidates_evaluated: u64,
    pub accepted_moves: u64,
    pub restarts: u64,
    pub operator_calls: u64,
    pub best_fitness: Fitness,
    pub best_pseudocode: String,
    pub best_program: SerializedProgram,
    pub trace: ConvergenceTrace,
    pub metrics: Vec<InstanceMetrics>,
}

impl RunRecord {
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deterministic identity of the run: trace fingerprint plus the
    /// final program.
    pub fn fingerprint(&self) -> String {
        format!("{}\n{}", self.trace.fingerprint(), self.best_pseudocode)
    }

    pub fn metrics_for(&self, instance_id: &str) -> Option<&InstanceMetrics> {
        self.metrics.iter().find(|m| m.instance_id == instance_id)
    }
}

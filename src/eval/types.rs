//! Training sets and evaluation outcomes.

use super::fitness::Fitness;
use crate::interp::{InterpretError, StopCause};
use crate::problem::{BestKnown, BestKnownTable, Problem, ProblemFamily, Solution};
use thiserror::Error;

/// Tolerance used when comparing a primary objective with a best-known value.
pub const BKS_EPS: f64 = 1e-9;

/// Errors raised while assembling a training set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrainingSetError {
    #[error("training set is empty")]
    Empty,
    #[error("instance '{instance}' is {found}, expected {expected}")]
    MixedFamilies {
        instance: String,
        expected: ProblemFamily,
        found: ProblemFamily,
    },
    #[error("duplicate instance id '{0}'")]
    DuplicateInstance(String),
}

/// Instances of one problem family, ordered by `instance_id`.
///
/// The fixed order makes mean fitness reproducible.
#[derive(Debug, Clone)]
pub struct TrainingSet {
    family: ProblemFamily,
    instances: Vec<Problem>,
}

impl TrainingSet {
    pub fn new(mut instances: Vec<Problem>) -> Result<Self, TrainingSetError> {
        let family = instances
            .first()
            .map(Problem::family)
            .ok_or(TrainingSetError::Empty)?;
        if let Some(p) = instances.iter().find(|p| p.family() != family) {
            return Err(TrainingSetError::MixedFamilies {
                instance: p.instance_id().to_string(),
                expected: family,
                found: p.family(),
            });
        }
        instances.sort_by(|a, b| a.instance_id().cmp(b.instance_id()));
        if let Some(w) = instances
            .windows(2)
            .find(|w| w[0].instance_id() == w[1].instance_id())
        {
            return Err(TrainingSetError::DuplicateInstance(
                w[0].instance_id().to_string(),
            ));
        }
        Ok(Self { family, instances })
    }

    /// Attaches best-known values from `table` to instances that have none.
    pub fn with_best_known(mut self, table: &BestKnownTable) -> Self {
        for p in &mut self.instances {
            if p.best_known().is_none() {
                if let Some(best) = table.get(p.family(), p.instance_id()) {
                    *p = p.clone().with_best_known(best);
                }
            }
        }
        self
    }

    pub fn family(&self) -> ProblemFamily {
        self.family
    }

    pub fn instances(&self) -> &[Problem] {
        &self.instances
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn get(&self, instance_id: &str) -> Option<&Problem> {
        self.instances
            .binary_search_by(|p| p.instance_id().cmp(instance_id))
            .ok()
            .map(|i| &self.instances[i])
    }

    /// Whether every instance carries a best-known value.
    pub fn fully_referenced(&self) -> bool {
        self.instances.iter().all(|p| p.best_known().is_some())
    }
}

/// Result of one replica on one instance.
#[derive(Debug, Clone)]
pub struct InstanceOutcome {
    pub instance_id: String,
    pub replica: usize,
    /// Seed of the interpretation RNG.
    pub seed: u64,
    /// State the program returned; this is what is scored.
    pub final_state: Solution,
    pub best_known: Option<BestKnown>,
    pub actions: u64,
    /// Actions that broke feasibility without declaring it.
    pub infeasible_breaches: u64,
    pub elapsed_ms: f64,
    pub stop: StopCause,
    pub fault: Option<InterpretError>,
}

impl InstanceOutcome {
    pub fn feasible(&self) -> bool {
        self.final_state.is_feasible()
    }

    pub fn primary(&self) -> f64 {
        self.final_state.primary()
    }

    pub fn secondary(&self) -> f64 {
        self.final_state.secondary()
    }

    /// Feasible and at least as good as the best-known primary.
    pub fn reaches_best_known(&self) -> bool {
        self.best_known
            .is_some_and(|b| self.feasible() && self.primary() <= b.primary + BKS_EPS)
    }
}

/// Aggregated result of evaluating one program on a training set.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub fitness: Fitness,
    /// Ordered by instance id, then replica.
    pub outcomes: Vec<InstanceOutcome>,
    /// Replicas whose interpretation hit an operator fault.
    pub faults: usize,
}

impl Evaluation {
    /// Every replica faulted, so the fitness is the worst sentinel.
    pub fn all_faulted(&self) -> bool {
        !self.outcomes.is_empty() && self.faults == self.outcomes.len()
    }

    /// Every instance has a best-known value and every replica reached it.
    pub fn reaches_best_known(&self) -> bool {
        !self.outcomes.is_empty() && self.outcomes.iter().all(InstanceOutcome::reaches_best_known)
    }

    /// Fraction of replicas whose final state is feasible.
    pub fn feasible_ratio(&self) -> f64 {
        if self.outcomes.is_empty() {
            return 0.0;
        }
        let feasible = self.outcomes.iter().filter(|o| o.feasible()).count();
        feasible as f64 / self.outcomes.len() as f64
    }
}

//! Program evaluation.
//!
//! A program is interpreted on every instance of a [`TrainingSet`] with
//! one or more replica seeds. The per-replica final states are averaged
//! into a hierarchical [`Fitness`]:
//!
//! - primary: penalized primary objective (colors, negated value, vehicles)
//! - secondary: conflicts, slack or distance
//! - tertiary: the [`CostSignal`], operator invocations by default

mod fitness;
mod runner;
mod types;

pub use fitness::{CostSignal, Fitness};
pub use runner::Evaluator;
pub use types::{Evaluation, InstanceOutcome, TrainingSet, TrainingSetError, BKS_EPS};

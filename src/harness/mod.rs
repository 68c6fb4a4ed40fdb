//! Run harness.
//!
//! Loads a flat [`GaaConfig`], builds the training set, drives one
//! seeded search and packs the outcome into a [`RunRecord`]: the config
//! snapshot, the convergence trace, the best program (pseudocode and
//! serialized form) and per-instance metrics with the gap to the
//! best-known solution.

mod config;
mod record;
mod runner;

pub use config::{ConfigError, GaaConfig};
pub use record::{gap, InstanceMetrics, RunRecord};
pub use runner::{run, run_seeds, run_with_cancel, RunError};

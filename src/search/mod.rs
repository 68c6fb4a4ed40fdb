//! Outer search over program space.
//!
//! A trajectory search with an elite archive: the incumbent program is
//! mutated (or crossed with an elite), legalized against the grammar,
//! evaluated on the training set and accepted greedily or under the
//! Metropolis rule. Stagnation triggers a restart from a fresh draw.
//!
//! The whole run is a function of the configuration, the training set and
//! the seed; a [`ConvergenceTrace`] fingerprint identifies the trajectory.

mod config;
mod crossover;
mod mutation;
mod population;
mod runner;
mod trace;

pub use config::{Acceptance, SearchConfig};
pub use crossover::crossover;
pub use mutation::{legalize, mutate, Mutation};
pub use population::{Member, Population};
pub use runner::{SearchError, SearchResult, SearchRunner, Termination};
pub use trace::{ConvergencePoint, ConvergenceTrace};

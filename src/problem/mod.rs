//! Problem instances and solution state.
//!
//! - [`Problem`]: immutable instance data (graph, items, or customers)
//!   with an optional precomputed distance matrix and best-known values
//! - [`Solution`]: an [`Assignment`] together with its cached
//!   [`Objectives`] (feasibility, primary, secondary, violations)
//! - [`BestKnownTable`]: external reference values for gap reporting
//! - [`loaders`]: DIMACS, knapsack and Solomon text forms
//!
//! All objectives follow the minimization convention. Knapsack values are
//! negated when they enter the engine.

mod bks;
pub mod loaders;
mod solution;
mod types;

pub use bks::BestKnownTable;
pub use solution::{Assignment, Objectives, Solution, Violation, INFEASIBLE_PENALTY};
pub use types::{
    BestKnown, Customer, DistanceMatrix, Graph, Item, KnapsackData, Problem, ProblemData,
    ProblemError, ProblemFamily, RoutingData,
};

//! Generative Algorithm Architecture.
//!
//! Heuristics are represented as typed abstract syntax trees over a small
//! control grammar (sequence, branch, bounded loops) whose leaves invoke
//! problem-specific operators. An outer metaheuristic searches program
//! space for the tree that performs best on a training set.
//!
//! - **Grammar**: the type system and well-typedness rules of programs.
//! - **AST**: arena-allocated trees, structural edits, pseudocode and
//!   JSON serialization.
//! - **Registry**: named constructive, local-search, perturbation and
//!   repair operators of one problem family.
//! - **Generator**: random well-typed programs under depth and size caps.
//! - **Interpreter**: executes a program on one instance under budgets.
//! - **Evaluator**: mean hierarchical fitness over a training set.
//! - **Search**: mutation, crossover and greedy or Metropolis acceptance
//!   with an elite archive and restarts.
//! - **Harness**: flat configuration, seeded runs and run records.
//!
//! Reference problem families (graph coloring, 0/1 knapsack, VRPTW) live
//! in [`problem`] and [`domains`].
//!
//! # Architecture
//!
//! Everything inside one run is single-threaded and driven by one seed:
//! the same configuration, training set and seed reproduce the same
//! trajectory. Independent seeds may run in parallel with the `parallel`
//! feature.

pub mod ast;
pub mod domains;
pub mod eval;
pub mod generator;
pub mod grammar;
pub mod harness;
pub mod interp;
pub mod problem;
pub mod random;
pub mod registry;
pub mod search;

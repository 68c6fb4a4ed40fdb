//! Program interpreter.
//!
//! Walks an [`crate::ast::AlgorithmProgram`] against one problem instance,
//! threading a [`crate::problem::Solution`] through the registered operators.
//!
//! - `Seq` runs its children in order, `If` picks a branch on the current
//!   state, `While` and `For` are bounded by the loop cap
//! - `While` additionally stops after `stagnation_limit` iterations that
//!   did not lower the penalized primary objective
//! - budgets are checked after every action: the action completes, the
//!   enclosing loops unwind and the partial state is returned
//! - operator faults are contained on the [`ExecTrace`]

mod runner;
mod types;

pub use runner::Interpreter;
pub use types::{Budget, ExecTrace, InterpretError, Interpretation, InterpreterConfig, StopCause};

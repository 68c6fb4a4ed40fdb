//! Typed grammar of heuristic programs.
//!
//! Two value types exist: `Bool` (conditions) and `SolutionTransform`
//! (everything else). [`Grammar`] checks a tree against the typing rules,
//! the constructor-first convention and the [`GrammarLimits`].

mod config;
mod rules;
mod types;

pub use config::{GrammarLimits, Param};
pub use rules::{numeric_params, Grammar, GrammarError};
pub use types::{Arity, NodeKind, ValueType};

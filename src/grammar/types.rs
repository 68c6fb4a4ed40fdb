//! Node kinds, the two-type universe, and arity signatures.

use crate::ast::Slot;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The value type a node produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// A condition evaluated against the current state.
    Bool,
    /// Consumes a solution state and produces the next one.
    SolutionTransform,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Bool => f.write_str("Bool"),
            ValueType::SolutionTransform => f.write_str("SolutionTransform"),
        }
    }
}

/// The closed set of node kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Seq,
    If,
    While,
    For,
    Improves,
    Feasible,
    StagnationCount,
    TimeLimit,
    Constructive,
    LocalSearch,
    Perturbation,
    Repair,
}

/// Child-count bounds of a node kind. `max = None` means bounded only by
/// [`super::GrammarLimits::max_seq_len`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    pub min: usize,
    pub max: Option<usize>,
}

impl NodeKind {
    pub const ALL: [NodeKind; 12] = [
        NodeKind::Seq,
        NodeKind::If,
        NodeKind::While,
        NodeKind::For,
        NodeKind::Improves,
        NodeKind::Feasible,
        NodeKind::StagnationCount,
        NodeKind::TimeLimit,
        NodeKind::Constructive,
        NodeKind::LocalSearch,
        NodeKind::Perturbation,
        NodeKind::Repair,
    ];

    pub const CONDITIONS: [NodeKind; 4] = [
        NodeKind::Improves,
        NodeKind::Feasible,
        NodeKind::StagnationCount,
        NodeKind::TimeLimit,
    ];

    /// The type this kind produces.
    pub fn output_type(self) -> ValueType {
        if self.is_condition() {
            ValueType::Bool
        } else {
            ValueType::SolutionTransform
        }
    }

    pub fn is_condition(self) -> bool {
        matches!(
            self,
            NodeKind::Improves
                | NodeKind::Feasible
                | NodeKind::StagnationCount
                | NodeKind::TimeLimit
        )
    }

    pub fn is_action(self) -> bool {
        matches!(
            self,
            NodeKind::Constructive
                | NodeKind::LocalSearch
                | NodeKind::Perturbation
                | NodeKind::Repair
        )
    }

    pub fn is_control(self) -> bool {
        matches!(
            self,
            NodeKind::Seq | NodeKind::If | NodeKind::While | NodeKind::For
        )
    }

    /// Child-count signature.
    pub fn arity(self) -> Arity {
        match self {
            NodeKind::Seq => Arity { min: 1, max: None },
            NodeKind::If => Arity {
                min: 2,
                max: Some(3),
            },
            NodeKind::While => Arity {
                min: 2,
                max: Some(2),
            },
            NodeKind::For => Arity {
                min: 1,
                max: Some(1),
            },
            _ => Arity {
                min: 0,
                max: Some(0),
            },
        }
    }

    /// The type a child in `slot` must produce, or `None` if this kind has
    /// no such slot.
    pub fn slot_type(self, slot: Slot) -> Option<ValueType> {
        match (self, slot) {
            (NodeKind::Seq, Slot::Child(_)) => Some(ValueType::SolutionTransform),
            (NodeKind::If, Slot::Cond) | (NodeKind::While, Slot::Cond) => Some(ValueType::Bool),
            (NodeKind::If, Slot::Then) | (NodeKind::If, Slot::Else) => {
                Some(ValueType::SolutionTransform)
            }
            (NodeKind::While, Slot::Body) | (NodeKind::For, Slot::Body) => {
                Some(ValueType::SolutionTransform)
            }
            _ => None,
        }
    }

    /// Lower-case name used in serialized programs and pseudocode.
    pub fn name(self) -> &'static str {
        match self {
            NodeKind::Seq => "seq",
            NodeKind::If => "if",
            NodeKind::While => "while",
            NodeKind::For => "for",
            NodeKind::Improves => "improves",
            NodeKind::Feasible => "feasible",
            NodeKind::StagnationCount => "stagnation_count",
            NodeKind::TimeLimit => "time_limit",
            NodeKind::Constructive => "constructive",
            NodeKind::LocalSearch => "local_search",
            NodeKind::Perturbation => "perturbation",
            NodeKind::Repair => "repair",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

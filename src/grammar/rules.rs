//! Well-typedness rules.
//!
//! [`Grammar::validate`] reports every violated rule; it never stops at
//! the first error. The rules are:
//!
//! 1. The root produces a `SolutionTransform`.
//! 2. Every child slot holds a node of the slot's type; arities hold.
//! 3. Constructor-first: exactly one `Constructive` node, which is either
//!    the root or the first child of the root `Seq`.
//! 4. Every operator name is a key of the active registry.
//! 5. Depth, size and loop bounds respect [`GrammarLimits`].
//! 6. Numeric parameters lie in their declared ranges.

use super::config::{GrammarLimits, Param};
use super::types::{NodeKind, ValueType};
use crate::ast::{AlgorithmProgram, Arena, Node, NodeId, Slot};
use crate::registry::{OperatorFamily, OperatorRegistry};
use thiserror::Error;

/// A single rule violation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GrammarError {
    #[error("{kind} node {node} has {found} children, expected {min}..={max}")]
    BadArity {
        node: NodeId,
        kind: NodeKind,
        found: usize,
        min: usize,
        max: usize,
    },
    #[error("{slot} of node {node} expects {expected}, found {found}")]
    TypeMismatch {
        node: NodeId,
        slot: Slot,
        expected: ValueType,
        found: ValueType,
    },
    #[error("node {node} references unknown {family} operator '{name}'")]
    UnknownOperator {
        node: NodeId,
        family: OperatorFamily,
        name: String,
    },
    #[error("depth {depth} exceeds max_depth {max}")]
    DepthExceeded { depth: usize, max: usize },
    #[error("size {size} exceeds max_size {max}")]
    SizeExceeded { size: usize, max: usize },
    #[error("parameter '{param}' of node {node} is {value}, allowed [{min}, {max}]")]
    ParamOutOfRange {
        node: NodeId,
        param: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("program has no constructive node")]
    MissingConstructor,
    #[error("constructive node {node} is not the first action of the outermost sequence")]
    MisplacedConstructor { node: NodeId },
}

impl GrammarError {
    /// Errors the generator knows how to fix in place.
    pub fn is_repairable(&self) -> bool {
        matches!(
            self,
            GrammarError::UnknownOperator { .. } | GrammarError::SizeExceeded { .. }
        )
    }
}

/// The typed grammar of heuristic programs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grammar {
    limits: GrammarLimits,
}

impl Grammar {
    pub fn new(limits: GrammarLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &GrammarLimits {
        &self.limits
    }

    /// Validates a program against all rules.
    pub fn validate(
        &self,
        program: &AlgorithmProgram,
        registry: &OperatorRegistry,
    ) -> Vec<GrammarError> {
        self.validate_arena(program.arena(), registry)
    }

    /// Validates a bare tree against all rules.
    pub fn validate_arena(&self, arena: &Arena, registry: &OperatorRegistry) -> Vec<GrammarError> {
        let mut errors = Vec::new();
        let limits = &self.limits;
        let root = arena.root();

        // Rule 1
        let root_type = arena.node(root).kind().output_type();
        if root_type != ValueType::SolutionTransform {
            errors.push(GrammarError::TypeMismatch {
                node: root,
                slot: Slot::Root,
                expected: ValueType::SolutionTransform,
                found: root_type,
            });
        }

        // Rule 3: allowed constructor position
        let allowed_ctor = match arena.node(root) {
            Node::Constructive(_) => Some(root),
            Node::Seq(children) => children.first().copied(),
            _ => None,
        };
        let mut constructors = 0usize;

        for entry in arena.enumerate() {
            let id = entry.id;
            let node = arena.node(id);
            let kind = node.kind();

            // Rule 2
            if let Node::Seq(children) = node {
                if children.is_empty() || children.len() > limits.max_seq_len {
                    errors.push(GrammarError::BadArity {
                        node: id,
                        kind,
                        found: children.len(),
                        min: 1,
                        max: limits.max_seq_len,
                    });
                }
            }
            for (slot, child) in node.children() {
                let found = arena.node(child).kind().output_type();
                if let Some(expected) = kind.slot_type(slot) {
                    if expected != found {
                        errors.push(GrammarError::TypeMismatch {
                            node: id,
                            slot,
                            expected,
                            found,
                        });
                    }
                }
            }

            // Rule 3
            if kind == NodeKind::Constructive {
                constructors += 1;
                if allowed_ctor != Some(id) || constructors > 1 {
                    errors.push(GrammarError::MisplacedConstructor { node: id });
                }
            }

            // Rule 4
            if let Some((family, name)) = node.operator() {
                if !registry.contains(family, name) {
                    errors.push(GrammarError::UnknownOperator {
                        node: id,
                        family,
                        name: name.to_string(),
                    });
                }
            }

            // Rules 5 and 6
            for (param, value) in numeric_params(node) {
                if !limits.in_range(param, value) {
                    let (min, max) = limits.range(param);
                    errors.push(GrammarError::ParamOutOfRange {
                        node: id,
                        param: param.name(),
                        value,
                        min,
                        max,
                    });
                }
            }
        }

        if constructors == 0 {
            errors.push(GrammarError::MissingConstructor);
        }

        let depth = arena.depth();
        if depth > limits.max_depth {
            errors.push(GrammarError::DepthExceeded {
                depth,
                max: limits.max_depth,
            });
        }
        let size = arena.size();
        if size > limits.max_size {
            errors.push(GrammarError::SizeExceeded {
                size,
                max: limits.max_size,
            });
        }

        errors
    }

    pub fn is_valid(&self, program: &AlgorithmProgram, registry: &OperatorRegistry) -> bool {
        self.validate(program, registry).is_empty()
    }
}

/// Numeric parameters carried by `node`, with their declared kind.
pub fn numeric_params(node: &Node) -> Vec<(Param, f64)> {
    match node {
        Node::While { max_iter, .. } => vec![(Param::LoopIterations, *max_iter as f64)],
        Node::For { n, .. } => vec![(Param::RepeatCount, *n as f64)],
        Node::StagnationCount(k) => vec![(Param::StagnationThreshold, *k as f64)],
        Node::TimeLimit(ms) => vec![(Param::TimeLimitMs, *ms as f64)],
        Node::LocalSearch {
            max_iter: Some(m), ..
        } => vec![(Param::LocalSearchIterations, *m as f64)],
        Node::Perturbation {
            intensity: Some(x), ..
        } => vec![(Param::Intensity, *x)],
        _ => Vec::new(),
    }
}

//! Candidate algorithms: a root tree plus its metadata header.

use super::arena::{Arena, NodeRef};
use super::node::{Node, NodeId, Slot};
use crate::grammar::{GrammarLimits, NodeKind};
use crate::problem::ProblemFamily;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rejected structural edits. A rejected edit leaves the program unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("edit would raise depth to {depth} (max {max})")]
    DepthExceeded { depth: usize, max: usize },
    #[error("edit would raise size to {size} (max {max})")]
    SizeExceeded { size: usize, max: usize },
    #[error("node {0} does not exist")]
    NoSuchNode(NodeId),
    #[error("node {parent} has no {slot} slot")]
    NoSuchSlot { parent: NodeId, slot: Slot },
    #[error("replacement must have the same children as the node it replaces")]
    ShapeChanged,
}

/// Depth and size caps a program must respect at all times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeCaps {
    pub max_depth: usize,
    pub max_size: usize,
}

impl From<&GrammarLimits> for SizeCaps {
    fn from(limits: &GrammarLimits) -> Self {
        Self {
            max_depth: limits.max_depth,
            max_size: limits.max_size,
        }
    }
}

/// Number of action nodes per operator family.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorCounts {
    pub constructive: usize,
    pub local_search: usize,
    pub perturbation: usize,
    pub repair: usize,
}

impl OperatorCounts {
    fn of(arena: &Arena) -> Self {
        let mut counts = Self::default();
        for node in arena.nodes() {
            match node.kind() {
                NodeKind::Constructive => counts.constructive += 1,
                NodeKind::LocalSearch => counts.local_search += 1,
                NodeKind::Perturbation => counts.perturbation += 1,
                NodeKind::Repair => counts.repair += 1,
                _ => {}
            }
        }
        counts
    }
}

/// Program metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramHeader {
    /// Seed of the generator draw that produced the program (inherited by
    /// edited offspring).
    pub seed: u64,
    pub depth: usize,
    pub size: usize,
    pub operator_counts: OperatorCounts,
    pub problem_family: ProblemFamily,
    pub max_depth: usize,
    pub max_size: usize,
}

/// A candidate heuristic.
///
/// Programs are immutable: every edit returns a new program and leaves the
/// receiver untouched, so no substructure is ever shared between programs.
#[derive(Debug, Clone, PartialEq)]
pub struct AlgorithmProgram {
    arena: Arena,
    header: ProgramHeader,
}

impl AlgorithmProgram {
    /// Wraps `arena` after checking the depth and size caps.
    pub fn new(
        arena: Arena,
        family: ProblemFamily,
        seed: u64,
        caps: SizeCaps,
    ) -> Result<Self, EditError> {
        let depth = arena.depth();
        let size = arena.size();
        if depth > caps.max_depth {
            return Err(EditError::DepthExceeded {
                depth,
                max: caps.max_depth,
            });
        }
        if size > caps.max_size {
            return Err(EditError::SizeExceeded {
                size,
                max: caps.max_size,
            });
        }
        let header = ProgramHeader {
            seed,
            depth,
            size,
            operator_counts: OperatorCounts::of(&arena),
            problem_family: family,
            max_depth: caps.max_depth,
            max_size: caps.max_size,
        };
        Ok(Self { arena, header })
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn root(&self) -> NodeId {
        self.arena.root()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        self.arena.node(id)
    }

    pub fn header(&self) -> &ProgramHeader {
        &self.header
    }

    pub fn depth(&self) -> usize {
        self.header.depth
    }

    pub fn size(&self) -> usize {
        self.header.size
    }

    pub fn seed(&self) -> u64 {
        self.header.seed
    }

    pub fn family(&self) -> ProblemFamily {
        self.header.problem_family
    }

    pub fn caps(&self) -> SizeCaps {
        SizeCaps {
            max_depth: self.header.max_depth,
            max_size: self.header.max_size,
        }
    }

    /// Pre-order `(id, parent, slot, depth)` of every node.
    pub fn enumerate_nodes(&self) -> Vec<NodeRef> {
        self.arena.enumerate()
    }

    pub fn clone_program(&self) -> Self {
        self.clone()
    }

    pub fn clone_subtree(&self, id: NodeId) -> Result<Arena, EditError> {
        self.check_node(id)?;
        Ok(self.arena.extract(id))
    }

    /// Returns a program where the child of `parent` at `slot` is `subtree`.
    /// `parent = None` replaces the whole tree.
    pub fn replace_subtree(
        &self,
        parent: Option<NodeId>,
        slot: Slot,
        subtree: &Arena,
    ) -> Result<Self, EditError> {
        if let Some(p) = parent {
            self.check_node(p)?;
        }
        let arena = self
            .arena
            .graft(parent, slot, subtree)
            .ok_or(EditError::NoSuchSlot {
                parent: parent.unwrap_or(self.root()),
                slot,
            })?;
        Self::new(arena, self.family(), self.seed(), self.caps())
    }

    /// Replaces the subtree located by a [`NodeRef`] of this program.
    pub fn replace_at(&self, at: &NodeRef, subtree: &Arena) -> Result<Self, EditError> {
        self.replace_subtree(at.parent, at.slot, subtree)
    }

    /// Swaps node `id` for `node` with identical children (renames and
    /// parameter changes).
    pub fn replace_node(&self, id: NodeId, node: Node) -> Result<Self, EditError> {
        self.check_node(id)?;
        if self.arena.node(id).children() != node.children() {
            return Err(EditError::ShapeChanged);
        }
        let arena = self.arena.with_node(id, node);
        Self::new(arena, self.family(), self.seed(), self.caps())
    }

    fn check_node(&self, id: NodeId) -> Result<(), EditError> {
        if id.index() < self.arena.size() {
            Ok(())
        } else {
            Err(EditError::NoSuchNode(id))
        }
    }
}

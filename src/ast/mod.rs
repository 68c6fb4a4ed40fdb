//! Arena-backed abstract syntax trees for candidate heuristics.
//!
//! Nodes are stored in a single vector owned by the program and address
//! their children by small-integer [`NodeId`]s. Cloning a program is a
//! vector copy; structural edits graft a detached [`Arena`] into a slot
//! and re-compact, returning a new program.
//!
//! # Key Types
//!
//! - [`Node`]: the closed sum type of control, condition and action nodes
//! - [`Arena`]: a compact pre-ordered tree; [`TreeBuilder`] assembles one
//! - [`AlgorithmProgram`]: root tree plus [`ProgramHeader`] (seed, depth,
//!   size, operator counts, family)
//! - [`SerializedProgram`]: the `{kind, params, children[]}` record form

mod arena;
mod node;
mod program;
mod pseudocode;
mod serial;

pub use arena::{Arena, NodeRef, TreeBuilder};
pub use node::{Node, NodeId, Slot};
pub use program::{AlgorithmProgram, EditError, OperatorCounts, ProgramHeader, SizeCaps};
pub use pseudocode::arena_to_pseudocode;
pub use serial::{DecodeError, ParamValue, SerialNode, SerializedProgram};

//! In-place fixes for repairable grammar errors.

use crate::ast::{Arena, Node, NodeId};
use crate::grammar::{Grammar, GrammarError};
use crate::random::GaaRng;
use crate::registry::{OperatorFamily, OperatorRegistry};
use rand::Rng;

/// Fixes unknown operator keys and size overruns.
///
/// Unknown keys are resampled from the same pool (an unknown repair key
/// falls back to the default repair). Size overruns are fixed by dropping
/// trailing children of `Seq` nodes, later sequences first; the root
/// sequence keeps at least two children. Other errors are left for the
/// caller to reject.
pub fn repair_arena(
    arena: &Arena,
    grammar: &Grammar,
    registry: &OperatorRegistry,
    rng: &mut GaaRng,
) -> Arena {
    let mut arena = arena.clone();
    for error in grammar.validate_arena(&arena, registry) {
        if let GrammarError::UnknownOperator { node, family, .. } = error {
            if let Some(fixed) = resample_operator(arena.node(node), family, registry, rng) {
                arena = arena.with_node(node, fixed);
            }
        }
    }

    let max_size = grammar.limits().max_size;
    while arena.size() > max_size {
        match trailing_trim(&arena) {
            Some(trimmed) => arena = trimmed,
            None => break,
        }
    }
    arena
}

fn resample_operator(
    node: &Node,
    family: OperatorFamily,
    registry: &OperatorRegistry,
    rng: &mut GaaRng,
) -> Option<Node> {
    let keys = registry.keys(family);
    if keys.is_empty() {
        return match node {
            Node::Repair(_) => Some(Node::Repair(None)),
            _ => None,
        };
    }
    let key = keys[rng.random_range(0..keys.len())];
    node.with_operator(key)
}

/// Drops the last child of the last multi-child `Seq` in pre-order.
fn trailing_trim(arena: &Arena) -> Option<Arena> {
    let root = arena.root();
    let target = arena
        .enumerate()
        .into_iter()
        .rev()
        .find_map(|entry| match arena.node(entry.id) {
            Node::Seq(children) if children.len() > if entry.id == root { 2 } else { 1 } => {
                Some((entry.id, children.clone()))
            }
            _ => None,
        });
    let (id, mut children): (NodeId, Vec<NodeId>) = target?;
    children.pop();
    Some(arena.with_node(id, Node::Seq(children)))
}

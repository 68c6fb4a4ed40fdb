//! Typed subtree crossover.

use super::mutation::movable;
use crate::ast::{AlgorithmProgram, NodeRef};
use crate::random::GaaRng;
use rand::Rng;

/// Grafts a random subtree of `donor` into a type-compatible slot of
/// `receiver`.
///
/// Neither the donated subtree nor the replaced one may hold the
/// constructor, and the graft must respect the receiver's depth and size
/// caps. Returns `None` when no compatible pair exists.
pub fn crossover(
    receiver: &AlgorithmProgram,
    donor: &AlgorithmProgram,
    rng: &mut GaaRng,
) -> Option<AlgorithmProgram> {
    let donors = movable(donor);
    if donors.is_empty() {
        return None;
    }
    let pick = donors[rng.random_range(0..donors.len())];
    let graft = donor.arena().extract(pick.id);
    let ty = graft.node(graft.root()).kind().output_type();
    let caps = receiver.caps();
    let arena = receiver.arena();

    let slots: Vec<NodeRef> = movable(receiver)
        .into_iter()
        .filter(|e| arena.node(e.id).kind().output_type() == ty)
        .filter(|e| e.depth - 1 + graft.depth() <= caps.max_depth)
        .filter(|e| receiver.size() - arena.subtree_size(e.id) + graft.size() <= caps.max_size)
        .collect();
    if slots.is_empty() {
        return None;
    }
    let slot = slots[rng.random_range(0..slots.len())];
    receiver.replace_at(&slot, &graft).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{SizeCaps, TreeBuilder};
    use crate::problem::ProblemFamily;
    use crate::random::create_rng;

    const CAPS: SizeCaps = SizeCaps {
        max_depth: 5,
        max_size: 25,
    };

    fn receiver() -> AlgorithmProgram {
        let mut b = TreeBuilder::new();
        let c = b.constructive("dsatur");
        let cond = b.feasible();
        let ls = b.local_search("min_conflicts", Some(10));
        let p = b.perturbation("random_recolor", Some(0.2));
        let branch = b.if_else(cond, ls, p);
        let root = b.seq(vec![c, branch]);
        AlgorithmProgram::new(b.build(root), ProblemFamily::GraphColoring, 1, CAPS).unwrap()
    }

    fn donor() -> AlgorithmProgram {
        let mut b = TreeBuilder::new();
        let c = b.constructive("greedy");
        let k = b.stagnation_count(4);
        let ls = b.local_search("class_elimination", None);
        let w = b.while_loop(k, ls, 6);
        let root = b.seq(vec![c, w]);
        AlgorithmProgram::new(b.build(root), ProblemFamily::GraphColoring, 2, CAPS).unwrap()
    }

    #[test]
    fn test_child_keeps_single_constructor_and_caps() {
        let mut rng = create_rng(42);
        let (a, b) = (receiver(), donor());
        let mut produced = 0;
        for _ in 0..50 {
            if let Some(child) = crossover(&a, &b, &mut rng) {
                assert_eq!(child.header().operator_counts.constructive, 1);
                assert!(child.depth() <= CAPS.max_depth);
                assert!(child.size() <= CAPS.max_size);
                assert_eq!(child.seed(), a.seed());
                produced += 1;
            }
        }
        assert!(produced > 0);
    }

    #[test]
    fn test_types_are_respected() {
        let mut rng = create_rng(7);
        let (a, b) = (receiver(), donor());
        for _ in 0..50 {
            if let Some(child) = crossover(&a, &b, &mut rng) {
                for e in child.enumerate_nodes() {
                    let node = child.node(e.id);
                    for (slot, c) in node.children() {
                        let expected = node.kind().slot_type(slot);
                        assert_eq!(expected, Some(child.node(c).kind().output_type()));
                    }
                }
            }
        }
    }

    #[test]
    fn test_lone_constructor_has_nothing_to_give() {
        let mut b = TreeBuilder::new();
        let c = b.constructive("greedy");
        let lone =
            AlgorithmProgram::new(b.build(c), ProblemFamily::GraphColoring, 0, CAPS).unwrap();
        assert!(crossover(&receiver(), &lone, &mut create_rng(0)).is_none());
        assert!(crossover(&lone, &donor(), &mut create_rng(0)).is_none());
    }
}

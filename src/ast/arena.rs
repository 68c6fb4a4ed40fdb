//! Index-addressed node storage.
//!
//! Nodes live in a flat vector and refer to their children by [`NodeId`].
//! Every arena handed out by this module is *compact*: it holds exactly the
//! nodes reachable from the root, in pre-order, with the root at index 0.
//! Structural equality of two trees is therefore plain vector equality, and
//! cloning a tree is a vector copy.

use super::node::{Node, NodeId, Slot};
use crate::grammar::NodeKind;

/// One entry of a pre-order walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeRef {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub slot: Slot,
    /// 1 for the root.
    pub depth: usize,
}

/// A compact tree of [`Node`]s.
#[derive(Debug, Clone, PartialEq)]
pub struct Arena {
    nodes: Vec<Node>,
}

impl Arena {
    /// A single-node tree.
    pub fn leaf(node: Node) -> Self {
        assert!(
            node.children().is_empty(),
            "leaf constructor requires a childless node"
        );
        Self { nodes: vec![node] }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Number of nodes (all nodes are reachable).
    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    /// Length of the longest root-to-leaf path, counting nodes.
    pub fn depth(&self) -> usize {
        self.subtree_depth(self.root())
    }

    /// Pre-order walk with parent and slot of every node.
    pub fn enumerate(&self) -> Vec<NodeRef> {
        walk(&self.nodes, self.root())
    }

    pub fn subtree_depth(&self, id: NodeId) -> usize {
        1 + self
            .node(id)
            .children()
            .into_iter()
            .map(|(_, c)| self.subtree_depth(c))
            .max()
            .unwrap_or(0)
    }

    pub fn subtree_size(&self, id: NodeId) -> usize {
        1 + self
            .node(id)
            .children()
            .into_iter()
            .map(|(_, c)| self.subtree_size(c))
            .sum::<usize>()
    }

    /// Whether the subtree rooted at `id` contains a node of `kind`.
    pub fn subtree_contains(&self, id: NodeId, kind: NodeKind) -> bool {
        let node = self.node(id);
        node.kind() == kind
            || node
                .children()
                .into_iter()
                .any(|(_, c)| self.subtree_contains(c, kind))
    }

    /// Copies the subtree rooted at `id` into a standalone arena.
    pub fn extract(&self, id: NodeId) -> Arena {
        Arena {
            nodes: compact(&self.nodes, id),
        }
    }

    /// Returns a new arena in which the child of `parent` at `slot` is
    /// replaced by a copy of `subtree`. `parent = None` replaces the root.
    ///
    /// Returns `None` if `parent` has no such slot.
    pub fn graft(&self, parent: Option<NodeId>, slot: Slot, subtree: &Arena) -> Option<Arena> {
        let Some(parent) = parent else {
            return Some(subtree.clone());
        };
        let mut nodes = self.nodes.clone();
        let offset = nodes.len() as u32;
        nodes.extend(subtree.nodes.iter().cloned().map(|mut n| {
            n.map_children(|c| NodeId(c.0 + offset));
            n
        }));
        if !nodes[parent.index()].set_child(slot, NodeId(offset)) {
            return None;
        }
        Some(Arena {
            nodes: compact(&nodes, NodeId(0)),
        })
    }

    /// Replaces the node at `id` by `node`, which must have the same
    /// children as the node it replaces (used for leaf and parameter edits).
    pub fn with_node(&self, id: NodeId, node: Node) -> Arena {
        let mut nodes = self.nodes.clone();
        nodes[id.index()] = node;
        Arena {
            nodes: compact(&nodes, NodeId(0)),
        }
    }
}

/// Builds an [`Arena`] bottom-up.
///
/// ```
/// use u_gaa::ast::TreeBuilder;
///
/// let mut b = TreeBuilder::new();
/// let c = b.constructive("dsatur");
/// let cond = b.feasible();
/// let ls = b.local_search("min_conflicts", None);
/// let p = b.perturbation("random_recolor", Some(0.2));
/// let branch = b.if_else(cond, ls, p);
/// let root = b.seq(vec![c, branch]);
/// let arena = b.build(root);
/// assert_eq!(arena.size(), 6);
/// assert_eq!(arena.depth(), 3);
/// ```
#[derive(Debug, Default)]
pub struct TreeBuilder {
    nodes: Vec<Node>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Appends a copy of `subtree` and returns its root id.
    pub fn push_arena(&mut self, subtree: &Arena) -> NodeId {
        let offset = self.nodes.len() as u32;
        self.nodes.extend(subtree.nodes.iter().cloned().map(|mut n| {
            n.map_children(|c| NodeId(c.0 + offset));
            n
        }));
        NodeId(offset)
    }

    pub fn seq(&mut self, children: Vec<NodeId>) -> NodeId {
        self.push(Node::Seq(children))
    }

    pub fn if_then(&mut self, cond: NodeId, then: NodeId) -> NodeId {
        self.push(Node::If {
            cond,
            then,
            otherwise: None,
        })
    }

    pub fn if_else(&mut self, cond: NodeId, then: NodeId, otherwise: NodeId) -> NodeId {
        self.push(Node::If {
            cond,
            then,
            otherwise: Some(otherwise),
        })
    }

    pub fn while_loop(&mut self, cond: NodeId, body: NodeId, max_iter: u32) -> NodeId {
        self.push(Node::While {
            cond,
            body,
            max_iter,
        })
    }

    pub fn for_loop(&mut self, n: u32, body: NodeId) -> NodeId {
        self.push(Node::For { n, body })
    }

    pub fn improves(&mut self) -> NodeId {
        self.push(Node::Improves)
    }

    pub fn feasible(&mut self) -> NodeId {
        self.push(Node::Feasible)
    }

    pub fn stagnation_count(&mut self, k: u32) -> NodeId {
        self.push(Node::StagnationCount(k))
    }

    pub fn time_limit(&mut self, ms: u64) -> NodeId {
        self.push(Node::TimeLimit(ms))
    }

    pub fn constructive(&mut self, op: &str) -> NodeId {
        self.push(Node::Constructive(op.to_string()))
    }

    pub fn local_search(&mut self, op: &str, max_iter: Option<u32>) -> NodeId {
        self.push(Node::LocalSearch {
            op: op.to_string(),
            max_iter,
        })
    }

    pub fn perturbation(&mut self, op: &str, intensity: Option<f64>) -> NodeId {
        self.push(Node::Perturbation {
            op: op.to_string(),
            intensity,
        })
    }

    pub fn repair(&mut self, op: Option<&str>) -> NodeId {
        self.push(Node::Repair(op.map(str::to_string)))
    }

    /// Finishes the tree rooted at `root`. Nodes not reachable from `root`
    /// are dropped.
    ///
    /// # Panics
    /// Panics if a child index is out of range or a node is reachable twice
    /// (shared substructure or a cycle).
    pub fn build(self, root: NodeId) -> Arena {
        Arena {
            nodes: compact(&self.nodes, root),
        }
    }
}

/// Pre-order walk; asserts every node is reached at most once.
fn walk(nodes: &[Node], root: NodeId) -> Vec<NodeRef> {
    let mut seen = vec![false; nodes.len()];
    let mut out = Vec::with_capacity(nodes.len());
    let mut stack = vec![NodeRef {
        id: root,
        parent: None,
        slot: Slot::Root,
        depth: 1,
    }];
    while let Some(entry) = stack.pop() {
        let idx = entry.id.index();
        assert!(idx < nodes.len(), "dangling child index {}", entry.id);
        assert!(!seen[idx], "node {} reachable twice", entry.id);
        seen[idx] = true;
        out.push(entry);
        for (slot, child) in nodes[idx].children().into_iter().rev() {
            stack.push(NodeRef {
                id: child,
                parent: Some(entry.id),
                slot,
                depth: entry.depth + 1,
            });
        }
    }
    out
}

/// Copies the nodes reachable from `root` into pre-order, re-indexing children.
fn compact(nodes: &[Node], root: NodeId) -> Vec<Node> {
    let order = walk(nodes, root);
    let mut remap = vec![u32::MAX; nodes.len()];
    for (new, entry) in order.iter().enumerate() {
        remap[entry.id.index()] = new as u32;
    }
    order
        .iter()
        .map(|entry| {
            let mut node = nodes[entry.id.index()].clone();
            node.map_children(|c| NodeId(remap[c.index()]));
            node
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skeleton() -> Arena {
        let mut b = TreeBuilder::new();
        let c = b.constructive("greedy");
        let cond = b.improves();
        let ls = b.local_search("ls", Some(5));
        let p = b.perturbation("kick", Some(0.3));
        let branch = b.if_else(cond, ls, p);
        let root = b.seq(vec![c, branch]);
        b.build(root)
    }

    #[test]
    fn test_build_is_preorder() {
        let arena = skeleton();
        let kinds: Vec<NodeKind> = arena.nodes().iter().map(|n| n.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::Seq,
                NodeKind::Constructive,
                NodeKind::If,
                NodeKind::Improves,
                NodeKind::LocalSearch,
                NodeKind::Perturbation
            ]
        );
        assert_eq!(arena.size(), 6);
        assert_eq!(arena.depth(), 3);
    }

    #[test]
    fn test_enumerate_reports_parent_and_slot() {
        let arena = skeleton();
        let refs = arena.enumerate();
        assert_eq!(refs.len(), arena.size());
        assert_eq!(refs[0].slot, Slot::Root);
        assert_eq!(refs[0].parent, None);
        let pert = refs
            .iter()
            .find(|r| arena.node(r.id).kind() == NodeKind::Perturbation)
            .unwrap();
        assert_eq!(pert.slot, Slot::Else);
        assert_eq!(pert.depth, 3);
        assert_eq!(pert.parent, Some(NodeId(2)));
    }

    #[test]
    fn test_unreachable_nodes_dropped() {
        let mut b = TreeBuilder::new();
        let _orphan = b.feasible();
        let c = b.constructive("greedy");
        let arena = b.build(c);
        assert_eq!(arena.size(), 1);
    }

    #[test]
    #[should_panic(expected = "reachable twice")]
    fn test_shared_substructure_rejected() {
        let mut b = TreeBuilder::new();
        let ls = b.local_search("ls", None);
        let root = b.seq(vec![ls, ls]);
        b.build(root);
    }

    #[test]
    fn test_graft_replaces_slot() {
        let arena = skeleton();
        let donor = Arena::leaf(Node::Repair(None));
        let grafted = arena.graft(Some(NodeId(2)), Slot::Then, &donor).unwrap();
        assert_eq!(grafted.size(), 6);
        assert_eq!(grafted.node(NodeId(4)), &Node::Repair(None));
        // source arena untouched
        assert_eq!(arena.node(NodeId(4)).kind(), NodeKind::LocalSearch);
    }

    #[test]
    fn test_graft_bad_slot() {
        let arena = skeleton();
        let donor = Arena::leaf(Node::Feasible);
        assert!(arena.graft(Some(NodeId(1)), Slot::Body, &donor).is_none());
    }

    #[test]
    fn test_extract_subtree() {
        let arena = skeleton();
        let sub = arena.extract(NodeId(2));
        assert_eq!(sub.size(), 4);
        assert_eq!(sub.node(sub.root()).kind(), NodeKind::If);
        assert!(arena.subtree_contains(NodeId(0), NodeKind::Constructive));
        assert!(!sub.subtree_contains(sub.root(), NodeKind::Constructive));
    }
}

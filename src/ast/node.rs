//! Node payloads and slot addressing.

use crate::grammar::NodeKind;
use crate::registry::OperatorFamily;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a node inside its owning [`super::Arena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Position of a child relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    /// The program root (no parent).
    Root,
    /// The i-th child of a `Seq`.
    Child(usize),
    Cond,
    Then,
    Else,
    Body,
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Root => f.write_str("root"),
            Slot::Child(i) => write!(f, "child[{i}]"),
            Slot::Cond => f.write_str("cond"),
            Slot::Then => f.write_str("then"),
            Slot::Else => f.write_str("else"),
            Slot::Body => f.write_str("body"),
        }
    }
}

/// A node with its typed children and parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Seq(Vec<NodeId>),
    If {
        cond: NodeId,
        then: NodeId,
        otherwise: Option<NodeId>,
    },
    While {
        cond: NodeId,
        body: NodeId,
        max_iter: u32,
    },
    For {
        n: u32,
        body: NodeId,
    },
    Improves,
    Feasible,
    StagnationCount(u32),
    /// Milliseconds since interpretation start.
    TimeLimit(u64),
    Constructive(String),
    LocalSearch {
        op: String,
        max_iter: Option<u32>,
    },
    Perturbation {
        op: String,
        intensity: Option<f64>,
    },
    /// `None` invokes the registry's default repair.
    Repair(Option<String>),
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Seq(_) => NodeKind::Seq,
            Node::If { .. } => NodeKind::If,
            Node::While { .. } => NodeKind::While,
            Node::For { .. } => NodeKind::For,
            Node::Improves => NodeKind::Improves,
            Node::Feasible => NodeKind::Feasible,
            Node::StagnationCount(_) => NodeKind::StagnationCount,
            Node::TimeLimit(_) => NodeKind::TimeLimit,
            Node::Constructive(_) => NodeKind::Constructive,
            Node::LocalSearch { .. } => NodeKind::LocalSearch,
            Node::Perturbation { .. } => NodeKind::Perturbation,
            Node::Repair(_) => NodeKind::Repair,
        }
    }

    /// Children in slot order.
    pub fn children(&self) -> Vec<(Slot, NodeId)> {
        match self {
            Node::Seq(children) => children
                .iter()
                .enumerate()
                .map(|(i, &c)| (Slot::Child(i), c))
                .collect(),
            Node::If {
                cond,
                then,
                otherwise,
            } => {
                let mut out = vec![(Slot::Cond, *cond), (Slot::Then, *then)];
                if let Some(e) = otherwise {
                    out.push((Slot::Else, *e));
                }
                out
            }
            Node::While { cond, body, .. } => vec![(Slot::Cond, *cond), (Slot::Body, *body)],
            Node::For { body, .. } => vec![(Slot::Body, *body)],
            _ => Vec::new(),
        }
    }

    pub fn child(&self, slot: Slot) -> Option<NodeId> {
        self.children()
            .into_iter()
            .find(|(s, _)| *s == slot)
            .map(|(_, id)| id)
    }

    /// Points `slot` at `id`. Returns `false` if this node has no such slot.
    pub fn set_child(&mut self, slot: Slot, id: NodeId) -> bool {
        match (self, slot) {
            (Node::Seq(children), Slot::Child(i)) if i < children.len() => {
                children[i] = id;
                true
            }
            (Node::If { cond, .. }, Slot::Cond) | (Node::While { cond, .. }, Slot::Cond) => {
                *cond = id;
                true
            }
            (Node::If { then, .. }, Slot::Then) => {
                *then = id;
                true
            }
            (Node::If { otherwise, .. }, Slot::Else) if otherwise.is_some() => {
                *otherwise = Some(id);
                true
            }
            (Node::While { body, .. }, Slot::Body) | (Node::For { body, .. }, Slot::Body) => {
                *body = id;
                true
            }
            _ => false,
        }
    }

    /// Rewrites every child index through `f`.
    pub(crate) fn map_children(&mut self, mut f: impl FnMut(NodeId) -> NodeId) {
        match self {
            Node::Seq(children) => {
                for c in children.iter_mut() {
                    *c = f(*c);
                }
            }
            Node::If {
                cond,
                then,
                otherwise,
            } => {
                *cond = f(*cond);
                *then = f(*then);
                if let Some(e) = otherwise {
                    *e = f(*e);
                }
            }
            Node::While { cond, body, .. } => {
                *cond = f(*cond);
                *body = f(*body);
            }
            Node::For { body, .. } => *body = f(*body),
            _ => {}
        }
    }

    /// The registry pool and key an action node refers to.
    ///
    /// `Repair(None)` returns `None`: it resolves to the default repair.
    pub fn operator(&self) -> Option<(OperatorFamily, &str)> {
        match self {
            Node::Constructive(op) => Some((OperatorFamily::Constructive, op)),
            Node::LocalSearch { op, .. } => Some((OperatorFamily::LocalSearch, op)),
            Node::Perturbation { op, .. } => Some((OperatorFamily::Perturbation, op)),
            Node::Repair(Some(op)) => Some((OperatorFamily::Repair, op)),
            _ => None,
        }
    }

    /// Replaces the operator key of an action node, keeping its parameters.
    pub fn with_operator(&self, key: &str) -> Option<Node> {
        match self {
            Node::Constructive(_) => Some(Node::Constructive(key.to_string())),
            Node::LocalSearch { max_iter, .. } => Some(Node::LocalSearch {
                op: key.to_string(),
                max_iter: *max_iter,
            }),
            Node::Perturbation { intensity, .. } => Some(Node::Perturbation {
                op: key.to_string(),
                intensity: *intensity,
            }),
            Node::Repair(_) => Some(Node::Repair(Some(key.to_string()))),
            _ => None,
        }
    }

    /// Whether the node carries a numeric parameter that can be jittered.
    pub fn has_numeric_param(&self) -> bool {
        matches!(
            self,
            Node::While { .. }
                | Node::For { .. }
                | Node::StagnationCount(_)
                | Node::TimeLimit(_)
                | Node::LocalSearch { .. }
                | Node::Perturbation { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_children_in_slot_order() {
        let node = Node::If {
            cond: NodeId(1),
            then: NodeId(2),
            otherwise: Some(NodeId(3)),
        };
        assert_eq!(
            node.children(),
            vec![
                (Slot::Cond, NodeId(1)),
                (Slot::Then, NodeId(2)),
                (Slot::Else, NodeId(3))
            ]
        );
        assert_eq!(node.child(Slot::Else), Some(NodeId(3)));
        assert_eq!(node.child(Slot::Body), None);
    }

    #[test]
    fn test_set_child_rejects_missing_slot() {
        let mut node = Node::If {
            cond: NodeId(1),
            then: NodeId(2),
            otherwise: None,
        };
        assert!(!node.set_child(Slot::Else, NodeId(9)));
        assert!(node.set_child(Slot::Then, NodeId(9)));
        assert_eq!(node.child(Slot::Then), Some(NodeId(9)));

        let mut seq = Node::Seq(vec![NodeId(1)]);
        assert!(!seq.set_child(Slot::Child(1), NodeId(5)));
    }

    #[test]
    fn test_operator_lookup() {
        let ls = Node::LocalSearch {
            op: "two_opt".into(),
            max_iter: Some(10),
        };
        assert_eq!(ls.operator(), Some((OperatorFamily::LocalSearch, "two_opt")));
        assert_eq!(Node::Repair(None).operator(), None);
        assert_eq!(
            ls.with_operator("relocate"),
            Some(Node::LocalSearch {
                op: "relocate".into(),
                max_iter: Some(10)
            })
        );
        assert_eq!(Node::Feasible.with_operator("x"), None);
    }
}

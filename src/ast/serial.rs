//! Nested-record serialization of programs.
//!
//! A program is emitted as `{ header, root }` where every node is
//! `{ kind, params, children[] }`. `If` children are `[cond, then, else?]`,
//! `While` children are `[cond, body]`, `For` children are `[body]`.

use super::arena::{Arena, TreeBuilder};
use super::node::{Node, NodeId};
use super::program::{AlgorithmProgram, EditError, ProgramHeader, SizeCaps};
use crate::grammar::NodeKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// A scalar node parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(u64),
    Float(f64),
    Text(String),
}

/// One serialized node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerialNode {
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, ParamValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SerialNode>,
}

/// A serialized program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedProgram {
    pub header: ProgramHeader,
    pub root: SerialNode,
}

/// Errors raised while decoding a serialized program.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{kind} node is missing parameter '{param}'")]
    MissingParam { kind: NodeKind, param: &'static str },
    #[error("{kind} node has a malformed '{param}' parameter")]
    BadParam { kind: NodeKind, param: &'static str },
    #[error("{kind} node expects {expected} children, found {found}")]
    BadChildren {
        kind: NodeKind,
        expected: &'static str,
        found: usize,
    },
    #[error("header field '{0}' does not match the decoded tree")]
    HeaderMismatch(&'static str),
    #[error(transparent)]
    Edit(#[from] EditError),
}

fn params_of(node: &Node) -> BTreeMap<String, ParamValue> {
    let mut params = BTreeMap::new();
    let mut put = |k: &str, v: ParamValue| {
        params.insert(k.to_string(), v);
    };
    match node {
        Node::While { max_iter, .. } => put("max_iter", ParamValue::Int(*max_iter as u64)),
        Node::For { n, .. } => put("n", ParamValue::Int(*n as u64)),
        Node::StagnationCount(k) => put("k", ParamValue::Int(*k as u64)),
        Node::TimeLimit(ms) => put("t_ms", ParamValue::Int(*ms)),
        Node::Constructive(op) => put("op", ParamValue::Text(op.clone())),
        Node::LocalSearch { op, max_iter } => {
            put("op", ParamValue::Text(op.clone()));
            if let Some(m) = max_iter {
                put("max_iter", ParamValue::Int(*m as u64));
            }
        }
        Node::Perturbation { op, intensity } => {
            put("op", ParamValue::Text(op.clone()));
            if let Some(x) = intensity {
                put("intensity", ParamValue::Float(*x));
            }
        }
        Node::Repair(Some(op)) => put("op", ParamValue::Text(op.clone())),
        _ => {}
    }
    params
}

fn encode(arena: &Arena, id: NodeId) -> SerialNode {
    let node = arena.node(id);
    SerialNode {
        kind: node.kind(),
        params: params_of(node),
        children: node
            .children()
            .into_iter()
            .map(|(_, c)| encode(arena, c))
            .collect(),
    }
}

impl SerialNode {
    fn text(&self, param: &'static str) -> Result<Option<String>, DecodeError> {
        match self.params.get(param) {
            None => Ok(None),
            Some(ParamValue::Text(s)) => Ok(Some(s.clone())),
            Some(_) => Err(DecodeError::BadParam {
                kind: self.kind,
                param,
            }),
        }
    }

    fn int(&self, param: &'static str) -> Result<Option<u64>, DecodeError> {
        match self.params.get(param) {
            None => Ok(None),
            Some(ParamValue::Int(v)) => Ok(Some(*v)),
            Some(_) => Err(DecodeError::BadParam {
                kind: self.kind,
                param,
            }),
        }
    }

    fn u32(&self, param: &'static str) -> Result<Option<u32>, DecodeError> {
        self.int(param)?
            .map(|v| {
                u32::try_from(v).map_err(|_| DecodeError::BadParam {
                    kind: self.kind,
                    param,
                })
            })
            .transpose()
    }

    fn float(&self, param: &'static str) -> Result<Option<f64>, DecodeError> {
        match self.params.get(param) {
            None => Ok(None),
            Some(ParamValue::Float(v)) => Ok(Some(*v)),
            Some(ParamValue::Int(v)) => Ok(Some(*v as f64)),
            Some(_) => Err(DecodeError::BadParam {
                kind: self.kind,
                param,
            }),
        }
    }

    fn required<T>(&self, value: Option<T>, param: &'static str) -> Result<T, DecodeError> {
        value.ok_or(DecodeError::MissingParam {
            kind: self.kind,
            param,
        })
    }

    fn expect_children(&self, expected: &'static str, ok: bool) -> Result<(), DecodeError> {
        if ok {
            Ok(())
        } else {
            Err(DecodeError::BadChildren {
                kind: self.kind,
                expected,
                found: self.children.len(),
            })
        }
    }

    fn decode_into(&self, b: &mut TreeBuilder) -> Result<NodeId, DecodeError> {
        let n = self.children.len();
        let mut kids = Vec::with_capacity(n);
        for child in &self.children {
            kids.push(child.decode_into(b)?);
        }
        let node = match self.kind {
            NodeKind::Seq => {
                self.expect_children("at least 1", n >= 1)?;
                Node::Seq(kids)
            }
            NodeKind::If => {
                self.expect_children("2 or 3", n == 2 || n == 3)?;
                Node::If {
                    cond: kids[0],
                    then: kids[1],
                    otherwise: kids.get(2).copied(),
                }
            }
            NodeKind::While => {
                self.expect_children("2", n == 2)?;
                Node::While {
                    cond: kids[0],
                    body: kids[1],
                    max_iter: self.required(self.u32("max_iter")?, "max_iter")?,
                }
            }
            NodeKind::For => {
                self.expect_children("1", n == 1)?;
                Node::For {
                    n: self.required(self.u32("n")?, "n")?,
                    body: kids[0],
                }
            }
            leaf => {
                self.expect_children("0", n == 0)?;
                match leaf {
                    NodeKind::Improves => Node::Improves,
                    NodeKind::Feasible => Node::Feasible,
                    NodeKind::StagnationCount => {
                        Node::StagnationCount(self.required(self.u32("k")?, "k")?)
                    }
                    NodeKind::TimeLimit => Node::TimeLimit(self.required(self.int("t_ms")?, "t_ms")?),
                    NodeKind::Constructive => {
                        Node::Constructive(self.required(self.text("op")?, "op")?)
                    }
                    NodeKind::LocalSearch => Node::LocalSearch {
                        op: self.required(self.text("op")?, "op")?,
                        max_iter: self.u32("max_iter")?,
                    },
                    NodeKind::Perturbation => Node::Perturbation {
                        op: self.required(self.text("op")?, "op")?,
                        intensity: self.float("intensity")?,
                    },
                    _ => Node::Repair(self.text("op")?),
                }
            }
        };
        Ok(b.push(node))
    }

    /// Decodes this node and its descendants into a compact arena.
    pub fn to_arena(&self) -> Result<Arena, DecodeError> {
        let mut b = TreeBuilder::new();
        let root = self.decode_into(&mut b)?;
        Ok(b.build(root))
    }
}

impl AlgorithmProgram {
    pub fn to_serialized(&self) -> SerializedProgram {
        SerializedProgram {
            header: self.header().clone(),
            root: encode(self.arena(), self.root()),
        }
    }

    /// Rebuilds a program; the header must agree with the decoded tree.
    pub fn from_serialized(serialized: &SerializedProgram) -> Result<Self, DecodeError> {
        let h = &serialized.header;
        let arena = serialized.root.to_arena()?;
        let program = AlgorithmProgram::new(
            arena,
            h.problem_family,
            h.seed,
            SizeCaps {
                max_depth: h.max_depth,
                max_size: h.max_size,
            },
        )?;
        let decoded = program.header();
        if decoded.depth != h.depth {
            return Err(DecodeError::HeaderMismatch("depth"));
        }
        if decoded.size != h.size {
            return Err(DecodeError::HeaderMismatch("size"));
        }
        if decoded.operator_counts != h.operator_counts {
            return Err(DecodeError::HeaderMismatch("operator_counts"));
        }
        Ok(program)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.to_serialized())
    }

    pub fn from_json(json: &str) -> Result<Self, DecodeError> {
        let serialized: SerializedProgram = serde_json::from_str(json)?;
        Self::from_serialized(&serialized)
    }
}

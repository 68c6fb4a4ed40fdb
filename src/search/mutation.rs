//! Program mutations.
//!
//! Every mutation returns a fresh program or `None` when it found no
//! target or the edit broke a depth or size cap. Grammar validity is
//! restored (or the child dropped) by [`legalize`].

use crate::ast::{AlgorithmProgram, Node, NodeRef, TreeBuilder};
use crate::generator::{repair_arena, Generator};
use crate::grammar::{GrammarError, GrammarLimits, NodeKind, Param, ValueType};
use crate::random::GaaRng;
use crate::registry::OperatorFamily;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// The five mutation operators, drawn uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mutation {
    /// Swap an operator key for another key of the same pool.
    Point,
    /// Replace a subtree by a freshly sampled one of the same type.
    SubtreeRegen,
    /// Nudge a numeric parameter within its range.
    ParamJitter,
    /// Wrap an action subtree in a new `While`.
    InsertWhile,
    /// Replace a control node by one of its transform children.
    Delete,
}

impl Mutation {
    pub const ALL: [Mutation; 5] = [
        Mutation::Point,
        Mutation::SubtreeRegen,
        Mutation::ParamJitter,
        Mutation::InsertWhile,
        Mutation::Delete,
    ];

    /// Applies this mutation to `program`.
    pub fn apply(
        self,
        program: &AlgorithmProgram,
        generator: &Generator<'_>,
        rng: &mut GaaRng,
    ) -> Option<AlgorithmProgram> {
        match self {
            Mutation::Point => point(program, generator, rng),
            Mutation::SubtreeRegen => subtree_regen(program, generator, rng),
            Mutation::ParamJitter => param_jitter(program, &generator.config().limits, rng),
            Mutation::InsertWhile => insert_while(program, generator, rng),
            Mutation::Delete => delete(program, rng),
        }
    }
}

/// Applies a uniformly chosen mutation.
pub fn mutate(
    program: &AlgorithmProgram,
    generator: &Generator<'_>,
    rng: &mut GaaRng,
) -> Option<AlgorithmProgram> {
    let kind = Mutation::ALL[rng.random_range(0..Mutation::ALL.len())];
    kind.apply(program, generator, rng)
}

/// Validates `program`, repairing it when every error is repairable.
///
/// Returns `None` for programs that stay invalid.
pub fn legalize(
    program: AlgorithmProgram,
    generator: &Generator<'_>,
    rng: &mut GaaRng,
) -> Option<AlgorithmProgram> {
    let grammar = generator.grammar();
    let registry = generator.registry();
    let errors = grammar.validate(&program, registry);
    if errors.is_empty() {
        return Some(program);
    }
    if !errors.iter().all(GrammarError::is_repairable) {
        return None;
    }
    let arena = repair_arena(program.arena(), grammar, registry, rng);
    if !grammar.validate_arena(&arena, registry).is_empty() {
        return None;
    }
    AlgorithmProgram::new(arena, program.family(), program.seed(), program.caps()).ok()
}

fn pick<T: Copy>(items: &[T], rng: &mut GaaRng) -> Option<T> {
    if items.is_empty() {
        None
    } else {
        Some(items[rng.random_range(0..items.len())])
    }
}

/// Non-root subtrees that do not hold the constructor.
pub(crate) fn movable(program: &AlgorithmProgram) -> Vec<NodeRef> {
    let arena = program.arena();
    program
        .enumerate_nodes()
        .into_iter()
        .filter(|e| e.parent.is_some() && !arena.subtree_contains(e.id, NodeKind::Constructive))
        .collect()
}

fn point(
    program: &AlgorithmProgram,
    generator: &Generator<'_>,
    rng: &mut GaaRng,
) -> Option<AlgorithmProgram> {
    let targets: Vec<NodeRef> = program
        .enumerate_nodes()
        .into_iter()
        .filter(|e| program.node(e.id).kind().is_action())
        .collect();
    let target = pick(&targets, rng)?;
    let node = program.node(target.id);
    let (family, current) = match node {
        Node::Repair(None) => (OperatorFamily::Repair, None),
        other => {
            let (family, key) = other.operator()?;
            (family, Some(key))
        }
    };
    let keys: Vec<&str> = generator
        .registry()
        .keys(family)
        .into_iter()
        .filter(|k| Some(*k) != current)
        .collect();
    let replacement = match pick(&keys, rng) {
        Some(key) => node.with_operator(key)?,
        None if matches!(node, Node::Repair(Some(_))) => Node::Repair(None),
        None => return None,
    };
    program.replace_node(target.id, replacement).ok()
}

fn subtree_regen(
    program: &AlgorithmProgram,
    generator: &Generator<'_>,
    rng: &mut GaaRng,
) -> Option<AlgorithmProgram> {
    let target = pick(&movable(program), rng)?;
    let ty = program.node(target.id).kind().output_type();
    let budget = program.caps().max_depth.saturating_sub(target.depth - 1);
    if budget == 0 {
        return None;
    }
    let fresh = generator.sample_subtree(ty, budget, rng);
    program.replace_at(&target, &fresh).ok()
}

fn insert_while(
    program: &AlgorithmProgram,
    generator: &Generator<'_>,
    rng: &mut GaaRng,
) -> Option<AlgorithmProgram> {
    let targets: Vec<NodeRef> = movable(program)
        .into_iter()
        .filter(|e| program.node(e.id).kind().output_type() == ValueType::SolutionTransform)
        .collect();
    let target = pick(&targets, rng)?;
    let body_tree = program.arena().extract(target.id);

    let mut b = TreeBuilder::new();
    let cond = b.push(generator.sample_condition(rng));
    let body = b.push_arena(&body_tree);
    let wrapped = b.while_loop(cond, body, generator.sample_loop_bound(rng));
    program.replace_at(&target, &b.build(wrapped)).ok()
}

fn delete(program: &AlgorithmProgram, rng: &mut GaaRng) -> Option<AlgorithmProgram> {
    let arena = program.arena();
    let targets: Vec<NodeRef> = movable(program)
        .into_iter()
        .filter(|e| arena.node(e.id).kind().is_control())
        .collect();
    let target = pick(&targets, rng)?;
    let survivors: Vec<_> = arena
        .node(target.id)
        .children()
        .into_iter()
        .map(|(_, c)| c)
        .filter(|c| arena.node(*c).kind().output_type() == ValueType::SolutionTransform)
        .collect();
    let keep = pick(&survivors, rng)?;
    program.replace_at(&target, &arena.extract(keep)).ok()
}

fn param_jitter(
    program: &AlgorithmProgram,
    limits: &GrammarLimits,
    rng: &mut GaaRng,
) -> Option<AlgorithmProgram> {
    let targets: Vec<NodeRef> = program
        .enumerate_nodes()
        .into_iter()
        .filter(|e| program.node(e.id).has_numeric_param())
        .collect();
    let target = pick(&targets, rng)?;
    let bound = |param: Param| {
        let (lo, hi) = limits.range(param);
        (lo as u64, hi as u64)
    };
    let to_u32 = |v: u64| u32::try_from(v).unwrap_or(u32::MAX);

    let jittered = match program.node(target.id).clone() {
        Node::While {
            cond,
            body,
            max_iter,
        } => {
            let (lo, hi) = bound(Param::LoopIterations);
            Node::While {
                cond,
                body,
                max_iter: to_u32(nudge(max_iter as u64, lo, hi, rng)),
            }
        }
        Node::For { n, body } => {
            let (lo, hi) = bound(Param::RepeatCount);
            Node::For {
                n: to_u32(nudge(n as u64, lo, hi, rng)),
                body,
            }
        }
        Node::StagnationCount(k) => {
            let (lo, hi) = bound(Param::StagnationThreshold);
            Node::StagnationCount(to_u32(nudge(k as u64, lo, hi, rng)))
        }
        Node::TimeLimit(ms) => {
            let (lo, hi) = bound(Param::TimeLimitMs);
            Node::TimeLimit(nudge(ms, lo, hi, rng))
        }
        Node::LocalSearch { op, max_iter } => {
            let (lo, hi) = bound(Param::LocalSearchIterations);
            let next = match max_iter {
                Some(m) => nudge(m as u64, lo, hi, rng),
                None => rng.random_range(lo..=hi.min(100).max(lo)),
            };
            Node::LocalSearch {
                op,
                max_iter: Some(to_u32(next)),
            }
        }
        Node::Perturbation { op, intensity } => {
            // whole percents, like the generator
            let next = match intensity {
                Some(x) => nudge((x.clamp(0.0, 1.0) * 100.0).round() as u64, 0, 100, rng),
                None => rng.random_range(5..=50),
            };
            Node::Perturbation {
                op,
                intensity: Some(next as f64 / 100.0),
            }
        }
        _ => return None,
    };
    if &jittered == program.node(target.id) {
        return None;
    }
    program.replace_node(target.id, jittered).ok()
}

/// Moves `value` by a random step of up to a tenth of `[lo, hi]`, staying
/// inside the range.
fn nudge(value: u64, lo: u64, hi: u64, rng: &mut GaaRng) -> u64 {
    if hi <= lo {
        return lo;
    }
    let step = ((hi - lo) / 10).max(1);
    let delta = rng.random_range(1..=step);
    let up = if value <= lo {
        true
    } else if value >= hi {
        false
    } else {
        rng.random_bool(0.5)
    };
    if up {
        value.saturating_add(delta).min(hi)
    } else {
        value.saturating_sub(delta).max(lo)
    }
}

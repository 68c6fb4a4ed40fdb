//! Seeded sampling of well-typed programs.

use super::config::{GeneratorConfig, Strategy};
use super::repair::repair_arena;
use crate::ast::{AlgorithmProgram, Arena, Node, NodeId, SizeCaps, TreeBuilder};
use crate::grammar::{Grammar, GrammarError, ValueType};
use crate::random::{create_rng, weighted_index, GaaRng};
use crate::registry::{OperatorFamily, OperatorRegistry};
use rand::Rng;
use thiserror::Error;

/// Generation failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenError {
    #[error("registry has no {0} operators")]
    EmptyPool(OperatorFamily),
    #[error("no valid program after {attempts} attempts (last errors: {last:?})")]
    ExhaustedAttempts {
        attempts: usize,
        last: Vec<GrammarError>,
    },
    #[error("invalid generator configuration: {0}")]
    InvalidConfig(String),
}

/// Relative weights of LocalSearch, Perturbation and Repair leaves.
const ACTION_WEIGHTS: [f64; 3] = [0.45, 0.35, 0.20];

/// Relative weights of If, While, For and Seq interior nodes.
const CONTROL_WEIGHTS: [f64; 4] = [0.35, 0.25, 0.15, 0.25];

/// Samples [`AlgorithmProgram`]s that pass [`Grammar::validate`].
///
/// # Examples
///
/// ```
/// use u_gaa::domains::registry_for;
/// use u_gaa::generator::{Generator, GeneratorConfig};
/// use u_gaa::problem::ProblemFamily;
///
/// let registry = registry_for(ProblemFamily::GraphColoring).unwrap();
/// let generator = Generator::new(GeneratorConfig::default(), &registry).unwrap();
/// let a = generator.generate_seeded(42).unwrap();
/// let b = generator.generate_seeded(42).unwrap();
/// assert_eq!(a.to_pseudocode(), b.to_pseudocode());
/// ```
#[derive(Debug)]
pub struct Generator<'r> {
    config: GeneratorConfig,
    grammar: Grammar,
    registry: &'r OperatorRegistry,
}

impl<'r> Generator<'r> {
    pub fn new(config: GeneratorConfig, registry: &'r OperatorRegistry) -> Result<Self, GenError> {
        config.validate().map_err(GenError::InvalidConfig)?;
        if registry.pool_len(OperatorFamily::Constructive) == 0 {
            return Err(GenError::EmptyPool(OperatorFamily::Constructive));
        }
        if config.strategy == Strategy::FixedSkeleton {
            for pool in [OperatorFamily::LocalSearch, OperatorFamily::Perturbation] {
                if registry.pool_len(pool) == 0 {
                    return Err(GenError::EmptyPool(pool));
                }
            }
        }
        Ok(Self {
            grammar: Grammar::new(config.limits.clone()),
            config,
            registry,
        })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn registry(&self) -> &'r OperatorRegistry {
        self.registry
    }

    /// Draws a seed from `rng` and generates from it.
    pub fn generate(&self, rng: &mut GaaRng) -> Result<AlgorithmProgram, GenError> {
        self.generate_seeded(rng.random::<u64>())
    }

    /// Generates the `index`-th draw of a ramp.
    ///
    /// Under ramped half-and-half, consecutive indices visit every
    /// `(depth, grow | full)` shape in order before repeating. The drawn
    /// seed encodes the shape, so [`Self::generate_seeded`] on the header
    /// seed reproduces the program.
    pub fn generate_nth(&self, index: u64, rng: &mut GaaRng) -> Result<AlgorithmProgram, GenError> {
        let seed = match self.config.strategy {
            Strategy::RampedHalfAndHalf => {
                let slots = self.ramp_slots();
                let block = rng.random_range(0..u64::MAX / slots);
                block * slots + index % slots
            }
            Strategy::FixedSkeleton => rng.random::<u64>(),
        };
        self.generate_seeded(seed)
    }

    /// Generates the program determined by `seed`; the seed is recorded in
    /// the program header. Under ramped half-and-half, `seed` modulo the
    /// number of ramp shapes selects the target depth and grow or full.
    pub fn generate_seeded(&self, seed: u64) -> Result<AlgorithmProgram, GenError> {
        let mut rng = create_rng(seed);
        let caps = SizeCaps::from(&self.config.limits);
        let family = self.registry.problem_family();
        let mut last = Vec::new();

        for attempt in 0..self.config.max_attempts {
            let arena = match self.config.strategy {
                Strategy::RampedHalfAndHalf => {
                    let (depth, full) = self.ramp_shape(seed % self.ramp_slots());
                    self.ramped(depth, full, &mut rng)
                }
                Strategy::FixedSkeleton => self.skeleton(&mut rng),
            };
            let mut errors = self.grammar.validate_arena(&arena, self.registry);
            let arena = if !errors.is_empty() && errors.iter().all(GrammarError::is_repairable) {
                let repaired = repair_arena(&arena, &self.grammar, self.registry, &mut rng);
                errors = self.grammar.validate_arena(&repaired, self.registry);
                repaired
            } else {
                arena
            };
            if errors.is_empty() {
                if let Ok(program) = AlgorithmProgram::new(arena, family, seed, caps) {
                    return Ok(program);
                }
            }
            tracing::debug!(seed, attempt, errors = errors.len(), "generator draw rejected");
            last = errors;
        }
        Err(GenError::ExhaustedAttempts {
            attempts: self.config.max_attempts,
            last,
        })
    }

    /// A fresh subtree of type `ty` no deeper than `max_depth`, never
    /// containing a `Constructive` node.
    pub fn sample_subtree(&self, ty: ValueType, max_depth: usize, rng: &mut GaaRng) -> Arena {
        let mut b = TreeBuilder::new();
        let root = match ty {
            ValueType::Bool => self.condition(&mut b, rng),
            ValueType::SolutionTransform => self.transform(&mut b, max_depth.max(1), false, rng),
        };
        b.build(root)
    }

    /// A random condition leaf.
    pub fn sample_condition(&self, rng: &mut GaaRng) -> Node {
        let mut b = TreeBuilder::new();
        let id = self.condition(&mut b, rng);
        b.build(id).node(NodeId(0)).clone()
    }

    /// A uniformly drawn key of `family`'s pool.
    pub fn sample_operator(&self, family: OperatorFamily, rng: &mut GaaRng) -> Option<String> {
        let keys = self.registry.keys(family);
        if keys.is_empty() {
            None
        } else {
            Some(keys[rng.random_range(0..keys.len())].to_string())
        }
    }

    /// A `While` iteration cap within the configured loop cap.
    pub fn sample_loop_bound(&self, rng: &mut GaaRng) -> u32 {
        rng.random_range(1..=self.config.limits.loop_cap)
    }

    /// Two shapes, grow and full, per depth in `[min_depth, max_depth]`.
    fn ramp_slots(&self) -> u64 {
        let limits = &self.config.limits;
        2 * (limits.max_depth.saturating_sub(limits.min_depth) as u64 + 1)
    }

    /// Even slots grow, odd slots fill; depth rises every two slots.
    fn ramp_shape(&self, slot: u64) -> (usize, bool) {
        let depth = self.config.limits.min_depth + (slot / 2) as usize;
        (depth, slot % 2 == 1)
    }

    fn ramped(&self, depth: usize, full: bool, rng: &mut GaaRng) -> Arena {
        let limits = &self.config.limits;
        let mut b = TreeBuilder::new();
        let ctor = self.constructive(&mut b, rng);
        if depth == 1 || limits.max_seq_len < 2 {
            return b.build(ctor);
        }
        let bodies = if full {
            1
        } else {
            rng.random_range(1..limits.max_seq_len)
        };
        let mut children = vec![ctor];
        for _ in 0..bodies {
            children.push(self.transform(&mut b, depth - 1, full, rng));
        }
        let root = b.seq(children);
        b.build(root)
    }

    fn skeleton(&self, rng: &mut GaaRng) -> Arena {
        let mut b = TreeBuilder::new();
        let ctor = self.constructive(&mut b, rng);
        let cond = self.condition(&mut b, rng);
        let ls = self.local_search(&mut b, rng);
        let kick = self.perturbation(&mut b, rng);
        let branch = b.if_else(cond, ls, kick);
        let root = b.seq(vec![ctor, branch]);
        b.build(root)
    }

    /// A `SolutionTransform` subtree of depth at most `depth`. `full`
    /// keeps adding control nodes until the depth budget is spent.
    fn transform(&self, b: &mut TreeBuilder, depth: usize, full: bool, rng: &mut GaaRng) -> NodeId {
        if depth <= 1 || (!full && rng.random_bool(0.5)) {
            return self.action(b, rng);
        }
        let limits = &self.config.limits;
        match weighted_index(&CONTROL_WEIGHTS, rng).unwrap_or(0) {
            0 => {
                let cond = self.condition(b, rng);
                let then = self.transform(b, depth - 1, full, rng);
                if !full && rng.random_bool(0.5) {
                    let otherwise = self.transform(b, depth - 1, full, rng);
                    b.if_else(cond, then, otherwise)
                } else {
                    b.if_then(cond, then)
                }
            }
            1 => {
                let cond = self.condition(b, rng);
                let body = self.transform(b, depth - 1, full, rng);
                let max_iter = self.sample_loop_bound(rng);
                b.while_loop(cond, body, max_iter)
            }
            2 => {
                let body = self.transform(b, depth - 1, full, rng);
                let n = rng.random_range(1..=limits.loop_cap.min(5));
                b.for_loop(n, body)
            }
            _ => {
                let len = rng.random_range(1..=limits.max_seq_len.min(3));
                let children = (0..len)
                    .map(|_| self.transform(b, depth - 1, full, rng))
                    .collect();
                b.seq(children)
            }
        }
    }

    fn action(&self, b: &mut TreeBuilder, rng: &mut GaaRng) -> NodeId {
        let weights = [
            if self.registry.pool_len(OperatorFamily::LocalSearch) > 0 {
                ACTION_WEIGHTS[0]
            } else {
                0.0
            },
            if self.registry.pool_len(OperatorFamily::Perturbation) > 0 {
                ACTION_WEIGHTS[1]
            } else {
                0.0
            },
            ACTION_WEIGHTS[2],
        ];
        match weighted_index(&weights, rng).unwrap_or(2) {
            0 => self.local_search(b, rng),
            1 => self.perturbation(b, rng),
            _ => {
                let key = if rng.random_bool(0.5) {
                    self.sample_operator(OperatorFamily::Repair, rng)
                } else {
                    None
                };
                b.repair(key.as_deref())
            }
        }
    }

    fn constructive(&self, b: &mut TreeBuilder, rng: &mut GaaRng) -> NodeId {
        let key = self
            .sample_operator(OperatorFamily::Constructive, rng)
            .unwrap_or_default();
        b.constructive(&key)
    }

    fn local_search(&self, b: &mut TreeBuilder, rng: &mut GaaRng) -> NodeId {
        let key = self
            .sample_operator(OperatorFamily::LocalSearch, rng)
            .unwrap_or_default();
        let cap = self.config.limits.max_ls_iter.min(100);
        let max_iter = rng.random_range(1..=cap);
        b.local_search(&key, Some(max_iter))
    }

    fn perturbation(&self, b: &mut TreeBuilder, rng: &mut GaaRng) -> NodeId {
        let key = self
            .sample_operator(OperatorFamily::Perturbation, rng)
            .unwrap_or_default();
        // whole percents survive a decimal round trip exactly
        let intensity = rng.random_range(5..=50u32) as f64 / 100.0;
        b.perturbation(&key, Some(intensity))
    }

    fn condition(&self, b: &mut TreeBuilder, rng: &mut GaaRng) -> NodeId {
        let limits = &self.config.limits;
        let kinds = if self.config.time_conditions { 4 } else { 3 };
        match rng.random_range(0..kinds) {
            0 => b.improves(),
            1 => b.feasible(),
            2 => b.stagnation_count(rng.random_range(1..=limits.max_stagnation_k.min(10))),
            _ => b.time_limit(rng.random_range(1..=limits.max_time_limit_ms.min(1_000))),
        }
    }
}

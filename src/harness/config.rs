//! Flat run configuration.

use crate::eval::CostSignal;
use crate::generator::{GeneratorConfig, Strategy};
use crate::grammar::GrammarLimits;
use crate::interp::InterpreterConfig;
use crate::search::{Acceptance, SearchConfig};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Configuration errors, raised once before a run starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error("malformed configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Every knob of a run in one flat record.
///
/// Missing fields take their defaults when deserialized, so `{}` is a
/// valid configuration. The record is split into the component configs by
/// [`grammar_limits`](Self::grammar_limits),
/// [`generator_config`](Self::generator_config),
/// [`interpreter_config`](Self::interpreter_config) and
/// [`search_config`](Self::search_config).
///
/// # Examples
///
/// ```
/// use u_gaa::harness::GaaConfig;
///
/// let config = GaaConfig::from_json(r#"{ "max_iter": 50, "seed": 42, "T0": 10.0 }"#).unwrap();
/// assert_eq!(config.max_iter, 50);
/// assert_eq!(config.max_depth, 5);
/// assert_eq!(config.search_config().initial_temperature, 10.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaaConfig {
    // -- grammar --
    pub max_depth: usize,
    pub max_size: usize,
    pub min_depth: usize,
    pub max_seq_len: usize,
    /// Upper bound on loop parameters, also enforced by the interpreter.
    pub loop_cap: u32,

    // -- generator --
    pub strategy: Strategy,
    pub max_attempts: usize,
    pub time_conditions: bool,

    // -- outer search --
    pub pop_size: usize,
    pub elite_size: usize,
    pub p_crossover: f64,
    pub acceptance: Acceptance,
    #[serde(rename = "T0")]
    pub t0: f64,
    pub alpha: f64,
    pub restart_threshold: u64,
    pub max_iter: u64,
    /// Wall-clock limit of the whole search, in milliseconds.
    pub time_limit_ms: Option<u64>,
    pub mutation_attempts: usize,
    /// Global operator-invocation budget.
    pub max_evaluations: Option<u64>,
    /// Run seed; drawn at random (and recorded) when absent.
    pub seed: Option<u64>,

    // -- interpreter --
    pub stagnation_limit: u32,
    pub max_actions_per_interpret: u64,

    // -- evaluation --
    pub cost_signal: CostSignal,
    /// Instance ids to train on; empty selects every supplied instance.
    pub training_instances: Vec<String>,
    pub replicas_per_instance: usize,
}

impl Default for GaaConfig {
    fn default() -> Self {
        let limits = GrammarLimits::default();
        let generator = GeneratorConfig::default();
        let search = SearchConfig::default();
        let interp = InterpreterConfig::default();
        Self {
            max_depth: limits.max_depth,
            max_size: limits.max_size,
            min_depth: limits.min_depth,
            max_seq_len: limits.max_seq_len,
            loop_cap: limits.loop_cap,
            strategy: generator.strategy,
            max_attempts: generator.max_attempts,
            time_conditions: generator.time_conditions,
            pop_size: search.pop_size,
            elite_size: search.elite_size,
            p_crossover: search.p_crossover,
            acceptance: search.acceptance,
            t0: search.initial_temperature,
            alpha: search.alpha,
            restart_threshold: search.restart_threshold,
            max_iter: search.max_iter,
            time_limit_ms: None,
            mutation_attempts: search.mutation_attempts,
            max_evaluations: None,
            seed: None,
            stagnation_limit: interp.stagnation_limit,
            max_actions_per_interpret: interp.max_actions,
            cost_signal: CostSignal::default(),
            training_instances: Vec::new(),
            replicas_per_instance: 1,
        }
    }
}

impl GaaConfig {
    /// Parses a JSON configuration and validates it.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_max_iter(mut self, n: u64) -> Self {
        self.max_iter = n;
        self
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_acceptance(mut self, acceptance: Acceptance) -> Self {
        self.acceptance = acceptance;
        self
    }

    pub fn with_max_depth(mut self, d: usize) -> Self {
        self.max_depth = d;
        self
    }

    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = Some(ms);
        self
    }

    pub fn with_replicas(mut self, n: usize) -> Self {
        self.replicas_per_instance = n;
        self
    }

    pub fn with_training_instances(mut self, ids: Vec<String>) -> Self {
        self.training_instances = ids;
        self
    }

    pub fn grammar_limits(&self) -> GrammarLimits {
        GrammarLimits::default()
            .with_max_depth(self.max_depth)
            .with_min_depth(self.min_depth)
            .with_max_size(self.max_size)
            .with_max_seq_len(self.max_seq_len)
            .with_loop_cap(self.loop_cap)
    }

    pub fn generator_config(&self) -> GeneratorConfig {
        GeneratorConfig::default()
            .with_limits(self.grammar_limits())
            .with_strategy(self.strategy)
            .with_max_attempts(self.max_attempts)
            .with_time_conditions(self.time_conditions)
    }

    pub fn interpreter_config(&self) -> InterpreterConfig {
        InterpreterConfig::default()
            .with_loop_cap(self.loop_cap)
            .with_stagnation_limit(self.stagnation_limit)
            .with_max_actions(self.max_actions_per_interpret)
    }

    /// Search configuration; the seed is left unset when absent here.
    pub fn search_config(&self) -> SearchConfig {
        let mut config = SearchConfig::default()
            .with_pop_size(self.pop_size)
            .with_elite_size(self.elite_size)
            .with_p_crossover(self.p_crossover)
            .with_acceptance(self.acceptance)
            .with_initial_temperature(self.t0)
            .with_alpha(self.alpha)
            .with_restart_threshold(self.restart_threshold)
            .with_max_iter(self.max_iter)
            .with_mutation_attempts(self.mutation_attempts);
        if let Some(ms) = self.time_limit_ms {
            config = config.with_time_limit(Duration::from_millis(ms));
        }
        if let Some(n) = self.max_evaluations {
            config = config.with_max_evaluations(n);
        }
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        config
    }

    /// Validates every component projection.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field: &'static str| move |reason: String| ConfigError::Invalid { field, reason };
        self.generator_config().validate().map_err(invalid("grammar"))?;
        self.interpreter_config()
            .validate()
            .map_err(invalid("interpreter"))?;
        self.search_config().validate().map_err(invalid("search"))?;
        if self.replicas_per_instance == 0 {
            return Err(invalid("replicas_per_instance")(
                "at least one replica is required".into(),
            ));
        }
        if self.time_limit_ms == Some(0) {
            return Err(invalid("time_limit_ms")("must be positive".into()));
        }
        if self.max_evaluations == Some(0) {
            return Err(invalid("max_evaluations")("must be positive".into()));
        }
        Ok(())
    }
}

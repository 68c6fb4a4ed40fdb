//! Generator configuration.

use crate::grammar::GrammarLimits;
use serde::{Deserialize, Serialize};

/// Tree sampling strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Target depths cycle through `[min_depth, max_depth]`, alternating
    /// grown (leaves allowed early) and filled (controls until the target)
    /// trees at each depth.
    #[default]
    RampedHalfAndHalf,
    /// `Seq(Constructive, If(cond, LocalSearch, Perturbation))` with
    /// sampled terminals; every draw has the same shape and size.
    FixedSkeleton,
}

/// Configuration for [`super::Generator`].
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    /// Structural and parameter limits.
    pub limits: GrammarLimits,

    /// Sampling strategy.
    pub strategy: Strategy,

    /// Draws before giving up with [`super::GenError::ExhaustedAttempts`].
    pub max_attempts: usize,

    /// Whether `TimeLimit` conditions may be sampled.
    pub time_conditions: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            limits: GrammarLimits::default(),
            strategy: Strategy::default(),
            max_attempts: 50,
            time_conditions: false,
        }
    }
}

impl GeneratorConfig {
    pub fn with_limits(mut self, limits: GrammarLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_max_attempts(mut self, n: usize) -> Self {
        self.max_attempts = n;
        self
    }

    pub fn with_time_conditions(mut self, enabled: bool) -> Self {
        self.time_conditions = enabled;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        self.limits.validate()?;
        if self.max_attempts == 0 {
            return Err("max_attempts must be positive".into());
        }
        if self.strategy == Strategy::FixedSkeleton
            && (self.limits.max_depth < 3 || self.limits.max_size < 6)
        {
            return Err(format!(
                "fixed skeleton needs max_depth >= 3 and max_size >= 6, got {} and {}",
                self.limits.max_depth, self.limits.max_size
            ));
        }
        Ok(())
    }
}

//! Outer search configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Acceptance rule for candidate programs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Acceptance {
    /// Accept only lexicographically better children.
    #[default]
    Greedy,
    /// Accept better children; accept worse ones with probability
    /// `exp(-Δprimary / T)` under geometric cooling.
    Metropolis,
}

/// Configuration for [`super::SearchRunner`].
///
/// # Examples
///
/// ```
/// use u_gaa::search::{Acceptance, SearchConfig};
///
/// let config = SearchConfig::default()
///     .with_max_iter(200)
///     .with_acceptance(Acceptance::Metropolis)
///     .with_initial_temperature(50.0)
///     .with_elite_size(6)
///     .with_seed(42);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    /// Programs drawn at start; the best becomes the incumbent.
    pub pop_size: usize,

    /// Capacity of the elite set used as crossover donors.
    pub elite_size: usize,

    /// Probability of proposing by crossover instead of mutation.
    pub p_crossover: f64,

    pub acceptance: Acceptance,

    /// Initial Metropolis temperature.
    pub initial_temperature: f64,

    /// Geometric cooling factor in (0, 1), applied once per iteration.
    pub alpha: f64,

    /// Iterations without a new best before the incumbent is redrawn.
    pub restart_threshold: u64,

    /// Outer iterations. 0 evaluates the initial population only.
    pub max_iter: u64,

    /// Wall-clock limit for the whole search.
    pub time_limit: Option<Duration>,

    /// Global operator-invocation budget shared by all interpretations.
    pub max_evaluations: Option<u64>,

    /// Proposals tried per iteration before it is counted as rejected.
    pub mutation_attempts: usize,

    /// Random seed for reproducibility.
    pub seed: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            pop_size: 1,
            elite_size: 4,
            p_crossover: 0.0,
            acceptance: Acceptance::Greedy,
            initial_temperature: 100.0,
            alpha: 0.95,
            restart_threshold: 50,
            max_iter: 100,
            time_limit: None,
            max_evaluations: None,
            mutation_attempts: 20,
            seed: None,
        }
    }
}

impl SearchConfig {
    pub fn with_pop_size(mut self, n: usize) -> Self {
        self.pop_size = n;
        self
    }

    pub fn with_elite_size(mut self, n: usize) -> Self {
        self.elite_size = n;
        self
    }

    pub fn with_p_crossover(mut self, p: f64) -> Self {
        self.p_crossover = p;
        self
    }

    pub fn with_acceptance(mut self, acceptance: Acceptance) -> Self {
        self.acceptance = acceptance;
        self
    }

    pub fn with_initial_temperature(mut self, t: f64) -> Self {
        self.initial_temperature = t;
        self
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_restart_threshold(mut self, n: u64) -> Self {
        self.restart_threshold = n;
        self
    }

    pub fn with_max_iter(mut self, n: u64) -> Self {
        self.max_iter = n;
        self
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    pub fn with_max_evaluations(mut self, n: u64) -> Self {
        self.max_evaluations = Some(n);
        self
    }

    pub fn with_mutation_attempts(mut self, n: usize) -> Self {
        self.mutation_attempts = n;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.pop_size == 0 {
            return Err("pop_size must be positive".into());
        }
        if self.elite_size == 0 {
            return Err("elite_size must be positive".into());
        }
        if !(0.0..=1.0).contains(&self.p_crossover) {
            return Err(format!(
                "p_crossover must be in [0, 1], got {}",
                self.p_crossover
            ));
        }
        if self.initial_temperature <= 0.0 || !self.initial_temperature.is_finite() {
            return Err(format!(
                "initial_temperature must be positive, got {}",
                self.initial_temperature
            ));
        }
        if self.alpha <= 0.0 || self.alpha >= 1.0 {
            return Err(format!("alpha must be in (0, 1), got {}", self.alpha));
        }
        if self.restart_threshold == 0 {
            return Err("restart_threshold must be positive".into());
        }
        if self.mutation_attempts == 0 {
            return Err("mutation_attempts must be positive".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = SearchConfig::default();
        assert_eq!(c.pop_size, 1);
        assert_eq!(c.elite_size, 4);
        assert_eq!(c.p_crossover, 0.0);
        assert_eq!(c.acceptance, Acceptance::Greedy);
        assert_eq!(c.initial_temperature, 100.0);
        assert_eq!(c.alpha, 0.95);
        assert_eq!(c.restart_threshold, 50);
        assert_eq!(c.mutation_attempts, 20);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        assert!(SearchConfig::default().with_alpha(1.0).validate().is_err());
        assert!(SearchConfig::default().with_alpha(0.0).validate().is_err());
        assert!(SearchConfig::default().with_p_crossover(1.5).validate().is_err());
        assert!(SearchConfig::default().with_elite_size(0).validate().is_err());
        assert!(SearchConfig::default()
            .with_initial_temperature(0.0)
            .validate()
            .is_err());
        assert!(SearchConfig::default().with_max_iter(0).validate().is_ok());
    }
}

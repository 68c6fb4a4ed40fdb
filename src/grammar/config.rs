//! Grammar limits and parameter ranges.

/// A bounded numeric node parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Param {
    /// `While.max_iter`
    LoopIterations,
    /// `For.n`
    RepeatCount,
    /// `StagnationCount.k`
    StagnationThreshold,
    /// `TimeLimit.t` in milliseconds
    TimeLimitMs,
    /// `LocalSearch.max_iter`
    LocalSearchIterations,
    /// `Perturbation.intensity`
    Intensity,
}

impl Param {
    pub fn name(self) -> &'static str {
        match self {
            Param::LoopIterations => "max_iter",
            Param::RepeatCount => "n",
            Param::StagnationThreshold => "k",
            Param::TimeLimitMs => "t_ms",
            Param::LocalSearchIterations => "max_iter",
            Param::Intensity => "intensity",
        }
    }
}

/// Structural and parameter limits enforced by [`super::Grammar::validate`].
///
/// # Examples
///
/// ```
/// use u_gaa::grammar::GrammarLimits;
///
/// let limits = GrammarLimits::default()
///     .with_max_depth(4)
///     .with_max_size(15)
///     .with_loop_cap(10);
/// assert!(limits.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct GrammarLimits {
    /// Maximum root-to-leaf node count.
    pub max_depth: usize,

    /// Minimum target depth for ramped generation.
    pub min_depth: usize,

    /// Maximum total node count.
    pub max_size: usize,

    /// Upper bound on `While.max_iter` and `For.n`.
    pub loop_cap: u32,

    /// Maximum number of children of a `Seq`.
    pub max_seq_len: usize,

    /// Upper bound on `StagnationCount.k`.
    pub max_stagnation_k: u32,

    /// Upper bound on `TimeLimit.t` (ms).
    pub max_time_limit_ms: u64,

    /// Upper bound on `LocalSearch.max_iter`.
    pub max_ls_iter: u32,
}

impl Default for GrammarLimits {
    fn default() -> Self {
        Self {
            max_depth: 5,
            min_depth: 2,
            max_size: 25,
            loop_cap: 20,
            max_seq_len: 4,
            max_stagnation_k: 50,
            max_time_limit_ms: 60_000,
            max_ls_iter: 1_000,
        }
    }
}

impl GrammarLimits {
    pub fn with_max_depth(mut self, d: usize) -> Self {
        self.max_depth = d;
        self
    }

    pub fn with_min_depth(mut self, d: usize) -> Self {
        self.min_depth = d;
        self
    }

    pub fn with_max_size(mut self, s: usize) -> Self {
        self.max_size = s;
        self
    }

    pub fn with_loop_cap(mut self, cap: u32) -> Self {
        self.loop_cap = cap;
        self
    }

    pub fn with_max_seq_len(mut self, n: usize) -> Self {
        self.max_seq_len = n;
        self
    }

    /// Inclusive `[min, max]` range of a parameter.
    pub fn range(&self, param: Param) -> (f64, f64) {
        match param {
            Param::LoopIterations | Param::RepeatCount => (1.0, self.loop_cap as f64),
            Param::StagnationThreshold => (1.0, self.max_stagnation_k as f64),
            Param::TimeLimitMs => (1.0, self.max_time_limit_ms as f64),
            Param::LocalSearchIterations => (1.0, self.max_ls_iter as f64),
            Param::Intensity => (0.0, 1.0),
        }
    }

    /// Whether `value` lies in the declared range of `param`.
    pub fn in_range(&self, param: Param, value: f64) -> bool {
        let (lo, hi) = self.range(param);
        value.is_finite() && value >= lo && value <= hi
    }

    /// Validates the limits.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_depth == 0 {
            return Err("max_depth must be positive".into());
        }
        if self.min_depth == 0 || self.min_depth > self.max_depth {
            return Err(format!(
                "min_depth must be in [1, max_depth={}], got {}",
                self.max_depth, self.min_depth
            ));
        }
        if self.max_size == 0 {
            return Err("max_size must be positive".into());
        }
        if self.loop_cap == 0 {
            return Err("loop_cap must be positive".into());
        }
        if self.max_seq_len == 0 {
            return Err("max_seq_len must be positive".into());
        }
        if self.max_stagnation_k == 0 || self.max_time_limit_ms == 0 || self.max_ls_iter == 0 {
            return Err("parameter caps must be positive".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let limits = GrammarLimits::default();
        assert_eq!(limits.max_depth, 5);
        assert_eq!(limits.max_size, 25);
        assert_eq!(limits.min_depth, 2);
        assert!(limits.validate().is_ok());
    }

    #[test]
    fn test_validate_min_depth() {
        let limits = GrammarLimits::default().with_max_depth(3).with_min_depth(4);
        assert!(limits.validate().is_err());
        let limits = GrammarLimits::default().with_min_depth(0);
        assert!(limits.validate().is_err());
    }

    #[test]
    fn test_validate_zero_caps() {
        assert!(GrammarLimits::default().with_loop_cap(0).validate().is_err());
        assert!(GrammarLimits::default().with_max_size(0).validate().is_err());
        assert!(GrammarLimits::default().with_max_seq_len(0).validate().is_err());
    }

    #[test]
    fn test_ranges() {
        let limits = GrammarLimits::default().with_loop_cap(8);
        assert_eq!(limits.range(Param::LoopIterations), (1.0, 8.0));
        assert!(limits.in_range(Param::Intensity, 0.0));
        assert!(limits.in_range(Param::Intensity, 1.0));
        assert!(!limits.in_range(Param::Intensity, 1.01));
        assert!(!limits.in_range(Param::Intensity, f64::NAN));
        assert!(!limits.in_range(Param::RepeatCount, 0.0));
    }
}

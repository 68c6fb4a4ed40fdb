//! Hierarchical fitness.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A `(primary, secondary, tertiary)` triple compared lexicographically,
/// lower is better.
///
/// Equality and ordering use [`f64::total_cmp`] so fitness values can be
/// sorted and used as keys without special-casing NaN.
///
/// # Examples
///
/// ```
/// use u_gaa::eval::Fitness;
///
/// let a = Fitness::new(3.0, 0.0, 40.0);
/// let b = Fitness::new(3.0, 1.0, 10.0);
/// assert!(a < b);
/// assert!(b < Fitness::worst());
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Fitness {
    /// Mean penalized primary objective.
    pub primary: f64,
    /// Mean secondary objective, breaks primary ties.
    pub secondary: f64,
    /// Mean cost signal, last tie-break.
    pub tertiary: f64,
}

impl Fitness {
    pub fn new(primary: f64, secondary: f64, tertiary: f64) -> Self {
        Self {
            primary,
            secondary,
            tertiary,
        }
    }

    /// Sentinel assigned to programs whose every replica faulted.
    pub fn worst() -> Self {
        Self::new(f64::INFINITY, f64::INFINITY, f64::INFINITY)
    }

    pub fn is_worst(&self) -> bool {
        self.primary == f64::INFINITY
    }

    /// Strictly better (lexicographically smaller).
    pub fn is_better_than(&self, other: &Fitness) -> bool {
        self < other
    }
}

impl PartialEq for Fitness {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Fitness {}

impl PartialOrd for Fitness {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Fitness {
    fn cmp(&self, other: &Self) -> Ordering {
        self.primary
            .total_cmp(&other.primary)
            .then_with(|| self.secondary.total_cmp(&other.secondary))
            .then_with(|| self.tertiary.total_cmp(&other.tertiary))
    }
}

/// What the tertiary fitness component measures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostSignal {
    /// Mean operator invocations per interpretation (deterministic).
    #[default]
    Evaluations,
    /// Mean wall-clock milliseconds per interpretation.
    WallTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lexicographic_order() {
        let base = Fitness::new(2.0, 5.0, 9.0);
        assert!(Fitness::new(1.0, 99.0, 99.0) < base);
        assert!(Fitness::new(2.0, 4.0, 99.0) < base);
        assert!(Fitness::new(2.0, 5.0, 8.0) < base);
        assert_eq!(Fitness::new(2.0, 5.0, 9.0), base);
        assert!(!base.is_better_than(&base));
    }

    #[test]
    fn test_worst_sentinel() {
        let w = Fitness::worst();
        assert!(w.is_worst());
        assert!(Fitness::new(1.0e12, 0.0, 0.0) < w);
        assert!(!Fitness::new(0.0, 0.0, 0.0).is_worst());
    }

    #[test]
    fn test_sorting() {
        let mut v = [
            Fitness::new(3.0, 0.0, 0.0),
            Fitness::worst(),
            Fitness::new(1.0, 2.0, 0.0),
            Fitness::new(1.0, 1.0, 5.0),
        ];
        v.sort();
        assert_eq!(v[0], Fitness::new(1.0, 1.0, 5.0));
        assert!(v[3].is_worst());
    }
}

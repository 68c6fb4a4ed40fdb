//! Convergence traces.

use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// One outer-search observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConvergencePoint {
    pub iteration: u64,
    pub elapsed_ms: f64,
    pub primary_best_so_far: f64,
    pub secondary_best_so_far: f64,
    /// Whether the candidate of this iteration was accepted.
    pub accepted: bool,
}

/// Best-so-far trajectory of a search, one point per iteration.
///
/// Iterations strictly increase. The recorded best never gets worse: a
/// point whose best is lexicographically worse than its predecessor is
/// clamped to the predecessor's values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceTrace {
    points: Vec<ConvergencePoint>,
}

impl ConvergenceTrace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a point. Points with a non-increasing iteration are ignored.
    pub fn record(&mut self, mut point: ConvergencePoint) {
        if let Some(last) = self.points.last() {
            if point.iteration <= last.iteration {
                return;
            }
            let worse = point.primary_best_so_far > last.primary_best_so_far
                || (point.primary_best_so_far == last.primary_best_so_far
                    && point.secondary_best_so_far > last.secondary_best_so_far);
            if worse {
                point.primary_best_so_far = last.primary_best_so_far;
                point.secondary_best_so_far = last.secondary_best_so_far;
            }
        }
        self.points.push(point);
    }

    pub fn points(&self) -> &[ConvergencePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Option<&ConvergencePoint> {
        self.points.last()
    }

    /// Every field except `elapsed_ms`, one line per point.
    ///
    /// Two runs with the same seed and inputs produce identical
    /// fingerprints; wall time is the only field that may differ.
    pub fn fingerprint(&self) -> String {
        let mut out = String::with_capacity(self.points.len() * 48);
        for p in &self.points {
            let _ = writeln!(
                out,
                "{} {:016x} {:016x} {}",
                p.iteration,
                p.primary_best_so_far.to_bits(),
                p.secondary_best_so_far.to_bits(),
                u8::from(p.accepted)
            );
        }
        out
    }
}

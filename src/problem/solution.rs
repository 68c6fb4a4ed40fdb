//! Mutable per-run solution state.
//!
//! A [`Solution`] pairs an [`Assignment`] with its [`Objectives`]. The only
//! way to obtain a `Solution` is through [`Solution::new`] or
//! [`Solution::empty`], both of which evaluate the assignment, so the
//! cached feasibility and objective values always match the assignment
//! that crosses a component boundary.

use super::types::{Problem, ProblemFamily};
use crate::domains;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Penalty added to the primary objective of an infeasible state.
///
/// Problem-independent and uniform across families.
pub const INFEASIBLE_PENALTY: f64 = 1.0e6;

/// Raw decision variables, one variant per problem kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Assignment {
    /// Vertex → color; `None` means uncolored.
    Coloring(Vec<Option<usize>>),
    /// Item → packed.
    Selection(Vec<bool>),
    /// Giant tour of customer ids delimited by the depot (0), e.g. `[0, 2, 1, 0, 3, 0]`.
    Routing(Vec<usize>),
}

impl Assignment {
    /// The unassigned starting point for `problem`.
    pub fn empty_for(problem: &Problem) -> Self {
        match problem.family() {
            ProblemFamily::GraphColoring => {
                let n = problem.graph().map_or(0, |g| g.num_vertices());
                Assignment::Coloring(vec![None; n])
            }
            ProblemFamily::Knapsack => {
                let n = problem.knapsack_data().map_or(0, |k| k.items.len());
                Assignment::Selection(vec![false; n])
            }
            ProblemFamily::Vrptw => Assignment::Routing(vec![0]),
        }
    }

    pub fn family(&self) -> ProblemFamily {
        match self {
            Assignment::Coloring(_) => ProblemFamily::GraphColoring,
            Assignment::Selection(_) => ProblemFamily::Knapsack,
            Assignment::Routing(_) => ProblemFamily::Vrptw,
        }
    }
}

/// A single constraint violation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    Uncolored { vertex: usize },
    Conflict { u: usize, v: usize },
    Overweight { excess: u64 },
    Unvisited { customer: usize },
    DuplicateVisit { customer: usize },
    UnknownCustomer { customer: usize },
    CapacityExceeded { route: usize, load: u64 },
    LateArrival { customer: usize, arrival: f64, due: f64 },
    /// The assignment does not match the problem family or dimensions.
    Malformed { reason: String },
}

/// Cached derived fields of an assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Objectives {
    pub feasible: bool,
    pub primary: f64,
    pub secondary: f64,
    pub violations: Vec<Violation>,
}

impl Objectives {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self {
            feasible: false,
            primary: 0.0,
            secondary: 0.0,
            violations: vec![Violation::Malformed {
                reason: reason.into(),
            }],
        }
    }
}

/// An evaluated assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    assignment: Assignment,
    objectives: Objectives,
}

impl Solution {
    /// Evaluates `assignment` against `problem`.
    pub fn new(problem: &Problem, assignment: Assignment) -> Self {
        let objectives = domains::evaluate(problem, &assignment);
        Self {
            assignment,
            objectives,
        }
    }

    /// The unassigned starting state.
    pub fn empty(problem: &Problem) -> Self {
        Self::new(problem, Assignment::empty_for(problem))
    }

    pub fn assignment(&self) -> &Assignment {
        &self.assignment
    }

    /// Releases the assignment for editing; rebuild with [`Solution::new`].
    pub fn into_assignment(self) -> Assignment {
        self.assignment
    }

    pub fn objectives(&self) -> &Objectives {
        &self.objectives
    }

    pub fn is_feasible(&self) -> bool {
        self.objectives.feasible
    }

    pub fn primary(&self) -> f64 {
        self.objectives.primary
    }

    pub fn secondary(&self) -> f64 {
        self.objectives.secondary
    }

    pub fn violations(&self) -> &[Violation] {
        &self.objectives.violations
    }

    /// Primary plus [`INFEASIBLE_PENALTY`] when infeasible.
    pub fn penalized_primary(&self) -> f64 {
        if self.objectives.feasible {
            self.objectives.primary
        } else {
            self.objectives.primary + INFEASIBLE_PENALTY
        }
    }

    /// Lexicographic comparison on `(penalized primary, secondary)`.
    pub fn compare(&self, other: &Solution) -> Ordering {
        self.penalized_primary()
            .total_cmp(&other.penalized_primary())
            .then_with(|| self.secondary().total_cmp(&other.secondary()))
    }

    /// Strictly better under [`Solution::compare`].
    pub fn is_better_than(&self, other: &Solution) -> bool {
        self.compare(other) == Ordering::Less
    }
}

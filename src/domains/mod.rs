//! Reference problem layer.
//!
//! Objective evaluation for the three supported families and a small stock
//! of operators per family, enough to drive the engine end to end:
//!
//! - **Graph coloring** ([`gcp`]): greedy, DSATUR and Welsh-Powell
//!   constructors; min-conflicts and color-class elimination; recolor and
//!   class-merge kicks; greedy repair.
//! - **0/1 knapsack** ([`kbp`]): ratio/value/random greedy fills; residual
//!   fill and exchange search; drop and flip kicks; drop-worst repair.
//! - **VRPTW** ([`vrptw`]): nearest-neighbour and cheapest-insertion
//!   constructors; 2-opt and relocate; swap and split kicks; reinsertion
//!   repair.

pub mod gcp;
pub mod kbp;
pub mod vrptw;

use crate::problem::{Assignment, Objectives, Problem, ProblemData, ProblemFamily, Solution};
use crate::registry::{OperatorFault, OperatorRegistry, RegistryBuilder, RegistryError};

pub(crate) type OperatorResult = Result<Solution, OperatorFault>;

/// Computes feasibility, objectives and violations of `assignment`.
pub fn evaluate(problem: &Problem, assignment: &Assignment) -> Objectives {
    match (problem.data(), assignment) {
        (ProblemData::Graph(g), Assignment::Coloring(colors)) => gcp::evaluate(g, colors),
        (ProblemData::Knapsack(k), Assignment::Selection(selected)) => kbp::evaluate(k, selected),
        (ProblemData::Routing(r), Assignment::Routing(tour)) => match problem.matrix() {
            Some(m) => vrptw::evaluate(r, m, tour),
            None => Objectives::malformed("routing instance has no distance matrix"),
        },
        _ => Objectives::malformed(format!(
            "{} assignment for a {} instance",
            assignment.family(),
            problem.family()
        )),
    }
}

/// Builds the reference registry of `family`.
pub fn registry_for(family: ProblemFamily) -> Result<OperatorRegistry, RegistryError> {
    let mut builder = RegistryBuilder::new(family);
    match family {
        ProblemFamily::GraphColoring => gcp::register(&mut builder)?,
        ProblemFamily::Knapsack => kbp::register(&mut builder)?,
        ProblemFamily::Vrptw => vrptw::register(&mut builder)?,
    }
    builder.build()
}

/// Number of elementary moves for a kick of the given intensity.
pub(crate) fn moves_for(count: usize, intensity: f64) -> usize {
    ((count as f64 * intensity).ceil() as usize).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::OperatorFamily;

    #[test]
    fn test_every_family_has_all_pools() {
        for family in [
            ProblemFamily::GraphColoring,
            ProblemFamily::Knapsack,
            ProblemFamily::Vrptw,
        ] {
            let r = registry_for(family).unwrap();
            assert_eq!(r.problem_family(), family);
            for pool in OperatorFamily::ALL {
                assert!(r.pool_len(pool) > 0, "{family} {pool}");
            }
            assert!(r.default_repair().is_some());
        }
    }

    #[test]
    fn test_gcp_keys() {
        let r = registry_for(ProblemFamily::GraphColoring).unwrap();
        assert_eq!(
            r.keys(OperatorFamily::Constructive),
            vec!["dsatur", "greedy", "random_greedy", "welsh_powell"]
        );
    }

    #[test]
    fn test_moves_for() {
        assert_eq!(moves_for(10, 0.2), 2);
        assert_eq!(moves_for(10, 0.0), 1);
        assert_eq!(moves_for(3, 0.3), 1);
        assert_eq!(moves_for(3, 1.0), 3);
    }
}

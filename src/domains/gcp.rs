//! Graph coloring: evaluation and reference operators.
//!
//! Primary objective is the number of distinct colors; secondary is the
//! number of violations (conflicting edges plus uncolored vertices).

use super::{moves_for, OperatorResult};
use crate::problem::{Assignment, Graph, Objectives, Problem, Solution, Violation};
use crate::random::{shuffle, GaaRng};
use crate::registry::{
    OpParams, OperatorDescriptor, OperatorFamily, OperatorFault, RegistryBuilder, RegistryError,
};
use rand::Rng;
use std::collections::BTreeSet;

/// Scores a vertex → color assignment.
pub fn evaluate(graph: &Graph, colors: &[Option<usize>]) -> Objectives {
    if colors.len() != graph.num_vertices() {
        return Objectives::malformed(format!(
            "coloring has {} entries for {} vertices",
            colors.len(),
            graph.num_vertices()
        ));
    }
    let mut violations = Vec::new();
    for (vertex, c) in colors.iter().enumerate() {
        if c.is_none() {
            violations.push(Violation::Uncolored { vertex });
        }
    }
    for &(u, v) in graph.edges() {
        if let (Some(a), Some(b)) = (colors[u], colors[v]) {
            if a == b {
                violations.push(Violation::Conflict { u, v });
            }
        }
    }
    let used: BTreeSet<usize> = colors.iter().flatten().copied().collect();
    Objectives {
        feasible: violations.is_empty(),
        primary: used.len() as f64,
        secondary: violations.len() as f64,
        violations,
    }
}

pub(crate) fn register(b: &mut RegistryBuilder) -> Result<(), RegistryError> {
    use OperatorFamily::*;
    b.register(Constructive, "greedy", OperatorDescriptor::new(greedy))?
        .register(Constructive, "welsh_powell", OperatorDescriptor::new(welsh_powell))?
        .register(Constructive, "dsatur", OperatorDescriptor::new(dsatur))?
        .register(
            Constructive,
            "random_greedy",
            OperatorDescriptor::new(random_greedy).with_stochastic(true),
        )?
        .register(
            LocalSearch,
            "min_conflicts",
            OperatorDescriptor::new(min_conflicts)
                .with_stochastic(true)
                .with_infeasible_output(true),
        )?
        .register(
            LocalSearch,
            "class_elimination",
            OperatorDescriptor::new(class_elimination),
        )?
        .register(
            Perturbation,
            "random_recolor",
            OperatorDescriptor::new(random_recolor)
                .with_stochastic(true)
                .with_infeasible_output(true),
        )?
        .register(
            Perturbation,
            "class_merge",
            OperatorDescriptor::new(class_merge)
                .with_stochastic(true)
                .with_infeasible_output(true),
        )?
        .register(Repair, "greedy_repair", OperatorDescriptor::new(greedy_repair))?
        .default_repair("greedy_repair");
    Ok(())
}

fn graph_of(problem: &Problem) -> Result<&Graph, OperatorFault> {
    problem
        .graph()
        .ok_or_else(|| OperatorFault::new("graph coloring operator applied to a non-graph problem"))
}

fn colors_of(state: &Solution, n: usize) -> Result<Vec<Option<usize>>, OperatorFault> {
    match state.assignment() {
        Assignment::Coloring(c) if c.len() == n => Ok(c.clone()),
        _ => Err(OperatorFault::new("state is not a coloring of this graph")),
    }
}

/// Smallest color not used by a colored neighbor of `v`.
fn smallest_free(graph: &Graph, colors: &[Option<usize>], v: usize) -> usize {
    let taken: BTreeSet<usize> = graph
        .neighbors(v)
        .iter()
        .filter_map(|&u| colors[u])
        .collect();
    (0..).find(|c| !taken.contains(c)).unwrap_or(0)
}

fn color_in_order(graph: &Graph, order: &[usize]) -> Vec<Option<usize>> {
    let mut colors = vec![None; graph.num_vertices()];
    for &v in order {
        colors[v] = Some(smallest_free(graph, &colors, v));
    }
    colors
}

/// Renumbers colors to `0..k` in order of first appearance.
fn compact(colors: &mut [Option<usize>]) {
    let mut map = std::collections::BTreeMap::new();
    for c in colors.iter_mut().flatten() {
        let next = map.len();
        *c = *map.entry(*c).or_insert(next);
    }
}

fn palette(colors: &[Option<usize>]) -> usize {
    colors.iter().flatten().max().map_or(1, |&m| m + 1)
}

fn greedy(problem: &Problem, _s: &Solution, _p: &OpParams, _rng: &mut GaaRng) -> OperatorResult {
    let graph = graph_of(problem)?;
    let order: Vec<usize> = (0..graph.num_vertices()).collect();
    Ok(Solution::new(
        problem,
        Assignment::Coloring(color_in_order(graph, &order)),
    ))
}

fn welsh_powell(
    problem: &Problem,
    _s: &Solution,
    _p: &OpParams,
    _rng: &mut GaaRng,
) -> OperatorResult {
    let graph = graph_of(problem)?;
    let mut order: Vec<usize> = (0..graph.num_vertices()).collect();
    order.sort_by(|&a, &b| graph.degree(b).cmp(&graph.degree(a)));
    Ok(Solution::new(
        problem,
        Assignment::Coloring(color_in_order(graph, &order)),
    ))
}

fn dsatur(problem: &Problem, _s: &Solution, _p: &OpParams, _rng: &mut GaaRng) -> OperatorResult {
    let graph = graph_of(problem)?;
    let n = graph.num_vertices();
    let mut colors: Vec<Option<usize>> = vec![None; n];
    for _ in 0..n {
        // max saturation, then max degree, then lowest index
        let next = (0..n)
            .filter(|&v| colors[v].is_none())
            .map(|v| {
                let sat = graph
                    .neighbors(v)
                    .iter()
                    .filter_map(|&u| colors[u])
                    .collect::<BTreeSet<_>>()
                    .len();
                (sat, graph.degree(v), std::cmp::Reverse(v))
            })
            .max();
        if let Some((_, _, std::cmp::Reverse(v))) = next {
            colors[v] = Some(smallest_free(graph, &colors, v));
        }
    }
    Ok(Solution::new(problem, Assignment::Coloring(colors)))
}

fn random_greedy(
    problem: &Problem,
    _s: &Solution,
    _p: &OpParams,
    rng: &mut GaaRng,
) -> OperatorResult {
    let graph = graph_of(problem)?;
    let mut order: Vec<usize> = (0..graph.num_vertices()).collect();
    shuffle(&mut order, rng);
    Ok(Solution::new(
        problem,
        Assignment::Coloring(color_in_order(graph, &order)),
    ))
}

fn conflicts_at(graph: &Graph, colors: &[Option<usize>], v: usize, c: usize) -> usize {
    graph
        .neighbors(v)
        .iter()
        .filter(|&&u| colors[u] == Some(c))
        .count()
}

/// Recolors conflicting vertices within the current palette, keeping the
/// best state seen.
fn min_conflicts(
    problem: &Problem,
    state: &Solution,
    params: &OpParams,
    rng: &mut GaaRng,
) -> OperatorResult {
    let graph = graph_of(problem)?;
    let mut colors = colors_of(state, graph.num_vertices())?;
    let k = palette(&colors);
    let mut best = state.clone();

    for _ in 0..params.max_iter_or(100) {
        let bad: Vec<usize> = (0..colors.len())
            .filter(|&v| match colors[v] {
                None => true,
                Some(c) => conflicts_at(graph, &colors, v, c) > 0,
            })
            .collect();
        if bad.is_empty() {
            break;
        }
        let v = bad[rng.random_range(0..bad.len())];
        let current = colors[v];
        // min-conflict color; on a tie with the current color, move
        let mut choice = current.unwrap_or(0);
        let mut fewest = usize::MAX;
        for c in 0..k {
            let n = conflicts_at(graph, &colors, v, c);
            if n < fewest || (n == fewest && Some(choice) == current) {
                fewest = n;
                choice = c;
            }
        }
        colors[v] = Some(choice);
        let candidate = Solution::new(problem, Assignment::Coloring(colors.clone()));
        if candidate.is_better_than(&best) {
            best = candidate;
        }
    }
    Ok(best)
}

/// Tries to empty whole color classes by moving their vertices to other
/// existing classes without creating conflicts.
fn class_elimination(
    problem: &Problem,
    state: &Solution,
    params: &OpParams,
    _rng: &mut GaaRng,
) -> OperatorResult {
    let graph = graph_of(problem)?;
    let mut colors = colors_of(state, graph.num_vertices())?;
    if !state.is_feasible() {
        return Ok(state.clone());
    }

    for _ in 0..params.max_iter_or(10) {
        let classes: BTreeSet<usize> = colors.iter().flatten().copied().collect();
        let mut by_size: Vec<(usize, usize)> = classes
            .iter()
            .map(|&c| (colors.iter().filter(|x| **x == Some(c)).count(), c))
            .collect();
        by_size.sort();

        let mut eliminated = false;
        for &(_, target) in &by_size {
            let mut trial = colors.clone();
            let ok = (0..trial.len())
                .filter(|&v| colors[v] == Some(target))
                .all(|v| {
                    let free = classes
                        .iter()
                        .copied()
                        .find(|&c| c != target && conflicts_at(graph, &trial, v, c) == 0);
                    trial[v] = free;
                    free.is_some()
                });
            if ok {
                colors = trial;
                eliminated = true;
                break;
            }
        }
        if !eliminated {
            break;
        }
    }
    compact(&mut colors);
    Ok(Solution::new(problem, Assignment::Coloring(colors)))
}

fn random_recolor(
    problem: &Problem,
    state: &Solution,
    params: &OpParams,
    rng: &mut GaaRng,
) -> OperatorResult {
    let graph = graph_of(problem)?;
    let mut colors = colors_of(state, graph.num_vertices())?;
    if colors.is_empty() {
        return Ok(state.clone());
    }
    let k = palette(&colors);
    for _ in 0..moves_for(colors.len(), params.intensity_or(0.2)) {
        let v = rng.random_range(0..colors.len());
        colors[v] = Some(rng.random_range(0..k));
    }
    Ok(Solution::new(problem, Assignment::Coloring(colors)))
}

/// Merges one random color class into another.
fn class_merge(
    problem: &Problem,
    state: &Solution,
    _p: &OpParams,
    rng: &mut GaaRng,
) -> OperatorResult {
    let graph = graph_of(problem)?;
    let mut colors = colors_of(state, graph.num_vertices())?;
    let classes: Vec<usize> = colors
        .iter()
        .flatten()
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    if classes.len() < 2 {
        return Ok(state.clone());
    }
    let from = classes[rng.random_range(0..classes.len())];
    let into = loop {
        let c = classes[rng.random_range(0..classes.len())];
        if c != from {
            break c;
        }
    };
    for c in colors.iter_mut() {
        if *c == Some(from) {
            *c = Some(into);
        }
    }
    compact(&mut colors);
    Ok(Solution::new(problem, Assignment::Coloring(colors)))
}

/// Uncolors one endpoint of every conflicting edge, then colors every
/// uncolored vertex with its smallest free color.
fn greedy_repair(
    problem: &Problem,
    state: &Solution,
    _p: &OpParams,
    _rng: &mut GaaRng,
) -> OperatorResult {
    let graph = graph_of(problem)?;
    let mut colors = colors_of(state, graph.num_vertices())?;
    for &(u, v) in graph.edges() {
        if colors[u].is_some() && colors[u] == colors[v] {
            colors[u.max(v)] = None;
        }
    }
    for v in 0..colors.len() {
        if colors[v].is_none() {
            colors[v] = Some(smallest_free(graph, &colors, v));
        }
    }
    Ok(Solution::new(problem, Assignment::Coloring(colors)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::create_rng;

    fn run(
        op: fn(&Problem, &Solution, &OpParams, &mut GaaRng) -> OperatorResult,
        p: &Problem,
        s: &Solution,
    ) -> Solution {
        op(p, s, &OpParams::default(), &mut create_rng(42)).unwrap()
    }

    fn cycle(n: usize) -> Problem {
        let edges: Vec<_> = (0..n).map(|i| (i, (i + 1) % n)).collect();
        Problem::graph_coloring("cycle", n, &edges).unwrap()
    }

    fn clique(n: usize) -> Problem {
        let mut edges = Vec::new();
        for u in 0..n {
            for v in u + 1..n {
                edges.push((u, v));
            }
        }
        Problem::graph_coloring("clique", n, &edges).unwrap()
    }

    // ---- Evaluation ----

    #[test]
    fn test_evaluate_counts_colors_and_conflicts() {
        let p = cycle(4);
        let g = p.graph().unwrap();
        let obj = evaluate(g, &[Some(0), Some(1), Some(0), Some(1)]);
        assert!(obj.feasible);
        assert_eq!(obj.primary, 2.0);
        let obj = evaluate(g, &[Some(0), Some(0), Some(0), None]);
        assert!(!obj.feasible);
        // edges (0,1),(1,2) conflict; vertex 3 uncolored
        assert_eq!(obj.secondary, 3.0);
        assert!(matches!(
            evaluate(g, &[Some(0)]).violations[0],
            Violation::Malformed { .. }
        ));
    }

    // ---- Constructive ----

    #[test]
    fn test_constructors_are_proper() {
        let p = cycle(5);
        let empty = Solution::empty(&p);
        for op in [greedy, welsh_powell, dsatur, random_greedy] {
            let s = run(op, &p, &empty);
            assert!(s.is_feasible());
            assert_eq!(s.primary(), 3.0);
        }
        let p = cycle(4);
        assert_eq!(run(dsatur, &p, &Solution::empty(&p)).primary(), 2.0);
        assert_eq!(run(greedy, &p, &Solution::empty(&p)).primary(), 2.0);
    }

    #[test]
    fn test_clique_needs_n_colors() {
        let p = clique(5);
        let s = run(dsatur, &p, &Solution::empty(&p));
        assert!(s.is_feasible());
        assert_eq!(s.primary(), 5.0);
    }

    // ---- Local search / perturbation / repair ----

    #[test]
    fn test_class_elimination_removes_redundant_class() {
        let p = cycle(4);
        let s = Solution::new(&p, Assignment::Coloring(vec![Some(0), Some(1), Some(2), Some(1)]));
        let out = run(class_elimination, &p, &s);
        assert!(out.is_feasible());
        assert_eq!(out.primary(), 2.0);
    }

    #[test]
    fn test_min_conflicts_never_worsens() {
        // star centred on 0; every recoloring move strictly reduces conflicts
        let p = Problem::graph_coloring("star", 5, &[(0, 1), (0, 2), (0, 3), (0, 4)]).unwrap();
        let s = Solution::new(
            &p,
            Assignment::Coloring(vec![Some(0), Some(0), Some(0), Some(0), Some(1)]),
        );
        let out = run(min_conflicts, &p, &s);
        assert!(!s.is_better_than(&out));
        assert!(out.secondary() < s.secondary());

        let feasible = run(greedy, &p, &Solution::empty(&p));
        assert_eq!(run(min_conflicts, &p, &feasible), feasible);
    }

    #[test]
    fn test_merge_then_repair() {
        let p = cycle(4);
        let s = run(greedy, &p, &Solution::empty(&p));
        let merged = run(class_merge, &p, &s);
        assert_eq!(merged.primary(), 1.0);
        assert!(!merged.is_feasible());
        let fixed = run(greedy_repair, &p, &merged);
        assert!(fixed.is_feasible());
    }

    #[test]
    fn test_recolor_is_seeded() {
        let p = cycle(8);
        let s = run(greedy, &p, &Solution::empty(&p));
        let a = random_recolor(&p, &s, &OpParams::default(), &mut create_rng(3)).unwrap();
        let b = random_recolor(&p, &s, &OpParams::default(), &mut create_rng(3)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_wrong_state_faults() {
        let p = cycle(3);
        let k = Problem::knapsack("k", 3, &[(1, 1)]).unwrap();
        let bad = Solution::empty(&k);
        assert!(min_conflicts(&p, &bad, &OpParams::default(), &mut create_rng(0)).is_err());
        assert!(greedy(&k, &bad, &OpParams::default(), &mut create_rng(0)).is_err());
    }
}

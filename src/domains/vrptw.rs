//! Vehicle routing with time windows: evaluation and reference operators.
//!
//! A state is a giant tour over customer ids with the depot (0) as route
//! delimiter, e.g. `[0, 3, 1, 0, 2, 0]`. Primary objective is the number
//! of non-empty routes, secondary is total travelled distance. Travel time
//! equals Euclidean distance; a vehicle waits when it arrives before the
//! ready time and is late when it arrives after the due date.

use super::{moves_for, OperatorResult};
use crate::problem::{
    Assignment, DistanceMatrix, Objectives, Problem, RoutingData, Solution, Violation,
};
use crate::random::GaaRng;
use crate::registry::{
    OpParams, OperatorDescriptor, OperatorFamily, OperatorFault, RegistryBuilder, RegistryError,
};
use rand::Rng;
use std::collections::BTreeSet;

const EPS: f64 = 1e-9;

/// Splits a giant tour into its non-empty routes.
pub fn routes_of(tour: &[usize]) -> Vec<Vec<usize>> {
    tour.split(|&c| c == 0)
        .filter(|r| !r.is_empty())
        .map(<[usize]>::to_vec)
        .collect()
}

/// Joins routes into a depot-delimited giant tour.
pub fn tour_of(routes: &[Vec<usize>]) -> Vec<usize> {
    let mut tour = vec![0];
    for route in routes.iter().filter(|r| !r.is_empty()) {
        tour.extend_from_slice(route);
        tour.push(0);
    }
    tour
}

/// Scores a giant tour.
pub fn evaluate(data: &RoutingData, matrix: &DistanceMatrix, tour: &[usize]) -> Objectives {
    if tour.first() != Some(&0) || tour.last() != Some(&0) {
        return Objectives::malformed("tour must start and end at the depot");
    }
    let n = data.customers.len();
    let depot = data.depot();
    let mut violations = Vec::new();
    let mut seen = vec![false; n];
    let mut distance = 0.0;
    let routes = routes_of(tour);

    for (r, route) in routes.iter().enumerate() {
        let mut load = 0u64;
        let mut time = depot.ready_time;
        let mut prev = 0;
        for &c in route {
            if c >= n {
                violations.push(Violation::UnknownCustomer { customer: c });
                continue;
            }
            if seen[c] {
                violations.push(Violation::DuplicateVisit { customer: c });
            }
            seen[c] = true;
            let cust = &data.customers[c];
            let leg = matrix.get(prev, c);
            distance += leg;
            load += cust.demand;
            let arrival = time + leg;
            if arrival > cust.due_date + EPS {
                violations.push(Violation::LateArrival {
                    customer: c,
                    arrival,
                    due: cust.due_date,
                });
            }
            time = arrival.max(cust.ready_time) + cust.service_time;
            prev = c;
        }
        let leg = matrix.get(prev, 0);
        distance += leg;
        if time + leg > depot.due_date + EPS {
            violations.push(Violation::LateArrival {
                customer: 0,
                arrival: time + leg,
                due: depot.due_date,
            });
        }
        if load > data.capacity {
            violations.push(Violation::CapacityExceeded { route: r, load });
        }
    }
    for (customer, &visited) in seen.iter().enumerate().skip(1) {
        if !visited {
            violations.push(Violation::Unvisited { customer });
        }
    }

    Objectives {
        feasible: violations.is_empty(),
        primary: routes.len() as f64,
        secondary: distance,
        violations,
    }
}

pub(crate) fn register(b: &mut RegistryBuilder) -> Result<(), RegistryError> {
    use OperatorFamily::*;
    b.register(
        Constructive,
        "nearest_neighbor",
        OperatorDescriptor::new(nearest_neighbor),
    )?
    .register(
        Constructive,
        "cheapest_insertion",
        OperatorDescriptor::new(cheapest_insertion),
    )?
    .register(LocalSearch, "two_opt", OperatorDescriptor::new(two_opt))?
    .register(LocalSearch, "relocate", OperatorDescriptor::new(relocate))?
    .register(
        Perturbation,
        "random_swap",
        OperatorDescriptor::new(random_swap)
            .with_stochastic(true)
            .with_infeasible_output(true),
    )?
    .register(
        Perturbation,
        "route_split",
        OperatorDescriptor::new(route_split).with_stochastic(true),
    )?
    .register(Repair, "reinsert", OperatorDescriptor::new(reinsert))?
    .default_repair("reinsert");
    Ok(())
}

/// Instance view shared by all routing operators.
struct Fleet<'a> {
    data: &'a RoutingData,
    matrix: &'a DistanceMatrix,
}

/// Feasibility and length of one route.
#[derive(Debug, Clone, Copy)]
struct RouteCheck {
    feasible: bool,
    distance: f64,
}

impl<'a> Fleet<'a> {
    fn of(problem: &'a Problem) -> Result<Self, OperatorFault> {
        match (problem.routing(), problem.matrix()) {
            (Some(data), Some(matrix)) => Ok(Self { data, matrix }),
            _ => Err(OperatorFault::new(
                "routing operator applied to a non-routing problem",
            )),
        }
    }

    fn n(&self) -> usize {
        self.data.customers.len()
    }

    fn d(&self, a: usize, b: usize) -> f64 {
        self.matrix.get(a, b)
    }

    /// Routes of `state`, rejecting ids outside the instance.
    fn routes(&self, state: &Solution) -> Result<Vec<Vec<usize>>, OperatorFault> {
        match state.assignment() {
            Assignment::Routing(tour) if tour.iter().all(|&c| c < self.n()) => {
                Ok(routes_of(tour))
            }
            _ => Err(OperatorFault::new("state is not a tour over this instance")),
        }
    }

    fn check(&self, route: &[usize]) -> RouteCheck {
        let depot = self.data.depot();
        let mut time = depot.ready_time;
        let mut load = 0u64;
        let mut distance = 0.0;
        let mut feasible = true;
        let mut prev = 0;
        for &c in route {
            let cust = &self.data.customers[c];
            let leg = self.d(prev, c);
            distance += leg;
            load += cust.demand;
            let arrival = time + leg;
            if arrival > cust.due_date + EPS {
                feasible = false;
            }
            time = arrival.max(cust.ready_time) + cust.service_time;
            prev = c;
        }
        let leg = self.d(prev, 0);
        distance += leg;
        if time + leg > depot.due_date + EPS || load > self.data.capacity {
            feasible = false;
        }
        RouteCheck { feasible, distance }
    }

    /// Cheapest feasible position for `c` in `route`, by distance increase.
    fn best_insertion(&self, route: &[usize], c: usize) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        let mut trial = Vec::with_capacity(route.len() + 1);
        for pos in 0..=route.len() {
            let prev = if pos == 0 { 0 } else { route[pos - 1] };
            let next = route.get(pos).copied().unwrap_or(0);
            let cost = self.d(prev, c) + self.d(c, next) - self.d(prev, next);
            if best.is_some_and(|(_, b)| cost >= b) {
                continue;
            }
            trial.clear();
            trial.extend_from_slice(&route[..pos]);
            trial.push(c);
            trial.extend_from_slice(&route[pos..]);
            if self.check(&trial).feasible {
                best = Some((pos, cost));
            }
        }
        best
    }

    /// Inserts `c` at its cheapest feasible position over all routes, or
    /// opens a new route.
    fn insert_cheapest(&self, routes: &mut Vec<Vec<usize>>, c: usize) {
        let mut best: Option<(usize, usize, f64)> = None;
        for (r, route) in routes.iter().enumerate() {
            if let Some((pos, cost)) = self.best_insertion(route, c) {
                if best.is_none_or(|(_, _, b)| cost < b) {
                    best = Some((r, pos, cost));
                }
            }
        }
        match best {
            Some((r, pos, _)) => routes[r].insert(pos, c),
            None => routes.push(vec![c]),
        }
    }

    fn solution(&self, problem: &Problem, routes: &[Vec<usize>]) -> Solution {
        Solution::new(problem, Assignment::Routing(tour_of(routes)))
    }
}

fn nearest_neighbor(
    problem: &Problem,
    _s: &Solution,
    _p: &OpParams,
    _rng: &mut GaaRng,
) -> OperatorResult {
    let fleet = Fleet::of(problem)?;
    let data = fleet.data;
    let depot = data.depot();
    let mut unrouted: BTreeSet<usize> = (1..fleet.n()).collect();
    let mut routes = Vec::new();

    while let Some(&first) = unrouted.iter().next() {
        let mut route = Vec::new();
        let (mut load, mut time, mut prev) = (0u64, depot.ready_time, 0usize);
        loop {
            let next = unrouted
                .iter()
                .copied()
                .filter(|&c| {
                    let cust = &data.customers[c];
                    let arrival = time + fleet.d(prev, c);
                    let done = arrival.max(cust.ready_time) + cust.service_time;
                    load + cust.demand <= data.capacity
                        && arrival <= cust.due_date + EPS
                        && done + fleet.d(c, 0) <= depot.due_date + EPS
                })
                .min_by(|&a, &b| fleet.d(prev, a).total_cmp(&fleet.d(prev, b)));
            let Some(c) = next else { break };
            let cust = &data.customers[c];
            time = (time + fleet.d(prev, c)).max(cust.ready_time) + cust.service_time;
            load += cust.demand;
            prev = c;
            route.push(c);
            unrouted.remove(&c);
        }
        if route.is_empty() {
            // unservable even by a fresh vehicle; keep it visible as a violation
            unrouted.remove(&first);
            route.push(first);
        }
        routes.push(route);
    }
    Ok(fleet.solution(problem, &routes))
}

/// Sequential insertion: seed each route with the unrouted customer
/// farthest from the depot, then insert the cheapest feasible customer
/// until none fits.
fn cheapest_insertion(
    problem: &Problem,
    _s: &Solution,
    _p: &OpParams,
    _rng: &mut GaaRng,
) -> OperatorResult {
    let fleet = Fleet::of(problem)?;
    let n = fleet.n();
    let mut seeds: Vec<usize> = (1..n).collect();
    seeds.sort_by(|&a, &b| fleet.d(0, a).total_cmp(&fleet.d(0, b)));
    let mut remaining = vec![true; n];
    remaining[0] = false;
    let mut routes = Vec::new();

    while let Some(seed) = seeds.pop() {
        if !remaining[seed] {
            continue;
        }
        remaining[seed] = false;
        let mut route = vec![seed];
        loop {
            let mut best: Option<(usize, usize, f64)> = None;
            for c in (1..n).filter(|&c| remaining[c]) {
                if let Some((pos, cost)) = fleet.best_insertion(&route, c) {
                    if best.is_none_or(|(_, _, b)| cost < b) {
                        best = Some((c, pos, cost));
                    }
                }
            }
            let Some((c, pos, _)) = best else { break };
            remaining[c] = false;
            route.insert(pos, c);
        }
        routes.push(route);
    }
    Ok(fleet.solution(problem, &routes))
}

/// Intra-route segment reversal, first improvement.
fn two_opt(
    problem: &Problem,
    state: &Solution,
    params: &OpParams,
    _rng: &mut GaaRng,
) -> OperatorResult {
    let fleet = Fleet::of(problem)?;
    let mut routes = fleet.routes(state)?;
    let passes = params.max_iter_or(50);

    for route in routes.iter_mut() {
        let mut current = fleet.check(route);
        for _ in 0..passes {
            let mut improved = false;
            for i in 0..route.len() {
                for j in i + 1..route.len() {
                    route[i..=j].reverse();
                    let cand = fleet.check(route);
                    let better = cand.feasible
                        && (!current.feasible || cand.distance < current.distance - EPS);
                    if better {
                        current = cand;
                        improved = true;
                    } else {
                        route[i..=j].reverse();
                    }
                }
            }
            if !improved {
                break;
            }
        }
    }
    Ok(fleet.solution(problem, &routes))
}

/// Moves single customers between (or within) routes, first improvement.
/// Emptying a route always counts as an improvement.
fn relocate(
    problem: &Problem,
    state: &Solution,
    params: &OpParams,
    _rng: &mut GaaRng,
) -> OperatorResult {
    let fleet = Fleet::of(problem)?;
    let mut routes = fleet.routes(state)?;

    for _ in 0..params.max_iter_or(50) {
        let Some(next) = relocate_once(&fleet, &routes) else {
            break;
        };
        routes = next;
    }
    Ok(fleet.solution(problem, &routes))
}

fn relocate_once(fleet: &Fleet<'_>, routes: &[Vec<usize>]) -> Option<Vec<Vec<usize>>> {
    let checks: Vec<RouteCheck> = routes.iter().map(|r| fleet.check(r)).collect();
    for a in 0..routes.len() {
        for i in 0..routes[a].len() {
            let c = routes[a][i];
            let mut source = routes[a].clone();
            source.remove(i);
            let source_check = fleet.check(&source);
            if !source.is_empty() && !source_check.feasible {
                continue;
            }
            for b in 0..routes.len() {
                let base = if b == a { &source } else { &routes[b] };
                for pos in 0..=base.len() {
                    if b == a && pos == i {
                        continue;
                    }
                    let mut target = base.clone();
                    target.insert(pos, c);
                    let target_check = fleet.check(&target);
                    if !target_check.feasible {
                        continue;
                    }
                    let improves = if b == a {
                        target_check.distance < checks[a].distance - EPS
                    } else {
                        let before = checks[a].distance + checks[b].distance;
                        let after = source_check.distance + target_check.distance;
                        source.is_empty() || after < before - EPS
                    };
                    if improves {
                        let mut next = routes.to_vec();
                        if b == a {
                            next[a] = target;
                        } else {
                            next[a] = source;
                            next[b] = target;
                        }
                        next.retain(|r| !r.is_empty());
                        return Some(next);
                    }
                }
            }
        }
    }
    None
}

fn random_swap(
    problem: &Problem,
    state: &Solution,
    params: &OpParams,
    rng: &mut GaaRng,
) -> OperatorResult {
    let fleet = Fleet::of(problem)?;
    fleet.routes(state)?;
    let mut tour = match state.assignment() {
        Assignment::Routing(t) => t.clone(),
        _ => return Err(OperatorFault::new("state is not a tour")),
    };
    let slots: Vec<usize> = (0..tour.len()).filter(|&i| tour[i] != 0).collect();
    if slots.len() < 2 {
        return Ok(state.clone());
    }
    for _ in 0..moves_for(slots.len(), params.intensity_or(0.2)) {
        let a = slots[rng.random_range(0..slots.len())];
        let b = slots[rng.random_range(0..slots.len())];
        tour.swap(a, b);
    }
    Ok(Solution::new(problem, Assignment::Routing(tour)))
}

/// Cuts a random multi-customer route in two.
fn route_split(
    problem: &Problem,
    state: &Solution,
    _p: &OpParams,
    rng: &mut GaaRng,
) -> OperatorResult {
    let fleet = Fleet::of(problem)?;
    let mut routes = fleet.routes(state)?;
    let long: Vec<usize> = (0..routes.len()).filter(|&r| routes[r].len() >= 2).collect();
    if long.is_empty() {
        return Ok(state.clone());
    }
    let r = long[rng.random_range(0..long.len())];
    let cut = rng.random_range(1..routes[r].len());
    let tail = routes[r].split_off(cut);
    routes.insert(r + 1, tail);
    Ok(fleet.solution(problem, &routes))
}

/// Rebuilds a feasible tour: keeps the longest feasible prefix-extension of
/// every route, drops duplicates and unknown ids, then inserts every
/// unrouted customer at its cheapest feasible position.
fn reinsert(
    problem: &Problem,
    state: &Solution,
    _p: &OpParams,
    _rng: &mut GaaRng,
) -> OperatorResult {
    let fleet = Fleet::of(problem)?;
    let tour = match state.assignment() {
        Assignment::Routing(t) => t,
        _ => return Err(OperatorFault::new("state is not a tour")),
    };
    let n = fleet.n();
    let mut seen = vec![false; n];
    let mut pending = Vec::new();
    let mut routes = Vec::new();

    for route in routes_of(tour) {
        let mut kept: Vec<usize> = Vec::with_capacity(route.len());
        for c in route {
            if c >= n || seen[c] {
                continue;
            }
            seen[c] = true;
            kept.push(c);
            if !fleet.check(&kept).feasible {
                kept.pop();
                pending.push(c);
            }
        }
        if !kept.is_empty() {
            routes.push(kept);
        }
    }
    pending.extend((1..n).filter(|&c| !seen[c]));
    pending.sort_unstable();
    for c in pending {
        fleet.insert_cheapest(&mut routes, c);
    }
    Ok(fleet.solution(problem, &routes))
}

//! 0/1 knapsack: evaluation and reference operators.
//!
//! Primary objective is the negated packed value. Secondary is the residual
//! capacity of a feasible packing, or the excess weight of an overfull one.

use super::{moves_for, OperatorResult};
use crate::problem::{Assignment, KnapsackData, Objectives, Problem, Solution, Violation};
use crate::random::{shuffle, GaaRng};
use crate::registry::{
    OpParams, OperatorDescriptor, OperatorFamily, OperatorFault, RegistryBuilder, RegistryError,
};
use rand::Rng;

/// Scores an item → packed selection.
pub fn evaluate(data: &KnapsackData, selected: &[bool]) -> Objectives {
    if selected.len() != data.items.len() {
        return Objectives::malformed(format!(
            "selection has {} entries for {} items",
            selected.len(),
            data.items.len()
        ));
    }
    let (value, weight) = totals(data, selected);
    let mut violations = Vec::new();
    let secondary = if weight > data.capacity {
        let excess = weight - data.capacity;
        violations.push(Violation::Overweight { excess });
        excess as f64
    } else {
        (data.capacity - weight) as f64
    };
    Objectives {
        feasible: violations.is_empty(),
        primary: -(value as f64),
        secondary,
        violations,
    }
}

fn totals(data: &KnapsackData, selected: &[bool]) -> (u64, u64) {
    data.items
        .iter()
        .zip(selected)
        .filter(|(_, &s)| s)
        .fold((0, 0), |(v, w), (item, _)| (v + item.value, w + item.weight))
}

pub(crate) fn register(b: &mut RegistryBuilder) -> Result<(), RegistryError> {
    use OperatorFamily::*;
    b.register(Constructive, "greedy_ratio", OperatorDescriptor::new(greedy_ratio))?
        .register(Constructive, "greedy_value", OperatorDescriptor::new(greedy_value))?
        .register(
            Constructive,
            "random_fill",
            OperatorDescriptor::new(random_fill).with_stochastic(true),
        )?
        .register(LocalSearch, "fill_residual", OperatorDescriptor::new(fill_residual))?
        .register(LocalSearch, "swap_improve", OperatorDescriptor::new(swap_improve))?
        .register(
            Perturbation,
            "random_drop",
            OperatorDescriptor::new(random_drop).with_stochastic(true),
        )?
        .register(
            Perturbation,
            "random_flip",
            OperatorDescriptor::new(random_flip)
                .with_stochastic(true)
                .with_infeasible_output(true),
        )?
        .register(Repair, "drop_worst_ratio", OperatorDescriptor::new(drop_worst_ratio))?
        .default_repair("drop_worst_ratio");
    Ok(())
}

fn data_of(problem: &Problem) -> Result<&KnapsackData, OperatorFault> {
    problem
        .knapsack_data()
        .ok_or_else(|| OperatorFault::new("knapsack operator applied to a non-knapsack problem"))
}

fn selection_of(state: &Solution, n: usize) -> Result<Vec<bool>, OperatorFault> {
    match state.assignment() {
        Assignment::Selection(s) if s.len() == n => Ok(s.clone()),
        _ => Err(OperatorFault::new("state is not a selection over these items")),
    }
}

/// Items by decreasing value density; ties keep index order.
fn by_ratio(data: &KnapsackData) -> Vec<usize> {
    let mut order: Vec<usize> = (0..data.items.len()).collect();
    order.sort_by(|&a, &b| data.ratio(b).total_cmp(&data.ratio(a)));
    order
}

/// Adds items in `order` while they fit.
fn pack(data: &KnapsackData, selected: &mut [bool], order: &[usize]) {
    let (_, mut weight) = totals(data, selected);
    for &i in order {
        let w = data.items[i].weight;
        if !selected[i] && weight + w <= data.capacity {
            selected[i] = true;
            weight += w;
        }
    }
}

fn greedy_ratio(
    problem: &Problem,
    _s: &Solution,
    _p: &OpParams,
    _rng: &mut GaaRng,
) -> OperatorResult {
    let data = data_of(problem)?;
    let mut selected = vec![false; data.items.len()];
    pack(data, &mut selected, &by_ratio(data));
    Ok(Solution::new(problem, Assignment::Selection(selected)))
}

fn greedy_value(
    problem: &Problem,
    _s: &Solution,
    _p: &OpParams,
    _rng: &mut GaaRng,
) -> OperatorResult {
    let data = data_of(problem)?;
    let mut order: Vec<usize> = (0..data.items.len()).collect();
    order.sort_by(|&a, &b| data.items[b].value.cmp(&data.items[a].value));
    let mut selected = vec![false; data.items.len()];
    pack(data, &mut selected, &order);
    Ok(Solution::new(problem, Assignment::Selection(selected)))
}

fn random_fill(
    problem: &Problem,
    _s: &Solution,
    _p: &OpParams,
    rng: &mut GaaRng,
) -> OperatorResult {
    let data = data_of(problem)?;
    let mut order: Vec<usize> = (0..data.items.len()).collect();
    shuffle(&mut order, rng);
    let mut selected = vec![false; data.items.len()];
    pack(data, &mut selected, &order);
    Ok(Solution::new(problem, Assignment::Selection(selected)))
}

/// Packs every remaining item that still fits, densest first.
fn fill_residual(
    problem: &Problem,
    state: &Solution,
    _p: &OpParams,
    _rng: &mut GaaRng,
) -> OperatorResult {
    let data = data_of(problem)?;
    let mut selected = selection_of(state, data.items.len())?;
    if !state.is_feasible() {
        return Ok(state.clone());
    }
    pack(data, &mut selected, &by_ratio(data));
    Ok(Solution::new(problem, Assignment::Selection(selected)))
}

/// Best-improvement 1-1 exchange between a packed and an unpacked item,
/// each exchange followed by a densest-first refill.
fn swap_improve(
    problem: &Problem,
    state: &Solution,
    params: &OpParams,
    _rng: &mut GaaRng,
) -> OperatorResult {
    let data = data_of(problem)?;
    let mut selected = selection_of(state, data.items.len())?;
    if !state.is_feasible() {
        return Ok(state.clone());
    }
    let order = by_ratio(data);

    for _ in 0..params.max_iter_or(100) {
        let (value, weight) = totals(data, &selected);
        let mut best: Option<(Vec<bool>, u64)> = None;
        for out in (0..selected.len()).filter(|&i| selected[i]) {
            for into in (0..selected.len()).filter(|&i| !selected[i]) {
                let (a, b) = (data.items[out], data.items[into]);
                if weight - a.weight + b.weight > data.capacity {
                    continue;
                }
                let mut trial = selected.clone();
                trial[out] = false;
                trial[into] = true;
                pack(data, &mut trial, &order);
                let (v, _) = totals(data, &trial);
                if v > best.as_ref().map_or(value, |(_, bv)| *bv) {
                    best = Some((trial, v));
                }
            }
        }
        let Some((trial, _)) = best else { break };
        selected = trial;
    }
    Ok(Solution::new(problem, Assignment::Selection(selected)))
}

fn random_drop(
    problem: &Problem,
    state: &Solution,
    params: &OpParams,
    rng: &mut GaaRng,
) -> OperatorResult {
    let data = data_of(problem)?;
    let mut selected = selection_of(state, data.items.len())?;
    let mut packed: Vec<usize> = (0..selected.len()).filter(|&i| selected[i]).collect();
    let k = moves_for(packed.len(), params.intensity_or(0.3)).min(packed.len());
    for _ in 0..k {
        let i = packed.swap_remove(rng.random_range(0..packed.len()));
        selected[i] = false;
    }
    Ok(Solution::new(problem, Assignment::Selection(selected)))
}

fn random_flip(
    problem: &Problem,
    state: &Solution,
    params: &OpParams,
    rng: &mut GaaRng,
) -> OperatorResult {
    let data = data_of(problem)?;
    let mut selected = selection_of(state, data.items.len())?;
    if selected.is_empty() {
        return Ok(state.clone());
    }
    for _ in 0..moves_for(selected.len(), params.intensity_or(0.2)) {
        let i = rng.random_range(0..selected.len());
        selected[i] = !selected[i];
    }
    Ok(Solution::new(problem, Assignment::Selection(selected)))
}

/// Unpacks the least dense items until the packing fits.
fn drop_worst_ratio(
    problem: &Problem,
    state: &Solution,
    _p: &OpParams,
    _rng: &mut GaaRng,
) -> OperatorResult {
    let data = data_of(problem)?;
    let mut selected = selection_of(state, data.items.len())?;
    let (_, mut weight) = totals(data, &selected);
    for &i in by_ratio(data).iter().rev() {
        if weight <= data.capacity {
            break;
        }
        if selected[i] {
            selected[i] = false;
            weight -= data.items[i].weight;
        }
    }
    Ok(Solution::new(problem, Assignment::Selection(selected)))
}

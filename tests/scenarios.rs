//! End-to-end scenarios on tiny instances, all at seed 42.

use u_gaa::domains::registry_for;
use u_gaa::domains::vrptw::routes_of;
use u_gaa::eval::{CostSignal, Evaluator, TrainingSet};
use u_gaa::generator::{Generator, GeneratorConfig, Strategy};
use u_gaa::grammar::GrammarLimits;
use u_gaa::harness::{run, GaaConfig, RunRecord};
use u_gaa::interp::InterpreterConfig;
use u_gaa::problem::loaders::{parse_dimacs, parse_kbp};
use u_gaa::problem::{
    Assignment, BestKnown, BestKnownTable, Customer, Problem, ProblemFamily,
};
use u_gaa::search::{Acceptance, SearchConfig, SearchRunner};

fn triangle() -> Problem {
    Problem::graph_coloring("triangle", 3, &[(0, 1), (1, 2), (0, 2)]).unwrap()
}

fn four_cycle() -> Problem {
    Problem::graph_coloring("c4", 4, &[(0, 1), (1, 2), (2, 3), (3, 0)]).unwrap()
}

fn k5() -> Problem {
    let mut edges = Vec::new();
    for u in 0..5 {
        for v in (u + 1)..5 {
            edges.push((u, v));
        }
    }
    Problem::graph_coloring("k5", 5, &edges).unwrap()
}

fn customer(id: usize, x: f64, y: f64, demand: u64) -> Customer {
    Customer {
        id,
        x,
        y,
        demand,
        ready_time: 0.0,
        due_date: 1_000.0,
        service_time: if id == 0 { 0.0 } else { 10.0 },
    }
}

fn run_one(family: ProblemFamily, config: &GaaConfig, instance: Problem) -> RunRecord {
    let registry = registry_for(family).unwrap();
    run(config, &registry, &[instance], &BestKnownTable::new()).unwrap()
}

// ---- Graph coloring ----

#[test]
fn s1_triangle_needs_three_colors() {
    let config = GaaConfig::default()
        .with_strategy(Strategy::FixedSkeleton)
        .with_max_iter(50)
        .with_seed(42);
    let record = run_one(ProblemFamily::GraphColoring, &config, triangle());
    let m = &record.metrics[0];
    assert_eq!(m.primary, 3.0);
    assert!(m.feasible);
    assert_eq!(m.secondary, 0.0);
    assert_eq!(m.gap, None);
}

#[test]
fn s2_four_cycle_reaches_bks() {
    let registry = registry_for(ProblemFamily::GraphColoring).unwrap();
    let table = BestKnownTable::new().with_entry(
        ProblemFamily::GraphColoring,
        "c4",
        BestKnown::primary(2.0),
    );
    let config = GaaConfig::default()
        .with_strategy(Strategy::FixedSkeleton)
        .with_acceptance(Acceptance::Greedy)
        .with_max_iter(100)
        .with_seed(42);
    let record = run(&config, &registry, &[four_cycle()], &table).unwrap();
    let m = &record.metrics[0];
    assert_eq!(m.primary, 2.0);
    assert!(m.feasible);
    assert_eq!(m.gap, Some(0.0));
}

#[test]
fn s5_k5_never_below_five() {
    let configs = [
        GaaConfig::default().with_seed(42).with_max_iter(40),
        GaaConfig::default()
            .with_seed(42)
            .with_max_iter(40)
            .with_strategy(Strategy::FixedSkeleton)
            .with_acceptance(Acceptance::Metropolis),
    ];
    for config in &configs {
        let record = run_one(ProblemFamily::GraphColoring, config, k5());
        let m = &record.metrics[0];
        assert_eq!(m.primary, 5.0);
        assert!(m.feasible);
    }
}

#[test]
fn dimacs_input_runs_end_to_end() {
    let text = "c five-cycle\np edge 5 5\ne 1 2\ne 2 3\ne 3 4\ne 4 5\ne 5 1\n";
    let c5 = parse_dimacs("c5", text).unwrap();
    let config = GaaConfig::default().with_max_iter(30).with_seed(42);
    let record = run_one(ProblemFamily::GraphColoring, &config, c5);
    assert_eq!(record.metrics[0].primary, 3.0);
    assert!(record.metrics[0].feasible);
}

// ---- Knapsack ----

#[test]
fn s3_knapsack_packs_at_least_twelve() {
    let kp = parse_kbp("kp4", "4 10\n6 4\n4 3\n5 5\n3 2\n").unwrap();
    let registry = registry_for(ProblemFamily::Knapsack).unwrap();
    let table =
        BestKnownTable::new().with_entry(ProblemFamily::Knapsack, "kp4", BestKnown::primary(-12.0));
    let config = GaaConfig::default()
        .with_acceptance(Acceptance::Greedy)
        .with_max_iter(200)
        .with_seed(42);
    let record = run(&config, &registry, &[kp], &table).unwrap();
    let m = &record.metrics[0];
    assert!(m.feasible);
    assert!(m.primary <= -12.0);
    assert!(m.gap.is_some_and(|g| g <= 0.0));
}

// ---- VRPTW ----

#[test]
fn s4_vrptw_single_vehicle() {
    let problem = Problem::vrptw(
        "star3",
        10,
        vec![
            customer(0, 50.0, 50.0, 0),
            customer(1, 60.0, 50.0, 3),
            customer(2, 50.0, 60.0, 3),
            customer(3, 40.0, 50.0, 3),
        ],
    )
    .unwrap();
    let registry = registry_for(ProblemFamily::Vrptw).unwrap();
    let generator = Generator::new(
        GeneratorConfig::default().with_strategy(Strategy::FixedSkeleton),
        &registry,
    )
    .unwrap();
    let evaluator = Evaluator::new(
        &registry,
        InterpreterConfig::default(),
        vec![42],
        CostSignal::Evaluations,
    );
    let training = TrainingSet::new(vec![problem]).unwrap();
    let config = SearchConfig::default().with_max_iter(50).with_seed(42);
    let result = SearchRunner::run(&generator, &evaluator, &training, &config).unwrap();

    let outcome = &result.best_evaluation.outcomes[0];
    assert!(outcome.feasible());
    assert_eq!(outcome.primary(), 1.0);
    let Assignment::Routing(tour) = outcome.final_state.assignment() else {
        panic!("routing instance produced a non-routing state");
    };
    let routes = routes_of(tour);
    assert_eq!(routes.len(), 1);
    let mut visited = routes[0].clone();
    visited.sort_unstable();
    assert_eq!(visited, vec![1, 2, 3]);
}

// ---- Determinism ----

#[test]
fn s6_generator_is_deterministic() {
    let registry = registry_for(ProblemFamily::GraphColoring).unwrap();
    let config =
        GeneratorConfig::default().with_limits(GrammarLimits::default().with_max_depth(3));
    let a = Generator::new(config.clone(), &registry)
        .unwrap()
        .generate_seeded(42)
        .unwrap();
    let b = Generator::new(config, &registry)
        .unwrap()
        .generate_seeded(42)
        .unwrap();
    assert_eq!(a.to_pseudocode(), b.to_pseudocode());
    assert_eq!((a.depth(), a.size()), (b.depth(), b.size()));
    assert!(a.depth() <= 3);
}

#[test]
fn runs_are_reproducible() {
    let config = GaaConfig::default()
        .with_acceptance(Acceptance::Metropolis)
        .with_max_iter(40)
        .with_seed(42);
    let a = run_one(ProblemFamily::GraphColoring, &config, k5());
    let b = run_one(ProblemFamily::GraphColoring, &config, k5());
    assert_eq!(a.fingerprint(), b.fingerprint());
    assert_eq!(a.best_program, b.best_program);
}

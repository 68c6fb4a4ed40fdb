//! Criterion benchmarks for u-gaa.
//!
//! Measures program generation, interpretation on random graph coloring
//! instances, and short end-to-end searches.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::Rng;
use u_gaa::domains::registry_for;
use u_gaa::eval::{CostSignal, Evaluator, TrainingSet};
use u_gaa::generator::{Generator, GeneratorConfig, Strategy};
use u_gaa::grammar::GrammarLimits;
use u_gaa::interp::{Budget, Interpreter, InterpreterConfig};
use u_gaa::problem::{Problem, ProblemFamily, Solution};
use u_gaa::random::create_rng;
use u_gaa::search::{SearchConfig, SearchRunner};

// ===========================================================================
// Instances
// ===========================================================================

/// G(n, p) random graph with a fixed seed.
fn random_graph(n: usize, p: f64, seed: u64) -> Problem {
    let mut rng = create_rng(seed);
    let mut edges = Vec::new();
    for u in 0..n {
        for v in (u + 1)..n {
            if rng.random_bool(p) {
                edges.push((u, v));
            }
        }
    }
    Problem::graph_coloring(format!("g{}_{}", n, seed), n, &edges).unwrap()
}

// ===========================================================================
// Benchmarks
// ===========================================================================

fn bench_generate(c: &mut Criterion) {
    let registry = registry_for(ProblemFamily::GraphColoring).unwrap();
    let mut group = c.benchmark_group("generate");

    for &depth in &[3usize, 5, 7] {
        let config = GeneratorConfig::default().with_limits(
            GrammarLimits::default()
                .with_max_depth(depth)
                .with_max_size(depth * 8),
        );
        let generator = Generator::new(config, &registry).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(depth), &generator, |b, g| {
            let mut seed = 0u64;
            b.iter(|| {
                seed += 1;
                black_box(g.generate_seeded(black_box(seed)))
            })
        });
    }
    group.finish();
}

fn bench_interpret(c: &mut Criterion) {
    let registry = registry_for(ProblemFamily::GraphColoring).unwrap();
    let generator = Generator::new(
        GeneratorConfig::default().with_strategy(Strategy::FixedSkeleton),
        &registry,
    )
    .unwrap();
    let program = generator.generate_seeded(42).unwrap();
    let interpreter = Interpreter::new(&registry, InterpreterConfig::default());
    let mut group = c.benchmark_group("interpret_gcp");
    group.sample_size(20);

    for &n in &[20usize, 50, 100] {
        let problem = random_graph(n, 0.3, 7);
        group.bench_with_input(BenchmarkId::from_parameter(n), &problem, |b, p| {
            b.iter(|| {
                let mut budget = Budget::unlimited();
                let mut rng = create_rng(1);
                let result = interpreter.interpret(
                    black_box(&program),
                    p,
                    Solution::empty(p),
                    &mut budget,
                    &mut rng,
                );
                black_box(result)
            })
        });
    }
    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let registry = registry_for(ProblemFamily::GraphColoring).unwrap();
    let generator = Generator::new(GeneratorConfig::default(), &registry).unwrap();
    let evaluator = Evaluator::new(
        &registry,
        InterpreterConfig::default(),
        vec![1],
        CostSignal::Evaluations,
    );
    let training = TrainingSet::new(vec![random_graph(30, 0.3, 1), random_graph(30, 0.5, 2)])
        .unwrap();
    let mut group = c.benchmark_group("search_gcp");
    group.sample_size(10);

    for &iters in &[10u64, 50] {
        let config = SearchConfig::default().with_max_iter(iters).with_seed(42);
        group.bench_with_input(BenchmarkId::from_parameter(iters), &config, |b, cfg| {
            b.iter(|| {
                let result = SearchRunner::run(&generator, &evaluator, &training, black_box(cfg));
                black_box(result)
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_generate, bench_interpret, bench_search);
criterion_main!(benches);

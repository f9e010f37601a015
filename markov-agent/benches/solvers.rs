use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use markov_agent::{policy_iteration, value_iteration, PolicyEvaluator};
use markov_core::{RandomSelectPolicy, SolverConfig};
use markov_env::{GridSquare, GridWorld};
use std::hint::black_box;

fn grid(size: usize) -> GridWorld {
    let mut world = GridWorld::new(size, size, -1.0).unwrap();
    world
        .add_goal(GridSquare::new(size - 1, size - 1), 0.0)
        .unwrap();
    world
}

fn bench_evaluation(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluation");
    let config = SolverConfig::new(1e-3, 0.9);

    for size in [5, 10, 20].iter() {
        group.bench_with_input(BenchmarkId::new("random_policy", size), size, |b, &n| {
            let world = grid(n);
            let policy = RandomSelectPolicy::for_mdp(&world);
            let evaluator = PolicyEvaluator::new(&world, &config).unwrap();

            b.iter(|| black_box(evaluator.evaluate(&policy).unwrap()));
        });
    }

    group.finish();
}

fn bench_control(c: &mut Criterion) {
    let mut group = c.benchmark_group("control");
    group.sample_size(20);
    let config = SolverConfig::new(1e-3, 0.9);

    for size in [5, 10, 20].iter() {
        group.bench_with_input(BenchmarkId::new("value_iteration", size), size, |b, &n| {
            let world = grid(n);
            b.iter(|| black_box(value_iteration::optimal_policy(&world, &config).unwrap()));
        });

        group.bench_with_input(BenchmarkId::new("policy_iteration", size), size, |b, &n| {
            let world = grid(n);
            b.iter(|| black_box(policy_iteration::optimal_policy(&world, &config).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_evaluation, bench_control);
criterion_main!(benches);

//! # ACO Benchmarks
//!
//! Measures colony runs on random symmetric instances, with and without
//! 2-opt local search.
//!
//! Run: `cargo bench --bench aco_bench`

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use swarm_engine::{AcoConfig, AntColonyOptimizer};

/// Cidades em posições pseudo-aleatórias determinísticas
fn instance(n: usize) -> Vec<Vec<f64>> {
    let points: Vec<(f64, f64)> = (0..n)
        .map(|i| {
            let t = i as f64 * 0.618_033_988_75;
            ((t * 97.0).fract() * 100.0, (t * 53.0).fract() * 100.0)
        })
        .collect();
    points
        .iter()
        .map(|a| {
            points
                .iter()
                .map(|b| ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt())
                .collect()
        })
        .collect()
}

/// Benchmark complete runs for growing instance sizes
fn bench_aco_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("aco_run");
    group.sample_size(20);

    for cities in [10, 30, 60] {
        let matrix = instance(cities);
        for local_search in [false, true] {
            let config = AcoConfig::builder()
                .num_ants(20)
                .max_iterations(20)
                .local_search(local_search)
                .local_search_interval(5)
                .parallel(true)
                .build()
                .unwrap();
            let label = if local_search { "two_opt" } else { "plain" };

            group.bench_with_input(BenchmarkId::new(label, cities), &matrix, |b, matrix| {
                b.iter(|| {
                    let mut aco = AntColonyOptimizer::seeded(config.clone(), 42);
                    black_box(aco.optimize(matrix, None).unwrap())
                })
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_aco_run);
criterion_main!(benches);

//! # PSO Benchmarks
//!
//! Measures full particle swarm runs on the sphere function, serial versus
//! rayon-parallel fitness evaluation.
//!
//! Run: `cargo bench --bench pso_bench`

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use swarm_engine::{ParticleSwarmOptimizer, PsoConfig};

fn sphere(x: &[f64]) -> f64 {
    x.iter().map(|v| v * v).sum()
}

/// Benchmark complete runs for growing swarm sizes
fn bench_pso_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("pso_run");

    for particles in [10, 50, 200] {
        for parallel in [false, true] {
            let config = PsoConfig::builder()
                .num_particles(particles)
                .dimension(10)
                .max_iterations(50)
                .convergence_threshold(0.0)
                .parallel(parallel)
                .build()
                .unwrap();
            let label = if parallel { "parallel" } else { "serial" };

            group.bench_with_input(BenchmarkId::new(label, particles), &config, |b, config| {
                b.iter(|| {
                    let mut pso = ParticleSwarmOptimizer::seeded(config.clone(), 42);
                    black_box(pso.optimize(sphere, None).unwrap())
                })
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_pso_run);
criterion_main!(benches);

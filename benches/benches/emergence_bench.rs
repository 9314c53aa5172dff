//! # Emergence Benchmarks
//!
//! Measures pattern detection over population snapshots (pairwise clustering
//! dominates).
//!
//! Run: `cargo bench --bench emergence_bench`

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use swarm_engine::{AgentSnapshot, EmergenceConfig, EmergenceDetector};

fn population(n: usize) -> Vec<AgentSnapshot> {
    (0..n)
        .map(|i| {
            let t = i as f64;
            AgentSnapshot::new(
                i,
                vec![(t * 0.37).sin() * 10.0, (t * 0.11).cos() * 10.0, t % 7.0],
                vec![(t * 0.5).sin(), (t * 0.3).cos(), 0.1],
                (t * 1.3).sin().abs() * 100.0,
            )
        })
        .collect()
}

fn bench_detect_patterns(c: &mut Criterion) {
    let mut group = c.benchmark_group("detect_patterns");
    let config = EmergenceConfig::builder()
        .history_capacity(Some(64))
        .build()
        .unwrap();

    for agents in [30, 100, 500] {
        let snapshots = population(agents);
        let mut detector = EmergenceDetector::new(config.clone());

        group.bench_with_input(BenchmarkId::from_parameter(agents), &snapshots, |b, s| {
            b.iter(|| black_box(detector.detect_patterns(s).unwrap()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_detect_patterns);
criterion_main!(benches);

//! Conformal-fit benchmarks
//!
//! The fit runs once per assembled track, so it sits on the hot path of the
//! archive branch.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use trackforge::fit::estimate_pt;

fn circle_hits(radius: f64, n: usize) -> Vec<[f64; 3]> {
    (1..=n)
        .map(|i| {
            let theta = 2.5 * (i as f64) / (n as f64 + 1.0);
            [
                radius * theta.cos(),
                radius + radius * theta.sin(),
                i as f64,
            ]
        })
        .collect()
}

fn bench_estimate_pt(c: &mut Criterion) {
    let mut group = c.benchmark_group("estimate_pt");
    for n_hits in [5, 10, 20, 50] {
        let hits = circle_hits(1_000.0, n_hits);
        group.bench_with_input(BenchmarkId::from_parameter(n_hits), &hits, |b, hits| {
            b.iter(|| estimate_pt(black_box(hits)).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_estimate_pt);
criterion_main!(benches);

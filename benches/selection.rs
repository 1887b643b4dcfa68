use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use clickmux::{
    select_arm, BetaPosterior, PosteriorState, ReplicationStreams, SelectionPolicy,
    ThompsonSampling,
};
use std::hint::black_box;

fn bench_selection(c: &mut Criterion) {
    let mut group = c.benchmark_group("selection");
    for &n_arms in &[3usize, 16usize, 128usize] {
        // Deterministic, slightly non-uniform posteriors and bids.
        let state = PosteriorState::from_posteriors(
            (0..n_arms)
                .map(|i| BetaPosterior {
                    alpha: 1.0 + ((i * 7) % 13) as f64,
                    beta: 50.0 + ((i * 17 + 3) % 101) as f64,
                })
                .collect(),
        );
        let bids: Vec<f64> = (0..n_arms).map(|i| 0.3 + (i % 5) as f64 * 0.1).collect();
        let scores: Vec<f64> = state.as_slice().iter().map(BetaPosterior::mean).collect();

        group.bench_with_input(BenchmarkId::new("argmax", n_arms), &n_arms, |b, &_n| {
            b.iter(|| black_box(select_arm(black_box(&bids), black_box(&scores))))
        });

        group.bench_with_input(BenchmarkId::new("thompson", n_arms), &n_arms, |b, &_n| {
            let mut rng = ReplicationStreams::new(123).stream(0);
            b.iter(|| black_box(ThompsonSampling.choose(black_box(&bids), &state, &mut rng)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_selection);
criterion_main!(benches);

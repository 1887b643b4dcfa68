//! Reference ad-auction run: three ads, Thompson sampling vs posterior-mean greedy.
//!
//! Run:
//! `cargo run --release --example reference_auction -- [horizon] [replications]`
//!
//! Defaults to the reference sizes (10_000 rounds x 1_000 replications).
//! Set `RUST_LOG=clickmux=debug` for per-replication logs.

use clickmux::{
    reference_registry, Experiment, ExperimentConfig, ExperimentResult, PosteriorMeanGreedy,
    ThompsonSampling,
};

fn arg_or(idx: usize, default: usize) -> usize {
    std::env::args()
        .nth(idx)
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn report(res: &ExperimentResult) {
    let t = res.horizon;
    let decile = (t / 10).max(1);
    println!("policy={}", res.policy);
    println!(
        "  total regret={:.3}  total reward={:.3}",
        res.total_regret(),
        res.total_reward()
    );
    println!(
        "  regret/round first 10%={:.6}  last 10%={:.6}",
        res.mean_regret_over(0..decile),
        res.mean_regret_over(t.saturating_sub(decile)..t)
    );
    let shares = res.overall_selection_share();
    for (i, id) in res.arm_ids.iter().enumerate() {
        let p = res.final_posterior[i];
        println!(
            "  {id:<14} share={:.3}  final alpha={:.1} beta={:.1} mean={:.4}",
            shares[i],
            p.alpha,
            p.beta,
            p.mean()
        );
    }
}

fn main() -> Result<(), clickmux::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "clickmux=info".into()),
        )
        .init();

    let defaults = ExperimentConfig::default();
    let cfg = defaults
        .with_horizon(arg_or(1, defaults.horizon))
        .with_replications(arg_or(2, defaults.replications))
        .with_seed(42);

    let registry = reference_registry()?;
    for arm in registry.arms() {
        println!(
            "{:<14} bid={:.2} true ctr={:.3} ev={:.4}{}",
            arm.id,
            arm.bid,
            arm.true_ctr,
            arm.true_value(),
            if registry.get(registry.best_index()) == Some(arm) {
                "  (oracle)"
            } else {
                ""
            }
        );
    }

    let exp = Experiment::new(registry, cfg)?;
    report(&exp.run_with(&ThompsonSampling));
    report(&exp.run_with(&PosteriorMeanGreedy));
    Ok(())
}

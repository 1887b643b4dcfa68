//! Monte-Carlo experiment driver.
//!
//! Runs `R` independent replications of a `T`-round horizon and averages the
//! per-round traces. Each replication starts from a fresh copy of the seeded
//! posteriors and owns its own random stream, so replications share nothing
//! mutable and can run in any order or in parallel.
//!
//! Aggregation is sum-then-divide through [`Accumulator`], whose
//! [`merge`](Accumulator::merge) is commutative and associative; results only
//! depend on processing order through floating-point summation order.

use std::ops::Range;

use tracing::{debug, info};

use crate::arm::ArmRegistry;
use crate::config::ExperimentConfig;
use crate::error::{Error, Result};
use crate::policy::SelectionPolicy;
use crate::posterior::{BetaPosterior, PosteriorState};
use crate::round::{ReplicationTrace, RoundContext, RoundEngine};
use crate::simulator::OutcomeSimulator;
use crate::stream::ReplicationStreams;
use crate::thompson::ThompsonSampling;

/// Running per-round sums over some subset of replications.
#[derive(Debug, Clone, PartialEq)]
pub struct Accumulator {
    horizon: usize,
    arms: usize,
    replications: usize,
    reward: Vec<f64>,
    regret: Vec<f64>,
    // Row-major `[round][arm]`.
    samples: Vec<f64>,
    chosen: Vec<u64>,
    final_alpha: Vec<f64>,
    final_beta: Vec<f64>,
}

impl Accumulator {
    pub fn new(horizon: usize, arms: usize) -> Self {
        Self {
            horizon,
            arms,
            replications: 0,
            reward: vec![0.0; horizon],
            regret: vec![0.0; horizon],
            samples: vec![0.0; horizon * arms],
            chosen: vec![0; horizon * arms],
            final_alpha: vec![0.0; arms],
            final_beta: vec![0.0; arms],
        }
    }

    /// Replications absorbed so far.
    pub fn replications(&self) -> usize {
        self.replications
    }

    /// Add one complete replication trace.
    ///
    /// Rounds past the accumulator's horizon and arms past its width are
    /// ignored.
    pub fn absorb(&mut self, trace: &ReplicationTrace) {
        for rec in trace.records.iter().take(self.horizon) {
            let t = rec.round;
            if t >= self.horizon {
                continue;
            }
            self.reward[t] += rec.reward;
            self.regret[t] += rec.regret;
            let row = t * self.arms;
            for (k, s) in rec.samples.iter().take(self.arms).enumerate() {
                self.samples[row + k] += s;
            }
            if rec.chosen < self.arms {
                self.chosen[row + rec.chosen] += 1;
            }
        }
        for (k, p) in trace.final_posterior.as_slice().iter().take(self.arms).enumerate() {
            self.final_alpha[k] += p.alpha;
            self.final_beta[k] += p.beta;
        }
        self.replications += 1;
    }

    /// `(horizon, arms)` this accumulator was built for.
    pub fn shape(&self) -> (usize, usize) {
        (self.horizon, self.arms)
    }

    /// Combine two partial sums over the same `(horizon, arms)` shape.
    pub fn merge(self, other: Self) -> Result<Self> {
        if self.shape() != other.shape() {
            return Err(Error::AccumulatorShapeMismatch {
                expected: self.shape(),
                got: other.shape(),
            });
        }
        Ok(self.merge_same_shape(other))
    }

    fn merge_same_shape(mut self, other: Self) -> Self {
        add_into(&mut self.reward, &other.reward);
        add_into(&mut self.regret, &other.regret);
        add_into(&mut self.samples, &other.samples);
        for (a, b) in self.chosen.iter_mut().zip(&other.chosen) {
            *a += b;
        }
        add_into(&mut self.final_alpha, &other.final_alpha);
        add_into(&mut self.final_beta, &other.final_beta);
        self.replications += other.replications;
        self
    }

    /// Divide every sum by the replication count.
    pub fn finish(self, arm_ids: Vec<String>, policy: &str) -> ExperimentResult {
        let n = self.replications.max(1) as f64;
        let per_round = |flat: &[f64]| -> Vec<Vec<f64>> {
            flat.chunks(self.arms.max(1))
                .map(|row| row.iter().map(|x| x / n).collect())
                .collect()
        };
        let share: Vec<f64> = self.chosen.iter().map(|&c| c as f64).collect();
        ExperimentResult {
            arm_ids,
            policy: policy.to_string(),
            horizon: self.horizon,
            replications: self.replications,
            mean_reward: self.reward.iter().map(|x| x / n).collect(),
            mean_regret: self.regret.iter().map(|x| x / n).collect(),
            mean_samples: per_round(&self.samples),
            selection_share: per_round(&share),
            final_posterior: self
                .final_alpha
                .iter()
                .zip(&self.final_beta)
                .map(|(a, b)| BetaPosterior {
                    alpha: a / n,
                    beta: b / n,
                })
                .collect(),
        }
    }
}

fn add_into(dst: &mut [f64], src: &[f64]) {
    for (a, b) in dst.iter_mut().zip(src) {
        *a += b;
    }
}

/// Per-round averages across all replications.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExperimentResult {
    /// Arm ids in registry order; every per-arm vector below uses this order.
    pub arm_ids: Vec<String>,
    /// Name of the selection policy that produced the run.
    pub policy: String,
    pub horizon: usize,
    pub replications: usize,
    /// Mean realized reward at each round.
    pub mean_reward: Vec<f64>,
    /// Mean instantaneous regret at each round.
    pub mean_regret: Vec<f64>,
    /// `[round][arm]` mean of the score drawn for each arm.
    pub mean_samples: Vec<Vec<f64>>,
    /// `[round][arm]` fraction of replications that showed each arm.
    pub selection_share: Vec<Vec<f64>>,
    /// Mean `(alpha, beta)` per arm after the last round.
    pub final_posterior: Vec<BetaPosterior>,
}

impl ExperimentResult {
    /// Running sum of [`mean_regret`](Self::mean_regret).
    pub fn cumulative_regret(&self) -> Vec<f64> {
        running_sum(&self.mean_regret)
    }

    /// Running sum of [`mean_reward`](Self::mean_reward).
    pub fn cumulative_reward(&self) -> Vec<f64> {
        running_sum(&self.mean_reward)
    }

    /// Expected regret over the whole horizon.
    pub fn total_regret(&self) -> f64 {
        self.mean_regret.iter().sum()
    }

    /// Expected reward over the whole horizon.
    pub fn total_reward(&self) -> f64 {
        self.mean_reward.iter().sum()
    }

    /// Mean per-round regret over `rounds` (clamped to the horizon); `0` if empty.
    pub fn mean_regret_over(&self, rounds: Range<usize>) -> f64 {
        let end = rounds.end.min(self.mean_regret.len());
        let start = rounds.start.min(end);
        let window = &self.mean_regret[start..end];
        if window.is_empty() {
            0.0
        } else {
            window.iter().sum::<f64>() / window.len() as f64
        }
    }

    /// Mean-sample trajectory of one arm across rounds.
    pub fn sample_trajectory(&self, arm: usize) -> Vec<f64> {
        self.mean_samples
            .iter()
            .map(|row| row.get(arm).copied().unwrap_or(0.0))
            .collect()
    }

    /// Posterior mean CTR per arm from the averaged final parameters.
    pub fn final_posterior_means(&self) -> Vec<f64> {
        self.final_posterior.iter().map(BetaPosterior::mean).collect()
    }

    /// Fraction of all impressions each arm received over the horizon.
    pub fn overall_selection_share(&self) -> Vec<f64> {
        let mut totals = vec![0.0; self.arm_ids.len()];
        for row in &self.selection_share {
            add_into(&mut totals, row);
        }
        let t = self.selection_share.len().max(1) as f64;
        totals.iter().map(|x| x / t).collect()
    }
}

fn running_sum(xs: &[f64]) -> Vec<f64> {
    xs.iter()
        .scan(0.0, |acc, x| {
            *acc += x;
            Some(*acc)
        })
        .collect()
}

/// A validated registry and configuration, ready to run.
#[derive(Debug, Clone)]
pub struct Experiment {
    registry: ArmRegistry,
    simulator: OutcomeSimulator,
    config: ExperimentConfig,
    initial: PosteriorState,
}

impl Experiment {
    /// Validate everything up front; running cannot fail afterwards.
    pub fn new(registry: ArmRegistry, config: ExperimentConfig) -> Result<Self> {
        config.validate()?;
        let initial = PosteriorState::initialize(&registry, config.prior_pseudo_count)?;
        let simulator = OutcomeSimulator::from_registry(&registry)?;
        Ok(Self {
            registry,
            simulator,
            config,
            initial,
        })
    }

    pub fn registry(&self) -> &ArmRegistry {
        &self.registry
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    /// Posteriors every replication starts from.
    pub fn initial_posterior(&self) -> &PosteriorState {
        &self.initial
    }

    /// Run with Thompson sampling.
    pub fn run(&self) -> ExperimentResult {
        self.run_with(&ThompsonSampling)
    }

    /// Run with any selection policy.
    pub fn run_with<P>(&self, policy: &P) -> ExperimentResult
    where
        P: SelectionPolicy + Sync,
    {
        let cfg = &self.config;
        info!(
            policy = policy.name(),
            arms = self.registry.len(),
            horizon = cfg.horizon,
            replications = cfg.replications,
            seed = cfg.seed,
            parallel = cfg.parallel,
            "starting experiment"
        );

        let acc = self.accumulate(policy);
        let result = acc.finish(self.registry.ids(), policy.name());

        info!(
            policy = policy.name(),
            total_regret = result.total_regret(),
            total_reward = result.total_reward(),
            "experiment finished"
        );
        result
    }

    /// Replay a single replication in full.
    ///
    /// Deterministic in `(seed, replication)`: this returns exactly the trace
    /// that [`run_with`](Self::run_with) folded in for that replication.
    pub fn run_replication<P>(&self, policy: &P, replication: usize) -> ReplicationTrace
    where
        P: SelectionPolicy,
    {
        let ctx = RoundContext::new(&self.registry, &self.simulator, policy);
        let rng = ReplicationStreams::new(self.config.seed).stream(replication);
        let engine =
            RoundEngine::with_checked_horizon(ctx, self.initial.clone(), self.config.horizon, rng);
        let trace = engine.run_to_end();
        debug!(
            replication,
            total_regret = trace.total_regret(),
            total_reward = trace.total_reward(),
            "replication finished"
        );
        trace
    }

    fn empty_accumulator(&self) -> Accumulator {
        Accumulator::new(self.config.horizon, self.registry.len())
    }

    #[cfg(feature = "parallel")]
    fn accumulate<P>(&self, policy: &P) -> Accumulator
    where
        P: SelectionPolicy + Sync,
    {
        if !self.config.parallel {
            return self.accumulate_sequential(policy);
        }
        use rayon::prelude::*;
        (0..self.config.replications)
            .into_par_iter()
            .fold(
                || self.empty_accumulator(),
                |mut acc, r| {
                    acc.absorb(&self.run_replication(policy, r));
                    acc
                },
            )
            .reduce(|| self.empty_accumulator(), Accumulator::merge_same_shape)
    }

    #[cfg(not(feature = "parallel"))]
    fn accumulate<P>(&self, policy: &P) -> Accumulator
    where
        P: SelectionPolicy + Sync,
    {
        self.accumulate_sequential(policy)
    }

    fn accumulate_sequential<P>(&self, policy: &P) -> Accumulator
    where
        P: SelectionPolicy,
    {
        let mut acc = self.empty_accumulator();
        for r in 0..self.config.replications {
            acc.absorb(&self.run_replication(policy, r));
        }
        acc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arm::{reference_registry, Arm};
    use crate::policy::PosteriorMeanGreedy;

    fn small(seed: u64) -> Experiment {
        let cfg = ExperimentConfig::default()
            .with_horizon(60)
            .with_replications(24)
            .with_seed(seed);
        Experiment::new(reference_registry().unwrap(), cfg).unwrap()
    }

    fn assert_close(a: &[f64], b: &[f64]) {
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b) {
            assert!((x - y).abs() < 1e-9, "{x} vs {y}");
        }
    }

    #[test]
    fn setup_errors_surface_before_running() {
        let reg = reference_registry().unwrap();
        let cfg = ExperimentConfig::default();
        assert_eq!(
            Experiment::new(reg.clone(), cfg.with_horizon(0)).unwrap_err(),
            Error::InvalidHorizon(0)
        );
        assert_eq!(
            Experiment::new(reg, cfg.with_replications(0)).unwrap_err(),
            Error::InvalidReplicationCount(0)
        );
    }

    #[test]
    fn result_shapes_follow_config() {
        let res = small(1).run();
        assert_eq!(res.horizon, 60);
        assert_eq!(res.replications, 24);
        assert_eq!(res.policy, "thompson");
        assert_eq!(res.arm_ids, vec!["crypto_magic", "green_energy", "infini_waves"]);
        assert_eq!(res.mean_reward.len(), 60);
        assert_eq!(res.mean_regret.len(), 60);
        assert_eq!(res.mean_samples.len(), 60);
        assert!(res.mean_samples.iter().all(|row| row.len() == 3));
        assert_eq!(res.final_posterior.len(), 3);
        for row in &res.selection_share {
            assert!((row.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn final_posterior_gains_exactly_horizon_pseudo_observations() {
        let exp = small(2);
        let res = exp.run();
        let start: f64 = exp
            .initial_posterior()
            .as_slice()
            .iter()
            .map(BetaPosterior::concentration)
            .sum();
        let end: f64 = res.final_posterior.iter().map(BetaPosterior::concentration).sum();
        assert!((end - start - 60.0).abs() < 1e-9);
    }

    #[test]
    fn same_seed_same_result() {
        let run = || {
            Experiment::new(
                reference_registry().unwrap(),
                small(3).config().with_parallel(false),
            )
            .unwrap()
            .run()
        };
        assert_eq!(run(), run());
        assert_close(&run().mean_regret, &small(3).run().mean_regret);
    }

    #[test]
    fn replay_matches_folded_trace() {
        let exp = small(4);
        let mut acc = Accumulator::new(60, 3);
        for r in 0..24 {
            acc.absorb(&exp.run_replication(&ThompsonSampling, r));
        }
        let manual = acc.finish(exp.registry().ids(), "thompson");
        let res = exp.run();
        assert_close(&manual.mean_regret, &res.mean_regret);
        assert_close(&manual.mean_reward, &res.mean_reward);
    }

    #[test]
    fn aggregation_is_order_insensitive() {
        let exp = small(5);
        let traces: Vec<_> = (0..24).map(|r| exp.run_replication(&ThompsonSampling, r)).collect();

        let mut forward = Accumulator::new(60, 3);
        traces.iter().for_each(|t| forward.absorb(t));

        let mut halves = (Accumulator::new(60, 3), Accumulator::new(60, 3));
        for (i, t) in traces.iter().rev().enumerate() {
            if i % 2 == 0 {
                halves.0.absorb(t);
            } else {
                halves.1.absorb(t);
            }
        }
        let merged = halves.1.merge(halves.0).unwrap();
        assert_eq!(merged.replications(), 24);

        let ids = exp.registry().ids();
        let a = forward.finish(ids.clone(), "thompson");
        let b = merged.finish(ids, "thompson");
        assert_close(&a.mean_regret, &b.mean_regret);
        assert_close(&a.sample_trajectory(1), &b.sample_trajectory(1));
        assert_close(&a.final_posterior_means(), &b.final_posterior_means());
    }

    #[test]
    fn merge_rejects_mismatched_shapes() {
        let exp = small(8);
        let mut narrow = Accumulator::new(60, 2);
        narrow.absorb(&exp.run_replication(&ThompsonSampling, 0));
        let err = Accumulator::new(60, 3).merge(narrow.clone()).unwrap_err();
        assert_eq!(
            err,
            Error::AccumulatorShapeMismatch {
                expected: (60, 3),
                got: (60, 2)
            }
        );
        assert!(Accumulator::new(30, 2).merge(narrow).is_err());

        let empty = Accumulator::new(60, 3).merge(Accumulator::new(60, 3)).unwrap();
        assert_eq!(empty.replications(), 0);
        assert_eq!(empty.shape(), (60, 3));
    }

    #[test]
    fn sequential_and_parallel_agree() {
        let seq = Experiment::new(
            reference_registry().unwrap(),
            small(6).config().with_parallel(false),
        )
        .unwrap()
        .run();
        let par = small(6).run();
        assert_close(&seq.mean_regret, &par.mean_regret);
        assert_close(&seq.mean_reward, &par.mean_reward);
        assert_close(&seq.overall_selection_share(), &par.overall_selection_share());
    }

    #[test]
    fn greedy_policy_runs_through_same_driver() {
        let res = small(7).run_with(&PosteriorMeanGreedy);
        assert_eq!(res.policy, "posterior_mean_greedy");
        assert!(res.mean_regret.iter().all(|&r| r >= 0.0));
    }

    #[test]
    fn single_arm_experiment_has_no_regret() {
        let reg = ArmRegistry::new(vec![Arm::new("solo", 1.0, 0.2).with_history(10, 2)]).unwrap();
        let cfg = ExperimentConfig::default().with_horizon(25).with_replications(4);
        let res = Experiment::new(reg, cfg).unwrap().run();
        assert_eq!(res.total_regret(), 0.0);
        assert!(res.selection_share.iter().all(|row| row == &vec![1.0]));
    }

    #[test]
    fn curve_helpers() {
        let res = ExperimentResult {
            arm_ids: vec!["a".into(), "b".into()],
            policy: "thompson".into(),
            horizon: 4,
            replications: 1,
            mean_reward: vec![1.0, 0.0, 1.0, 1.0],
            mean_regret: vec![0.4, 0.2, 0.2, 0.0],
            mean_samples: vec![vec![0.1, 0.2]; 4],
            selection_share: vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.0, 1.0], vec![0.0, 1.0]],
            final_posterior: vec![BetaPosterior { alpha: 1.0, beta: 3.0 }; 2],
        };
        assert_close(&res.cumulative_regret(), &[0.4, 0.6, 0.8, 0.8]);
        assert_close(&res.cumulative_reward(), &[1.0, 1.0, 2.0, 3.0]);
        assert!((res.mean_regret_over(0..2) - 0.3).abs() < 1e-12);
        assert!((res.mean_regret_over(2..100) - 0.1).abs() < 1e-12);
        assert_eq!(res.mean_regret_over(9..12), 0.0);
        assert_close(&res.overall_selection_share(), &[0.25, 0.75]);
        assert_close(&res.final_posterior_means(), &[0.25, 0.25]);
    }
}

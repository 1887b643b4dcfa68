//! `clickmux`: seedable Thompson-sampling simulation for repeated ad auctions.
//!
//! Every round a single decision-maker picks one of a small set of ads (arms)
//! to show, observes a click or no click, and updates its belief about that
//! ad's click-through rate (CTR). Each ad carries a bid (value per click) and a
//! hidden true CTR; the goal is to maximize `bid * CTR` over a finite horizon
//! and to measure how much value is lost against an oracle that always shows
//! the ad with the highest true expected value.
//!
//! **Pieces, leaves first:**
//! - [`ArmRegistry`]: validated, immutable arm table with a precomputed oracle.
//!   [`reference_arms`] is the three-ad table used by the demo and tests.
//! - [`BetaPosterior`] / [`PosteriorState`]: conjugate Beta posteriors seeded
//!   from historical `(views, clicks)` plus a pseudo-count.
//! - [`SelectionPolicy`]: scores arms from posteriors; [`select_arm`] picks
//!   `argmax bid * score` with lowest-index tie-breaks.
//!   [`ThompsonSampling`] scores by posterior draws, [`PosteriorMeanGreedy`]
//!   by posterior means.
//! - [`OutcomeSimulator`]: Bernoulli clicks from the hidden CTRs.
//! - [`play_round`] / [`RoundEngine`]: one replication, round by round, with
//!   the posterior threaded through by value.
//! - [`Experiment`]: many replications, averaged into an [`ExperimentResult`].
//!
//! **Goals:**
//! - **Deterministic by default**: same arms + config + seed → same result,
//!   whether replications run sequentially or on the rayon pool.
//! - **No shared mutable state**: each replication owns its posteriors and its
//!   random stream ([`ReplicationStreams`]).
//! - **Fail at setup**: malformed arms or config are rejected by
//!   [`ArmRegistry::new`] / [`Experiment::new`]; running cannot fail.
//!
//! **Non-goals:**
//! - No live auction serving or persistence.
//! - Bernoulli rewards only; no contextual features; one decision-maker.
//!
//! # Example
//!
//! ```rust
//! use clickmux::{reference_registry, Experiment, ExperimentConfig};
//!
//! let cfg = ExperimentConfig::default()
//!     .with_horizon(200)
//!     .with_replications(8)
//!     .with_seed(7);
//! let exp = Experiment::new(reference_registry()?, cfg)?;
//! let res = exp.run();
//!
//! assert_eq!(res.mean_regret.len(), 200);
//! assert!(res.mean_regret.iter().all(|&r| r >= 0.0));
//! # Ok::<(), clickmux::Error>(())
//! ```
//!
//! # Regret
//!
//! The instantaneous regret of showing arm `i` is
//! `max_j bid_j * ctr_j - bid_i * ctr_i`, computed from the true CTRs and
//! therefore never negative. Realized reward (`bid` on a click, else `0`) is
//! reported separately; it is noisy even for the oracle arm.
//!
//! # Features
//!
//! - `parallel` (default): run replications with `rayon`.
//! - `serde`: `Serialize`/`Deserialize` for configs, records, and results.

#![forbid(unsafe_code)]

mod error;
pub use error::*;

mod arm;
pub use arm::*;

mod posterior;
pub use posterior::{BetaPosterior, PosteriorState, DEFAULT_PRIOR_PSEUDO_COUNT};

mod policy;
pub use policy::*;

mod thompson;
pub use thompson::*;

mod simulator;
pub use simulator::*;

mod stream;
pub use stream::*;

mod round;
pub use round::*;

mod config;
pub use config::*;

mod experiment;
pub use experiment::*;

/// Crate version, for stamping logged results.
pub const CLICKMUX_VERSION: &str = env!("CARGO_PKG_VERSION");

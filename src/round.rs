//! Round engine: one decision round at a time, for one replication.
//!
//! A round is, strictly in this order:
//! 1. score every arm from the current posteriors,
//! 2. choose `argmax bid * score`,
//! 3. simulate the click for the chosen arm,
//! 4. compute reward and instantaneous regret,
//! 5. fold the outcome into the chosen arm's posterior.
//!
//! The posterior state is threaded by value: [`play_round`] consumes the state
//! it was given and returns the next one, so a round can only ever update with
//! its own choice and outcome.

use rand::Rng;

use crate::arm::ArmRegistry;
use crate::error::{Error, Result};
use crate::policy::SelectionPolicy;
use crate::posterior::PosteriorState;
use crate::simulator::OutcomeSimulator;
use crate::stream::SimRng;

/// What happened in one round of one replication.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoundRecord {
    /// Zero-based round index.
    pub round: usize,
    /// Registry index of the arm shown.
    pub chosen: usize,
    /// Whether the impression was clicked.
    pub clicked: bool,
    /// `bid[chosen]` on a click, else `0`.
    pub reward: f64,
    /// `best_true_value - true_value[chosen]` (never negative).
    pub regret: f64,
    /// Per-arm scores drawn this round, in registry order.
    pub samples: Vec<f64>,
}

impl RoundRecord {
    /// The click outcome as `0` / `1`.
    pub fn outcome(&self) -> u8 {
        u8::from(self.clicked)
    }
}

/// Read-only inputs shared by every round of every replication.
#[derive(Debug)]
pub struct RoundContext<'a, P> {
    pub registry: &'a ArmRegistry,
    pub simulator: &'a OutcomeSimulator,
    pub policy: &'a P,
}

// Manual impls: `P` itself need not be `Clone`/`Copy`.
impl<P> Clone for RoundContext<'_, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P> Copy for RoundContext<'_, P> {}

impl<'a, P: SelectionPolicy> RoundContext<'a, P> {
    pub fn new(registry: &'a ArmRegistry, simulator: &'a OutcomeSimulator, policy: &'a P) -> Self {
        Self {
            registry,
            simulator,
            policy,
        }
    }
}

/// Play round `round` against `state`, returning the next state and the record.
///
/// `state` must hold one posterior per registered arm, and the policy must
/// return one score per arm. [`RoundEngine::new`] checks the first; breaking
/// either is a programming error.
pub fn play_round<P, R>(
    state: PosteriorState,
    ctx: &RoundContext<'_, P>,
    round: usize,
    rng: &mut R,
) -> (PosteriorState, RoundRecord)
where
    P: SelectionPolicy,
    R: Rng + ?Sized,
{
    let bids = ctx.registry.bids();
    debug_assert_eq!(state.len(), bids.len(), "posterior/registry shape");
    let (chosen, samples) = ctx.policy.choose(bids, &state, rng);
    debug_assert_eq!(samples.len(), bids.len(), "policy `{}` score count", ctx.policy.name());
    // The registry is never empty, so a choice always exists.
    let chosen = chosen.unwrap_or(0);
    let clicked = ctx.simulator.draw(chosen, rng);
    let reward = if clicked { bids[chosen] } else { 0.0 };
    let regret = ctx.registry.regret_of(chosen);
    let next = state.update(chosen, clicked);
    (
        next,
        RoundRecord {
            round,
            chosen,
            clicked,
            reward,
            regret,
            samples,
        },
    )
}

/// Where a [`RoundEngine`] is in its horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnginePhase {
    /// No round played yet.
    Ready,
    /// Round `next_round` is the next one to play.
    Running { next_round: usize },
    /// All `horizon` rounds have been played.
    Done,
}

/// Everything one replication produced.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReplicationTrace {
    pub records: Vec<RoundRecord>,
    pub final_posterior: PosteriorState,
}

impl ReplicationTrace {
    pub fn total_reward(&self) -> f64 {
        self.records.iter().map(|r| r.reward).sum()
    }

    pub fn total_regret(&self) -> f64 {
        self.records.iter().map(|r| r.regret).sum()
    }
}

/// State machine driving one replication: `Ready -> Running -> Done`.
#[derive(Debug)]
pub struct RoundEngine<'a, P, R = SimRng> {
    ctx: RoundContext<'a, P>,
    horizon: usize,
    phase: EnginePhase,
    state: PosteriorState,
    rng: R,
}

impl<'a, P, R> RoundEngine<'a, P, R>
where
    P: SelectionPolicy,
    R: Rng,
{
    pub fn new(
        ctx: RoundContext<'a, P>,
        initial: PosteriorState,
        horizon: usize,
        rng: R,
    ) -> Result<Self> {
        if horizon == 0 {
            return Err(Error::InvalidHorizon(horizon));
        }
        if initial.len() != ctx.registry.len() {
            return Err(Error::PosteriorShapeMismatch {
                expected: ctx.registry.len(),
                got: initial.len(),
            });
        }
        Ok(Self::with_checked_horizon(ctx, initial, horizon, rng))
    }

    /// Caller guarantees `horizon >= 1` and a state shaped like the registry.
    pub(crate) fn with_checked_horizon(
        ctx: RoundContext<'a, P>,
        initial: PosteriorState,
        horizon: usize,
        rng: R,
    ) -> Self {
        Self {
            ctx,
            horizon,
            phase: EnginePhase::Ready,
            state: initial,
            rng,
        }
    }

    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    pub fn is_done(&self) -> bool {
        self.phase == EnginePhase::Done
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    /// Posteriors after the rounds played so far.
    pub fn posterior(&self) -> &PosteriorState {
        &self.state
    }

    /// Play the next round; `None` once the horizon is exhausted.
    pub fn step(&mut self) -> Option<RoundRecord> {
        let round = match self.phase {
            EnginePhase::Done => return None,
            EnginePhase::Ready => 0,
            EnginePhase::Running { next_round } => next_round,
        };
        let state = std::mem::take(&mut self.state);
        let (next, record) = play_round(state, &self.ctx, round, &mut self.rng);
        self.state = next;
        self.phase = if round + 1 >= self.horizon {
            EnginePhase::Done
        } else {
            EnginePhase::Running {
                next_round: round + 1,
            }
        };
        Some(record)
    }

    /// Play every remaining round.
    pub fn run_to_end(mut self) -> ReplicationTrace {
        let remaining = match self.phase {
            EnginePhase::Ready => self.horizon,
            EnginePhase::Running { next_round } => self.horizon - next_round,
            EnginePhase::Done => 0,
        };
        let mut records = Vec::with_capacity(remaining);
        while let Some(r) = self.step() {
            records.push(r);
        }
        ReplicationTrace {
            records,
            final_posterior: self.state,
        }
    }
}

impl<P, R> Iterator for RoundEngine<'_, P, R>
where
    P: SelectionPolicy,
    R: Rng,
{
    type Item = RoundRecord;

    fn next(&mut self) -> Option<RoundRecord> {
        self.step()
    }
}

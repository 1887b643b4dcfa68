//! Setup errors.
//!
//! Every check runs before the first replication starts. Once an
//! [`Experiment`](crate::Experiment) is constructed, sampling and updates are
//! total. The shape variants guard the lower-level public pieces
//! ([`RoundEngine`](crate::RoundEngine), [`Accumulator`](crate::Accumulator))
//! when they are driven directly.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Reasons an experiment, or one of its parts, cannot be set up.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// An arm's bid, click-through rate, or history is malformed.
    #[error("invalid data for arm `{arm}`: {reason}")]
    InvalidArmData { arm: String, reason: String },

    /// The registry was built from zero arms.
    #[error("no arms registered")]
    EmptyArmSet,

    /// The horizon must be at least one round.
    #[error("horizon must be >= 1 (got {0})")]
    InvalidHorizon(usize),

    /// At least one replication is required.
    #[error("replication count must be >= 1 (got {0})")]
    InvalidReplicationCount(usize),

    /// The prior pseudo-count must be finite and strictly positive.
    #[error("prior pseudo-count must be finite and > 0 (got {0})")]
    InvalidPriorPseudoCount(f64),

    /// Historical counts with more clicks than views.
    #[error("clicks ({clicks}) exceed views ({views})")]
    InvalidHistory { views: u64, clicks: u64 },

    /// A posterior state does not hold one entry per registered arm.
    #[error("posterior state has {got} arms, registry has {expected}")]
    PosteriorShapeMismatch { expected: usize, got: usize },

    /// Two accumulators with different `(horizon, arms)` shapes.
    #[error("accumulator shape {got:?} does not match {expected:?}")]
    AccumulatorShapeMismatch {
        expected: (usize, usize),
        got: (usize, usize),
    },
}

impl Error {
    pub(crate) fn arm(arm: &str, reason: impl Into<String>) -> Self {
        Self::InvalidArmData {
            arm: arm.to_string(),
            reason: reason.into(),
        }
    }
}

//! Experiment configuration.

use crate::error::{Error, Result};
use crate::posterior::{check_pseudo_count, DEFAULT_PRIOR_PSEUDO_COUNT};

/// Rounds per replication in the reference run.
pub const DEFAULT_HORIZON: usize = 10_000;
/// Replications in the reference run.
pub const DEFAULT_REPLICATIONS: usize = 1_000;

/// Tunables for one [`Experiment`](crate::Experiment).
///
/// With the `serde` feature, missing fields take their [`Default`] values.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct ExperimentConfig {
    /// Rounds per replication (`T`, >= 1).
    pub horizon: usize,
    /// Independent replications (`R`, >= 1).
    pub replications: usize,
    /// Top-level seed; replication `r` uses stream `r` under this seed.
    pub seed: u64,
    /// Pseudo-count added to both Beta shape parameters at seeding time.
    pub prior_pseudo_count: f64,
    /// Run replications on the rayon pool (needs the `parallel` feature;
    /// ignored without it).
    pub parallel: bool,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            horizon: DEFAULT_HORIZON,
            replications: DEFAULT_REPLICATIONS,
            seed: 0,
            prior_pseudo_count: DEFAULT_PRIOR_PSEUDO_COUNT,
            parallel: true,
        }
    }
}

impl ExperimentConfig {
    pub fn with_horizon(mut self, horizon: usize) -> Self {
        self.horizon = horizon;
        self
    }

    pub fn with_replications(mut self, replications: usize) -> Self {
        self.replications = replications;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_prior_pseudo_count(mut self, pseudo_count: f64) -> Self {
        self.prior_pseudo_count = pseudo_count;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.horizon == 0 {
            return Err(Error::InvalidHorizon(self.horizon));
        }
        if self.replications == 0 {
            return Err(Error::InvalidReplicationCount(self.replications));
        }
        check_pseudo_count(self.prior_pseudo_count)
    }
}

//! Per-replication random streams.
//!
//! Every replication gets its own ChaCha keystream, selected with
//! `set_stream(replication_index)` under one top-level seed. Streams never
//! overlap and a replication's draws do not depend on which worker runs it.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Random stream for any code that consumes posterior samples and clicks.
pub type SimRng = ChaCha8Rng;

/// Stream factory keyed by a top-level seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReplicationStreams {
    seed: u64,
}

impl ReplicationStreams {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// The stream owned by replication `replication`.
    pub fn stream(&self, replication: usize) -> SimRng {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        rng.set_stream(replication as u64);
        rng
    }
}

//! Thompson sampling over Beta posteriors.
//!
//! Each round draws one CTR per arm from its posterior and acts greedily on
//! `bid * sample`. Wide posteriors occasionally sample high enough to win, so
//! exploration decays on its own as evidence accumulates; there is no
//! exploration-rate knob.

use rand::Rng;

use crate::policy::SelectionPolicy;
use crate::posterior::PosteriorState;

/// Posterior-sampling policy. Stateless: all belief lives in the
/// [`PosteriorState`] threaded through the rounds.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThompsonSampling;

impl SelectionPolicy for ThompsonSampling {
    fn name(&self) -> &'static str {
        "thompson"
    }

    /// One Beta draw per arm, in registry order.
    fn scores<R: Rng + ?Sized>(&self, posteriors: &PosteriorState, rng: &mut R) -> Vec<f64> {
        posteriors.as_slice().iter().map(|p| p.sample(rng)).collect()
    }
}

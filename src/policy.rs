//! Selection policies.
//!
//! A policy turns the current posteriors into one score per arm (an estimated
//! CTR); the arm shown is always the argmax of `bid * score`. Keeping the
//! argmax outside the trait means every policy shares the same tie-break.
//!
//! [`ThompsonSampling`][crate::ThompsonSampling] scores by posterior samples.
//! [`PosteriorMeanGreedy`] scores by posterior means and is the
//! no-exploration baseline to compare it against.

use rand::Rng;

use crate::posterior::PosteriorState;

/// Pick `argmax_i bids[i] * scores[i]`.
///
/// Ties go to the lowest index (strict `>`), and a NaN product never wins.
/// Returns `None` only when there are no arms.
///
/// ```rust
/// use clickmux::select_arm;
///
/// // A: 0.7 * 0.03 = 0.021, B: 0.5 * 0.05 = 0.025
/// assert_eq!(select_arm(&[0.7, 0.5], &[0.03, 0.05]), Some(1));
/// assert_eq!(select_arm(&[], &[]), None);
/// ```
pub fn select_arm(bids: &[f64], scores: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, (&bid, &score)) in bids.iter().zip(scores).enumerate() {
        let value = bid * score;
        let better = match best {
            None => true,
            Some((_, v)) => value > v || (v.is_nan() && !value.is_nan()),
        };
        if better {
            best = Some((i, value));
        }
    }
    best.map(|(i, _)| i)
}

/// Common interface for posterior-driven arm scoring.
pub trait SelectionPolicy {
    /// Short stable name, used in logs.
    fn name(&self) -> &'static str;

    /// One score per arm, in registry order.
    ///
    /// Sampling policies draw from `rng`; deterministic ones leave it untouched.
    fn scores<R: Rng + ?Sized>(&self, posteriors: &PosteriorState, rng: &mut R) -> Vec<f64>;

    /// Score every arm and pick the best by expected value.
    fn choose<R: Rng + ?Sized>(
        &self,
        bids: &[f64],
        posteriors: &PosteriorState,
        rng: &mut R,
    ) -> (Option<usize>, Vec<f64>) {
        let scores = self.scores(posteriors, rng);
        (select_arm(bids, &scores), scores)
    }
}

/// Always exploit the current posterior mean.
#[derive(Debug, Clone, Copy, Default)]
pub struct PosteriorMeanGreedy;

impl SelectionPolicy for PosteriorMeanGreedy {
    fn name(&self) -> &'static str {
        "posterior_mean_greedy"
    }

    fn scores<R: Rng + ?Sized>(&self, posteriors: &PosteriorState, _rng: &mut R) -> Vec<f64> {
        posteriors.as_slice().iter().map(|p| p.mean()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::posterior::BetaPosterior;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn hand_computed_case_picks_higher_expected_value() {
        // 0.021 vs 0.025
        assert_eq!(select_arm(&[0.7, 0.5], &[0.03, 0.05]), Some(1));
    }

    #[test]
    fn ties_go_to_lowest_index() {
        assert_eq!(select_arm(&[1.0, 0.5, 2.0], &[0.2, 0.4, 0.1]), Some(0));
    }

    #[test]
    fn nan_never_wins() {
        assert_eq!(select_arm(&[1.0, 1.0], &[f64::NAN, 0.1]), Some(1));
        assert_eq!(select_arm(&[1.0, 1.0], &[0.1, f64::NAN]), Some(0));
    }

    #[test]
    fn single_arm_is_always_chosen() {
        assert_eq!(select_arm(&[0.0], &[0.0]), Some(0));
    }

    #[test]
    fn greedy_scores_are_means_and_consume_no_randomness() {
        let state = PosteriorState::from_posteriors(vec![
            BetaPosterior { alpha: 1.0, beta: 3.0 },
            BetaPosterior { alpha: 3.0, beta: 1.0 },
        ]);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let before = rng.clone();
        let (chosen, scores) = PosteriorMeanGreedy.choose(&[1.0, 1.0], &state, &mut rng);
        assert_eq!(scores, vec![0.25, 0.75]);
        assert_eq!(chosen, Some(1));
        assert_eq!(rng, before);
    }
}

//! Click simulator: the only place the hidden CTRs are sampled from.

use rand::Rng;
use rand_distr::{Bernoulli, Distribution};

use crate::arm::ArmRegistry;
use crate::error::{Error, Result};

/// One Bernoulli click distribution per arm, in registry order.
#[derive(Debug, Clone)]
pub struct OutcomeSimulator {
    clicks: Vec<Bernoulli>,
}

impl OutcomeSimulator {
    pub fn from_registry(registry: &ArmRegistry) -> Result<Self> {
        let clicks = registry
            .arms()
            .iter()
            .map(|arm| {
                Bernoulli::new(arm.true_ctr)
                    .map_err(|e| Error::arm(&arm.id, format!("true ctr rejected: {e}")))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { clicks })
    }

    pub fn len(&self) -> usize {
        self.clicks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clicks.is_empty()
    }

    /// Simulate one impression of arm `idx`. Unknown arms never click.
    pub fn draw<R: Rng + ?Sized>(&self, idx: usize, rng: &mut R) -> bool {
        self.clicks.get(idx).is_some_and(|d| d.sample(rng))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arm::Arm;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn sim() -> OutcomeSimulator {
        let reg = ArmRegistry::new(vec![
            Arm::new("never", 1.0, 0.0),
            Arm::new("always", 1.0, 1.0),
            Arm::new("third", 1.0, 0.3),
        ])
        .unwrap();
        OutcomeSimulator::from_registry(&reg).unwrap()
    }

    #[test]
    fn degenerate_ctrs_are_deterministic() {
        let s = sim();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        for _ in 0..100 {
            assert!(!s.draw(0, &mut rng));
            assert!(s.draw(1, &mut rng));
        }
        assert!(!s.draw(99, &mut rng));
    }

    #[test]
    fn empirical_click_rate_tracks_true_ctr() {
        let s = sim();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let n = 20_000;
        let clicks = (0..n).filter(|_| s.draw(2, &mut rng)).count();
        let rate = clicks as f64 / n as f64;
        // sd ~ 0.0032
        assert!((rate - 0.3).abs() < 0.02, "rate {rate}");
    }
}

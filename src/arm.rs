//! Arm registry: the static description of every competing ad.
//!
//! The registry is validated once and never mutated afterwards. It is the only
//! shared resource across replications, so it is read-only by construction.

use crate::error::{Error, Result};
use std::collections::BTreeSet;

/// Historical `(views, clicks)` counts used to seed an arm's prior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct History {
    /// Number of past impressions.
    pub views: u64,
    /// Number of past clicks (must be `<= views`).
    pub clicks: u64,
}

impl History {
    pub fn new(views: u64, clicks: u64) -> Self {
        Self { views, clicks }
    }

    /// Impressions that did not produce a click.
    pub fn non_clicks(&self) -> u64 {
        self.views.saturating_sub(self.clicks)
    }
}

/// One competing ad.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Arm {
    /// Stable, unique identifier.
    pub id: String,
    /// Value realized per click (finite, `>= 0`).
    pub bid: f64,
    /// True click-through rate in `[0, 1]`.
    ///
    /// Only the outcome simulator and the regret oracle read this.
    pub true_ctr: f64,
    /// Optional historical counts for prior seeding.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub history: Option<History>,
}

impl Arm {
    pub fn new(id: impl Into<String>, bid: f64, true_ctr: f64) -> Self {
        Self {
            id: id.into(),
            bid,
            true_ctr,
            history: None,
        }
    }

    /// Attach historical `(views, clicks)` counts.
    pub fn with_history(mut self, views: u64, clicks: u64) -> Self {
        self.history = Some(History::new(views, clicks));
        self
    }

    /// Expected value per impression under the true CTR.
    pub fn true_value(&self) -> f64 {
        self.bid * self.true_ctr
    }

    fn validate(&self) -> Result<()> {
        if !self.bid.is_finite() || self.bid < 0.0 {
            return Err(Error::arm(
                &self.id,
                format!("bid must be finite and >= 0 (got {})", self.bid),
            ));
        }
        if !(0.0..=1.0).contains(&self.true_ctr) {
            return Err(Error::arm(
                &self.id,
                format!("true ctr must be in [0, 1] (got {})", self.true_ctr),
            ));
        }
        if let Some(h) = self.history {
            if h.clicks > h.views {
                let reason = Error::InvalidHistory {
                    views: h.views,
                    clicks: h.clicks,
                };
                return Err(Error::arm(&self.id, reason.to_string()));
            }
        }
        Ok(())
    }
}

/// Validated, immutable set of arms with a precomputed oracle.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ArmRegistry {
    arms: Vec<Arm>,
    bids: Vec<f64>,
    true_values: Vec<f64>,
    best: usize,
}

impl ArmRegistry {
    /// Validate `arms` and fix the oracle arm.
    ///
    /// The oracle is the arm with the highest `bid * true_ctr`; the lowest
    /// registry index wins ties.
    pub fn new(arms: Vec<Arm>) -> Result<Self> {
        if arms.is_empty() {
            return Err(Error::EmptyArmSet);
        }
        let mut seen = BTreeSet::new();
        for arm in &arms {
            arm.validate()?;
            if !seen.insert(arm.id.as_str()) {
                return Err(Error::arm(&arm.id, "duplicate arm id"));
            }
        }

        let bids: Vec<f64> = arms.iter().map(|a| a.bid).collect();
        let true_values: Vec<f64> = arms.iter().map(Arm::true_value).collect();
        let mut best = 0;
        for (i, &v) in true_values.iter().enumerate() {
            if v > true_values[best] {
                best = i;
            }
        }

        Ok(Self {
            arms,
            bids,
            true_values,
            best,
        })
    }

    pub fn len(&self) -> usize {
        self.arms.len()
    }

    /// Always `false`: construction rejects empty arm sets.
    pub fn is_empty(&self) -> bool {
        self.arms.is_empty()
    }

    pub fn arms(&self) -> &[Arm] {
        &self.arms
    }

    pub fn get(&self, idx: usize) -> Option<&Arm> {
        self.arms.get(idx)
    }

    /// Registry index of the arm with this id.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.arms.iter().position(|a| a.id == id)
    }

    pub fn ids(&self) -> Vec<String> {
        self.arms.iter().map(|a| a.id.clone()).collect()
    }

    /// Bids in registry order.
    pub fn bids(&self) -> &[f64] {
        &self.bids
    }

    /// Registry index of the oracle arm.
    pub fn best_index(&self) -> usize {
        self.best
    }

    /// True expected value of the oracle arm.
    pub fn best_value(&self) -> f64 {
        self.true_values[self.best]
    }

    /// Instantaneous regret of showing arm `idx`. Never negative.
    pub fn regret_of(&self, idx: usize) -> f64 {
        (self.best_value() - self.true_values[idx]).max(0.0)
    }
}

/// The three-ad reference table used by the demo, tests, and benches.
///
/// `crypto_magic` has 9 clicks out of 300 views; the true CTRs put
/// `green_energy` ahead on expected value even though `crypto_magic` bids more.
pub fn reference_arms() -> Vec<Arm> {
    vec![
        Arm::new("crypto_magic", 0.70, 0.030).with_history(300, 9),
        Arm::new("green_energy", 0.50, 0.055).with_history(250, 12),
        Arm::new("infini_waves", 0.45, 0.045).with_history(400, 16),
    ]
}

/// [`reference_arms`] as a validated registry.
pub fn reference_registry() -> Result<ArmRegistry> {
    ArmRegistry::new(reference_arms())
}

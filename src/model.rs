//! Posterior state: Beta(α, β) belief per arm per context.

use crate::arm::{Arm, ALPHA0, BETA0};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Beta(α, β) posterior over an arm's success probability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArmPosterior {
    pub alpha: f64,
    pub beta: f64,
}

impl ArmPosterior {
    pub fn prior() -> Self {
        Self {
            alpha: ALPHA0,
            beta: BETA0,
        }
    }

    /// Observation count, derived from how far the posterior has moved from
    /// the prior; never stored directly (spec §3, invariant 1).
    pub fn n(&self) -> f64 {
        self.alpha + self.beta - ALPHA0 - BETA0
    }

    pub fn mean(&self) -> f64 {
        self.alpha / (self.alpha + self.beta)
    }
}

impl Default for ArmPosterior {
    fn default() -> Self {
        Self::prior()
    }
}

/// Per-context posteriors, keyed by arm minutes. A `BTreeMap` keeps the
/// arm set small, ordered, and open-addressed the way the spec's
/// "small open-addressed map" design note describes.
pub type ContextPosteriors = BTreeMap<Arm, ArmPosterior>;

/// The `model` table: contextKey -> arm -> posterior.
pub type ModelTable = HashMap<String, ContextPosteriors>;

/// `N(C) = Σ_a n(a)` over every arm ever observed in this context, not just
/// the arms in the currently active zone.
pub fn total_observations(posteriors: &ContextPosteriors) -> f64 {
    posteriors.values().map(ArmPosterior::n).sum()
}

/// The arm with the highest posterior mean, used by the cross-energy floor
/// rule (spec §4.6 step 6). Returns `None` for an empty context.
pub fn best_mean_arm(posteriors: &ContextPosteriors) -> Option<Arm> {
    posteriors
        .iter()
        .max_by(|a, b| a.1.mean().partial_cmp(&b.1.mean()).unwrap())
        .map(|(&arm, _)| arm)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_posterior_has_zero_observations() {
        let p = ArmPosterior::prior();
        assert_eq!(p.n(), 0.0);
        assert!((p.mean() - (1.0 / 2.5)).abs() < 1e-9);
    }

    #[test]
    fn total_observations_sums_across_arms() {
        let mut posteriors = ContextPosteriors::new();
        posteriors.insert(25, ArmPosterior { alpha: 3.0, beta: 2.0 });
        posteriors.insert(30, ArmPosterior { alpha: 1.0, beta: 1.5 });
        // arm 25: n = 3+2-1-1.5 = 2.5; arm 30: n = 0
        assert!((total_observations(&posteriors) - 2.5).abs() < 1e-9);
    }

    #[test]
    fn best_mean_arm_picks_highest_mean() {
        let mut posteriors = ContextPosteriors::new();
        posteriors.insert(25, ArmPosterior { alpha: 2.0, beta: 2.0 });
        posteriors.insert(40, ArmPosterior { alpha: 9.0, beta: 2.0 });
        assert_eq!(best_mean_arm(&posteriors), Some(40));
    }
}

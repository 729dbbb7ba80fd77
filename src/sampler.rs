//! Beta-distribution sampling and Thompson-Sampling arm selection.

use crate::arm::{Arm, EARLY_THRESHOLD};
use crate::model::{total_observations, ArmPosterior, ContextPosteriors};
use rand::rngs::SmallRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

/// Jöhnk's generator: draw `Beta(alpha, beta)` from two independent
/// uniform(0,1) draws `u, v` via `x = u^(1/alpha), y = v^(1/beta)`,
/// `sample = x / (x + y)`. Factored out as a free function so it can be
/// unit-tested without an RNG in the loop.
pub fn sample_beta(alpha: f64, beta: f64, u: f64, v: f64) -> f64 {
    let x = u.powf(1.0 / alpha);
    let y = v.powf(1.0 / beta);
    if x + y > 0.0 {
        x / (x + y)
    } else {
        0.0
    }
}

/// Owns the deterministic RNG used for Beta draws and early-exploration
/// choices. Seeding it fixes every downstream recommendation, which is what
/// makes the scenario tests in spec §8 reproducible.
pub struct Sampler {
    rng: SmallRng,
}

impl Sampler {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn from_os_rng() -> Self {
        Self {
            rng: SmallRng::from_os_rng(),
        }
    }

    fn draw_beta(&mut self, posterior: &ArmPosterior) -> f64 {
        let u = self.rng.random::<f64>();
        let v = self.rng.random::<f64>();
        sample_beta(posterior.alpha, posterior.beta, u, v)
    }

    /// Select the best arm for a context's current arm set. Materialises
    /// (and leaves in `posteriors` for the caller to persist) a prior entry
    /// for any arm not yet observed.
    pub fn get_best_action(&mut self, posteriors: &mut ContextPosteriors, arms: &[Arm]) -> Arm {
        assert!(!arms.is_empty(), "arm set is never empty");

        if total_observations(posteriors) < EARLY_THRESHOLD {
            return *arms
                .choose(&mut self.rng)
                .expect("arm set is never empty");
        }

        let mut best_arm = arms[0];
        let mut best_sample = f64::MIN;
        for &arm in arms {
            let posterior = posteriors.entry(arm).or_insert_with(ArmPosterior::prior);
            let sample = self.draw_beta(posterior);
            if sample > best_sample {
                best_sample = sample;
                best_arm = arm;
            }
        }
        best_arm
    }

    /// `updateModel(C, a, r)`. Guard: non-finite or exactly-zero reward is a
    /// no-op. A negative `r` is the rejection-penalty path and only ever
    /// inflates `beta`; invariant 1 (`alpha >= alpha0, beta >= beta0`) holds
    /// either way because both branches only ever add a non-negative amount.
    pub fn update_model(posteriors: &mut ContextPosteriors, arm: Arm, r: f64) {
        if !r.is_finite() || r == 0.0 {
            return;
        }
        let posterior = posteriors.entry(arm).or_insert_with(ArmPosterior::prior);
        if r < 0.0 {
            posterior.beta += -r;
        } else {
            let r = r.min(1.0);
            posterior.alpha += r;
            posterior.beta += 1.0 - r;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arm::{ALPHA0, BETA0};

    fn mean_of(samples: &[f64]) -> f64 {
        samples.iter().sum::<f64>() / samples.len() as f64
    }

    #[test]
    fn beta_5_1_skews_high() {
        let mut sampler = Sampler::seeded(7);
        let posterior = ArmPosterior { alpha: 5.0, beta: 1.0 };
        let samples: Vec<f64> = (0..2000).map(|_| sampler.draw_beta(&posterior)).collect();
        assert!(mean_of(&samples) > 0.6, "mean was {}", mean_of(&samples));
    }

    #[test]
    fn beta_1_5_skews_low() {
        let mut sampler = Sampler::seeded(7);
        let posterior = ArmPosterior { alpha: 1.0, beta: 5.0 };
        let samples: Vec<f64> = (0..2000).map(|_| sampler.draw_beta(&posterior)).collect();
        assert!(mean_of(&samples) < 0.4, "mean was {}", mean_of(&samples));
    }

    #[test]
    fn beta_1_1_is_spread_out() {
        let mut sampler = Sampler::seeded(11);
        let posterior = ArmPosterior { alpha: 1.0, beta: 1.0 };
        let samples: Vec<f64> = (0..1000).map(|_| sampler.draw_beta(&posterior)).collect();
        let below = samples.iter().filter(|&&s| s < 0.3).count();
        let above = samples.iter().filter(|&&s| s > 0.7).count();
        assert!(below as f64 / 1000.0 >= 0.15);
        assert!(above as f64 / 1000.0 >= 0.15);
    }

    #[test]
    fn early_exploration_ignores_thompson_draw() {
        let mut sampler = Sampler::seeded(3);
        let mut posteriors = ContextPosteriors::new();
        // Two observations: N(C) = 2 < EARLY_THRESHOLD (3).
        Sampler::update_model(&mut posteriors, 25, 0.8);
        Sampler::update_model(&mut posteriors, 25, 0.8);
        let arms = [10, 15, 20, 25, 30];
        let mut seen = std::collections::HashSet::new();
        for _ in 0..50 {
            seen.insert(sampler.get_best_action(&mut posteriors, &arms));
        }
        assert!(seen.len() > 1, "expected uniform exploration, saw {:?}", seen);
    }

    #[test]
    fn update_model_guard_ignores_zero_and_nan() {
        let mut posteriors = ContextPosteriors::new();
        Sampler::update_model(&mut posteriors, 25, 0.0);
        Sampler::update_model(&mut posteriors, 25, f64::NAN);
        assert!(posteriors.is_empty());
    }

    #[test]
    fn update_model_round_trips_alpha_beta() {
        let mut posteriors = ContextPosteriors::new();
        Sampler::update_model(&mut posteriors, 25, 0.8);
        let p = posteriors[&25];
        assert!((p.alpha - (ALPHA0 + 0.8)).abs() < 1e-9);
        assert!((p.beta - (BETA0 + 0.2)).abs() < 1e-9);
    }

    #[test]
    fn rejection_penalty_only_inflates_beta() {
        let mut posteriors = ContextPosteriors::new();
        Sampler::update_model(&mut posteriors, 25, -0.3);
        let p = posteriors[&25];
        assert!((p.alpha - ALPHA0).abs() < 1e-9);
        assert!((p.beta - (BETA0 + 0.3)).abs() < 1e-9);
    }
}

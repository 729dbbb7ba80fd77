//! Orchestrates the posterior, zone governor, capacity tracker and reward
//! function into the four (plus one maintenance) operations a caller sees.

use crate::arm::{clamp_to_arms, permitted_break_arms, Arm, Zone, REJECTION_PENALTY, SPILLOVER_FACTOR, SPILLOVER_THRESHOLD};
use crate::capacity::{adjust_for_capacity, CapacityStats, SessionRecord};
use crate::context::{Context, EnergyLevel};
use crate::model::{best_mean_arm, total_observations, ContextPosteriors, ModelTable};
use crate::reward::{capacity_scaled, compute_reward, CompletionType, SessionOutcome};
use crate::sampler::Sampler;
use crate::storage::Storage;
use crate::zone::ZoneData;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type ZoneMap = HashMap<String, ZoneData>;
pub type CapacityMap = HashMap<String, CapacityStats>;

/// A context needs at least this many observations before the model (rather
/// than the caller-supplied heuristic) drives its recommendation.
const LEARNING_THRESHOLD: f64 = 2.0;
/// A context needs at least this many observations before a recommendation
/// is labelled `Learned` rather than `Blended`.
const CONFIDENT_THRESHOLD: f64 = 5.0;

/// Which signal actually produced a recommendation's value, for a caller
/// that wants to show it with confidence or hedge the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Too little history to trust the model; the caller-supplied heuristic
    /// was returned as-is (clamped into the arm set).
    Heuristic,
    /// Some history, but not yet enough to call the recommendation learned.
    Blended,
    /// Plenty of history and the capacity tracker left the model's pick
    /// untouched.
    Learned,
    /// The capacity tracker overrode the model's pick.
    Capacity,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub minutes: Arm,
    pub source: Source,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub model: ModelTable,
    pub zones: ZoneMap,
    pub capacity: CapacityMap,
}

pub struct Recommender<S> {
    storage: S,
    sampler: Sampler,
    model: ModelTable,
    zones: ZoneMap,
    capacity: CapacityMap,
}

impl<S> Recommender<S>
where
    S: Storage<ModelTable> + Storage<ZoneMap> + Storage<CapacityMap>,
{
    pub fn new(storage: S, sampler: Sampler) -> Self {
        let model = Storage::<ModelTable>::load(&storage, "model");
        let zones = Storage::<ZoneMap>::load(&storage, "zones");
        let capacity = Storage::<CapacityMap>::load(&storage, "capacity");
        Self {
            storage,
            sampler,
            model,
            zones,
            capacity,
        }
    }

    /// Recommend a focus-session duration for `context` (spec §4.6).
    ///
    /// `heuristic_minutes` is the caller's own rule-of-thumb pick (used
    /// verbatim below the learning threshold, and as the zone-init seed on
    /// first contact); `dynamic_arms` are arms the caller already knows
    /// about for this context (e.g. restored from elsewhere) that should be
    /// admitted into the active arm set before it is computed.
    pub fn recommend_focus(
        &mut self,
        context: &Context,
        heuristic_minutes: Arm,
        dynamic_arms: &[Arm],
    ) -> Recommendation {
        let key = context.key();

        self.zones
            .entry(key.clone())
            .or_insert_with(|| ZoneData::new(Zone::initial(heuristic_minutes, context.energy_level)));
        {
            let zone_data = self.zones.get_mut(&key).expect("zone just inserted above");
            for &arm in dynamic_arms {
                zone_data.admit_dynamic_arm(arm);
            }
        }
        let arms = self.zones[&key].arm_set();

        let n_total = self.model.get(&key).map(total_observations).unwrap_or(0.0);

        let recommendation = if n_total < LEARNING_THRESHOLD {
            Recommendation {
                minutes: clamp_to_arms(heuristic_minutes, &arms),
                source: Source::Heuristic,
            }
        } else {
            let model_rec = {
                let posteriors = self.model.entry(key.clone()).or_insert_with(ContextPosteriors::new);
                self.sampler.get_best_action(posteriors, &arms)
            };
            let capacity_adjusted = {
                let stats = self.capacity.entry(key.clone()).or_insert_with(CapacityStats::default);
                adjust_for_capacity(model_rec, stats, context.energy_level)
            };
            let capacity_changed = capacity_adjusted != model_rec;

            let floored = self.apply_cross_energy_floor(context, capacity_adjusted);
            let minutes = clamp_to_arms(floored, &arms);

            let source = if capacity_changed {
                Source::Capacity
            } else if n_total >= CONFIDENT_THRESHOLD {
                Source::Learned
            } else {
                Source::Blended
            };
            self.persist_model();
            self.persist_capacity();
            Recommendation { minutes, source }
        };

        self.persist_zones();
        recommendation
    }

    /// Recommend a break duration for `context`, restricted to the break
    /// arms a session of `focus_minutes` actually permits (spec §4.6).
    pub fn recommend_break(&mut self, context: &Context, heuristic_break: Arm, focus_minutes: Arm) -> Recommendation {
        let permitted = permitted_break_arms(focus_minutes);
        let key = context.break_key();
        let n_total = self.model.get(&key).map(total_observations).unwrap_or(0.0);

        let recommendation = if n_total < LEARNING_THRESHOLD {
            let ceiling = *permitted.iter().max().expect("permitted break arms is never empty");
            Recommendation {
                minutes: heuristic_break.min(ceiling),
                source: Source::Heuristic,
            }
        } else {
            let posteriors = self.model.entry(key).or_insert_with(ContextPosteriors::new);
            let minutes = self.sampler.get_best_action(posteriors, &permitted);
            self.persist_model();
            Recommendation {
                minutes,
                source: Source::Learned,
            }
        };

        recommendation
    }

    /// A higher-energy recommendation can never fall below the best proven
    /// arm recorded at any lower energy level for the same task (spec §4.6
    /// step 6).
    fn apply_cross_energy_floor(&self, context: &Context, candidate: Arm) -> Arm {
        let Some(rank) = context.energy_level.rank() else {
            return candidate;
        };
        let mut floor = candidate;
        for lower in EnergyLevel::ALL
            .iter()
            .filter(|e| e.rank().is_some_and(|r| r < rank))
        {
            let lower_key = context.at_energy(*lower).key();
            if let Some(best) = self.model.get(&lower_key).and_then(best_mean_arm) {
                floor = floor.max(best);
            }
        }
        floor
    }

    /// Record the outcome of a completed, skipped-focus or skipped-break
    /// session: compute the reward, update whichever posteriors/trackers
    /// this completion type touches, and persist (spec §4.5-4.6). There is
    /// no error return: an outcome that can't be fully reconciled still has
    /// its valid parts recorded, per the "caller receives no error code"
    /// contract (spec §7).
    pub fn observe_outcome(&mut self, context: &Context, outcome: SessionOutcome) {
        let key = context.key();
        let reward = compute_reward(&outcome);

        match outcome.completion_type {
            CompletionType::Completed => {
                let arm = outcome.selected_focus_minutes;
                let scaled_reward = {
                    let stats = self.capacity.entry(key.clone()).or_insert_with(CapacityStats::default);
                    capacity_scaled(reward, stats)
                };

                {
                    let posteriors = self.model.entry(key.clone()).or_insert_with(ContextPosteriors::new);
                    Sampler::update_model(posteriors, arm, scaled_reward);
                }
                if scaled_reward >= SPILLOVER_THRESHOLD {
                    self.apply_spillover(&key, arm, scaled_reward);
                }

                let break_key = context.break_key();
                let break_posteriors = self.model.entry(break_key).or_insert_with(ContextPosteriors::new);
                Sampler::update_model(break_posteriors, outcome.selected_break_minutes, scaled_reward);

                let zone_data = self
                    .zones
                    .entry(key.clone())
                    .or_insert_with(|| ZoneData::new(Zone::initial(arm, context.energy_level)));
                zone_data.admit_dynamic_arm(arm);
                zone_data.record_selection(arm);

                let stats = self.capacity.entry(key.clone()).or_insert_with(CapacityStats::default);
                stats.record(SessionRecord {
                    selected: outcome.selected_focus_minutes,
                    actual: outcome.focused_minutes,
                    completed: true,
                    timestamp: outcome.timestamp,
                    time_of_day: outcome.time_of_day.clone(),
                });

                self.persist_model();
                self.persist_zones();
                self.persist_capacity();
            }
            CompletionType::SkippedBreak => {
                let arm = outcome.selected_focus_minutes;
                let posteriors = self.model.entry(key).or_insert_with(ContextPosteriors::new);
                Sampler::update_model(posteriors, arm, reward);
                self.persist_model();
            }
            CompletionType::SkippedFocus => {
                let stats = self.capacity.entry(key).or_insert_with(CapacityStats::default);
                stats.record(SessionRecord {
                    selected: outcome.selected_focus_minutes,
                    actual: outcome.focused_minutes,
                    completed: false,
                    timestamp: outcome.timestamp,
                    time_of_day: outcome.time_of_day.clone(),
                });
                self.persist_capacity();
            }
        }
    }

    /// A completed session with a strong reward spills a fraction of its
    /// weight onto the next-higher arm in the same zone, so a context that
    /// keeps acing its recommendation nudges the posterior upward even
    /// before that higher arm is tried directly (spec §4.5).
    fn apply_spillover(&mut self, key: &str, arm: Arm, reward: f64) {
        let arms = self.zones.get(key).map(|z| z.arm_set()).unwrap_or_default();
        let Some(&next) = arms.iter().find(|&&a| a > arm) else {
            return;
        };
        let posteriors = self
            .model
            .entry(key.to_string())
            .or_insert_with(ContextPosteriors::new);
        Sampler::update_model(posteriors, next, reward * SPILLOVER_FACTOR);
    }

    /// Apply the rejection penalty to an arm the user was offered and
    /// explicitly turned down without starting a session (spec §4.5).
    pub fn penalize_rejection(&mut self, context: &Context, rejected_minutes: Arm) {
        let key = context.key();
        let posteriors = self.model.entry(key).or_insert_with(ContextPosteriors::new);
        Sampler::update_model(posteriors, rejected_minutes, REJECTION_PENALTY);
        self.persist_model();
    }

    /// Diagnostic-only view of a context's zone confidence (spec §4.3); not
    /// consulted anywhere in the core recommendation flow.
    pub fn zone_confidence(&self, context: &Context) -> Option<f64> {
        self.zones.get(&context.key()).map(|z| z.confidence)
    }

    /// Diagnostic-only view of which zone a context is currently governed
    /// by, if it has ever been materialised.
    pub fn zone_of(&self, context: &Context) -> Option<Zone> {
        self.zones.get(&context.key()).map(|z| z.zone)
    }

    pub fn export_state(&self) -> StateSnapshot {
        StateSnapshot {
            model: self.model.clone(),
            zones: self.zones.clone(),
            capacity: self.capacity.clone(),
        }
    }

    pub fn import_state(&mut self, snapshot: StateSnapshot) {
        self.model = snapshot.model;
        self.zones = snapshot.zones;
        self.capacity = snapshot.capacity;
        self.persist_model();
        self.persist_zones();
        self.persist_capacity();
    }

    /// Wipe every table, in memory and on the backing store. Not one of the
    /// spec's four headline operations, but required by its lifecycle
    /// section (a user resetting the recommender from scratch).
    pub fn clear_all_data(&mut self) {
        self.model.clear();
        self.zones.clear();
        self.capacity.clear();
        Storage::<ModelTable>::clear(&self.storage, "model");
        Storage::<ZoneMap>::clear(&self.storage, "zones");
        Storage::<CapacityMap>::clear(&self.storage, "capacity");
    }

    fn persist_model(&self) {
        Storage::<ModelTable>::save(&self.storage, "model", &self.model);
    }

    fn persist_zones(&self) {
        Storage::<ZoneMap>::save(&self.storage, "zones", &self.zones);
    }

    fn persist_capacity(&self) {
        Storage::<CapacityMap>::save(&self.storage, "capacity", &self.capacity);
    }
}

//! Per-context zone state: which regime (short/long) a user is operating in,
//! and the migration rule that moves them between regimes.

use crate::arm::{
    Arm, Zone, SELECTIONS_WINDOW, TRANSITION_DOWN_AVG, TRANSITION_UP_AVG, TRANSITION_WINDOW,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneData {
    pub zone: Zone,
    pub confidence: f64,
    pub selections: VecDeque<Arm>,
    pub transition_ready: bool,
    #[serde(default)]
    pub dynamic_arms: BTreeSet<Arm>,
}

impl ZoneData {
    pub fn new(zone: Zone) -> Self {
        Self {
            zone,
            confidence: 0.0,
            selections: VecDeque::new(),
            transition_ready: false,
            dynamic_arms: BTreeSet::new(),
        }
    }

    pub fn arm_set(&self) -> Vec<Arm> {
        self.zone.arm_set(&self.dynamic_arms)
    }

    /// Admit a user-dialled arm outside the current zone's base set so it
    /// is offered by future recommendations (spec §4.3).
    pub fn admit_dynamic_arm(&mut self, arm: Arm) {
        if !self.zone.base_arms().contains(&arm) {
            self.dynamic_arms.insert(arm);
        }
    }

    /// Record a chosen arm, evict past the window, recompute confidence,
    /// and apply the hysteresis transition rule once enough history exists.
    pub fn record_selection(&mut self, arm: Arm) {
        self.selections.push_back(arm);
        while self.selections.len() > SELECTIONS_WINDOW {
            self.selections.pop_front();
        }
        self.confidence = (self.selections.len() as f64 / TRANSITION_WINDOW as f64).min(1.0);

        if self.selections.len() >= TRANSITION_WINDOW {
            let recent: Vec<Arm> = self
                .selections
                .iter()
                .rev()
                .take(TRANSITION_WINDOW)
                .copied()
                .collect();
            let avg_recent = recent.iter().sum::<Arm>() as f64 / recent.len() as f64;

            self.transition_ready = true;
            match self.zone {
                Zone::Short if avg_recent >= TRANSITION_UP_AVG => self.zone = Zone::Long,
                Zone::Long if avg_recent <= TRANSITION_DOWN_AVG => self.zone = Zone::Short,
                _ => {}
            }
        } else {
            self.transition_ready = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_caps_at_one() {
        let mut z = ZoneData::new(Zone::Short);
        for _ in 0..10 {
            z.record_selection(20);
        }
        assert_eq!(z.confidence, 1.0);
        assert!(z.selections.len() <= SELECTIONS_WINDOW);
    }

    #[test]
    fn selections_window_is_bounded() {
        let mut z = ZoneData::new(Zone::Short);
        for i in 0..20 {
            z.record_selection(10 + i % 5);
        }
        assert_eq!(z.selections.len(), SELECTIONS_WINDOW);
    }

    #[test]
    fn five_selections_of_30_transitions_short_to_long() {
        let mut z = ZoneData::new(Zone::Short);
        for _ in 0..5 {
            z.record_selection(30);
        }
        assert_eq!(z.zone, Zone::Long);
    }

    #[test]
    fn hysteresis_holds_zone_in_the_gap() {
        let mut z = ZoneData::new(Zone::Long);
        for _ in 0..5 {
            z.record_selection(28); // between 25 and 30: neither threshold crossed
        }
        assert_eq!(z.zone, Zone::Long);
    }

    #[test]
    fn long_to_short_on_sustained_low_average() {
        let mut z = ZoneData::new(Zone::Long);
        for _ in 0..5 {
            z.record_selection(20);
        }
        assert_eq!(z.zone, Zone::Short);
    }

    #[test]
    fn dynamic_arm_outside_base_set_is_admitted() {
        let mut z = ZoneData::new(Zone::Short);
        z.admit_dynamic_arm(12);
        assert!(z.dynamic_arms.contains(&12));
        assert!(z.arm_set().contains(&12));
    }

    #[test]
    fn dynamic_arm_already_in_base_set_is_not_admitted() {
        let mut z = ZoneData::new(Zone::Short);
        z.admit_dynamic_arm(25);
        assert!(z.dynamic_arms.is_empty());
    }
}

//! What the user can actually sustain, independent of what the posterior
//! currently prefers.

use crate::arm::{round_to_5, Arm, CAPACITY_WINDOW, STRETCH_THRESHOLD_HIGH, STRETCH_THRESHOLD_MID};
use crate::context::EnergyLevel;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Growing,
    Stable,
    Declining,
}

/// One completed-or-skipped session. `time_of_day` is a historical field:
/// the original tool stored it but never read it back for recommendation
/// purposes. It is preserved on import/export for backup compatibility and
/// otherwise ignored (spec §9 Open Questions).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub selected: Arm,
    pub actual: Arm,
    pub completed: bool,
    pub timestamp: i64,
    #[serde(default)]
    pub time_of_day: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityStats {
    pub recent_sessions: VecDeque<SessionRecord>,
    pub average_capacity: f64,
    pub completion_rate: f64,
    pub trend: Trend,
}

impl Default for CapacityStats {
    fn default() -> Self {
        Self {
            recent_sessions: VecDeque::new(),
            average_capacity: 0.0,
            completion_rate: 0.0,
            trend: Trend::Stable,
        }
    }
}

impl CapacityStats {
    pub fn record(&mut self, session: SessionRecord) {
        self.recent_sessions.push_back(session);
        while self.recent_sessions.len() > CAPACITY_WINDOW {
            self.recent_sessions.pop_front();
        }
        self.recompute();
    }

    fn recompute(&mut self) {
        let n = self.recent_sessions.len();
        if n == 0 {
            self.average_capacity = 0.0;
            self.completion_rate = 0.0;
            self.trend = Trend::Stable;
            return;
        }

        self.average_capacity =
            self.recent_sessions.iter().map(|s| s.actual as f64).sum::<f64>() / n as f64;

        let completed = self.recent_sessions.iter().filter(|s| s.completed).count();
        self.completion_rate = completed as f64 / n as f64;

        self.trend = if n < 3 {
            Trend::Stable
        } else {
            let ratios: Vec<f64> = self
                .recent_sessions
                .iter()
                .map(|s| s.actual as f64 / s.selected.max(1) as f64)
                .collect();
            let slope = least_squares_slope(&ratios);
            if slope > 0.05 {
                Trend::Growing
            } else if slope < -0.05 {
                Trend::Declining
            } else {
                Trend::Stable
            }
        };
    }
}

/// Least-squares slope of `y` against indices `0..n-1`.
fn least_squares_slope(y: &[f64]) -> f64 {
    let n = y.len() as f64;
    let xs: Vec<f64> = (0..y.len()).map(|i| i as f64).collect();
    let x_mean = xs.iter().sum::<f64>() / n;
    let y_mean = y.iter().sum::<f64>() / n;
    let mut num = 0.0;
    let mut den = 0.0;
    for (x, yv) in xs.iter().zip(y.iter()) {
        num += (x - x_mean) * (yv - y_mean);
        den += (x - x_mean).powi(2);
    }
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

/// `adjustForCapacity(modelRec, stats, energyLevel)` (spec §4.4).
pub fn adjust_for_capacity(model_rec: Arm, stats: &CapacityStats, energy_level: EnergyLevel) -> Arm {
    if stats.recent_sessions.len() < 3 {
        return model_rec;
    }
    if stats.completion_rate < 0.5 {
        return std::cmp::max(10, round_to_5(stats.average_capacity));
    }
    if energy_level == EnergyLevel::Low {
        return model_rec;
    }
    let stretch_threshold = if energy_level == EnergyLevel::High {
        STRETCH_THRESHOLD_HIGH
    } else {
        STRETCH_THRESHOLD_MID
    };
    let trend_ok = matches!(stats.trend, Trend::Stable | Trend::Growing);
    if stats.completion_rate >= stretch_threshold && trend_ok {
        model_rec + 5
    } else {
        model_rec
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(selected: Arm, actual: Arm, completed: bool) -> SessionRecord {
        SessionRecord {
            selected,
            actual,
            completed,
            timestamp: 0,
            time_of_day: None,
        }
    }

    #[test]
    fn window_is_bounded_to_ten() {
        let mut stats = CapacityStats::default();
        for i in 0..15 {
            stats.record(session(25, 20 + i % 3, true));
        }
        assert_eq!(stats.recent_sessions.len(), CAPACITY_WINDOW);
    }

    #[test]
    fn fewer_than_three_sessions_is_stable() {
        let mut stats = CapacityStats::default();
        stats.record(session(25, 10, true));
        stats.record(session(25, 30, true));
        assert_eq!(stats.trend, Trend::Stable);
    }

    #[test]
    fn capacity_clamp_limits_to_demonstrated_ceiling() {
        let mut stats = CapacityStats::default();
        for _ in 0..10 {
            stats.record(session(40, 12, false));
        }
        assert!(stats.completion_rate < 0.5);
        let adjusted = adjust_for_capacity(40, &stats, EnergyLevel::Mid);
        assert!(adjusted <= 20);
    }

    #[test]
    fn low_energy_never_stretches() {
        let mut stats = CapacityStats::default();
        for _ in 0..10 {
            stats.record(session(25, 25, true));
        }
        assert_eq!(adjust_for_capacity(25, &stats, EnergyLevel::Low), 25);
    }

    #[test]
    fn high_completion_and_stable_trend_stretches_by_five() {
        let mut stats = CapacityStats::default();
        for _ in 0..10 {
            stats.record(session(25, 25, true));
        }
        assert_eq!(stats.completion_rate, 1.0);
        assert_eq!(adjust_for_capacity(25, &stats, EnergyLevel::Mid), 30);
    }

    #[test]
    fn insufficient_data_returns_model_recommendation_unchanged() {
        let stats = CapacityStats::default();
        assert_eq!(adjust_for_capacity(25, &stats, EnergyLevel::Mid), 25);
    }
}

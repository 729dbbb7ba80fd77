//! Deterministic conversion of a raw session outcome into a scalar reward
//! in `[0, 1]` used to update the posterior.

use crate::arm::{Arm, IDEAL_MAX, REWARD_RECOMMENDATION_BONUS};
use crate::capacity::CapacityStats;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CompletionType {
    Completed,
    SkippedFocus,
    SkippedBreak,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SkipReason {
    SkippedFocus,
    SkippedBreak,
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOutcome {
    pub completion_type: CompletionType,
    pub accepted_recommendation: bool,
    pub selected_focus_minutes: Arm,
    pub selected_break_minutes: Arm,
    pub focused_minutes: Arm,
    pub recommended_focus: Arm,
    #[serde(default)]
    pub skip_reason: SkipReason,
    pub timestamp: i64,
    #[serde(default)]
    pub time_of_day: Option<String>,
}

impl Default for SkipReason {
    fn default() -> Self {
        SkipReason::None
    }
}

/// `reward()` (spec §4.5, steps 1-6).
pub fn compute_reward(outcome: &SessionOutcome) -> f64 {
    let target = if outcome.accepted_recommendation {
        outcome.recommended_focus
    } else {
        outcome.selected_focus_minutes
    };

    let ratio = if target == 0 {
        0.0
    } else {
        (outcome.focused_minutes as f64 / target as f64).min(1.0)
    };

    let mut reward = match outcome.completion_type {
        CompletionType::SkippedFocus => 0.40 * ratio,
        CompletionType::SkippedBreak => 0.30 + 0.30 * ratio,
        CompletionType::Completed => 0.70 + 0.30 * ratio,
    };

    if outcome.accepted_recommendation {
        reward += REWARD_RECOMMENDATION_BONUS;
    }

    if (target as f64) > IDEAL_MAX {
        reward -= 0.10 * ((target as f64 - IDEAL_MAX) / IDEAL_MAX).min(1.0);
    }

    reward.clamp(0.0, 1.0)
}

/// Capacity scaling applied to completed sessions only, before the reward is
/// written to the posterior (spec §4.5, §9 Open Questions — see DESIGN.md
/// for why this path, and not the unscaled one, is the one implemented).
///
/// A session that runs well past the user's demonstrated average capacity is
/// scaled down so a single lucky long completion can't out-weigh a track
/// record of only finishing short ones; a session within or below capacity
/// is left alone.
pub fn capacity_scaled(reward: f64, stats: &CapacityStats) -> f64 {
    if stats.recent_sessions.len() < 3 || stats.average_capacity <= 0.0 {
        return reward;
    }
    let Some(latest) = stats.recent_sessions.back() else {
        return reward;
    };
    let capacity_ratio = (stats.average_capacity / latest.selected.max(1) as f64).min(1.0);
    reward * (0.5 + 0.5 * capacity_ratio)
}

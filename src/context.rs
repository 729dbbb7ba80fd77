//! Context identity: the (task kind, energy level) pair every posterior,
//! zone and capacity record is keyed by.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Self-reported energy level at the moment a recommendation is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnergyLevel {
    Low,
    Mid,
    High,
    Unset,
}

impl EnergyLevel {
    /// All four variants, used when walking the energy hierarchy.
    pub const ALL: [EnergyLevel; 4] = [
        EnergyLevel::Low,
        EnergyLevel::Mid,
        EnergyLevel::High,
        EnergyLevel::Unset,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EnergyLevel::Low => "low",
            EnergyLevel::Mid => "mid",
            EnergyLevel::High => "high",
            EnergyLevel::Unset => "unset",
        }
    }

    /// Position in the `low < mid < high` hierarchy used by the cross-energy
    /// floor rule. `Unset` does not participate in the hierarchy.
    pub fn rank(&self) -> Option<u8> {
        match self {
            EnergyLevel::Low => Some(0),
            EnergyLevel::Mid => Some(1),
            EnergyLevel::High => Some(2),
            EnergyLevel::Unset => None,
        }
    }
}

impl fmt::Display for EnergyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EnergyLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(EnergyLevel::Low),
            "mid" | "medium" => Ok(EnergyLevel::Mid),
            "high" => Ok(EnergyLevel::High),
            _ => Ok(EnergyLevel::Unset),
        }
    }
}

/// The context a recommendation or observation is made under.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Context {
    pub task_type: String,
    pub energy_level: EnergyLevel,
}

impl Context {
    pub fn new(task_type: impl Into<String>, energy_level: EnergyLevel) -> Self {
        Self {
            task_type: task_type.into(),
            energy_level,
        }
    }

    /// Trimmed, leading-letter-cased task type; an empty string normalises
    /// to the literal token `unset` so that an unlabelled task shares a
    /// context with other unlabelled tasks rather than forking on casing.
    pub fn normalized_task(&self) -> String {
        normalize_task_type(&self.task_type)
    }

    /// `"${taskType}|${energyLevel}"`, the focus-posterior key.
    pub fn key(&self) -> String {
        format!("{}|{}", self.normalized_task(), self.energy_level.as_str())
    }

    /// `"${taskType}-break|${energyLevel}"`, the break-posterior key.
    pub fn break_key(&self) -> String {
        format!(
            "{}-break|{}",
            self.normalized_task(),
            self.energy_level.as_str()
        )
    }

    /// The same task at a different energy level, used by the cross-energy
    /// floor rule.
    pub fn at_energy(&self, energy_level: EnergyLevel) -> Self {
        Self {
            task_type: self.task_type.clone(),
            energy_level,
        }
    }
}

fn normalize_task_type(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return "unset".to_string();
    }
    let mut lower = trimmed.to_ascii_lowercase();
    if let Some(first) = lower.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    lower
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_task_type_normalises_to_unset() {
        let ctx = Context::new("   ", EnergyLevel::Mid);
        assert_eq!(ctx.normalized_task(), "unset");
    }

    #[test]
    fn casing_and_whitespace_collapse_to_same_key() {
        let a = Context::new("coding", EnergyLevel::Mid);
        let b = Context::new("  Coding ", EnergyLevel::Mid);
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn break_key_uses_dash_break_suffix() {
        let ctx = Context::new("coding", EnergyLevel::High);
        assert_eq!(ctx.break_key(), "Coding-break|high");
    }

    #[test]
    fn key_is_deterministic() {
        let ctx = Context::new("writing", EnergyLevel::Low);
        assert_eq!(ctx.key(), ctx.key());
        assert_eq!(ctx.key(), "Writing|low");
    }
}

//! Skill Ledger (v0.1.0)
//!
//! Named skills bounded to 0-100, milestone detection and the overall level.
//!
//! ## Overall level
//!
//! `level = sum(skill values) / 50`. Crossing a level listed in
//! [`LEVEL_UNLOCKS`] makes that unlock available.
//!
//! The ledger does not deduplicate gains. Delivering the same gain twice
//! counts twice; callers own at-most-once delivery.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// Upper bound for a single skill
pub const SKILL_MAX: u8 = 100;

/// Thresholds that fire a milestone when crossed upward
pub const MILESTONES: &[u8] = &[10, 25, 50, 75, 100];

/// Skill points per overall level
pub const POINTS_PER_LEVEL: u32 = 50;

/// Skills every new ledger starts with
pub const DEFAULT_SKILLS: &[&str] = &["perception", "logic", "persistence", "creativity", "technical"];

/// Overall level -> unlock made available at that level
pub const LEVEL_UNLOCKS: &[(u32, &str)] = &[
    (2, "custom_themes"),
    (5, "skill_tree"),
    (8, "secret_archive"),
    (10, "advanced_npcs"),
];

/// Notification produced by a skill change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkillEvent {
    Milestone { skill: String, threshold: u8 },
    Mastery { skill: String, unlock: String },
    LevelUp { from: u32, to: u32, unlocks: Vec<String> },
}

/// Unlock key granted when a skill reaches 100
pub fn mastery_unlock(skill: &str) -> String {
    format!("mastery_{}", skill)
}

/// Per-user skill values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillLedger {
    skills: BTreeMap<String, u8>,
    /// Skills whose mastery unlock already fired
    #[serde(default)]
    mastered: BTreeSet<String>,
}

impl Default for SkillLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl SkillLedger {
    pub fn new() -> Self {
        Self {
            skills: DEFAULT_SKILLS.iter().map(|s| (s.to_string(), 0)).collect(),
            mastered: BTreeSet::new(),
        }
    }

    pub fn get(&self, skill: &str) -> u8 {
        self.skills.get(skill).copied().unwrap_or(0)
    }

    pub fn skills(&self) -> &BTreeMap<String, u8> {
        &self.skills
    }

    pub fn mastered(&self) -> &BTreeSet<String> {
        &self.mastered
    }

    pub fn total_points(&self) -> u32 {
        self.skills.values().map(|v| *v as u32).sum()
    }

    pub fn overall_level(&self) -> u32 {
        self.total_points() / POINTS_PER_LEVEL
    }

    /// Apply every gain in order
    pub fn award_skills(&mut self, gains: &BTreeMap<String, i32>) -> Vec<SkillEvent> {
        let mut events = Vec::new();
        for (skill, amount) in gains {
            events.extend(self.increase_skill(skill, *amount));
        }
        events
    }

    /// Add `amount` to a skill, clamped to 0-100.
    ///
    /// Fires one milestone per threshold in `(old, new]`, the mastery unlock
    /// the first time a skill hits 100, and a level-up when the overall
    /// level rises.
    pub fn increase_skill(&mut self, skill: &str, amount: i32) -> Vec<SkillEvent> {
        let old_level = self.overall_level();
        let old = self.get(skill);
        let new = (old as i32).saturating_add(amount).clamp(0, SKILL_MAX as i32) as u8;
        self.skills.insert(skill.to_string(), new);

        let mut events = Vec::new();
        if new <= old {
            debug!(skill, old, new, "skill unchanged or lowered");
            return events;
        }

        for &threshold in MILESTONES {
            if threshold > old && threshold <= new {
                info!(skill, threshold, "skill milestone reached");
                events.push(SkillEvent::Milestone {
                    skill: skill.to_string(),
                    threshold,
                });
            }
        }

        if new == SKILL_MAX && self.mastered.insert(skill.to_string()) {
            info!(skill, "skill mastered");
            events.push(SkillEvent::Mastery {
                skill: skill.to_string(),
                unlock: mastery_unlock(skill),
            });
        }

        let new_level = self.overall_level();
        if new_level > old_level {
            let unlocks = level_unlocks_between(old_level, new_level);
            info!(from = old_level, to = new_level, ?unlocks, "overall level up");
            events.push(SkillEvent::LevelUp {
                from: old_level,
                to: new_level,
                unlocks,
            });
        }

        events
    }

    /// Milestones at or below the current value of a skill
    pub fn milestones_reached(&self, skill: &str) -> Vec<u8> {
        let value = self.get(skill);
        MILESTONES.iter().copied().filter(|t| *t <= value).collect()
    }

    /// Level rewards available at the current overall level
    pub fn unlocked_level_rewards(&self) -> Vec<String> {
        level_unlocks_between(0, self.overall_level())
    }

    /// Mastery unlock keys earned so far
    pub fn mastery_unlocks(&self) -> Vec<String> {
        self.mastered.iter().map(|s| mastery_unlock(s)).collect()
    }

    /// Re-clamp values loaded from storage
    pub fn sanitize(&mut self) {
        for value in self.skills.values_mut() {
            *value = (*value).min(SKILL_MAX);
        }
        for (skill, value) in &self.skills {
            if *value == SKILL_MAX {
                self.mastered.insert(skill.clone());
            }
        }
    }
}

/// Unlocks for levels in `(from, to]`
fn level_unlocks_between(from: u32, to: u32) -> Vec<String> {
    LEVEL_UNLOCKS
        .iter()
        .filter(|(level, _)| *level > from && *level <= to)
        .map(|(_, unlock)| unlock.to_string())
        .collect()
}

//! Unlock Gate (v0.1.0)
//!
//! Turns skill, completion and journey milestones into named content
//! unlocks. Every source is recomputable, so collecting twice yields the
//! same set.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::journey::JourneyState;
use crate::skills::SkillLedger;

/// Completed puzzle count -> unlock
pub const COMPLETION_UNLOCKS: &[(usize, &str)] = &[
    (5, "puzzle_novice"),
    (10, "puzzle_adept"),
    (20, "puzzle_expert"),
    (30, "puzzle_master"),
    (50, "puzzle_legend"),
];

/// Set of opaque unlock keys
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnlockSet(BTreeSet<String>);

impl UnlockSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when the key was not already present
    pub fn insert(&mut self, key: impl Into<String>) -> bool {
        self.0.insert(key.into())
    }

    pub fn extend<I, S>(&mut self, keys: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for key in keys {
            self.0.insert(key.into());
        }
    }

    /// Merge `other`, returning keys that were new
    pub fn merge(&mut self, other: &UnlockSet) -> Vec<String> {
        other
            .0
            .iter()
            .filter(|key| self.0.insert((*key).clone()))
            .cloned()
            .collect()
    }

    /// Keys in `self` that `previous` lacks
    pub fn diff(&self, previous: &UnlockSet) -> Vec<String> {
        self.0.difference(&previous.0).cloned().collect()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.0.iter()
    }
}

impl FromIterator<String> for UnlockSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Unlocks earned by completing `count` puzzles
pub fn completion_unlocks(count: usize) -> Vec<String> {
    COMPLETION_UNLOCKS
        .iter()
        .filter(|(threshold, _)| count >= *threshold)
        .map(|(_, key)| key.to_string())
        .collect()
}

/// `journey_level_<n>` for every level above the first
pub fn journey_unlocks(level: u8) -> Vec<String> {
    (2..=level).map(|n| format!("journey_level_{}", n)).collect()
}

pub struct UnlockGate;

impl UnlockGate {
    pub fn collect(skills: &SkillLedger, completed: usize, journey: &JourneyState) -> UnlockSet {
        let mut set = UnlockSet::new();
        set.extend(skills.mastery_unlocks());
        set.extend(skills.unlocked_level_rewards());
        set.extend(completion_unlocks(completed));
        set.extend(journey_unlocks(journey.level));
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_thresholds() {
        assert!(completion_unlocks(4).is_empty());
        assert_eq!(completion_unlocks(5), vec!["puzzle_novice"]);
        assert_eq!(completion_unlocks(29).len(), 3);
        assert_eq!(completion_unlocks(500).len(), 5);
    }

    #[test]
    fn test_journey_unlocks() {
        assert!(journey_unlocks(1).is_empty());
        assert_eq!(
            journey_unlocks(3),
            vec!["journey_level_2".to_string(), "journey_level_3".to_string()]
        );
    }

    #[test]
    fn test_merge_reports_only_new() {
        let mut set: UnlockSet = vec!["a".to_string()].into_iter().collect();
        let other: UnlockSet = vec!["a".to_string(), "b".to_string()].into_iter().collect();
        assert_eq!(set.merge(&other), vec!["b".to_string()]);
        assert!(set.merge(&other).is_empty());
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_gate_unions_sources() {
        let mut skills = SkillLedger::new();
        skills.increase_skill("logic", 100);
        skills.increase_skill("perception", 20);
        let mut journey = JourneyState::default();
        journey.level = 2;

        let set = UnlockGate::collect(&skills, 10, &journey);
        assert!(set.contains("mastery_logic"));
        assert!(set.contains("custom_themes"));
        assert!(set.contains("puzzle_novice"));
        assert!(set.contains("puzzle_adept"));
        assert!(set.contains("journey_level_2"));

        let again = UnlockGate::collect(&skills, 10, &journey);
        assert_eq!(set, again);
    }
}

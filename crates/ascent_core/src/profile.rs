//! Persisted per-user progression record.
//!
//! Everything here survives between sessions. Active puzzle attempts are
//! ephemeral and never written.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::attempt::{CompletionRecord, FailureRecord};
use crate::config::DifficultyConfig;
use crate::journey::JourneySnapshot;
use crate::skills::SkillLedger;
use crate::unlocks::UnlockSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub skills: SkillLedger,
    #[serde(default = "default_difficulty")]
    pub difficulty: f64,
    #[serde(default)]
    pub total_xp: u64,
    #[serde(default)]
    pub completed: Vec<CompletionRecord>,
    #[serde(default)]
    pub failed: Vec<FailureRecord>,
    #[serde(default)]
    pub unlocks: UnlockSet,
    /// Cached journey fold; the event log stays authoritative
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journey: Option<JourneySnapshot>,
}

fn default_difficulty() -> f64 {
    DifficultyConfig::default().initial
}

impl Default for UserProfile {
    fn default() -> Self {
        Self::new(default_difficulty())
    }
}

impl UserProfile {
    /// New-user shape: zeroed skills, nothing completed
    pub fn new(initial_difficulty: f64) -> Self {
        Self {
            skills: SkillLedger::new(),
            difficulty: initial_difficulty,
            total_xp: 0,
            completed: Vec::new(),
            failed: Vec::new(),
            unlocks: UnlockSet::new(),
            journey: None,
        }
    }

    pub fn has_completed(&self, puzzle_id: &str) -> bool {
        self.completed.iter().any(|c| c.puzzle_id == puzzle_id)
    }

    pub fn completed_ids(&self) -> BTreeSet<String> {
        self.completed.iter().map(|c| c.puzzle_id.clone()).collect()
    }

    /// Drop repeated completion entries, keeping the first
    pub fn dedup_completions(&mut self) -> usize {
        let before = self.completed.len();
        let mut seen = BTreeSet::new();
        self.completed.retain(|c| seen.insert(c.puzzle_id.clone()));
        before - self.completed.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn completion(id: &str) -> CompletionRecord {
        CompletionRecord {
            puzzle_id: id.to_string(),
            completed_at: Utc::now(),
            attempts: 1,
            hints_used: 0,
            time_taken_ms: 1000,
            xp_earned: 10,
        }
    }

    #[test]
    fn test_new_user_shape() {
        let profile = UserProfile::default();
        assert_eq!(profile.difficulty, 1.0);
        assert_eq!(profile.skills.total_points(), 0);
        assert!(profile.completed.is_empty());
        assert!(profile.unlocks.is_empty());
    }

    #[test]
    fn test_sparse_json_fills_defaults() {
        let profile: UserProfile = serde_json::from_str(r#"{"total_xp": 30}"#).unwrap();
        assert_eq!(profile.total_xp, 30);
        assert_eq!(profile.difficulty, 1.0);
        assert_eq!(profile.skills.get("logic"), 0);
    }

    #[test]
    fn test_dedup_completions() {
        let mut profile = UserProfile::default();
        profile.completed = vec![completion("a"), completion("b"), completion("a")];
        assert_eq!(profile.dedup_completions(), 1);
        assert_eq!(profile.completed_ids().len(), 2);
        assert!(profile.has_completed("a"));
    }
}

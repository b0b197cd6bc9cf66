//! Derived journey state.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::event::JourneyAction;

/// Lowest journey level
pub const MIN_LEVEL: u8 = 1;
/// Highest journey level
pub const MAX_LEVEL: u8 = 5;

/// Result of folding a user's journey events. Never stored as the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JourneyState {
    pub level: u8,
    pub unlocked_triggers: BTreeSet<String>,
    pub completed_challenges: BTreeSet<String>,
    pub journey_started: bool,
    pub journey_completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archetype: Option<String>,
    pub philosophy_unlocked: BTreeSet<String>,
}

impl Default for JourneyState {
    fn default() -> Self {
        Self {
            level: MIN_LEVEL,
            unlocked_triggers: BTreeSet::new(),
            completed_challenges: BTreeSet::new(),
            journey_started: false,
            journey_completed: false,
            archetype: None,
            philosophy_unlocked: BTreeSet::new(),
        }
    }
}

impl JourneyState {
    /// Apply one action. Set fields are idempotent; flags only turn on.
    pub fn apply(&mut self, action: &JourneyAction) {
        match action {
            JourneyAction::EasterEggFound { trigger_id } => {
                self.unlocked_triggers.insert(trigger_id.clone());
            }
            JourneyAction::ChallengeCompleted { challenge_id } => {
                self.completed_challenges.insert(challenge_id.clone());
            }
            JourneyAction::JourneyStarted => {
                self.journey_started = true;
            }
            JourneyAction::JourneyCompleted { archetype } => {
                self.journey_started = true;
                self.journey_completed = true;
                if archetype.is_some() {
                    self.archetype = archetype.clone();
                }
            }
            JourneyAction::PhilosophyUnlocked { philosophy_id } => {
                self.philosophy_unlocked.insert(philosophy_id.clone());
            }
        }
    }

    pub fn has_trigger(&self, trigger_id: &str) -> bool {
        self.unlocked_triggers.contains(trigger_id)
    }
}

//! Progression Rule Engine (v0.2.0)
//!
//! Static per-level requirements over explicit trigger ids. A level is
//! reachable when every one of its triggers has been found.
//!
//! ## Overrides
//!
//! - completed transcendental journey: level >= 4
//! - four or more philosophies unlocked: level >= 5
//!
//! Level never moves backward.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::state::{JourneyState, MAX_LEVEL, MIN_LEVEL};

/// Level forced by a completed transcendental journey
pub const JOURNEY_COMPLETED_FLOOR: u8 = 4;
/// Level forced by enough philosophies
pub const PHILOSOPHY_FLOOR: u8 = 5;
/// Philosophies needed for [`PHILOSOPHY_FLOOR`]
pub const PHILOSOPHY_THRESHOLD: usize = 4;

/// Every trigger the level table knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerId {
    ConsoleMessage,
    KonamiCode,
    HiddenFooter,
    MidnightVisit,
    SourceComment,
    CipherSolved,
    GenieSummoned,
    ForumWhisper,
    PhilosophyRead,
    VoidGazed,
}

impl TriggerId {
    pub const ALL: [TriggerId; 10] = [
        TriggerId::ConsoleMessage,
        TriggerId::KonamiCode,
        TriggerId::HiddenFooter,
        TriggerId::MidnightVisit,
        TriggerId::SourceComment,
        TriggerId::CipherSolved,
        TriggerId::GenieSummoned,
        TriggerId::ForumWhisper,
        TriggerId::PhilosophyRead,
        TriggerId::VoidGazed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerId::ConsoleMessage => "console_message",
            TriggerId::KonamiCode => "konami_code",
            TriggerId::HiddenFooter => "hidden_footer",
            TriggerId::MidnightVisit => "midnight_visit",
            TriggerId::SourceComment => "source_comment",
            TriggerId::CipherSolved => "cipher_solved",
            TriggerId::GenieSummoned => "genie_summoned",
            TriggerId::ForumWhisper => "forum_whisper",
            TriggerId::PhilosophyRead => "philosophy_read",
            TriggerId::VoidGazed => "void_gazed",
        }
    }
}

impl FromStr for TriggerId {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        TriggerId::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == value)
            .ok_or_else(|| format!("unknown trigger '{}'", value))
    }
}

impl std::fmt::Display for TriggerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Requirements to reach one level
#[derive(Debug, Clone, Copy)]
pub struct LevelRequirement {
    pub level: u8,
    pub name: &'static str,
    pub required: &'static [TriggerId],
    /// Player-facing description of each required trigger
    pub challenges: &'static [&'static str],
    pub message: &'static str,
}

impl LevelRequirement {
    pub fn is_satisfied(&self, state: &JourneyState) -> bool {
        self.required.iter().all(|t| state.has_trigger(t.as_str()))
    }

    pub fn missing(&self, state: &JourneyState) -> Vec<TriggerId> {
        self.required
            .iter()
            .copied()
            .filter(|t| !state.has_trigger(t.as_str()))
            .collect()
    }
}

pub const LEVELS: &[LevelRequirement] = &[
    LevelRequirement {
        level: 1,
        name: "Awakening",
        required: &[],
        challenges: &[],
        message: "The journey begins.",
    },
    LevelRequirement {
        level: 2,
        name: "Curiosity",
        required: &[TriggerId::ConsoleMessage, TriggerId::KonamiCode],
        challenges: &[
            "Read what the developer console has to say",
            "Enter the old code on the home page",
        ],
        message: "Curiosity stirs. The site has noticed you.",
    },
    LevelRequirement {
        level: 3,
        name: "Discovery",
        required: &[
            TriggerId::HiddenFooter,
            TriggerId::MidnightVisit,
            TriggerId::SourceComment,
        ],
        challenges: &[
            "Find what hides beneath the footer",
            "Visit when the clock strikes twelve",
            "Read the comments left in the page source",
        ],
        message: "Discovery: the hidden layers open to you.",
    },
    LevelRequirement {
        level: 4,
        name: "Understanding",
        required: &[
            TriggerId::CipherSolved,
            TriggerId::GenieSummoned,
            TriggerId::ForumWhisper,
        ],
        challenges: &[
            "Break the cipher on the archive page",
            "Summon the genie and ask the right question",
            "Leave a whisper on the forum",
        ],
        message: "Understanding dawns. Few reach this far.",
    },
    LevelRequirement {
        level: 5,
        name: "Transcendence",
        required: &[TriggerId::PhilosophyRead, TriggerId::VoidGazed],
        challenges: &[
            "Read the philosophy in full",
            "Gaze into the void until it gazes back",
        ],
        message: "Transcendence. There is nothing left to find but yourself.",
    },
];

pub fn level_requirement(level: u8) -> Option<&'static LevelRequirement> {
    LEVELS.iter().find(|r| r.level == level)
}

/// Outcome of a progression check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelProgression {
    pub leveled_up: bool,
    pub old_level: u8,
    pub new_level: u8,
    pub message: String,
}

/// Highest reachable level from `state`, never below `state.level`.
///
/// Levels above the current one are scanned upward; lower levels do not
/// need to still hold.
pub fn check_level_progression(state: &JourneyState) -> LevelProgression {
    let old_level = state.level.clamp(MIN_LEVEL, MAX_LEVEL);
    let mut new_level = old_level;

    for requirement in LEVELS.iter().filter(|r| r.level > old_level) {
        if requirement.is_satisfied(state) {
            new_level = requirement.level;
        }
    }

    if state.journey_completed {
        new_level = new_level.max(JOURNEY_COMPLETED_FLOOR);
    }
    if state.philosophy_unlocked.len() >= PHILOSOPHY_THRESHOLD {
        new_level = new_level.max(PHILOSOPHY_FLOOR);
    }
    let new_level = new_level.clamp(old_level, MAX_LEVEL);

    let leveled_up = new_level > old_level;
    let message = match level_requirement(new_level) {
        Some(req) if leveled_up => format!("Level {} reached: {}. {}", new_level, req.name, req.message),
        Some(req) => format!("Level {}: {}", new_level, req.name),
        None => format!("Level {}", new_level),
    };

    LevelProgression {
        leveled_up,
        old_level,
        new_level,
        message,
    }
}

/// Challenges standing between `level` and the next one
pub fn next_challenges(level: u8) -> Vec<&'static str> {
    level_requirement(level.saturating_add(1))
        .map(|r| r.challenges.to_vec())
        .unwrap_or_default()
}

/// Triggers that count toward levels up to and including the next one
pub fn available_triggers(level: u8) -> Vec<TriggerId> {
    let ceiling = level.saturating_add(1).min(MAX_LEVEL);
    LEVELS
        .iter()
        .filter(|r| r.level <= ceiling)
        .flat_map(|r| r.required.iter().copied())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_triggers(triggers: &[TriggerId]) -> JourneyState {
        let mut state = JourneyState::default();
        for t in triggers {
            state.unlocked_triggers.insert(t.as_str().to_string());
        }
        state
    }

    #[test]
    fn test_no_triggers_stays_at_one() {
        let result = check_level_progression(&JourneyState::default());
        assert!(!result.leveled_up);
        assert_eq!(result.new_level, 1);
        assert_eq!(result.message, "Level 1: Awakening");
    }

    #[test]
    fn test_all_required_triggers_needed() {
        let partial = with_triggers(&[TriggerId::ConsoleMessage]);
        assert_eq!(check_level_progression(&partial).new_level, 1);

        let full = with_triggers(&[TriggerId::ConsoleMessage, TriggerId::KonamiCode]);
        let result = check_level_progression(&full);
        assert!(result.leveled_up);
        assert_eq!(result.new_level, 2);
        assert!(result.message.contains("Curiosity"));
    }

    #[test]
    fn test_higher_level_without_lower() {
        let state = with_triggers(&[
            TriggerId::CipherSolved,
            TriggerId::GenieSummoned,
            TriggerId::ForumWhisper,
        ]);
        assert_eq!(check_level_progression(&state).new_level, 4);
    }

    #[test]
    fn test_journey_completed_forces_four() {
        let mut state = JourneyState::default();
        state.journey_completed = true;
        let result = check_level_progression(&state);
        assert_eq!(result.new_level, 4);
        assert!(result.leveled_up);
    }

    #[test]
    fn test_journey_completed_keeps_level_five() {
        let mut state = JourneyState::default();
        state.level = 5;
        state.journey_completed = true;
        let result = check_level_progression(&state);
        assert_eq!(result.new_level, 5);
        assert!(!result.leveled_up);
    }

    #[test]
    fn test_four_philosophies_force_five() {
        let mut state = JourneyState::default();
        for id in ["stoic", "absurdist", "taoist"] {
            state.philosophy_unlocked.insert(id.to_string());
        }
        assert_eq!(check_level_progression(&state).new_level, 1);
        state.philosophy_unlocked.insert("existentialist".to_string());
        assert_eq!(check_level_progression(&state).new_level, 5);
    }

    #[test]
    fn test_never_moves_backward() {
        let mut state = JourneyState::default();
        state.level = 3;
        let result = check_level_progression(&state);
        assert_eq!(result.old_level, 3);
        assert_eq!(result.new_level, 3);
    }

    #[test]
    fn test_unknown_trigger_satisfies_nothing() {
        let mut state = JourneyState::default();
        state.unlocked_triggers.insert("console".to_string());
        state.unlocked_triggers.insert("konami".to_string());
        assert_eq!(check_level_progression(&state).new_level, 1);
    }

    #[test]
    fn test_next_challenges() {
        assert_eq!(next_challenges(1).len(), 2);
        assert_eq!(next_challenges(3).len(), 3);
        assert!(next_challenges(5).is_empty());
    }

    #[test]
    fn test_available_triggers() {
        assert_eq!(
            available_triggers(1),
            vec![TriggerId::ConsoleMessage, TriggerId::KonamiCode]
        );
        assert_eq!(available_triggers(5).len(), TriggerId::ALL.len());
    }

    #[test]
    fn test_trigger_round_trip_through_str() {
        for trigger in TriggerId::ALL {
            assert_eq!(trigger.as_str().parse::<TriggerId>(), Ok(trigger));
        }
        assert!("nope".parse::<TriggerId>().is_err());
    }

    #[test]
    fn test_missing_triggers() {
        let state = with_triggers(&[TriggerId::HiddenFooter]);
        let missing = level_requirement(3).unwrap().missing(&state);
        assert_eq!(missing, vec![TriggerId::MidnightVisit, TriggerId::SourceComment]);
    }
}

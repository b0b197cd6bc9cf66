//! Attempt State Machine (v0.1.0)
//!
//! One instance per active puzzle:
//!
//! ```text
//! inactive -> active --solve--> succeeded
//!               |  ^
//!          fail |  | retry (attempts < max)
//!               v  |
//!             exhausted (attempts >= max)
//! ```
//!
//! Only solution submissions move an instance. Re-activating a puzzle
//! replaces its instance; there is no other cancellation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::difficulty::DifficultyMultiplier;
use crate::skills::SkillEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptState {
    Active,
    Succeeded,
    Exhausted,
}

/// Result of registering a wrong answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStep {
    Retry { remaining: u32 },
    Exhausted,
}

/// Ephemeral state for one active puzzle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PuzzleAttempt {
    pub puzzle_id: String,
    pub started_at: DateTime<Utc>,
    /// Wrong answers so far
    pub attempts: u32,
    pub hints_used: u32,
    pub state: AttemptState,
}

impl PuzzleAttempt {
    pub fn new(puzzle_id: &str, started_at: DateTime<Utc>) -> Self {
        Self {
            puzzle_id: puzzle_id.to_string(),
            started_at,
            attempts: 0,
            hints_used: 0,
            state: AttemptState::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state == AttemptState::Active
    }

    pub fn register_failure(&mut self, max_attempts: u32) -> FailureStep {
        self.attempts += 1;
        if self.attempts >= max_attempts {
            self.state = AttemptState::Exhausted;
            FailureStep::Exhausted
        } else {
            FailureStep::Retry {
                remaining: max_attempts - self.attempts,
            }
        }
    }

    pub fn succeed(&mut self) {
        self.state = AttemptState::Succeeded;
    }

    /// Each hint permanently forfeits the no-hint bonus
    pub fn take_hint(&mut self) {
        self.hints_used += 1;
    }

    /// Every submission, including the one being made now
    pub fn submissions(&self) -> u32 {
        self.attempts + 1
    }

    pub fn elapsed_ms(&self, now: DateTime<Utc>) -> u64 {
        (now - self.started_at).num_milliseconds().max(0) as u64
    }
}

/// Persisted record of a solved puzzle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub puzzle_id: String,
    pub completed_at: DateTime<Utc>,
    pub attempts: u32,
    pub hints_used: u32,
    pub time_taken_ms: u64,
    pub xp_earned: u32,
}

/// Persisted record of an exhausted puzzle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub puzzle_id: String,
    pub failed_at: DateTime<Utc>,
    pub attempts: u32,
    pub hints_used: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionReport {
    pub puzzle_id: String,
    /// False when the puzzle was already in the completed set
    pub first_completion: bool,
    pub xp_earned: u32,
    pub skill_deltas: Vec<(String, i32)>,
    pub skill_events: Vec<SkillEvent>,
    pub difficulty: f64,
    pub multiplier: DifficultyMultiplier,
    pub new_unlocks: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryReport {
    pub puzzle_id: String,
    pub attempts: u32,
    pub remaining: u32,
    /// Static hint text, surfaced once enough attempts have failed
    pub hint: Option<String>,
    /// Difficulty-driven suggestion to show the hint button
    pub offer_hint: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExhaustionReport {
    pub puzzle_id: String,
    pub attempts: u32,
    pub difficulty: f64,
    /// Next puzzle at the lowered difficulty, if any remains
    pub replacement: Option<String>,
}

/// What a submission led to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Solved(CompletionReport),
    Retry(RetryReport),
    Exhausted(ExhaustionReport),
}

impl AttemptOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AttemptOutcome::Solved(_))
    }
}

/// `base * bonus` when no hint was used, else `base`
pub fn xp_for(base_xp: u32, hints_used: u32, no_hint_bonus: f64) -> u32 {
    if hints_used == 0 {
        (base_xp as f64 * no_hint_bonus).floor() as u32
    } else {
        base_xp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_new_attempt_is_active() {
        let attempt = PuzzleAttempt::new("metronome", Utc::now());
        assert!(attempt.is_active());
        assert_eq!(attempt.attempts, 0);
        assert_eq!(attempt.hints_used, 0);
    }

    #[test]
    fn test_three_failures_exhaust() {
        let mut attempt = PuzzleAttempt::new("metronome", Utc::now());
        assert_eq!(attempt.register_failure(3), FailureStep::Retry { remaining: 2 });
        assert_eq!(attempt.register_failure(3), FailureStep::Retry { remaining: 1 });
        assert_eq!(attempt.register_failure(3), FailureStep::Exhausted);
        assert_eq!(attempt.state, AttemptState::Exhausted);
        assert!(!attempt.is_active());
    }

    #[test]
    fn test_xp_bonus() {
        assert_eq!(xp_for(100, 0, 1.5), 150);
        assert_eq!(xp_for(100, 1, 1.5), 100);
        assert_eq!(xp_for(75, 0, 1.5), 112);
    }

    #[test]
    fn test_elapsed_never_negative() {
        let now = Utc::now();
        let attempt = PuzzleAttempt::new("x", now + Duration::seconds(5));
        assert_eq!(attempt.elapsed_ms(now), 0);
        let attempt = PuzzleAttempt::new("x", now - Duration::milliseconds(1500));
        assert_eq!(attempt.elapsed_ms(now), 1500);
    }

    #[test]
    fn test_outcome_serializes_with_tag() {
        let outcome = AttemptOutcome::Exhausted(ExhaustionReport {
            puzzle_id: "x".to_string(),
            attempts: 3,
            difficulty: 1.0,
            replacement: None,
        });
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["outcome"], "exhausted");
        assert!(json["replacement"].is_null());
    }
}

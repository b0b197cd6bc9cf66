//! Progression Session (v0.3.0)
//!
//! One engine instance per user. Owns the user's profile, difficulty
//! controller, active puzzle attempts and journey projection, with
//! persistence injected through [`ProfileStore`] and [`JourneyStore`].
//!
//! ## Flow
//!
//! ```text
//! activate_puzzle -> attempt_puzzle -> solved    (rewards, difficulty up)
//!                         |
//!                         +-> retry     (hint after 2 misses)
//!                         +-> exhausted (difficulty down, replacement)
//! ```
//!
//! Callers keep one writer per user. Every mutation is persisted through
//! the profile store before the call returns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::attempt::{
    xp_for, AttemptOutcome, CompletionRecord, CompletionReport, ExhaustionReport, FailureRecord,
    FailureStep, PuzzleAttempt, RetryReport,
};
use crate::catalog::{Puzzle, PuzzleCatalog};
use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::difficulty::{DifficultyController, DifficultyMultiplier};
use crate::error::{EngineError, EngineResult};
use crate::journey::{
    check_level_progression, next_challenges, JourneyEvent, JourneyProjector, JourneySnapshot,
    JourneyState, LevelProgression,
};
use crate::profile::UserProfile;
use crate::skills::SkillEvent;
use crate::store::{validate_user_id, JourneyStore, ProfileStore};
use crate::unlocks::{UnlockGate, UnlockSet};
use crate::validate::validate_solution;

/// Result of a direct skill award
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillAward {
    pub skill_events: Vec<SkillEvent>,
    pub new_unlocks: Vec<String>,
}

/// Result of recording a journey event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JourneyUpdate {
    pub event_id: uuid::Uuid,
    pub progression: LevelProgression,
    pub new_unlocks: Vec<String>,
}

pub struct ProgressionSession {
    user_id: String,
    catalog: Arc<PuzzleCatalog>,
    config: EngineConfig,
    profiles: Arc<dyn ProfileStore>,
    journeys: Arc<dyn JourneyStore>,
    clock: Arc<dyn Clock>,
    profile: UserProfile,
    difficulty: DifficultyController,
    active: HashMap<String, PuzzleAttempt>,
    projector: JourneyProjector,
}

impl ProgressionSession {
    /// Load (or create) the user's state.
    ///
    /// A missing or unreadable profile starts the user over from the
    /// new-user shape. The journey is brought up to date from the event log.
    pub fn open(
        user_id: &str,
        catalog: Arc<PuzzleCatalog>,
        config: EngineConfig,
        profiles: Arc<dyn ProfileStore>,
        journeys: Arc<dyn JourneyStore>,
        clock: Arc<dyn Clock>,
    ) -> EngineResult<Self> {
        validate_user_id(user_id)?;
        config.validate()?;

        let mut profile = match profiles.load_profile(user_id) {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                debug!(user = user_id, "no profile yet, starting fresh");
                UserProfile::new(config.difficulty.initial)
            }
            Err(EngineError::CorruptProfile(reason)) => {
                warn!(user = user_id, %reason, "corrupt profile, starting fresh");
                UserProfile::new(config.difficulty.initial)
            }
            Err(e) => return Err(e),
        };
        profile.skills.sanitize();
        let dropped = profile.dedup_completions();
        if dropped > 0 {
            warn!(user = user_id, dropped, "dropped repeated completion entries");
        }

        let difficulty = DifficultyController::restore(config.difficulty.clone(), profile.difficulty);
        profile.difficulty = difficulty.value();

        let events = journeys.load_events(user_id)?;
        let snapshot = match profile.journey.take() {
            Some(snapshot) if snapshot.is_consistent_with(&events) => snapshot,
            Some(snapshot) => {
                warn!(
                    user = user_id,
                    applied = snapshot.applied,
                    events = events.len(),
                    "journey snapshot does not match event log, replaying"
                );
                JourneySnapshot::default()
            }
            None => JourneySnapshot::default(),
        };
        let mut projector = JourneyProjector::from_snapshot(snapshot);
        projector.catch_up(&events);

        let mut session = Self {
            user_id: user_id.to_string(),
            catalog,
            config,
            profiles,
            journeys,
            clock,
            profile,
            difficulty,
            active: HashMap::new(),
            projector,
        };
        session.refresh_unlocks();
        info!(
            user = user_id,
            difficulty = session.difficulty.value(),
            completed = session.profile.completed.len(),
            journey_level = session.projector.state().level,
            "session opened"
        );
        Ok(session)
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn catalog(&self) -> &PuzzleCatalog {
        &self.catalog
    }

    pub fn difficulty(&self) -> f64 {
        self.difficulty.value()
    }

    pub fn difficulty_multiplier(&self) -> DifficultyMultiplier {
        self.difficulty.multiplier()
    }

    pub fn active_attempt(&self, puzzle_id: &str) -> Option<&PuzzleAttempt> {
        self.active.get(puzzle_id)
    }

    /// Start (or restart) an attempt at `puzzle_id`
    pub fn activate_puzzle(&mut self, puzzle_id: &str) -> EngineResult<PuzzleAttempt> {
        if !self.catalog.contains(puzzle_id) {
            return Err(EngineError::UnknownPuzzle(puzzle_id.to_string()));
        }
        let attempt = PuzzleAttempt::new(puzzle_id, self.clock.now());
        if self.active.insert(puzzle_id.to_string(), attempt.clone()).is_some() {
            debug!(user = %self.user_id, puzzle = puzzle_id, "replaced active attempt");
        }
        info!(user = %self.user_id, puzzle = puzzle_id, "puzzle activated");
        Ok(attempt)
    }

    /// Submit a solution to an active puzzle
    pub fn attempt_puzzle(&mut self, puzzle_id: &str, solution: &Value) -> EngineResult<AttemptOutcome> {
        if !self.active.get(puzzle_id).is_some_and(|a| a.is_active()) {
            return Err(EngineError::not_active(puzzle_id));
        }
        let catalog = Arc::clone(&self.catalog);
        let puzzle = catalog
            .get(puzzle_id)
            .ok_or_else(|| EngineError::UnknownPuzzle(puzzle_id.to_string()))?;
        let Some(attempt) = self.active.remove(puzzle_id) else {
            return Err(EngineError::not_active(puzzle_id));
        };
        let pending = attempt.clone();

        let result = if validate_solution(puzzle, solution) {
            self.committed(|s| s.handle_success(puzzle, attempt).map(AttemptOutcome::Solved))
        } else {
            self.committed(|s| s.handle_failure(puzzle, attempt))
        };
        if result.is_err() {
            self.active.insert(puzzle_id.to_string(), pending);
        }
        result
    }

    /// Run a mutation; if it fails, put the profile and difficulty back
    fn committed<T>(&mut self, apply: impl FnOnce(&mut Self) -> EngineResult<T>) -> EngineResult<T> {
        let profile = self.profile.clone();
        let difficulty = self.difficulty.clone();
        let result = apply(self);
        if let Err(e) = &result {
            warn!(user = %self.user_id, error = %e, "save failed, changes rolled back");
            self.profile = profile;
            self.difficulty = difficulty;
        }
        result
    }

    fn handle_success(&mut self, puzzle: &Puzzle, mut attempt: PuzzleAttempt) -> EngineResult<CompletionReport> {
        attempt.succeed();
        let now = self.clock.now();
        let first_completion = !self.profile.has_completed(&puzzle.id);

        let mut skill_deltas = Vec::new();
        let mut skill_events = Vec::new();
        let mut xp_earned = 0;
        if first_completion {
            let before: BTreeMap<String, u8> = puzzle
                .skill_rewards
                .keys()
                .map(|k| (k.clone(), self.profile.skills.get(k)))
                .collect();
            skill_events = self.profile.skills.award_skills(&puzzle.skill_rewards);
            skill_deltas = before
                .iter()
                .map(|(skill, old)| (skill.clone(), self.profile.skills.get(skill) as i32 - *old as i32))
                .collect();

            xp_earned = xp_for(puzzle.xp, attempt.hints_used, self.config.attempts.no_hint_bonus);
            self.profile.total_xp += xp_earned as u64;
            self.profile.completed.push(CompletionRecord {
                puzzle_id: puzzle.id.clone(),
                completed_at: now,
                attempts: attempt.submissions(),
                hints_used: attempt.hints_used,
                time_taken_ms: attempt.elapsed_ms(now),
                xp_earned,
            });
        } else {
            debug!(user = %self.user_id, puzzle = %puzzle.id, "already completed, no rewards");
        }

        let difficulty = self.difficulty.record_success();
        let new_unlocks = self.refresh_unlocks();
        self.persist()?;

        info!(
            user = %self.user_id,
            puzzle = %puzzle.id,
            xp = xp_earned,
            difficulty,
            unlocks = new_unlocks.len(),
            "puzzle solved"
        );
        Ok(CompletionReport {
            puzzle_id: puzzle.id.clone(),
            first_completion,
            xp_earned,
            skill_deltas,
            skill_events,
            difficulty,
            multiplier: self.difficulty.multiplier(),
            new_unlocks,
        })
    }

    fn handle_failure(&mut self, puzzle: &Puzzle, mut attempt: PuzzleAttempt) -> EngineResult<AttemptOutcome> {
        match attempt.register_failure(self.config.attempts.max_attempts) {
            FailureStep::Retry { remaining } => {
                let hint = (attempt.attempts >= self.config.attempts.hint_after).then(|| puzzle.hint.clone());
                let report = RetryReport {
                    puzzle_id: puzzle.id.clone(),
                    attempts: attempt.attempts,
                    remaining,
                    hint,
                    offer_hint: self.difficulty.should_offer_hint(attempt.attempts),
                };
                debug!(user = %self.user_id, puzzle = %puzzle.id, remaining, "wrong answer");
                self.active.insert(puzzle.id.clone(), attempt);
                Ok(AttemptOutcome::Retry(report))
            }
            FailureStep::Exhausted => {
                self.profile.failed.push(FailureRecord {
                    puzzle_id: puzzle.id.clone(),
                    failed_at: self.clock.now(),
                    attempts: attempt.attempts,
                    hints_used: attempt.hints_used,
                });
                let difficulty = self.difficulty.record_failure();
                let replacement = self.suggest_puzzle().map(|p| p.id.clone());
                self.persist()?;

                info!(
                    user = %self.user_id,
                    puzzle = %puzzle.id,
                    difficulty,
                    replacement = replacement.as_deref().unwrap_or("none"),
                    "puzzle exhausted"
                );
                Ok(AttemptOutcome::Exhausted(ExhaustionReport {
                    puzzle_id: puzzle.id.clone(),
                    attempts: attempt.attempts,
                    difficulty,
                    replacement,
                }))
            }
        }
    }

    /// Hint text for an active puzzle. Forfeits the no-hint bonus.
    pub fn get_hint(&mut self, puzzle_id: &str) -> EngineResult<String> {
        let hint = match self.active.get(puzzle_id) {
            Some(attempt) if attempt.is_active() => self
                .catalog
                .get(puzzle_id)
                .map(|p| p.hint.clone())
                .ok_or_else(|| EngineError::UnknownPuzzle(puzzle_id.to_string()))?,
            _ => return Err(EngineError::not_active(puzzle_id)),
        };
        if let Some(attempt) = self.active.get_mut(puzzle_id) {
            attempt.take_hint();
            debug!(user = %self.user_id, puzzle = puzzle_id, hints = attempt.hints_used, "hint taken");
        }
        Ok(hint)
    }

    /// Direct skill gains outside of puzzles.
    ///
    /// Not deduplicated: the same award delivered twice counts twice.
    pub fn award_skills(&mut self, gains: &BTreeMap<String, i32>) -> EngineResult<SkillAward> {
        self.committed(|s| {
            let skill_events = s.profile.skills.award_skills(gains);
            let new_unlocks = s.refresh_unlocks();
            s.persist()?;
            info!(user = %s.user_id, skills = gains.len(), events = skill_events.len(), "skills awarded");
            Ok(SkillAward {
                skill_events,
                new_unlocks,
            })
        })
    }

    /// Best uncompleted puzzle for the current difficulty
    pub fn suggest_puzzle(&self) -> Option<&Puzzle> {
        self.catalog.puzzle_for_difficulty(
            self.difficulty.value(),
            &self.profile.completed_ids(),
            self.config.matching.window,
        )
    }

    /// Append a journey event and fold it in
    pub fn record_event(
        &mut self,
        event_type: &str,
        event_data: Value,
        timestamp: DateTime<Utc>,
    ) -> EngineResult<JourneyUpdate> {
        let event = JourneyEvent::new(&self.user_id, event_type, event_data, timestamp);
        self.append_event(event)
    }

    /// Append a prebuilt event; it must belong to this user
    pub fn append_event(&mut self, event: JourneyEvent) -> EngineResult<JourneyUpdate> {
        if event.user_id != self.user_id {
            return Err(EngineError::Storage(format!(
                "event for '{}' recorded in session of '{}'",
                event.user_id, self.user_id
            )));
        }
        if event.action().is_none() {
            debug!(user = %self.user_id, event_type = %event.event_type, "recording event with no journey effect");
        }
        self.journeys.append_event(&event)?;

        let before = self.projector.state().level;
        let events = self.journeys.load_events(&self.user_id)?;
        let level_ups = self.projector.catch_up(&events);
        let progression = match (level_ups.first(), level_ups.last()) {
            (Some(first), Some(last)) => LevelProgression {
                leveled_up: true,
                old_level: first.old_level.min(before),
                new_level: last.new_level,
                message: last.message.clone(),
            },
            _ => check_level_progression(self.projector.state()),
        };

        let new_unlocks = self.refresh_unlocks();
        self.persist()?;
        Ok(JourneyUpdate {
            event_id: event.id,
            progression,
            new_unlocks,
        })
    }

    pub fn journey(&self) -> &JourneyState {
        self.projector.state()
    }

    /// Current level summary, never a level-up
    pub fn level_progression(&self) -> LevelProgression {
        check_level_progression(self.projector.state())
    }

    pub fn next_challenges(&self) -> Vec<&'static str> {
        next_challenges(self.projector.state().level)
    }

    pub fn unlocks(&self) -> &UnlockSet {
        &self.profile.unlocks
    }

    /// Persist the current profile
    pub fn save(&mut self) -> EngineResult<()> {
        self.persist()
    }

    /// Union newly earned unlocks into the profile, returning the new keys
    fn refresh_unlocks(&mut self) -> Vec<String> {
        let earned = UnlockGate::collect(
            &self.profile.skills,
            self.profile.completed.len(),
            self.projector.state(),
        );
        let fresh = self.profile.unlocks.merge(&earned);
        for key in &fresh {
            info!(user = %self.user_id, unlock = %key, "unlocked");
        }
        fresh
    }

    fn persist(&mut self) -> EngineResult<()> {
        self.profile.difficulty = self.difficulty.value();
        self.profile.journey = Some(self.projector.snapshot().clone());
        self.profiles.save_profile(&self.user_id, &self.profile)
    }
}

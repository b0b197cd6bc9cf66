//! Journey replay: full fold and snapshot + incremental fold.
//!
//! Both paths fold the same events in the same order through
//! [`fold_event`], so they produce identical state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::event::{order_events, JourneyEvent};
use super::rules::{check_level_progression, LevelProgression};
use super::state::JourneyState;

/// Apply one event and re-evaluate the level.
///
/// Returns `None` for events the engine does not understand.
pub fn fold_event(state: &mut JourneyState, event: &JourneyEvent) -> Option<LevelProgression> {
    let Some(action) = event.action() else {
        debug!(event_type = %event.event_type, id = %event.id, "ignoring unrecognized journey event");
        return None;
    };
    state.apply(&action);

    let progression = check_level_progression(state);
    if progression.leveled_up {
        info!(
            user = %event.user_id,
            from = progression.old_level,
            to = progression.new_level,
            "journey level up"
        );
        state.level = progression.new_level;
    }
    Some(progression)
}

/// Pure replay of a user's whole log
pub fn reconstruct_journey(events: &[JourneyEvent]) -> JourneyState {
    let mut state = JourneyState::default();
    for event in order_events(events) {
        fold_event(&mut state, event);
    }
    state
}

/// Folded state plus how much of the log it covers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JourneySnapshot {
    pub state: JourneyState,
    /// Number of log entries folded, in append order
    pub applied: usize,
    /// Latest timestamp folded so far
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watermark: Option<DateTime<Utc>>,
}

impl JourneySnapshot {
    pub fn from_events(events: &[JourneyEvent]) -> Self {
        Self {
            state: reconstruct_journey(events),
            applied: events.len(),
            watermark: events.iter().map(|e| e.timestamp).max(),
        }
    }

    /// True when folding the first `applied` log entries reproduces this snapshot
    pub fn is_consistent_with(&self, log: &[JourneyEvent]) -> bool {
        self.applied <= log.len() && Self::from_events(&log[..self.applied]) == *self
    }
}

/// Keeps a snapshot current as the log grows
#[derive(Debug, Clone, Default)]
pub struct JourneyProjector {
    snapshot: JourneySnapshot,
}

impl JourneyProjector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: JourneySnapshot) -> Self {
        Self { snapshot }
    }

    pub fn state(&self) -> &JourneyState {
        &self.snapshot.state
    }

    pub fn snapshot(&self) -> &JourneySnapshot {
        &self.snapshot
    }

    /// Fold entries appended to `log` since the last call.
    ///
    /// `log` is the full log in append order. An entry older than the
    /// watermark, or a log shorter than the snapshot, forces a full replay.
    pub fn catch_up(&mut self, log: &[JourneyEvent]) -> Vec<LevelProgression> {
        if log.len() < self.snapshot.applied {
            debug!(
                applied = self.snapshot.applied,
                len = log.len(),
                "journey log shrank, replaying"
            );
            self.snapshot = JourneySnapshot::from_events(log);
            return Vec::new();
        }

        let fresh = &log[self.snapshot.applied..];
        let out_of_order = match self.snapshot.watermark {
            Some(mark) => fresh.iter().any(|e| e.timestamp < mark),
            None => false,
        };
        if out_of_order {
            debug!(fresh = fresh.len(), "late journey event, replaying");
            let before = self.snapshot.state.level;
            self.snapshot = JourneySnapshot::from_events(log);
            return level_change(before, &self.snapshot.state)
                .into_iter()
                .collect();
        }

        let mut progressions = Vec::new();
        for event in order_events(fresh) {
            if let Some(p) = fold_event(&mut self.snapshot.state, event) {
                if p.leveled_up {
                    progressions.push(p);
                }
            }
            self.snapshot.watermark = Some(match self.snapshot.watermark {
                Some(mark) => mark.max(event.timestamp),
                None => event.timestamp,
            });
        }
        self.snapshot.applied = log.len();
        progressions
    }
}

fn level_change(before: u8, state: &JourneyState) -> Option<LevelProgression> {
    if state.level <= before {
        return None;
    }
    let mut previous = state.clone();
    previous.level = before;
    let mut progression = check_level_progression(&previous);
    progression.new_level = state.level;
    progression.leveled_up = true;
    Some(progression)
}

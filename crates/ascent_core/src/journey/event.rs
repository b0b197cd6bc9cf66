//! Journey events (append-only log records).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

pub const EASTER_EGG_FOUND: &str = "easter_egg_found";
pub const CHALLENGE_COMPLETED: &str = "challenge_completed";
pub const JOURNEY_STARTED: &str = "transcendental_journey_started";
pub const JOURNEY_COMPLETED: &str = "transcendental_journey_completed";
pub const PHILOSOPHY_UNLOCKED: &str = "philosophy_unlocked";

/// Single immutable log record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JourneyEvent {
    /// Unique id, used by stores to drop redelivered events
    pub id: Uuid,
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    #[serde(default)]
    pub event_data: Value,
}

impl JourneyEvent {
    pub fn new(user_id: &str, event_type: &str, event_data: Value, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            timestamp,
            event_type: event_type.to_string(),
            event_data,
        }
    }

    pub fn easter_egg(user_id: &str, trigger_id: &str, timestamp: DateTime<Utc>) -> Self {
        Self::new(user_id, EASTER_EGG_FOUND, json!({ "triggerId": trigger_id }), timestamp)
    }

    pub fn challenge_completed(user_id: &str, challenge_id: &str, timestamp: DateTime<Utc>) -> Self {
        Self::new(
            user_id,
            CHALLENGE_COMPLETED,
            json!({ "challengeId": challenge_id }),
            timestamp,
        )
    }

    pub fn journey_started(user_id: &str, timestamp: DateTime<Utc>) -> Self {
        Self::new(user_id, JOURNEY_STARTED, json!({}), timestamp)
    }

    pub fn journey_completed(user_id: &str, archetype: &str, timestamp: DateTime<Utc>) -> Self {
        Self::new(
            user_id,
            JOURNEY_COMPLETED,
            json!({ "archetype": archetype }),
            timestamp,
        )
    }

    pub fn philosophy_unlocked(user_id: &str, philosophy_id: &str, timestamp: DateTime<Utc>) -> Self {
        Self::new(
            user_id,
            PHILOSOPHY_UNLOCKED,
            json!({ "philosophyId": philosophy_id }),
            timestamp,
        )
    }

    /// Typed view; `None` for unknown types or missing fields
    pub fn action(&self) -> Option<JourneyAction> {
        JourneyAction::from_event(self)
    }
}

/// What a known event does to journey state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JourneyAction {
    EasterEggFound { trigger_id: String },
    ChallengeCompleted { challenge_id: String },
    JourneyStarted,
    JourneyCompleted { archetype: Option<String> },
    PhilosophyUnlocked { philosophy_id: String },
}

impl JourneyAction {
    pub fn from_event(event: &JourneyEvent) -> Option<Self> {
        let data = &event.event_data;
        match event.event_type.as_str() {
            EASTER_EGG_FOUND => text_field(data, &["triggerId", "trigger_id"])
                .map(|trigger_id| JourneyAction::EasterEggFound { trigger_id }),
            CHALLENGE_COMPLETED => text_field(data, &["challengeId", "challenge_id"])
                .map(|challenge_id| JourneyAction::ChallengeCompleted { challenge_id }),
            JOURNEY_STARTED => Some(JourneyAction::JourneyStarted),
            JOURNEY_COMPLETED => Some(JourneyAction::JourneyCompleted {
                archetype: text_field(data, &["archetype"]),
            }),
            PHILOSOPHY_UNLOCKED => text_field(data, &["philosophyId", "philosophy_id"])
                .map(|philosophy_id| JourneyAction::PhilosophyUnlocked { philosophy_id }),
            _ => None,
        }
    }
}

/// First non-empty string among `keys`
fn text_field(data: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| data.get(key).and_then(Value::as_str))
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

/// Stable sort by timestamp; equal timestamps keep append order
pub fn order_events(events: &[JourneyEvent]) -> Vec<&JourneyEvent> {
    let mut ordered: Vec<&JourneyEvent> = events.iter().collect();
    ordered.sort_by_key(|e| e.timestamp);
    ordered
}

//! Journey Ledger & Progression Rules
//!
//! Append-only per-user events folded into a five-level journey state.
//!
//! ## Modules
//!
//! - `event`: log records and their typed actions
//! - `state`: the derived state and how actions change it
//! - `rules`: per-level trigger requirements and overrides
//! - `replay`: full replay and snapshot-based incremental folding

pub mod event;
pub mod replay;
pub mod rules;
pub mod state;

pub use event::{
    order_events, JourneyAction, JourneyEvent, CHALLENGE_COMPLETED, EASTER_EGG_FOUND,
    JOURNEY_COMPLETED, JOURNEY_STARTED, PHILOSOPHY_UNLOCKED,
};
pub use replay::{fold_event, reconstruct_journey, JourneyProjector, JourneySnapshot};
pub use rules::{
    available_triggers, check_level_progression, level_requirement, next_challenges,
    LevelProgression, LevelRequirement, TriggerId, LEVELS,
};
pub use state::{JourneyState, MAX_LEVEL, MIN_LEVEL};

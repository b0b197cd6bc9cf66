//! Adaptive progression engine for puzzle-driven sites.
//! v0.1.0: Skill ledger, puzzle catalog, difficulty, attempts, journey rules.
//! v0.2.0: Storage boundary, snapshot journey folding, engine config.
//! v0.3.0: Per-user sessions with injected stores and clock.

pub mod attempt;
pub mod catalog;
pub mod config;
pub mod difficulty;
pub mod error;
pub mod journey;
pub mod skills;
pub mod unlocks;
pub mod validate;

// v0.2.0: Persistence
pub mod profile;
pub mod store;

// v0.3.0: Sessions
pub mod clock;
pub mod session;

pub use attempt::{AttemptOutcome, AttemptState, CompletionReport, ExhaustionReport, PuzzleAttempt, RetryReport};
pub use catalog::{Puzzle, PuzzleCatalog, PuzzleKind, Requirement, Tier};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::EngineConfig;
pub use difficulty::{DifficultyController, DifficultyMultiplier};
pub use error::{EngineError, EngineResult};
pub use journey::{reconstruct_journey, JourneyEvent, JourneyState, LevelProgression, TriggerId};
pub use profile::UserProfile;
pub use session::{JourneyUpdate, ProgressionSession, SkillAward};
pub use skills::{SkillEvent, SkillLedger};
pub use store::{FileStore, JourneyStore, MemoryStore, ProfileStore};
pub use unlocks::{UnlockGate, UnlockSet};

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default config file name inside the data directory
pub const CONFIG_FILE: &str = "ascent.toml";

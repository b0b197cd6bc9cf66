//! Error types for the progression engine.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Puzzle '{puzzle_id}' is not active")]
    NotActive { puzzle_id: String },

    #[error("Unknown puzzle: {0}")]
    UnknownPuzzle(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Corrupt profile: {0}")]
    CorruptProfile(String),

    #[error("Invalid catalog: {0}")]
    Catalog(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    pub fn not_active(puzzle_id: &str) -> Self {
        EngineError::NotActive {
            puzzle_id: puzzle_id.to_string(),
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            EngineError::NotActive { .. } => -32010,
            EngineError::UnknownPuzzle(_) => -32011,
            EngineError::Storage(_) => -32020,
            EngineError::CorruptProfile(_) => -32021,
            EngineError::Catalog(_) => -32030,
            EngineError::Config(_) => -32031,
            EngineError::Io(_) => -32006,
            EngineError::Json(_) => -32700,
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

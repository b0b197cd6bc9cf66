//! CLI - Command-line argument parsing
//!
//! Keeps argument parsing separate from execution logic.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Ascent progression engine CLI
#[derive(Parser)]
#[command(name = "ascentctl")]
#[command(about = "Ascent - inspect and drive per-user puzzle progression", long_about = None)]
#[command(version)]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    /// Directory holding profiles/ and journeys/
    #[arg(long, global = true, env = "ASCENT_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Engine config file (defaults to <data-dir>/ascent.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// JSON puzzle catalog to use instead of the built-in one
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show a user's skills, difficulty, journey level and unlocks
    Status {
        user: String,
        /// Output JSON only
        #[arg(long)]
        json: bool,
    },

    /// List the puzzle catalog
    Catalog {
        /// Output JSON only
        #[arg(long)]
        json: bool,
    },

    /// Suggest the next puzzle for a user
    Suggest { user: String },

    /// Attempt a puzzle, submitting each solution in turn
    Play {
        user: String,
        puzzle: String,
        /// Solution as JSON (repeatable; stops at the first terminal outcome)
        #[arg(long = "solution", required = true)]
        solutions: Vec<String>,
        /// Request the hint before the first submission
        #[arg(long)]
        hint: bool,
    },

    /// Award skill points directly
    Award {
        user: String,
        skill: String,
        amount: i32,
    },

    /// Record a journey event
    Event {
        user: String,
        /// Event type, e.g. easter_egg_found
        event_type: String,
        /// Event payload as JSON
        #[arg(long, default_value = "{}")]
        data: String,
        /// Event time (RFC 3339), defaults to now
        #[arg(long)]
        at: Option<String>,
    },

    /// Rebuild a user's journey from the event log
    Replay {
        user: String,
        /// Output JSON only
        #[arg(long)]
        json: bool,
    },
}

//! Command handlers
//!
//! Each handler opens a session for the user, performs one operation and
//! prints the result. State lives under the data directory.

use anyhow::{bail, Context, Result};
use ascent_core::journey::{reconstruct_journey, JourneySnapshot};
use ascent_core::{
    AttemptOutcome, EngineConfig, FileStore, JourneyStore, ProgressionSession, PuzzleCatalog,
    SystemClock, CONFIG_FILE,
};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::cli::{Cli, Commands};
use crate::output;

/// Everything a command needs besides its own arguments
pub struct AppContext {
    pub data_dir: PathBuf,
    pub config: EngineConfig,
    pub catalog: Arc<PuzzleCatalog>,
    pub store: Arc<FileStore>,
}

impl AppContext {
    pub fn load(cli: &Cli) -> Result<Self> {
        let base_dir = cli.data_dir.clone().unwrap_or_else(default_data_dir);
        let config_path = cli.config.clone().unwrap_or_else(|| base_dir.join(CONFIG_FILE));
        let config = EngineConfig::load(&config_path)?;

        // An explicit --data-dir wins over the config file
        let data_dir = match (&cli.data_dir, &config.storage.data_dir) {
            (None, Some(dir)) => dir.clone(),
            _ => base_dir,
        };
        debug!(data_dir = %data_dir.display(), config = %config_path.display(), "context loaded");

        let catalog = match &cli.catalog {
            Some(path) => load_catalog(path)?,
            None => PuzzleCatalog::builtin(),
        };

        Ok(Self {
            store: Arc::new(FileStore::new(&data_dir)),
            data_dir,
            config,
            catalog: Arc::new(catalog),
        })
    }

    pub fn open(&self, user: &str) -> Result<ProgressionSession> {
        let session = ProgressionSession::open(
            user,
            Arc::clone(&self.catalog),
            self.config.clone(),
            self.store.clone(),
            self.store.clone(),
            Arc::new(SystemClock),
        )
        .with_context(|| format!("Failed to open session for '{}'", user))?;
        Ok(session)
    }
}

/// XDG data dir, falling back to the working directory
fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("ascent"))
        .unwrap_or_else(|| PathBuf::from(".ascent"))
}

fn load_catalog(path: &Path) -> Result<PuzzleCatalog> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog {}", path.display()))?;
    PuzzleCatalog::from_json(&json).with_context(|| format!("Invalid catalog {}", path.display()))
}

pub fn run(cli: Cli) -> Result<()> {
    let ctx = AppContext::load(&cli)?;
    match cli.command {
        Commands::Status { user, json } => status(&ctx, &user, json),
        Commands::Catalog { json } => catalog(&ctx, json),
        Commands::Suggest { user } => suggest(&ctx, &user),
        Commands::Play {
            user,
            puzzle,
            solutions,
            hint,
        } => play(&ctx, &user, &puzzle, &solutions, hint),
        Commands::Award {
            user,
            skill,
            amount,
        } => award(&ctx, &user, &skill, amount),
        Commands::Event {
            user,
            event_type,
            data,
            at,
        } => event(&ctx, &user, &event_type, &data, at.as_deref()),
        Commands::Replay { user, json } => replay(&ctx, &user, json),
    }
}

pub fn status(ctx: &AppContext, user: &str, json: bool) -> Result<()> {
    let session = ctx.open(user)?;
    if json {
        let value = serde_json::json!({
            "user": user,
            "profile": session.profile(),
            "journey": session.journey(),
            "multiplier": session.difficulty_multiplier(),
            "next_challenges": session.next_challenges(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        output::print_status(&session);
    }
    Ok(())
}

pub fn catalog(ctx: &AppContext, json: bool) -> Result<()> {
    if json {
        let puzzles: Vec<_> = ctx.catalog.iter().collect();
        println!("{}", serde_json::to_string_pretty(&puzzles)?);
    } else {
        output::print_catalog(&ctx.catalog);
    }
    Ok(())
}

pub fn suggest(ctx: &AppContext, user: &str) -> Result<()> {
    let session = ctx.open(user)?;
    match session.suggest_puzzle() {
        Some(puzzle) => output::print_suggestion(puzzle, session.difficulty()),
        None => println!("No puzzle available near difficulty {:.1}", session.difficulty()),
    }
    Ok(())
}

pub fn play(ctx: &AppContext, user: &str, puzzle: &str, solutions: &[String], hint: bool) -> Result<()> {
    let mut session = ctx.open(user)?;
    session.activate_puzzle(puzzle)?;
    if hint {
        let text = session.get_hint(puzzle)?;
        output::print_hint(&text);
    }

    for raw in solutions {
        let solution = parse_solution(raw);
        let outcome = session.attempt_puzzle(puzzle, &solution)?;
        output::print_outcome(&outcome);
        if !matches!(outcome, AttemptOutcome::Retry(_)) {
            return Ok(());
        }
    }
    println!("Attempt left open; progress on it is not kept between runs.");
    Ok(())
}

/// JSON if it parses, otherwise the raw text as a string
fn parse_solution(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

pub fn award(ctx: &AppContext, user: &str, skill: &str, amount: i32) -> Result<()> {
    let mut session = ctx.open(user)?;
    let gains = BTreeMap::from([(skill.to_string(), amount)]);
    let award = session.award_skills(&gains)?;
    println!(
        "{} is now {} (overall level {})",
        skill,
        session.profile().skills.get(skill),
        session.profile().skills.overall_level()
    );
    output::print_skill_events(&award.skill_events);
    output::print_unlocks(&award.new_unlocks);
    Ok(())
}

pub fn event(ctx: &AppContext, user: &str, event_type: &str, data: &str, at: Option<&str>) -> Result<()> {
    let data: Value = serde_json::from_str(data).context("--data must be valid JSON")?;
    if !data.is_object() {
        bail!("--data must be a JSON object");
    }
    let timestamp = match at {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .with_context(|| format!("Invalid --at timestamp '{}'", raw))?
            .with_timezone(&Utc),
        None => Utc::now(),
    };

    let mut session = ctx.open(user)?;
    let update = session.record_event(event_type, data, timestamp)?;
    println!("Recorded event {}", update.event_id);
    output::print_progression(&update.progression);
    output::print_unlocks(&update.new_unlocks);
    Ok(())
}

pub fn replay(ctx: &AppContext, user: &str, json: bool) -> Result<()> {
    let events = ctx.store.load_events(user)?;
    if json {
        let snapshot = JourneySnapshot::from_events(&events);
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        let state = reconstruct_journey(&events);
        println!(
            "Replayed {} events for {} from {}",
            events.len(),
            user,
            ctx.data_dir.display()
        );
        output::print_journey(&state);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli_for(dir: &Path, args: &[&str]) -> Cli {
        let mut full = vec!["ascentctl", "--data-dir", dir.to_str().unwrap()];
        full.extend_from_slice(args);
        Cli::try_parse_from(full).unwrap()
    }

    #[test]
    fn test_parse_solution_falls_back_to_string() {
        assert_eq!(parse_solution("2000"), serde_json::json!(2000));
        assert_eq!(parse_solution("hello traveler"), Value::String("hello traveler".into()));
        assert_eq!(parse_solution(r#"["a","b"]"#), serde_json::json!(["a", "b"]));
    }

    #[test]
    fn test_event_then_replay_persists() {
        let dir = tempfile::tempdir().unwrap();
        let cli = cli_for(dir.path(), &["replay", "visitor"]);
        let ctx = AppContext::load(&cli).unwrap();

        event(&ctx, "visitor", "easter_egg_found", r#"{"triggerId":"console_message"}"#, None).unwrap();
        event(
            &ctx,
            "visitor",
            "easter_egg_found",
            r#"{"triggerId":"konami_code"}"#,
            Some("2030-01-01T00:00:00Z"),
        )
        .unwrap();

        let events = ctx.store.load_events("visitor").unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(reconstruct_journey(&events).level, 2);
        assert_eq!(ctx.open("visitor").unwrap().journey().level, 2);
    }

    #[test]
    fn test_event_rejects_bad_input() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = AppContext::load(&cli_for(dir.path(), &["catalog"])).unwrap();
        assert!(event(&ctx, "visitor", "easter_egg_found", "[1]", None).is_err());
        assert!(event(&ctx, "visitor", "easter_egg_found", "{}", Some("yesterday")).is_err());
    }

    #[test]
    fn test_config_from_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "[difficulty]\ninitial = 5.0\n",
        )
        .unwrap();
        let ctx = AppContext::load(&cli_for(dir.path(), &["catalog"])).unwrap();
        assert_eq!(ctx.config.difficulty.initial, 5.0);
        assert_eq!(ctx.open("fresh").unwrap().difficulty(), 5.0);
    }
}

//! Output formatting - plain ASCII terminal output

use ascent_core::catalog::Tier;
use ascent_core::journey::{level_requirement, LevelProgression};
use ascent_core::{
    AttemptOutcome, JourneyState, ProgressionSession, Puzzle, PuzzleCatalog, SkillEvent,
};
use owo_colors::OwoColorize;

const SEPARATOR: &str = "------------------------------------------------------------";

/// Fixed-width bar for a 0-100 value
fn bar(value: u8) -> String {
    let filled = (value as usize) / 5;
    format!("[{}{}]", "#".repeat(filled), ".".repeat(20 - filled))
}

pub fn print_status(session: &ProgressionSession) {
    let profile = session.profile();
    let journey = session.journey();

    println!();
    println!("{}  {}", "[USER]".bright_cyan(), session.user_id().bold());
    println!("{}", SEPARATOR.dimmed());

    println!(
        "Skills (overall level {}, {} points)",
        profile.skills.overall_level(),
        profile.skills.total_points()
    );
    for (skill, value) in profile.skills.skills() {
        let mark = if profile.skills.mastered().contains(skill) {
            " mastered".bright_green().to_string()
        } else {
            String::new()
        };
        println!("  {:<12} {} {:>3}{}", skill, bar(*value), value, mark);
    }

    let m = session.difficulty_multiplier();
    println!();
    println!(
        "Difficulty   {:.1}  (complexity x{:.2}, enemies x{:.2}, hint cooldown x{:.2})",
        session.difficulty(),
        m.puzzle_complexity,
        m.enemy_strength,
        m.hint_cooldown
    );
    println!(
        "Puzzles      {} solved, {} exhausted, {} xp",
        profile.completed.len(),
        profile.failed.len(),
        profile.total_xp
    );

    println!();
    print_journey(journey);
    let next = session.next_challenges();
    if !next.is_empty() {
        println!("  Next:");
        for challenge in next {
            println!("    * {}", challenge);
        }
    }

    println!();
    if session.unlocks().is_empty() {
        println!("Unlocks      {}", "none yet".dimmed());
    } else {
        println!("Unlocks");
        for key in session.unlocks().iter() {
            println!("  * {}", key.cyan());
        }
    }
    println!();
}

pub fn print_journey(state: &JourneyState) {
    let name = level_requirement(state.level).map(|r| r.name).unwrap_or("?");
    println!("Journey      level {} ({})", state.level, name.bright_magenta());
    println!(
        "  {} triggers, {} challenges, {} philosophies",
        state.unlocked_triggers.len(),
        state.completed_challenges.len(),
        state.philosophy_unlocked.len()
    );
    if state.journey_completed {
        let archetype = state.archetype.as_deref().unwrap_or("unknown");
        println!("  Transcendental journey complete ({})", archetype);
    } else if state.journey_started {
        println!("  Transcendental journey in progress");
    }
}

pub fn print_catalog(catalog: &PuzzleCatalog) {
    for tier in [Tier::Novice, Tier::Adept, Tier::Expert, Tier::Master] {
        let puzzles = catalog.by_tier(tier);
        if puzzles.is_empty() {
            continue;
        }
        println!("[{}]", tier.label().to_uppercase().bright_cyan());
        for puzzle in puzzles {
            println!(
                "  {:>2}  {:<22} {:<14} {:>4} xp  {}",
                puzzle.difficulty,
                puzzle.id,
                puzzle.kind.as_str(),
                puzzle.xp,
                puzzle.title.dimmed()
            );
        }
    }
}

pub fn print_suggestion(puzzle: &Puzzle, difficulty: f64) {
    println!(
        "{} {} ({}, difficulty {}; you are at {:.1})",
        "[NEXT]".bright_green(),
        puzzle.title.bold(),
        puzzle.id,
        puzzle.difficulty,
        difficulty
    );
}

pub fn print_hint(text: &str) {
    println!("{} {}", "[HINT]".yellow(), text);
}

pub fn print_outcome(outcome: &AttemptOutcome) {
    match outcome {
        AttemptOutcome::Solved(report) => {
            if report.first_completion {
                println!(
                    "{} {} solved, +{} xp, difficulty now {:.1}",
                    "[OK]".bright_green(),
                    report.puzzle_id,
                    report.xp_earned,
                    report.difficulty
                );
            } else {
                println!(
                    "{} {} solved again (no rewards), difficulty now {:.1}",
                    "[OK]".bright_green(),
                    report.puzzle_id,
                    report.difficulty
                );
            }
            for (skill, delta) in &report.skill_deltas {
                println!("  {} {:+}", skill, delta);
            }
            print_skill_events(&report.skill_events);
            print_unlocks(&report.new_unlocks);
        }
        AttemptOutcome::Retry(report) => {
            println!(
                "{} not quite, {} attempt(s) left",
                "[MISS]".yellow(),
                report.remaining
            );
            if let Some(hint) = &report.hint {
                print_hint(hint);
            } else if report.offer_hint {
                println!("  A hint is available (--hint).");
            }
        }
        AttemptOutcome::Exhausted(report) => {
            println!(
                "{} {} exhausted after {} attempts, difficulty now {:.1}",
                "[FAIL]".bright_red(),
                report.puzzle_id,
                report.attempts,
                report.difficulty
            );
            match &report.replacement {
                Some(id) => println!("  Try {} instead.", id.cyan()),
                None => println!("  No replacement puzzle available."),
            }
        }
    }
}

pub fn print_skill_events(events: &[SkillEvent]) {
    for event in events {
        match event {
            SkillEvent::Milestone { skill, threshold } => {
                println!("  {} {} reached {}", "[MILESTONE]".bright_cyan(), skill, threshold)
            }
            SkillEvent::Mastery { skill, .. } => {
                println!("  {} {} mastered", "[MASTERY]".bright_magenta(), skill)
            }
            SkillEvent::LevelUp { from, to, .. } => {
                println!("  {} overall level {} -> {}", "[LEVEL]".bright_green(), from, to)
            }
        }
    }
}

pub fn print_unlocks(keys: &[String]) {
    for key in keys {
        println!("  {} {}", "[UNLOCKED]".bright_green(), key);
    }
}

pub fn print_progression(progression: &LevelProgression) {
    if progression.leveled_up {
        println!("{} {}", "[LEVEL UP]".bright_magenta(), progression.message);
    } else {
        println!("{}", progression.message.dimmed());
    }
}

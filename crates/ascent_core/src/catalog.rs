//! Puzzle Catalog & Matcher (v0.1.0)
//!
//! Static reference data keyed by puzzle id. Iteration order is insertion
//! order, which is also the tie-break order for difficulty matching.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

use crate::error::{EngineError, EngineResult};

/// Coarse difficulty band
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Novice,
    Adept,
    Expert,
    Master,
}

impl Tier {
    pub fn for_difficulty(difficulty: u8) -> Self {
        match difficulty {
            0..=3 => Tier::Novice,
            4..=7 => Tier::Adept,
            8..=11 => Tier::Expert,
            _ => Tier::Master,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tier::Novice => "novice",
            Tier::Adept => "adept",
            Tier::Expert => "expert",
            Tier::Master => "master",
        }
    }
}

/// How a puzzle is solved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PuzzleKind {
    Hover,
    ClickPattern,
    Sequence,
    Cipher,
    Riddle,
    Code,
    Memory,
    Timing,
    MultiStep,
    TimeLocked,
}

impl PuzzleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PuzzleKind::Hover => "hover",
            PuzzleKind::ClickPattern => "click_pattern",
            PuzzleKind::Sequence => "sequence",
            PuzzleKind::Cipher => "cipher",
            PuzzleKind::Riddle => "riddle",
            PuzzleKind::Code => "code",
            PuzzleKind::Memory => "memory",
            PuzzleKind::Timing => "timing",
            PuzzleKind::MultiStep => "multi_step",
            PuzzleKind::TimeLocked => "time_locked",
        }
    }
}

impl std::fmt::Display for PuzzleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind-specific requirement payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Requirement {
    /// Hold for at least `min_duration_ms`
    Hover { min_duration_ms: u64 },
    /// Stop within `tolerance_ms` of `target_ms`
    Timing { target_ms: u64, tolerance_ms: u64 },
    /// Submit no earlier than `min_elapsed_ms` after activation
    TimeLocked { min_elapsed_ms: u64 },
    ClickPattern {
        pattern: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        within_ms: Option<u64>,
    },
    Sequence {
        steps: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        within_ms: Option<u64>,
    },
    Memory { items: Vec<String> },
    MultiStep { steps: Vec<String> },
    Text {
        answer: String,
        #[serde(default)]
        alternate_answers: Vec<String>,
    },
    Code { expression: String },
}

impl Requirement {
    /// Whether this payload belongs to `kind`
    pub fn fits(&self, kind: PuzzleKind) -> bool {
        matches!(
            (kind, self),
            (PuzzleKind::Hover, Requirement::Hover { .. })
                | (PuzzleKind::Timing, Requirement::Timing { .. })
                | (PuzzleKind::TimeLocked, Requirement::TimeLocked { .. })
                | (PuzzleKind::ClickPattern, Requirement::ClickPattern { .. })
                | (PuzzleKind::Sequence, Requirement::Sequence { .. })
                | (PuzzleKind::Memory, Requirement::Memory { .. })
                | (PuzzleKind::MultiStep, Requirement::MultiStep { .. })
                | (PuzzleKind::Cipher, Requirement::Text { .. })
                | (PuzzleKind::Riddle, Requirement::Text { .. })
                | (PuzzleKind::Code, Requirement::Code { .. })
        )
    }
}

/// A catalog-defined challenge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Puzzle {
    pub id: String,
    pub title: String,
    pub tier: Tier,
    pub difficulty: u8,
    pub kind: PuzzleKind,
    pub requirement: Requirement,
    #[serde(default)]
    pub skill_rewards: BTreeMap<String, i32>,
    pub xp: u32,
    pub hint: String,
}

/// Immutable, insertion-ordered puzzle set
#[derive(Debug, Clone)]
pub struct PuzzleCatalog {
    puzzles: Vec<Puzzle>,
    index: HashMap<String, usize>,
}

impl PuzzleCatalog {
    pub fn from_puzzles(puzzles: Vec<Puzzle>) -> EngineResult<Self> {
        let mut index = HashMap::with_capacity(puzzles.len());
        for (pos, puzzle) in puzzles.iter().enumerate() {
            if !puzzle.requirement.fits(puzzle.kind) {
                return Err(EngineError::Catalog(format!(
                    "puzzle '{}' has a requirement that does not fit kind {}",
                    puzzle.id, puzzle.kind
                )));
            }
            if index.insert(puzzle.id.clone(), pos).is_some() {
                return Err(EngineError::Catalog(format!(
                    "duplicate puzzle id '{}'",
                    puzzle.id
                )));
            }
        }
        Ok(Self { puzzles, index })
    }

    /// Parse a JSON array of puzzles
    pub fn from_json(json: &str) -> EngineResult<Self> {
        let puzzles: Vec<Puzzle> = serde_json::from_str(json)?;
        Self::from_puzzles(puzzles)
    }

    pub fn get(&self, id: &str) -> Option<&Puzzle> {
        self.index.get(id).map(|pos| &self.puzzles[*pos])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Puzzle> {
        self.puzzles.iter()
    }

    pub fn len(&self) -> usize {
        self.puzzles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.puzzles.is_empty()
    }

    pub fn by_tier(&self, tier: Tier) -> Vec<&Puzzle> {
        self.puzzles.iter().filter(|p| p.tier == tier).collect()
    }

    /// Closest not-yet-completed puzzle within `window` of `target`.
    ///
    /// Ties on distance go to the earlier catalog entry.
    pub fn puzzle_for_difficulty(
        &self,
        target: f64,
        completed: &BTreeSet<String>,
        window: f64,
    ) -> Option<&Puzzle> {
        let mut best: Option<(&Puzzle, f64)> = None;
        for puzzle in &self.puzzles {
            if completed.contains(&puzzle.id) {
                continue;
            }
            let distance = (puzzle.difficulty as f64 - target).abs();
            if distance > window {
                continue;
            }
            // Strict comparison keeps the first entry on ties
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((puzzle, distance));
            }
        }
        match best {
            Some((puzzle, distance)) => {
                debug!(target_difficulty = target, puzzle = %puzzle.id, distance, "matched puzzle");
                Some(puzzle)
            }
            None => {
                debug!(target_difficulty = target, completed = completed.len(), "no puzzle available");
                None
            }
        }
    }

    /// Built-in catalog shipped with the site
    pub fn builtin() -> Self {
        let puzzles = builtin_puzzles();
        let index = puzzles
            .iter()
            .enumerate()
            .map(|(pos, p)| (p.id.clone(), pos))
            .collect();
        Self { puzzles, index }
    }
}

fn rewards(pairs: &[(&str, i32)]) -> BTreeMap<String, i32> {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Builtin entry under construction
struct Draft(Puzzle);

fn puzzle(id: &str, title: &str, difficulty: u8, kind: PuzzleKind) -> Draft {
    Draft(Puzzle {
        id: id.to_string(),
        title: title.to_string(),
        tier: Tier::for_difficulty(difficulty),
        difficulty,
        kind,
        requirement: Requirement::Code {
            expression: String::new(),
        },
        skill_rewards: BTreeMap::new(),
        xp: 0,
        hint: String::new(),
    })
}

impl Draft {
    fn requires(mut self, requirement: Requirement) -> Self {
        self.0.requirement = requirement;
        self
    }

    fn rewards(mut self, pairs: &[(&str, i32)]) -> Self {
        self.0.skill_rewards = rewards(pairs);
        self
    }

    fn xp(mut self, xp: u32) -> Self {
        self.0.xp = xp;
        self
    }

    fn hint(mut self, hint: &str) -> Puzzle {
        self.0.hint = hint.to_string();
        self.0
    }
}

fn builtin_puzzles() -> Vec<Puzzle> {
    use PuzzleKind::*;
    vec![
        puzzle("lingering_glyph", "The Lingering Glyph", 1, Hover)
            .requires(Requirement::Hover { min_duration_ms: 3000 })
            .rewards(&[("perception", 5), ("persistence", 3)])
            .xp(50)
            .hint("Some symbols only speak to those who wait."),
        puzzle("nav_knock", "Knock on the Nav", 2, ClickPattern)
            .requires(Requirement::ClickPattern {
                pattern: strings(&["logo", "logo", "about", "logo"]),
                within_ms: Some(5000),
            })
            .rewards(&[("perception", 4), ("logic", 4)])
            .xp(60)
            .hint("Twice on the mark, once on the story, once more on the mark."),
        puzzle("caesar_greeting", "A Roman Greeting", 3, Cipher)
            .requires(Requirement::Text {
                answer: "hello traveler".to_string(),
                alternate_answers: strings(&["hello, traveler", "hello traveller"]),
            })
            .rewards(&[("logic", 6)])
            .xp(75)
            .hint("Every letter stepped three places forward."),
        puzzle("footer_riddle", "Riddle of the Footer", 4, Riddle)
            .requires(Requirement::Text {
                answer: "echo".to_string(),
                alternate_answers: strings(&["an echo"]),
            })
            .rewards(&[("creativity", 6), ("logic", 2)])
            .xp(80)
            .hint("It speaks without a mouth and answers only when called."),
        puzzle("memory_palace", "Memory Palace", 5, Memory)
            .requires(Requirement::Memory {
                items: strings(&["lantern", "key", "raven", "hourglass", "compass"]),
            })
            .rewards(&[("perception", 6), ("persistence", 4)])
            .xp(90)
            .hint("Walk the rooms in the order you entered them."),
        puzzle("metronome", "Metronome", 5, Timing)
            .requires(Requirement::Timing {
                target_ms: 2000,
                tolerance_ms: 150,
            })
            .rewards(&[("persistence", 5), ("perception", 3)])
            .xp(90)
            .hint("Count two heartbeats, not three."),
        puzzle("console_whisper", "Console Whisper", 6, Code)
            .requires(Requirement::Code {
                expression: "ascent.reveal()".to_string(),
            })
            .rewards(&[("technical", 8)])
            .xp(100)
            .hint("The console greets those who ask it to reveal itself."),
        puzzle("starfield_sequence", "Starfield Sequence", 7, Sequence)
            .requires(Requirement::Sequence {
                steps: strings(&["orion", "cassiopeia", "lyra", "cygnus"]),
                within_ms: Some(20_000),
            })
            .rewards(&[("logic", 6), ("perception", 4)])
            .xp(110)
            .hint("Follow the winter hunter to the summer swan."),
        puzzle("vigenere_door", "The Vigenere Door", 8, Cipher)
            .requires(Requirement::Text {
                answer: "the map is not the territory".to_string(),
                alternate_answers: Vec::new(),
            })
            .rewards(&[("logic", 8), ("technical", 4)])
            .xp(130)
            .hint("The key is the name of this site."),
        puzzle("patience_seal", "Seal of Patience", 8, TimeLocked)
            .requires(Requirement::TimeLocked {
                min_elapsed_ms: 60_000,
            })
            .rewards(&[("persistence", 10)])
            .xp(120)
            .hint("Nothing here rewards haste."),
        puzzle("three_locks", "Three Locks", 9, MultiStep)
            .requires(Requirement::MultiStep {
                steps: strings(&["moon", "tide", "harbor"]),
            })
            .rewards(&[("logic", 6), ("creativity", 6)])
            .xp(140)
            .hint("Each lock's answer pulls the next."),
        puzzle("mirror_riddle", "Riddle in the Mirror", 10, Riddle)
            .requires(Requirement::Text {
                answer: "tomorrow".to_string(),
                alternate_answers: strings(&["the future"]),
            })
            .rewards(&[("creativity", 10)])
            .xp(150)
            .hint("Always coming, never arriving."),
        puzzle("binary_pulse", "Binary Pulse", 11, ClickPattern)
            .requires(Requirement::ClickPattern {
                pattern: strings(&["1", "0", "1", "1", "0", "1"]),
                within_ms: Some(4000),
            })
            .rewards(&[("technical", 8), ("persistence", 4)])
            .xp(160)
            .hint("Forty-five, spoken in the machine's tongue."),
        puzzle("recursive_oracle", "Recursive Oracle", 12, Code)
            .requires(Requirement::Code {
                expression: "oracle.ask(oracle)".to_string(),
            })
            .rewards(&[("technical", 10), ("logic", 6)])
            .xp(180)
            .hint("Ask the oracle about the oracle."),
        puzzle("eclipse_timing", "Eclipse", 13, Timing)
            .requires(Requirement::Timing {
                target_ms: 7300,
                tolerance_ms: 50,
            })
            .rewards(&[("perception", 10), ("persistence", 6)])
            .xp(200)
            .hint("Totality lasts seven seconds and a breath."),
        puzzle("final_liturgy", "The Final Liturgy", 15, MultiStep)
            .requires(Requirement::MultiStep {
                steps: strings(&["silence", "ember", "ascent", "return"]),
            })
            .rewards(&[("creativity", 12), ("logic", 12), ("technical", 6)])
            .xp(300)
            .hint("Begin where sound ends; finish where you started."),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(id: &str, difficulty: u8) -> Puzzle {
        puzzle(id, id, difficulty, PuzzleKind::Riddle)
            .requires(Requirement::Text {
                answer: "x".to_string(),
                alternate_answers: Vec::new(),
            })
            .xp(100)
            .hint("hint")
    }

    fn catalog(levels: &[(&str, u8)]) -> PuzzleCatalog {
        PuzzleCatalog::from_puzzles(levels.iter().map(|(id, d)| at(id, *d)).collect()).unwrap()
    }

    #[test]
    fn test_builtin_catalog_is_valid() {
        let builtin = PuzzleCatalog::builtin();
        assert_eq!(builtin.len(), 16);
        let rebuilt = PuzzleCatalog::from_puzzles(builtin.iter().cloned().collect());
        assert!(rebuilt.is_ok());
        assert!(builtin.get("caesar_greeting").is_some());
    }

    #[test]
    fn test_match_prefers_insertion_order_on_tie() {
        let catalog = catalog(&[("d4", 4), ("d5", 5), ("d7", 7), ("d9", 9)]);
        let picked = catalog
            .puzzle_for_difficulty(6.0, &BTreeSet::new(), 2.0)
            .unwrap();
        assert_eq!(picked.id, "d5");
    }

    #[test]
    fn test_match_skips_completed() {
        let catalog = catalog(&[("d4", 4), ("d5", 5), ("d7", 7), ("d9", 9)]);
        let completed: BTreeSet<String> = ["d5".to_string()].into_iter().collect();
        let picked = catalog.puzzle_for_difficulty(6.0, &completed, 2.0).unwrap();
        assert_eq!(picked.id, "d7");
    }

    #[test]
    fn test_match_respects_window() {
        let catalog = catalog(&[("d1", 1), ("d9", 9)]);
        assert!(catalog
            .puzzle_for_difficulty(5.0, &BTreeSet::new(), 2.0)
            .is_none());
        // Boundary distance is inclusive
        let picked = catalog.puzzle_for_difficulty(3.0, &BTreeSet::new(), 2.0);
        assert_eq!(picked.map(|p| p.id.as_str()), Some("d1"));
    }

    #[test]
    fn test_match_fractional_target() {
        let catalog = catalog(&[("d2", 2), ("d3", 3)]);
        let picked = catalog
            .puzzle_for_difficulty(2.5, &BTreeSet::new(), 2.0)
            .unwrap();
        assert_eq!(picked.id, "d2");
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let result = PuzzleCatalog::from_puzzles(vec![at("same", 1), at("same", 2)]);
        assert!(matches!(result, Err(EngineError::Catalog(_))));
    }

    #[test]
    fn test_mismatched_requirement_rejected() {
        let mut bad = at("bad", 1);
        bad.kind = PuzzleKind::Hover;
        assert!(PuzzleCatalog::from_puzzles(vec![bad]).is_err());
    }

    #[test]
    fn test_from_json() {
        let json = r#"[{
            "id": "knock",
            "title": "Knock",
            "tier": "novice",
            "difficulty": 2,
            "kind": "click_pattern",
            "requirement": {"type": "click_pattern", "pattern": ["a", "b"]},
            "skill_rewards": {"logic": 3},
            "xp": 40,
            "hint": "a then b"
        }]"#;
        let catalog = PuzzleCatalog::from_json(json).unwrap();
        let knock = catalog.get("knock").unwrap();
        assert_eq!(knock.kind, PuzzleKind::ClickPattern);
        assert_eq!(knock.skill_rewards.get("logic"), Some(&3));
    }

    #[test]
    fn test_tier_bands() {
        assert_eq!(Tier::for_difficulty(1), Tier::Novice);
        assert_eq!(Tier::for_difficulty(5), Tier::Adept);
        assert_eq!(Tier::for_difficulty(9), Tier::Expert);
        assert_eq!(Tier::for_difficulty(15), Tier::Master);
        assert_eq!(PuzzleCatalog::builtin().by_tier(Tier::Master).len(), 3);
    }
}

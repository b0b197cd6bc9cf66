//! Solution validation per puzzle kind.
//!
//! Payloads arrive as JSON from the presentation layer. Anything that does
//! not have the expected shape is a wrong answer, never an error.
//!
//! Accepted shapes:
//! - text (cipher, riddle) and code: a JSON string
//! - structural (click pattern, sequence, memory, multi step): an array of
//!   strings, or `{"steps": [...], "elapsed_ms": n}`
//! - threshold (hover, timing, time locked): a number, or an object with
//!   `duration_ms`, `offset_ms` or `elapsed_ms`

use serde_json::Value;

use crate::catalog::{Puzzle, Requirement};

/// True when `solution` satisfies the puzzle's requirement
pub fn validate_solution(puzzle: &Puzzle, solution: &Value) -> bool {
    check(&puzzle.requirement, solution)
}

pub fn check(requirement: &Requirement, solution: &Value) -> bool {
    match requirement {
        Requirement::Text {
            answer,
            alternate_answers,
        } => match solution.as_str() {
            Some(text) => {
                let given = normalize(text);
                std::iter::once(answer)
                    .chain(alternate_answers.iter())
                    .any(|candidate| normalize(candidate) == given)
            }
            None => false,
        },
        Requirement::Code { expression } => solution.as_str() == Some(expression.as_str()),
        Requirement::ClickPattern { pattern, within_ms } => {
            structural_match(pattern, *within_ms, solution, false)
        }
        Requirement::Sequence { steps, within_ms } => {
            structural_match(steps, *within_ms, solution, false)
        }
        Requirement::Memory { items } => structural_match(items, None, solution, false),
        Requirement::MultiStep { steps } => structural_match(steps, None, solution, true),
        Requirement::Hover { min_duration_ms } => {
            threshold_value(solution, "duration_ms").map_or(false, |d| d >= *min_duration_ms as f64)
        }
        Requirement::Timing {
            target_ms,
            tolerance_ms,
        } => threshold_value(solution, "offset_ms")
            .map_or(false, |o| (o - *target_ms as f64).abs() <= *tolerance_ms as f64),
        Requirement::TimeLocked { min_elapsed_ms } => {
            threshold_value(solution, "elapsed_ms").map_or(false, |e| e >= *min_elapsed_ms as f64)
        }
    }
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Ordered equality against `expected`, plus the optional time window.
/// `loose` compares each step trimmed and case-insensitive.
fn structural_match(
    expected: &[String],
    within_ms: Option<u64>,
    solution: &Value,
    loose: bool,
) -> bool {
    let (steps, elapsed) = match solution {
        Value::Array(items) => (items, None),
        Value::Object(map) => match map.get("steps") {
            Some(Value::Array(items)) => (items, map.get("elapsed_ms").and_then(non_negative)),
            _ => return false,
        },
        _ => return false,
    };

    if let Some(limit) = within_ms {
        match elapsed {
            Some(ms) if ms <= limit as f64 => {}
            _ => return false,
        }
    }

    if steps.len() != expected.len() {
        return false;
    }
    steps.iter().zip(expected).all(|(given, want)| match given.as_str() {
        Some(given) if loose => normalize(given) == normalize(want),
        Some(given) => given == want.as_str(),
        None => false,
    })
}

/// Caller-supplied duration, either bare or under `field`
fn threshold_value(solution: &Value, field: &str) -> Option<f64> {
    match solution {
        Value::Number(_) => non_negative(solution),
        Value::Object(map) => map.get(field).and_then(non_negative),
        _ => None,
    }
}

fn non_negative(value: &Value) -> Option<f64> {
    value
        .as_f64()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

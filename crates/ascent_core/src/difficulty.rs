//! Difficulty Controller (v0.2.0)
//!
//! One bounded scalar per user, stepped after each puzzle outcome.
//!
//! ## Policy
//!
//! - solved puzzle: `+success_step` (default 0.5), capped at `max`
//! - exhausted puzzle: `-failure_step` (default 1.0), floored at `min`
//!
//! Retries inside an attempt do not move difficulty. Values are kept at one
//! decimal of precision.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::DifficultyConfig;

/// Projection of difficulty onto other game systems
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyMultiplier {
    pub puzzle_complexity: f64,
    pub enemy_strength: f64,
    pub hint_cooldown: f64,
}

/// Base number of failed attempts before a hint is offered
const HINT_BASE_ATTEMPTS: i64 = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct DifficultyController {
    value: f64,
    policy: DifficultyConfig,
}

impl DifficultyController {
    pub fn new(policy: DifficultyConfig) -> Self {
        let value = round_tenth(policy.initial.clamp(policy.min, policy.max));
        Self { value, policy }
    }

    /// Rebuild from a persisted value, clamped into bounds
    pub fn restore(policy: DifficultyConfig, value: f64) -> Self {
        let value = if value.is_finite() {
            round_tenth(value.clamp(policy.min, policy.max))
        } else {
            policy.initial
        };
        Self { value, policy }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn record_success(&mut self) -> f64 {
        self.adjust(self.policy.success_step)
    }

    pub fn record_failure(&mut self) -> f64 {
        self.adjust(-self.policy.failure_step)
    }

    fn adjust(&mut self, delta: f64) -> f64 {
        let old = self.value;
        self.value = round_tenth((self.value + delta).clamp(self.policy.min, self.policy.max));
        debug!(old, new = self.value, delta, "difficulty adjusted");
        self.value
    }

    pub fn multiplier(&self) -> DifficultyMultiplier {
        DifficultyMultiplier {
            puzzle_complexity: self.value / 5.0,
            enemy_strength: self.value / 3.0,
            hint_cooldown: 1.0 + self.value / 10.0,
        }
    }

    /// Higher difficulty lowers the number of attempts before a hint.
    pub fn should_offer_hint(&self, attempts_so_far: u32) -> bool {
        let threshold = HINT_BASE_ATTEMPTS - (self.value / 5.0).floor() as i64;
        attempts_so_far as i64 >= threshold
    }
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> DifficultyController {
        DifficultyController::new(DifficultyConfig::default())
    }

    #[test]
    fn test_initial_value() {
        assert_eq!(controller().value(), 1.0);
    }

    #[test]
    fn test_success_caps_at_max() {
        let mut d = controller();
        for _ in 0..100 {
            d.record_success();
        }
        assert_eq!(d.value(), 15.0);
    }

    #[test]
    fn test_failure_floors_at_min() {
        let mut d = controller();
        d.record_success();
        assert_eq!(d.value(), 1.5);
        d.record_failure();
        assert_eq!(d.value(), 1.0);
        d.record_failure();
        assert_eq!(d.value(), 1.0);
    }

    #[test]
    fn test_steps_stay_on_tenths() {
        let mut d = controller();
        for _ in 0..7 {
            d.record_success();
        }
        assert_eq!(d.value(), 4.5);
    }

    #[test]
    fn test_multiplier_projection() {
        let d = DifficultyController::restore(DifficultyConfig::default(), 6.0);
        let m = d.multiplier();
        assert!((m.puzzle_complexity - 1.2).abs() < 1e-9);
        assert!((m.enemy_strength - 2.0).abs() < 1e-9);
        assert!((m.hint_cooldown - 1.6).abs() < 1e-9);
    }

    #[test]
    fn test_hint_threshold_drops_with_difficulty() {
        let low = controller();
        assert!(!low.should_offer_hint(2));
        assert!(low.should_offer_hint(3));

        let mid = DifficultyController::restore(DifficultyConfig::default(), 5.0);
        assert!(mid.should_offer_hint(2));
        assert!(!mid.should_offer_hint(1));

        let top = DifficultyController::restore(DifficultyConfig::default(), 15.0);
        assert!(top.should_offer_hint(0));
    }

    #[test]
    fn test_restore_clamps() {
        assert_eq!(
            DifficultyController::restore(DifficultyConfig::default(), 99.0).value(),
            15.0
        );
        assert_eq!(
            DifficultyController::restore(DifficultyConfig::default(), -3.0).value(),
            1.0
        );
        assert_eq!(
            DifficultyController::restore(DifficultyConfig::default(), f64::NAN).value(),
            1.0
        );
    }
}

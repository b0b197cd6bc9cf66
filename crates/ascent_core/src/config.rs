//! Engine configuration (v0.2.0)
//!
//! Tunables for difficulty stepping, attempt limits and matching.
//! Config file: `ascent.toml`, every section optional.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::EngineError;

/// Difficulty controller tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultyConfig {
    #[serde(default = "default_initial")]
    pub initial: f64,
    #[serde(default = "default_min")]
    pub min: f64,
    #[serde(default = "default_max")]
    pub max: f64,
    /// Added after a solved puzzle
    #[serde(default = "default_success_step")]
    pub success_step: f64,
    /// Subtracted after an exhausted puzzle
    #[serde(default = "default_failure_step")]
    pub failure_step: f64,
}

fn default_initial() -> f64 {
    1.0
}
fn default_min() -> f64 {
    1.0
}
fn default_max() -> f64 {
    15.0
}
fn default_success_step() -> f64 {
    0.5
}
fn default_failure_step() -> f64 {
    1.0
}

impl Default for DifficultyConfig {
    fn default() -> Self {
        Self {
            initial: default_initial(),
            min: default_min(),
            max: default_max(),
            success_step: default_success_step(),
            failure_step: default_failure_step(),
        }
    }
}

/// Attempt limits for an active puzzle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Failed attempts before the static hint is surfaced
    #[serde(default = "default_hint_after")]
    pub hint_after: u32,
    #[serde(default = "default_no_hint_bonus")]
    pub no_hint_bonus: f64,
}

fn default_max_attempts() -> u32 {
    3
}
fn default_hint_after() -> u32 {
    2
}
fn default_no_hint_bonus() -> f64 {
    1.5
}

impl Default for AttemptConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            hint_after: default_hint_after(),
            no_hint_bonus: default_no_hint_bonus(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Largest accepted |difficulty - target|
    #[serde(default = "default_window")]
    pub window: f64,
}

fn default_window() -> f64 {
    2.0
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            window: default_window(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root for profiles/ and journeys/ (CLI only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

/// Top-level engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub difficulty: DifficultyConfig,
    #[serde(default)]
    pub attempts: AttemptConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl EngineConfig {
    /// Load from a TOML file. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: EngineConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        let contents = toml::to_string_pretty(self).context("Failed to serialize configuration")?;
        fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        let d = &self.difficulty;
        let fields = [
            ("difficulty.initial", d.initial),
            ("difficulty.min", d.min),
            ("difficulty.max", d.max),
            ("difficulty.success_step", d.success_step),
            ("difficulty.failure_step", d.failure_step),
            ("attempts.no_hint_bonus", self.attempts.no_hint_bonus),
            ("matching.window", self.matching.window),
        ];
        if let Some((name, value)) = fields.iter().find(|(_, v)| !v.is_finite()) {
            return Err(EngineError::Config(format!("{} must be a finite number, got {}", name, value)));
        }
        if d.min > d.max {
            return Err(EngineError::Config(format!(
                "difficulty bounds [{}, {}] are invalid",
                d.min, d.max
            )));
        }
        if d.initial < d.min || d.initial > d.max {
            return Err(EngineError::Config(format!(
                "initial difficulty {} outside [{}, {}]",
                d.initial, d.min, d.max
            )));
        }
        if d.success_step <= 0.0 || d.failure_step <= 0.0 {
            return Err(EngineError::Config(
                "difficulty steps must be positive".to_string(),
            ));
        }
        if self.attempts.max_attempts == 0 {
            return Err(EngineError::Config(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        if self.attempts.no_hint_bonus < 1.0 {
            return Err(EngineError::Config(
                "no_hint_bonus must be >= 1.0".to_string(),
            ));
        }
        if self.matching.window < 0.0 {
            return Err(EngineError::Config(
                "matching window must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.difficulty.initial, 1.0);
        assert_eq!(config.difficulty.max, 15.0);
        assert_eq!(config.attempts.max_attempts, 3);
        assert_eq!(config.attempts.hint_after, 2);
        assert_eq!(config.matching.window, 2.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: EngineConfig = toml::from_str(
            r#"
            [difficulty]
            success_step = 0.25
            "#,
        )
        .unwrap();
        assert_eq!(config.difficulty.success_step, 0.25);
        assert_eq!(config.difficulty.failure_step, 1.0);
        assert_eq!(config.attempts.max_attempts, 3);
    }

    #[test]
    fn test_validate_rejects_inverted_bounds() {
        let mut config = EngineConfig::default();
        config.difficulty.min = 10.0;
        config.difficulty.max = 5.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let mut config = EngineConfig::default();
        config.attempts.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_non_finite() {
        let parsed: EngineConfig = toml::from_str("[difficulty]\ninitial = nan\n").unwrap();
        assert!(parsed.validate().is_err());

        let mut config = EngineConfig::default();
        config.difficulty.success_step = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.difficulty.failure_step = f64::INFINITY;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.attempts.no_hint_bonus = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.matching.window = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_nan_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ascent.toml");
        fs::write(&path, "[difficulty]\nsuccess_step = nan\n\n[matching]\nwindow = nan\n").unwrap();
        assert!(EngineConfig::load(&path).is_err());
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_toml_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ascent.toml");
        let mut config = EngineConfig::default();
        config.attempts.max_attempts = 5;
        config.save(&path).unwrap();

        let loaded = EngineConfig::load(&path).unwrap();
        assert_eq!(loaded.attempts.max_attempts, 5);
    }

    #[test]
    fn test_invalid_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ascent.toml");
        fs::write(&path, "[difficulty]\nmin = 9.0\nmax = 2.0\n").unwrap();
        assert!(EngineConfig::load(&path).is_err());
    }
}

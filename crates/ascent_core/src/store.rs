//! Storage boundary (v0.2.0)
//!
//! The engine only needs "load/save profile" and "append/load events" per
//! user. `MemoryStore` backs tests and embedding; `FileStore` keeps one JSON
//! profile and one append-only JSONL journey per user:
//!
//! ```text
//! <data_dir>/profiles/<user>.json
//! <data_dir>/journeys/<user>.jsonl
//! ```
//!
//! Journey delivery is at-least-once. Stores drop events whose id was
//! already seen so replays never see the same record twice.

use std::collections::{HashMap, HashSet};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

use crate::error::{EngineError, EngineResult};
use crate::journey::JourneyEvent;
use crate::profile::UserProfile;

/// Longest accepted user id
const MAX_USER_ID_LEN: usize = 64;

pub trait ProfileStore: Send + Sync {
    /// `Ok(None)` for a user never saved before
    fn load_profile(&self, user_id: &str) -> EngineResult<Option<UserProfile>>;
    fn save_profile(&self, user_id: &str, profile: &UserProfile) -> EngineResult<()>;
}

pub trait JourneyStore: Send + Sync {
    fn append_event(&self, event: &JourneyEvent) -> EngineResult<()>;
    /// All events in append order, duplicates removed
    fn load_events(&self, user_id: &str) -> EngineResult<Vec<JourneyEvent>>;
}

/// Reject ids that could escape the data directory
pub fn validate_user_id(user_id: &str) -> EngineResult<()> {
    let valid = !user_id.is_empty()
        && user_id.len() <= MAX_USER_ID_LEN
        && user_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(EngineError::Storage(format!("invalid user id '{}'", user_id)))
    }
}

fn lock_poisoned() -> EngineError {
    EngineError::Storage("store lock poisoned".to_string())
}

/// In-process store
#[derive(Default)]
pub struct MemoryStore {
    profiles: Mutex<HashMap<String, UserProfile>>,
    events: Mutex<HashMap<String, Vec<JourneyEvent>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProfileStore for MemoryStore {
    fn load_profile(&self, user_id: &str) -> EngineResult<Option<UserProfile>> {
        let profiles = self.profiles.lock().map_err(|_| lock_poisoned())?;
        Ok(profiles.get(user_id).cloned())
    }

    fn save_profile(&self, user_id: &str, profile: &UserProfile) -> EngineResult<()> {
        let mut profiles = self.profiles.lock().map_err(|_| lock_poisoned())?;
        profiles.insert(user_id.to_string(), profile.clone());
        Ok(())
    }
}

impl JourneyStore for MemoryStore {
    fn append_event(&self, event: &JourneyEvent) -> EngineResult<()> {
        let mut events = self.events.lock().map_err(|_| lock_poisoned())?;
        let log = events.entry(event.user_id.clone()).or_default();
        if !log.iter().any(|e| e.id == event.id) {
            log.push(event.clone());
        }
        Ok(())
    }

    fn load_events(&self, user_id: &str) -> EngineResult<Vec<JourneyEvent>> {
        let events = self.events.lock().map_err(|_| lock_poisoned())?;
        Ok(events.get(user_id).cloned().unwrap_or_default())
    }
}

/// JSON/JSONL files under a data directory
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn profile_path(&self, user_id: &str) -> EngineResult<PathBuf> {
        validate_user_id(user_id)?;
        Ok(self.root.join("profiles").join(format!("{}.json", user_id)))
    }

    fn journey_path(&self, user_id: &str) -> EngineResult<PathBuf> {
        validate_user_id(user_id)?;
        Ok(self.root.join("journeys").join(format!("{}.jsonl", user_id)))
    }

    /// Users with a saved profile
    pub fn list_users(&self) -> EngineResult<Vec<String>> {
        let dir = self.root.join("profiles");
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut users = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    users.push(stem.to_string());
                }
            }
        }
        users.sort();
        Ok(users)
    }
}

impl ProfileStore for FileStore {
    fn load_profile(&self, user_id: &str) -> EngineResult<Option<UserProfile>> {
        let path = self.profile_path(user_id)?;
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| EngineError::CorruptProfile(format!("{}: {}", path.display(), e)))
    }

    fn save_profile(&self, user_id: &str, profile: &UserProfile) -> EngineResult<()> {
        let path = self.profile_path(user_id)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write to temp file then rename (atomic)
        let temp_path = path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(profile)?;
        fs::write(&temp_path, content)?;
        fs::rename(&temp_path, &path)?;
        Ok(())
    }
}

impl JourneyStore for FileStore {
    fn append_event(&self, event: &JourneyEvent) -> EngineResult<()> {
        let path = self.journey_path(&event.user_id)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        let line = serde_json::to_string(event)?;
        writeln!(file, "{}", line)?;
        file.sync_all()?;
        Ok(())
    }

    fn load_events(&self, user_id: &str) -> EngineResult<Vec<JourneyEvent>> {
        let path = self.journey_path(user_id)?;
        if !path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(File::open(&path)?);
        let mut seen = HashSet::new();
        let mut events = Vec::new();

        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<JourneyEvent>(&line) {
                Ok(event) => {
                    if event.user_id != user_id {
                        warn!(line = line_no + 1, owner = %event.user_id, "skipping journey event for another user");
                        continue;
                    }
                    if seen.insert(event.id) {
                        events.push(event);
                    }
                }
                Err(e) => {
                    // Skip malformed lines (forward compatibility)
                    warn!(line = line_no + 1, error = %e, path = %path.display(), "skipping malformed journey line");
                }
            }
        }

        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_user_id_validation() {
        assert!(validate_user_id("visitor_42").is_ok());
        assert!(validate_user_id("a-b").is_ok());
        assert!(validate_user_id("").is_err());
        assert!(validate_user_id("../etc/passwd").is_err());
        assert!(validate_user_id(&"x".repeat(65)).is_err());
    }

    #[test]
    fn test_memory_store_dedups_events() {
        let store = MemoryStore::new();
        let event = JourneyEvent::easter_egg("u1", "konami_code", Utc::now());
        store.append_event(&event).unwrap();
        store.append_event(&event).unwrap();
        assert_eq!(store.load_events("u1").unwrap().len(), 1);
        assert!(store.load_events("u2").unwrap().is_empty());
    }

    #[test]
    fn test_file_store_missing_profile() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert!(store.load_profile("nobody").unwrap().is_none());
        assert!(store.load_events("nobody").unwrap().is_empty());
    }

    #[test]
    fn test_file_store_profile_persists() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let mut profile = UserProfile::default();
        profile.total_xp = 420;
        store.save_profile("u1", &profile).unwrap();

        let loaded = store.load_profile("u1").unwrap().unwrap();
        assert_eq!(loaded.total_xp, 420);
        assert_eq!(store.list_users().unwrap(), vec!["u1".to_string()]);
    }

    #[test]
    fn test_file_store_corrupt_profile() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        fs::create_dir_all(dir.path().join("profiles")).unwrap();
        fs::write(dir.path().join("profiles/u1.json"), "{ not json").unwrap();
        assert!(matches!(
            store.load_profile("u1"),
            Err(EngineError::CorruptProfile(_))
        ));
    }

    #[test]
    fn test_file_store_skips_malformed_and_duplicate_lines() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let first = JourneyEvent::easter_egg("u1", "konami_code", Utc::now());
        let second = JourneyEvent::easter_egg("u1", "console_message", Utc::now());
        store.append_event(&first).unwrap();
        store.append_event(&first).unwrap();

        let path = dir.path().join("journeys/u1.jsonl");
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "{{ truncated").unwrap();
        drop(file);
        store.append_event(&second).unwrap();

        let events = store.load_events("u1").unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].id, first.id);
        assert_eq!(events[1].id, second.id);
    }

    #[test]
    fn test_file_store_rejects_bad_user() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let event = JourneyEvent::easter_egg("../escape", "x", Utc::now());
        assert!(matches!(
            store.append_event(&event),
            Err(EngineError::Storage(_))
        ));
    }
}

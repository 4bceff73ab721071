//! Durable log of pipeline sessions
//!
//! Every session is written to `session_<id>.json` inside the store directory
//! and rewritten after each pipeline step. Sessions are never deleted here.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::data::Session;

const SESSION_PREFIX: &str = "session_";
const SESSION_SUFFIX: &str = ".json";

/// Stored request that shares words with a new one
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarRequest {
    pub session_id: String,
    pub request: String,
    pub script: Option<String>,
    pub timestamp: String,
}

/// Directory-backed session store
#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding a session
    pub fn session_path(&self, id: &str) -> PathBuf {
        self.dir
            .join(format!("{}{}{}", SESSION_PREFIX, id, SESSION_SUFFIX))
    }

    /// Write the session, replacing any earlier version of it
    pub fn save(&self, session: &Session) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create session directory {}", self.dir.display()))?;

        let path = self.session_path(&session.id);
        let content =
            serde_json::to_string_pretty(session).context("Failed to serialize session")?;
        fs::write(&path, content)
            .with_context(|| format!("Failed to write session file {}", path.display()))?;

        debug!(session = %session.id, stage = ?session.stage, "session saved");
        Ok(path)
    }

    /// Load one session by id
    pub fn load(&self, id: &str) -> Result<Session> {
        let path = self.session_path(id);
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read session file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse session file {}", path.display()))
    }

    /// Every readable session, newest first. Unreadable files are skipped.
    pub fn load_all(&self) -> Vec<Session> {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return Vec::new();
        };

        let mut sessions: Vec<Session> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(SESSION_PREFIX) && n.ends_with(SESSION_SUFFIX))
            })
            .filter_map(|path| {
                let parsed = fs::read_to_string(&path)
                    .map_err(|e| e.to_string())
                    .and_then(|content| {
                        serde_json::from_str::<Session>(&content).map_err(|e| e.to_string())
                    });
                match parsed {
                    Ok(session) => Some(session),
                    Err(e) => {
                        warn!("skipping unreadable session {}: {}", path.display(), e);
                        None
                    }
                }
            })
            .collect();

        sessions.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        sessions
    }

    /// Earlier requests sharing at least one word with `request`, newest first
    pub fn similar_requests(&self, request: &str, limit: usize) -> Vec<SimilarRequest> {
        let words: Vec<String> = request
            .to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect();

        self.load_all()
            .into_iter()
            .filter(|session| {
                let stored = session.request.to_lowercase();
                words.iter().any(|w| stored.contains(w.as_str()))
            })
            .take(limit)
            .map(|session| SimilarRequest {
                script: session.final_script().map(str::to_string),
                session_id: session.id,
                request: session.request,
                timestamp: session.timestamp,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::PipelineStage;
    use chrono::{Local, TimeZone};
    use tempfile::TempDir;

    fn session_at(second: u32, request: &str) -> Session {
        let now = Local.with_ymd_and_hms(2026, 1, 2, 3, 4, second).unwrap();
        Session::started_at(now, request)
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path().join("sessions"));

        let mut session = session_at(5, "auto-assign critical issues");
        session.stage = PipelineStage::Plan;
        let path = store.save(&session).unwrap();

        assert_eq!(path, dir.path().join("sessions").join("session_20260102030405.json"));
        assert_eq!(store.load(&session.id).unwrap(), session);
    }

    #[test]
    fn test_save_overwrites() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path());

        let mut session = session_at(1, "x");
        store.save(&session).unwrap();
        session.record_script("exports.rule = {};", false);
        store.save(&session).unwrap();

        assert_eq!(store.load_all().len(), 1);
        assert_eq!(
            store.load(&session.id).unwrap().generated_script.as_deref(),
            Some("exports.rule = {};")
        );
    }

    #[test]
    fn test_load_all_skips_garbage_and_sorts_newest_first() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path());

        store.save(&session_at(1, "older")).unwrap();
        store.save(&session_at(2, "newer")).unwrap();
        fs::write(dir.path().join("session_broken.json"), "{ not json").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let requests: Vec<String> = store.load_all().into_iter().map(|s| s.request).collect();
        assert_eq!(requests, vec!["newer", "older"]);
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let store = SessionStore::new("/definitely/not/here");
        assert!(store.load_all().is_empty());
    }

    #[test]
    fn test_similar_requests() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path());

        let mut assign = session_at(1, "Assign critical issues");
        assign.record_script("// assign", false);
        store.save(&assign).unwrap();
        store.save(&session_at(2, "Set due dates")).unwrap();

        let similar = store.similar_requests("critical bugs", 5);
        assert_eq!(similar.len(), 1);
        assert_eq!(similar[0].request, "Assign critical issues");
        assert_eq!(similar[0].script.as_deref(), Some("// assign"));

        assert!(store.similar_requests("critical bugs", 0).is_empty());
    }
}

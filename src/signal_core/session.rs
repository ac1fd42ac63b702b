//! Per-user session storage
//!
//! Accumulates one observation per timeframe per user until an analysis
//! consumes the session. Optionally file-backed (one small JSON file per
//! user) so a pending session survives a restart.

use anyhow::{Context, Result};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::observation::{Timeframe, TimeframeObservation};

/// Accumulated, not-yet-analyzed observations for one user.
pub type UserSession = HashMap<Timeframe, TimeframeObservation>;

/// Owns all session data, partitioned by user id.
///
/// Last write wins per (user, timeframe): a repeat upload replaces the slot,
/// it never merges numbers. The store is constructed once and injected into
/// the controller; the signal engine only ever sees a snapshot.
pub struct SessionStore {
    sessions: HashMap<i64, UserSession>,
    /// Directory for per-user session files; None means in-memory only.
    dir: Option<PathBuf>,
    /// Users whose on-disk state has already been read this process.
    loaded: HashSet<i64>,
}

impl SessionStore {
    /// In-memory store (tests, or when persistence is not wanted).
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
            dir: None,
            loaded: HashSet::new(),
        }
    }

    /// File-backed store rooted at `dir`, created if missing.
    pub fn with_dir(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create session dir {}", dir.display()))?;
        Ok(Self {
            sessions: HashMap::new(),
            dir: Some(dir),
            loaded: HashSet::new(),
        })
    }

    fn session_path(dir: &Path, user: i64) -> PathBuf {
        dir.join(format!("session_{}.json", user))
    }

    /// Pull a user's pending session off disk the first time we touch them.
    fn ensure_loaded(&mut self, user: i64) {
        let Some(ref dir) = self.dir else { return };
        if !self.loaded.insert(user) {
            return;
        }
        let path = Self::session_path(dir, user);
        if !path.exists() {
            return;
        }
        match std::fs::read_to_string(&path)
            .map_err(anyhow::Error::from)
            .and_then(|json| serde_json::from_str::<UserSession>(&json).map_err(Into::into))
        {
            Ok(session) => {
                info!("Restored pending session for user {} ({} timeframes)", user, session.len());
                self.sessions.insert(user, session);
            }
            Err(e) => {
                // Corrupt file: start the user fresh rather than wedging them.
                debug!("Discarding unreadable session file {}: {}", path.display(), e);
            }
        }
    }

    fn persist(&self, user: i64) -> Result<()> {
        let Some(ref dir) = self.dir else { return Ok(()) };
        let path = Self::session_path(dir, user);
        match self.sessions.get(&user) {
            Some(session) if !session.is_empty() => {
                let json = serde_json::to_string(session)?;
                std::fs::write(&path, json)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
            }
            _ => {
                if path.exists() {
                    std::fs::remove_file(&path)
                        .with_context(|| format!("Failed to remove {}", path.display()))?;
                }
            }
        }
        Ok(())
    }

    /// Insert or replace the observation for (user, timeframe).
    ///
    /// The in-memory map is updated unconditionally; the returned error only
    /// reports a persistence failure.
    pub fn put(&mut self, user: i64, timeframe: Timeframe, obs: TimeframeObservation) -> Result<()> {
        self.ensure_loaded(user);
        self.sessions.entry(user).or_default().insert(timeframe, obs);
        self.persist(user)
    }

    /// Clone of the user's accumulated session, empty if none exists.
    pub fn snapshot(&mut self, user: i64) -> UserSession {
        self.ensure_loaded(user);
        self.sessions.get(&user).cloned().unwrap_or_default()
    }

    /// Number of timeframes currently stored for the user.
    pub fn timeframe_count(&mut self, user: i64) -> usize {
        self.ensure_loaded(user);
        self.sessions.get(&user).map_or(0, |s| s.len())
    }

    /// True when the user has no pending session.
    pub fn is_empty(&mut self, user: i64) -> bool {
        self.timeframe_count(user) == 0
    }

    /// Drop all accumulated data for the user. Idempotent.
    pub fn clear(&mut self, user: i64) -> Result<()> {
        self.ensure_loaded(user);
        self.sessions.remove(&user);
        self.persist(user)
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

//! In-memory screening session store.
//!
//! Key properties:
//! - Sessions exist only in memory and are lost on restart
//! - Appends to one session serialize through that session's mutex, so
//!   finding indices are exactly `0..n-1`
//! - Requests on different sessions never contend beyond the map lookup
//! - Optional idle eviction through `evict_idle`

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::{Duration, Instant};

use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Finding, PendingFinding, Session};

/// Length of the short session id handed to clients.
pub const SESSION_ID_LEN: usize = 8;

#[derive(Error, Debug, PartialEq)]
pub enum SessionError {
    #[error("Session not found: {0}")]
    NotFound(String),

    #[error("Session lock poisoned")]
    LockPoisoned,
}

type SharedSession = Arc<Mutex<Session>>;

// ═══════════════════════════════════════════════════════════
// SessionStore
// ═══════════════════════════════════════════════════════════

/// Process-wide session map.
///
/// The outer `RwLock` only guards membership. Mutation of a session's
/// contents happens under its own mutex.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, SharedSession>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new empty session under a fresh short id.
    pub fn create(&self) -> Result<Session, SessionError> {
        let mut sessions = self.sessions.write().map_err(|_| SessionError::LockPoisoned)?;

        let id = loop {
            let candidate = short_id();
            if !sessions.contains_key(&candidate) {
                break candidate;
            }
        };

        let session = Session::new(id.clone());
        sessions.insert(id.clone(), Arc::new(Mutex::new(session.clone())));
        tracing::info!(session_id = %id, active = sessions.len(), "Session created");
        Ok(session)
    }

    /// Snapshot of a session.
    pub fn get(&self, id: &str) -> Result<Session, SessionError> {
        let shared = self.lookup(id)?;
        let session = lock(&shared)?;
        Ok(session.clone())
    }

    /// Append a finding, assigning the next index and a timestamp.
    pub fn append_finding(&self, id: &str, pending: PendingFinding) -> Result<Finding, SessionError> {
        let shared = self.lookup(id)?;
        let mut session = lock(&shared)?;

        let finding = pending.into_finding(session.findings.len(), Utc::now());
        session.findings.push(finding.clone());
        session.last_activity = Instant::now();

        tracing::debug!(
            session_id = %id,
            index = finding.index,
            image_type = %finding.image_type,
            classification = finding.classification(),
            "Finding recorded"
        );
        Ok(finding)
    }

    /// Store the latest report text, replacing any previous one.
    pub fn set_report(&self, id: &str, text: String) -> Result<(), SessionError> {
        let shared = self.lookup(id)?;
        let mut session = lock(&shared)?;
        session.report = Some(text);
        session.last_activity = Instant::now();
        Ok(())
    }

    /// Drop sessions idle for longer than `ttl`. Returns how many were evicted.
    pub fn evict_idle(&self, ttl: Duration) -> Result<usize, SessionError> {
        let mut sessions = self.sessions.write().map_err(|_| SessionError::LockPoisoned)?;
        let before = sessions.len();
        // A session an in-flight request has looked up is active, even
        // before that request takes the session lock.
        sessions.retain(|_, shared| {
            if Arc::strong_count(shared) > 1 {
                return true;
            }
            match shared.try_lock() {
                Ok(session) => session.last_activity.elapsed() <= ttl,
                Err(_) => true,
            }
        });
        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::info!(evicted, remaining = sessions.len(), "Idle sessions evicted");
        }
        Ok(evicted)
    }

    pub fn len(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, id: &str) -> Result<SharedSession, SessionError> {
        let sessions = self.sessions.read().map_err(|_| SessionError::LockPoisoned)?;
        sessions
            .get(id)
            .cloned()
            .ok_or_else(|| SessionError::NotFound(id.to_string()))
    }
}

fn lock(shared: &SharedSession) -> Result<MutexGuard<'_, Session>, SessionError> {
    shared.lock().map_err(|_| SessionError::LockPoisoned)
}

fn short_id() -> String {
    Uuid::new_v4().simple().to_string()[..SESSION_ID_LEN].to_string()
}

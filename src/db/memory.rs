// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process store.
//!
//! All collections sit behind one lock, so every operation (including the
//! transactional ones) is serializable. Used for local development and
//! tests; nothing survives a restart.

use crate::db::TimingStore;
use crate::error::AppError;
use crate::models::{
    ActiveSessionPointer, BestTimeOutcome, BestTimeUpdate, IdentityIndexEntry, Leaderboard,
    RiderRecord, Session,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Mutex;

#[derive(Default)]
struct Collections {
    identity_index: HashMap<String, IdentityIndexEntry>,
    /// Insertion order doubles as scan order
    riders: Vec<RiderRecord>,
    sessions: HashMap<String, Session>,
    leaderboards: HashMap<String, Leaderboard>,
    active_session: Option<ActiveSessionPointer>,
}

/// In-memory [`TimingStore`].
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Collections>,
    rider_scans: AtomicUsize,
    fail_leaderboards: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a rider profile.
    pub async fn insert_rider(&self, rider: RiderRecord) {
        let mut inner = self.inner.lock().await;
        match inner.riders.iter().position(|r| r.id == rider.id) {
            Some(idx) => inner.riders[idx] = rider,
            None => inner.riders.push(rider),
        }
    }

    /// Store a session as-is, including its `active` flag.
    pub async fn insert_session(&self, session: Session) {
        self.inner
            .lock()
            .await
            .sessions
            .insert(session.id.clone(), session);
    }

    /// All sessions currently flagged active.
    pub async fn active_sessions(&self) -> Vec<Session> {
        self.inner
            .lock()
            .await
            .sessions
            .values()
            .filter(|s| s.active)
            .cloned()
            .collect()
    }

    pub async fn session_count(&self) -> usize {
        self.inner.lock().await.sessions.len()
    }

    /// Number of full rider scans served so far.
    pub fn rider_scan_count(&self) -> usize {
        self.rider_scans.load(Ordering::Relaxed)
    }

    /// Make every leaderboard transaction fail (to exercise error paths).
    pub fn set_fail_leaderboards(&self, fail: bool) {
        self.fail_leaderboards.store(fail, Ordering::Relaxed);
    }
}

#[async_trait::async_trait]
impl TimingStore for MemoryStore {
    async fn get_identity(&self, tag_id: &str) -> Result<Option<IdentityIndexEntry>, AppError> {
        Ok(self.inner.lock().await.identity_index.get(tag_id).cloned())
    }

    async fn put_identity(
        &self,
        tag_id: &str,
        entry: &IdentityIndexEntry,
    ) -> Result<(), AppError> {
        self.inner
            .lock()
            .await
            .identity_index
            .insert(tag_id.to_string(), entry.clone());
        Ok(())
    }

    async fn list_riders(&self) -> Result<Vec<RiderRecord>, AppError> {
        self.rider_scans.fetch_add(1, Ordering::Relaxed);
        Ok(self.inner.lock().await.riders.clone())
    }

    async fn find_sessions_by_location(
        &self,
        location: &str,
        limit: u32,
    ) -> Result<Vec<Session>, AppError> {
        Ok(self
            .inner
            .lock()
            .await
            .sessions
            .values()
            .filter(|s| s.location == location)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<Session>, AppError> {
        Ok(self.inner.lock().await.sessions.get(session_id).cloned())
    }

    async fn create_session(&self, session: &Session) -> Result<(), AppError> {
        self.insert_session(session.clone()).await;
        Ok(())
    }

    async fn save_session_ingest(&self, session: &Session) -> Result<(), AppError> {
        let mut inner = self.inner.lock().await;
        let stored = inner
            .sessions
            .get_mut(&session.id)
            .ok_or_else(|| AppError::Database(format!("Session {} does not exist", session.id)))?;

        stored.riders = session.riders.clone();
        stored.last_ingest_at = session.last_ingest_at;
        stored.last_device_id = session.last_device_id.clone();
        stored.last_start_ts = session.last_start_ts;
        Ok(())
    }

    async fn get_active_session(&self) -> Result<Option<ActiveSessionPointer>, AppError> {
        Ok(self.inner.lock().await.active_session.clone())
    }

    async fn activate_session(
        &self,
        session_id: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<String>, AppError> {
        let mut inner = self.inner.lock().await;

        if !inner.sessions.contains_key(session_id) {
            return Err(AppError::NotFound(format!("Session {}", session_id)));
        }

        let previous = inner
            .active_session
            .as_ref()
            .map(|p| p.id.clone())
            .filter(|id| id != session_id);

        if let Some(prev) = previous.as_ref().and_then(|id| inner.sessions.get_mut(id)) {
            prev.active = false;
        }
        if let Some(target) = inner.sessions.get_mut(session_id) {
            target.active = true;
        }
        inner.active_session = Some(ActiveSessionPointer {
            id: session_id.to_string(),
            updated_at: Some(at),
        });

        Ok(previous)
    }

    async fn get_leaderboard(&self, key: &str) -> Result<Option<Leaderboard>, AppError> {
        Ok(self.inner.lock().await.leaderboards.get(key).cloned())
    }

    async fn update_leaderboard(
        &self,
        key: &str,
        update: &BestTimeUpdate,
    ) -> Result<BestTimeOutcome, AppError> {
        if self.fail_leaderboards.load(Ordering::Relaxed) {
            return Err(AppError::Database(
                "Leaderboard transaction aborted".to_string(),
            ));
        }

        let mut inner = self.inner.lock().await;
        let mut board = inner
            .leaderboards
            .get(key)
            .cloned()
            .unwrap_or_else(|| Leaderboard::new(&update.location));

        let outcome = board.apply_best(update);
        if outcome.changed() {
            inner.leaderboards.insert(key.to_string(), board);
        }
        Ok(outcome)
    }
}

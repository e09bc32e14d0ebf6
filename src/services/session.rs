// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session discovery.
//!
//! A reading belongs to the newest session at its location that started
//! within the lookback window. When there is none, a session is created:
//! recording a time is preferred over rejecting it.

use crate::db::TimingStore;
use crate::error::{AppError, Result};
use crate::models::session::select_latest;
use crate::models::Session;
use chrono::{DateTime, Duration, Utc};
use ring::rand::{SecureRandom, SystemRandom};
use std::sync::Arc;

/// Which entry point is asking, which decides the lookback window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// Automatic discovery for a tag read
    Read,
    /// Explicit session start from a gate
    Start,
}

/// A located session and whether it was just created.
#[derive(Debug, Clone)]
pub struct LocatedSession {
    pub session: Session,
    pub created: bool,
}

/// Result of an explicit session start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStart {
    pub session_id: String,
    /// An existing session was picked up instead of creating one
    pub reused: bool,
}

/// Finds or creates the session a reading belongs to.
#[derive(Clone)]
pub struct SessionLocator {
    store: Arc<dyn TimingStore>,
    read_window: Duration,
    start_window: Duration,
    candidate_limit: u32,
}

impl SessionLocator {
    pub fn new(
        store: Arc<dyn TimingStore>,
        read_window: Duration,
        start_window: Duration,
        candidate_limit: u32,
    ) -> Self {
        Self {
            store,
            read_window,
            start_window,
            candidate_limit,
        }
    }

    fn window(&self, lookup: Lookup) -> Duration {
        match lookup {
            Lookup::Read => self.read_window,
            Lookup::Start => self.start_window,
        }
    }

    /// Find the current session for `location` as of `now`, creating one
    /// when nothing recent enough exists.
    pub async fn locate(
        &self,
        location: &str,
        now: DateTime<Utc>,
        lookup: Lookup,
    ) -> Result<LocatedSession> {
        let candidates = self
            .store
            .find_sessions_by_location(location, self.candidate_limit)
            .await?;
        let considered = candidates.len();

        if let Some(session) = select_latest(candidates, now, self.window(lookup)) {
            tracing::debug!(
                location,
                session_id = %session.id,
                considered,
                "Reusing session"
            );
            return Ok(LocatedSession {
                session,
                created: false,
            });
        }

        let session = Session::new(new_session_id()?, location, now);
        self.store.create_session(&session).await?;

        tracing::info!(
            location,
            session_id = %session.id,
            considered,
            "Created session"
        );

        Ok(LocatedSession {
            session,
            created: true,
        })
    }

    /// Explicit session start: locate (or create) the session for the
    /// gate, then make it the single active session.
    ///
    /// Two starts for the same gate inside the window resolve to the same
    /// session. Starts that race before either has created a session can
    /// still produce two; the newer one wins every later lookup.
    pub async fn start(&self, location: &str, now: DateTime<Utc>) -> Result<SessionStart> {
        let located = self.locate(location, now, Lookup::Start).await?;
        let previous = self.store.activate_session(&located.session.id, now).await?;

        tracing::info!(
            location,
            session_id = %located.session.id,
            reused = !located.created,
            previous = ?previous,
            "Session activated"
        );

        Ok(SessionStart {
            session_id: located.session.id,
            reused: !located.created,
        })
    }
}

/// Random 20-character hex session ID.
fn new_session_id() -> Result<String> {
    let mut bytes = [0u8; 10];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("System RNG failure")))?;
    Ok(hex::encode(bytes))
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer.
//!
//! [`TimingStore`] is the seam between the timing engine and the document
//! store. [`FirestoreStore`] talks to Firestore; [`MemoryStore`] keeps
//! everything in process for local runs and tests.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreStore;
pub use memory::MemoryStore;

use crate::error::AppError;
use crate::models::{
    ActiveSessionPointer, BestTimeOutcome, BestTimeUpdate, IdentityIndexEntry, Leaderboard,
    RiderRecord, Session,
};
use chrono::{DateTime, Utc};

/// Collection names as constants.
pub mod collections {
    /// Tag ID -> rider cache
    pub const IDENTITY_INDEX: &str = "identityIndex";
    /// Rider profiles (read-only here)
    pub const USERS: &str = "users";
    pub const SESSIONS: &str = "sessions";
    /// One board per normalized location key
    pub const LEADERBOARDS: &str = "leaderboards";
    pub const META: &str = "meta";
    /// Document in `meta` pointing at the active session
    pub const ACTIVE_SESSION_DOC: &str = "activeSession";
}

/// Typed operations the timing engine needs from the document store.
#[async_trait::async_trait]
pub trait TimingStore: Send + Sync {
    /// Look up a tag in the identity index.
    async fn get_identity(&self, tag_id: &str) -> Result<Option<IdentityIndexEntry>, AppError>;

    /// Write (or overwrite) the identity index entry for a tag.
    async fn put_identity(&self, tag_id: &str, entry: &IdentityIndexEntry)
        -> Result<(), AppError>;

    /// Read every rider profile. This is a full collection scan.
    async fn list_riders(&self) -> Result<Vec<RiderRecord>, AppError>;

    /// Sessions for a location, in whatever order the store returns them.
    async fn find_sessions_by_location(
        &self,
        location: &str,
        limit: u32,
    ) -> Result<Vec<Session>, AppError>;

    async fn get_session(&self, session_id: &str) -> Result<Option<Session>, AppError>;

    /// Store a new session document.
    async fn create_session(&self, session: &Session) -> Result<(), AppError>;

    /// Write back the roster and last-ingest fields of a session.
    ///
    /// The `active` flag is left as stored.
    async fn save_session_ingest(&self, session: &Session) -> Result<(), AppError>;

    /// Read the `meta/activeSession` pointer.
    async fn get_active_session(&self) -> Result<Option<ActiveSessionPointer>, AppError>;

    /// Make `session_id` the single active session.
    ///
    /// In one transaction: the session named by the pointer is deactivated,
    /// the target is activated and the pointer moves to it. Returns the ID
    /// of the previously active session, if it differed.
    async fn activate_session(
        &self,
        session_id: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<String>, AppError>;

    async fn get_leaderboard(&self, key: &str) -> Result<Option<Leaderboard>, AppError>;

    /// Apply a best-time update to the board at `key` inside a transaction.
    ///
    /// The store retries the whole read-modify-write on conflict. Nothing is
    /// written unless [`BestTimeOutcome::changed`] is true.
    async fn update_leaderboard(
        &self,
        key: &str,
        update: &BestTimeUpdate,
    ) -> Result<BestTimeOutcome, AppError>;
}

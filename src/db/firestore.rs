// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore-backed [`TimingStore`].
//!
//! Provides typed operations for:
//! - Identity index (tag ID -> rider cache)
//! - Rider profiles (read-only scan)
//! - Sessions and the `meta/activeSession` pointer
//! - Per-location leaderboards (transactional)

use crate::db::{collections, TimingStore};
use crate::error::AppError;
use crate::models::{
    ActiveSessionPointer, BestTimeOutcome, BestTimeUpdate, IdentityIndexEntry, Leaderboard,
    RiderRecord, Session,
};
use chrono::{DateTime, Utc};
use futures_util::FutureExt;

/// Fields written back after an ingest; `active` is deliberately absent.
const SESSION_INGEST_FIELDS: [&str; 4] =
    ["riders", "last_ingest_at", "last_device_id", "last_start_ts"];
const LEADERBOARD_FIELDS: [&str; 3] = ["location", "records", "updated_at"];

/// Document IDs cannot contain `/`, and tag IDs and locations come from
/// the field.
fn doc_id(raw: &str) -> String {
    urlencoding::encode(raw).into_owned()
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreStore {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreStore {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create an offline client. All operations return an error.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    /// Seed a rider profile. The profile subsystem owns these documents;
    /// this exists for tests and local fixtures.
    pub async fn put_rider(&self, rider: &RiderRecord) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&rider.id)
            .object(rider)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl TimingStore for FirestoreStore {
    // ─── Identity Operations ─────────────────────────────────────

    async fn get_identity(&self, tag_id: &str) -> Result<Option<IdentityIndexEntry>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::IDENTITY_INDEX)
            .obj()
            .one(&doc_id(tag_id))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn put_identity(
        &self,
        tag_id: &str,
        entry: &IdentityIndexEntry,
    ) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::IDENTITY_INDEX)
            .document_id(doc_id(tag_id))
            .object(entry)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn list_riders(&self) -> Result<Vec<RiderRecord>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Session Operations ──────────────────────────────────────

    async fn find_sessions_by_location(
        &self,
        location: &str,
        limit: u32,
    ) -> Result<Vec<Session>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::SESSIONS)
            .filter(|q| q.for_all([q.field("location").eq(location)]))
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<Session>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::SESSIONS)
            .obj()
            .one(session_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn create_session(&self, session: &Session) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::SESSIONS)
            .document_id(&session.id)
            .object(session)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn save_session_ingest(&self, session: &Session) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .fields(SESSION_INGEST_FIELDS)
            .in_col(collections::SESSIONS)
            .document_id(&session.id)
            .object(session)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn get_active_session(&self) -> Result<Option<ActiveSessionPointer>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::META)
            .obj()
            .one(collections::ACTIVE_SESSION_DOC)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Move the active-session pointer in a single transaction.
    ///
    /// Firestore retries the closure with fresh reads if either the pointer
    /// or the target session changes before commit.
    async fn activate_session(
        &self,
        session_id: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<String>, AppError> {
        let target_id = session_id.to_string();

        let result = self
            .get_client()?
            .run_transaction(|db, transaction| {
                let target_id = target_id.clone();
                async move {
                    let pointer: Option<ActiveSessionPointer> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::META)
                        .obj()
                        .one(collections::ACTIVE_SESSION_DOC)
                        .await?;

                    let target: Option<Session> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::SESSIONS)
                        .obj()
                        .one(&target_id)
                        .await?;

                    let Some(mut target) = target else {
                        return Ok(None);
                    };

                    let previous_id = pointer.map(|p| p.id).filter(|id| *id != target_id);

                    if let Some(prev_id) = previous_id.as_deref() {
                        let previous: Option<Session> = db
                            .fluent()
                            .select()
                            .by_id_in(collections::SESSIONS)
                            .obj()
                            .one(prev_id)
                            .await?;

                        if let Some(mut previous) = previous {
                            previous.active = false;
                            db.fluent()
                                .update()
                                .fields(["active"])
                                .in_col(collections::SESSIONS)
                                .document_id(prev_id)
                                .object(&previous)
                                .add_to_transaction(transaction)?;
                        }
                    }

                    target.active = true;
                    db.fluent()
                        .update()
                        .fields(["active"])
                        .in_col(collections::SESSIONS)
                        .document_id(&target_id)
                        .object(&target)
                        .add_to_transaction(transaction)?;

                    let pointer = ActiveSessionPointer {
                        id: target_id.clone(),
                        updated_at: Some(at),
                    };
                    db.fluent()
                        .update()
                        .in_col(collections::META)
                        .document_id(collections::ACTIVE_SESSION_DOC)
                        .object(&pointer)
                        .add_to_transaction(transaction)?;

                    Ok(Some(previous_id))
                }
                .boxed()
            })
            .await
            .map_err(|e| AppError::Database(format!("Session activation failed: {}", e)))?;

        result.ok_or_else(|| AppError::NotFound(format!("Session {}", session_id)))
    }

    // ─── Leaderboard Operations ─────────────────────────────────

    async fn get_leaderboard(&self, key: &str) -> Result<Option<Leaderboard>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::LEADERBOARDS)
            .obj()
            .one(&doc_id(key))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Read-modify-write of one leaderboard document.
    ///
    /// Two riders posting at the same location concurrently both land:
    /// the loser of the commit race is re-run against the winner's board.
    async fn update_leaderboard(
        &self,
        key: &str,
        update: &BestTimeUpdate,
    ) -> Result<BestTimeOutcome, AppError> {
        let doc = doc_id(key);
        let update = update.clone();

        self.get_client()?
            .run_transaction(|db, transaction| {
                let doc = doc.clone();
                let update = update.clone();
                async move {
                    let current: Option<Leaderboard> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::LEADERBOARDS)
                        .obj()
                        .one(&doc)
                        .await?;

                    let mut board =
                        current.unwrap_or_else(|| Leaderboard::new(&update.location));
                    let outcome = board.apply_best(&update);

                    if outcome.changed() {
                        db.fluent()
                            .update()
                            .fields(LEADERBOARD_FIELDS)
                            .in_col(collections::LEADERBOARDS)
                            .document_id(&doc)
                            .object(&board)
                            .add_to_transaction(transaction)?;
                    }

                    Ok(outcome)
                }
                .boxed()
            })
            .await
            .map_err(|e| AppError::Database(format!("Leaderboard transaction failed: {}", e)))
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Ingest routes called by the timing gates.

use crate::error::{AppError, Result};
use crate::models::reading::{
    BatchReadRequest, LegacyIngestRequest, SingleReadRequest, StartSessionRequest,
};
use crate::routes::parse_payload;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Json, State},
    routing::post,
    Router,
};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Ingest routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sessions/start", post(start_session))
        .route("/ingest/read", post(ingest_read))
        .route("/ingest/batch", post(ingest_batch))
        .route("/ingestRfid", post(ingest_rfid))
}

#[derive(Serialize, Debug)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StartSessionResponse {
    pub session_id: String,
    pub reused: bool,
}

#[derive(Serialize, Debug)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct IngestReadResponse {
    pub rider_name: String,
    pub time_added: u64,
    pub session_id: String,
}

#[derive(Serialize, Debug)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct IngestBatchResponse {
    pub processed: usize,
    pub skipped: usize,
    pub riders: usize,
}

/// Reply shape the gate readers already parse.
#[derive(Serialize, Debug)]
pub struct LegacyIngestResponse {
    pub ok: bool,
    pub appended: usize,
}

/// Start (or pick up) the session for a gate.
async fn start_session(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Json<StartSessionResponse>> {
    let request: StartSessionRequest = parse_payload(payload)?;

    let start = state.ingest.start_session(&request.device_name).await?;

    Ok(Json(StartSessionResponse {
        session_id: start.session_id,
        reused: start.reused,
    }))
}

/// Record a single tag read.
async fn ingest_read(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Json<IngestReadResponse>> {
    let request: SingleReadRequest = parse_payload(payload)?;

    let result = state
        .ingest
        .ingest_single(&request.tag_id, request.time_ms, &request.device_id)
        .await?;

    Ok(Json(IngestReadResponse {
        rider_name: result.rider_name,
        time_added: result.time_added,
        session_id: result.session_id,
    }))
}

/// Record a batch of tag reads from one gate.
async fn ingest_batch(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Json<IngestBatchResponse>> {
    let request: BatchReadRequest = parse_payload(payload)?;

    let summary = state
        .ingest
        .ingest_batch(&request.device_id, &request.items)
        .await?;

    Ok(Json(IngestBatchResponse {
        processed: summary.processed,
        skipped: summary.skipped,
        riders: summary.riders,
    }))
}

/// Reader payload recorded against the pointer-selected active session.
async fn ingest_rfid(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Json<LegacyIngestResponse>> {
    let request: LegacyIngestRequest = parse_payload(payload)?;
    let start_ts = request
        .start_ts()
        .ok_or_else(|| AppError::BadRequest("start_ts is required".to_string()))?;

    let appended = state
        .ingest
        .ingest_legacy(request.device_id.as_deref(), start_ts, &request.reads())
        .await?;

    Ok(Json(LegacyIngestResponse { ok: true, appended }))
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP route handlers.

pub mod ingest;
pub mod leaderboard;

use crate::error::{AppError, Result};
use crate::middleware::{require_ingest_key, INGEST_KEY_HEADER};
use crate::AppState;
use axum::extract::rejection::JsonRejection;
use axum::http::{header, HeaderName, Method};
use axum::{middleware, routing::get, Json, Router};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HealthResponse {
    pub status: String,
    pub build_id: String,
}

/// Health check response
async fn health_check() -> Json<HealthResponse> {
    let build_id = option_env!("BUILD_ID").unwrap_or("unknown").to_string();
    Json(HealthResponse {
        status: "ok".to_string(),
        build_id,
    })
}

/// Decode and validate a JSON body.
///
/// Malformed JSON, missing fields and failed validation all surface as
/// `400 bad_request`.
pub(crate) fn parse_payload<T>(
    payload: std::result::Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<T>
where
    T: DeserializeOwned + Validate,
{
    let Json(value) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let parsed: T =
        serde_json::from_value(value).map_err(|e| AppError::BadRequest(e.to_string()))?;
    parsed.validate()?;
    Ok(parsed)
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    // Gate readers post from arbitrary hosts
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static(INGEST_KEY_HEADER),
        ]);

    // Public routes (no auth required)
    let public_routes = Router::new().route("/health", get(health_check));

    // Shared-secret routes
    let protected_routes = Router::new()
        .merge(ingest::routes())
        .merge(leaderboard::routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_ingest_key,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(middleware::from_fn(
            crate::middleware::security::add_security_headers,
        ))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared-secret authentication for gate readers.

use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// Header carrying the shared ingest secret.
pub const INGEST_KEY_HEADER: &str = "x-ingest-key";

/// Constant-time check of a presented key against the configured one.
///
/// An empty configured key matches nothing.
pub fn key_matches(presented: &str, expected: &str) -> bool {
    !expected.is_empty() && bool::from(presented.as_bytes().ct_eq(expected.as_bytes()))
}

/// Reject requests without the correct `x-ingest-key` before any handler
/// (and therefore any store access) runs.
pub async fn require_ingest_key(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let presented = request
        .headers()
        .get(INGEST_KEY_HEADER)
        .and_then(|h| h.to_str().ok());

    match presented {
        Some(key) if key_matches(key, &state.config.ingest_key) => Ok(next.run(request).await),
        _ => {
            tracing::warn!(
                path = %request.uri().path(),
                has_key = presented.is_some(),
                "Rejected request with missing or wrong ingest key"
            );
            Err(AppError::Unauthorized)
        }
    }
}

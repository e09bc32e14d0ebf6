// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Leaderboard read routes.

use crate::error::{AppError, Result};
use crate::models::Leaderboard;
use crate::AppState;
use axum::{
    extract::{Json, Path, State},
    routing::get,
    Router,
};
use std::sync::Arc;

/// Leaderboard routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/leaderboards/{location}", get(get_leaderboard))
}

/// Current best times for a location.
async fn get_leaderboard(
    State(state): State<Arc<AppState>>,
    Path(location): Path<String>,
) -> Result<Json<Leaderboard>> {
    if location.trim().is_empty() || location.len() > 128 {
        return Err(AppError::BadRequest("Invalid location".to_string()));
    }

    let board = state.ingest.leaderboards().get(&location).await?;
    Ok(Json(board))
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Best-time leaderboard maintenance.

use crate::db::TimingStore;
use crate::error::Result;
use crate::models::leaderboard::leaderboard_key;
use crate::models::{BestTimeOutcome, BestTimeUpdate, Leaderboard};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Records best times on per-location leaderboards.
#[derive(Clone)]
pub struct LeaderboardUpdater {
    store: Arc<dyn TimingStore>,
}

impl LeaderboardUpdater {
    pub fn new(store: Arc<dyn TimingStore>) -> Self {
        Self { store }
    }

    /// Offer a time for a rider; only a strictly better time changes the board.
    pub async fn record_best(
        &self,
        location: &str,
        name: &str,
        time_ms: u64,
        at: DateTime<Utc>,
    ) -> Result<BestTimeOutcome> {
        let key = leaderboard_key(location);
        let update = BestTimeUpdate {
            location: location.to_string(),
            name: name.to_string(),
            time_ms,
            at,
        };

        let outcome = self.store.update_leaderboard(&key, &update).await?;
        tracing::debug!(key = %key, name, time_ms, ?outcome, "Leaderboard updated");
        Ok(outcome)
    }

    /// Like [`record_best`](Self::record_best), but failures are logged and
    /// dropped. Session recording never fails because of a leaderboard.
    pub async fn record_best_logged(
        &self,
        location: &str,
        name: &str,
        time_ms: u64,
        at: DateTime<Utc>,
    ) -> Option<BestTimeOutcome> {
        match self.record_best(location, name, time_ms, at).await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    location,
                    name,
                    time_ms,
                    "Leaderboard update failed"
                );
                None
            }
        }
    }

    /// Current board for a location; empty if nothing was recorded yet.
    pub async fn get(&self, location: &str) -> Result<Leaderboard> {
        let key = leaderboard_key(location);
        Ok(self
            .store
            .get_leaderboard(&key)
            .await?
            .unwrap_or_else(|| Leaderboard::new(location)))
    }
}

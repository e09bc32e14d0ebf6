// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-location best-time leaderboard.
//!
//! The board is a single document per normalized location key holding at
//! most [`LEADERBOARD_CAPACITY`] records, one per display name, sorted by
//! ascending time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of records kept on a board.
pub const LEADERBOARD_CAPACITY: usize = 20;

/// Leaderboard stored in the `leaderboards` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leaderboard {
    pub location: String,
    #[serde(default)]
    pub records: Vec<LeaderboardRecord>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A rider's best time on a board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardRecord {
    pub name: String,
    pub time_ms: u64,
    pub updated_at: DateTime<Utc>,
}

/// A candidate best time for one rider at one location.
#[derive(Debug, Clone, PartialEq)]
pub struct BestTimeUpdate {
    pub location: String,
    pub name: String,
    pub time_ms: u64,
    pub at: DateTime<Utc>,
}

/// Result of applying a [`BestTimeUpdate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BestTimeOutcome {
    /// First time on this board for the rider.
    Inserted,
    /// Strictly better than the previous best.
    Improved { previous_ms: u64 },
    /// Not better than the existing best; board untouched.
    Unchanged { best_ms: u64 },
    /// Too slow for a full board; board untouched.
    NotRanked,
}

impl BestTimeOutcome {
    /// Whether the board must be written back.
    pub fn changed(&self) -> bool {
        !matches!(
            self,
            BestTimeOutcome::Unchanged { .. } | BestTimeOutcome::NotRanked
        )
    }
}

/// Document key for a location: lower-cased, trimmed, with runs of
/// whitespace collapsed to a single `_`.
pub fn leaderboard_key(location: &str) -> String {
    location
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

impl Leaderboard {
    pub fn new(location: &str) -> Self {
        Self {
            location: location.to_string(),
            records: Vec::new(),
            updated_at: None,
        }
    }

    /// Apply a candidate best time.
    ///
    /// On any change the list is re-sorted ascending (stable, so earlier
    /// holders of an equal time stay ahead) and truncated to capacity.
    pub fn apply_best(&mut self, update: &BestTimeUpdate) -> BestTimeOutcome {
        let outcome = match self.records.iter().position(|r| r.name == update.name) {
            Some(idx) => {
                let record = &mut self.records[idx];
                if update.time_ms >= record.time_ms {
                    return BestTimeOutcome::Unchanged {
                        best_ms: record.time_ms,
                    };
                }
                let previous_ms = record.time_ms;
                record.time_ms = update.time_ms;
                record.updated_at = update.at;
                BestTimeOutcome::Improved { previous_ms }
            }
            None => {
                // Ties go to the earlier holder, so a full board needs a strictly better time
                if self.records.len() >= LEADERBOARD_CAPACITY
                    && self
                        .records
                        .iter()
                        .all(|r| r.time_ms <= update.time_ms)
                {
                    return BestTimeOutcome::NotRanked;
                }
                self.records.push(LeaderboardRecord {
                    name: update.name.clone(),
                    time_ms: update.time_ms,
                    updated_at: update.at,
                });
                BestTimeOutcome::Inserted
            }
        };

        self.records.sort_by_key(|r| r.time_ms);
        self.records.truncate(LEADERBOARD_CAPACITY);
        self.updated_at = Some(update.at);
        outcome
    }

    /// Best time recorded for a display name, if it is on the board.
    pub fn best_for(&self, name: &str) -> Option<u64> {
        self.records
            .iter()
            .find(|r| r.name == name)
            .map(|r| r.time_ms)
    }
}

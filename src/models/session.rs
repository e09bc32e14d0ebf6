// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Race session model and its rider roster.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Prefix for roster entries created for riders that were not
/// registered for the session ahead of time.
pub const AUTO_ENTRY_PREFIX: &str = "auto_";

/// Race session stored in the `sessions` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Session ID (also used as document ID)
    pub id: String,
    /// Location key (the gate/device name that opened it)
    pub location: String,
    /// When the session was created
    pub occurred_at: DateTime<Utc>,
    #[serde(default)]
    pub active: bool,
    /// Rider roster, in registration order
    #[serde(default, alias = "pilots")]
    pub riders: Vec<RiderEntry>,
    #[serde(default)]
    pub last_ingest_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_device_id: Option<String>,
    /// Reader-side start timestamp from the legacy ingest payload
    #[serde(default)]
    pub last_start_ts: Option<i64>,
}

/// A rider's row inside a session roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiderEntry {
    /// Identity ID, or `auto_` + identity ID for placeholder entries
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Recorded sample times in milliseconds, in arrival order
    #[serde(default)]
    pub times: Vec<u64>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl RiderEntry {
    /// Create a placeholder entry for a rider not yet on the roster.
    pub fn placeholder(identity_id: &str, name: &str, times: Vec<u64>) -> Self {
        Self {
            id: placeholder_entry_id(identity_id),
            name: name.to_string(),
            times,
            active: true,
        }
    }

    /// Identity ID this entry belongs to, with any `auto_` prefix removed.
    pub fn identity_key(&self) -> &str {
        self.id.strip_prefix(AUTO_ENTRY_PREFIX).unwrap_or(&self.id)
    }

    pub fn is_placeholder(&self) -> bool {
        self.id.starts_with(AUTO_ENTRY_PREFIX)
    }
}

/// Roster entry ID used for riders added on the fly.
pub fn placeholder_entry_id(identity_id: &str) -> String {
    format!("{}{}", AUTO_ENTRY_PREFIX, identity_id)
}

impl Session {
    /// Create a fresh, active session with an empty roster.
    pub fn new(id: String, location: &str, occurred_at: DateTime<Utc>) -> Self {
        Self {
            id,
            location: location.to_string(),
            occurred_at,
            active: true,
            riders: Vec::new(),
            last_ingest_at: None,
            last_device_id: None,
            last_start_ts: None,
        }
    }

    /// Whether the session started within `window` before `now`.
    ///
    /// Sessions stamped slightly in the future (device clock skew) count
    /// as current.
    pub fn is_within(&self, now: DateTime<Utc>, window: Duration) -> bool {
        self.occurred_at >= now - window
    }

    /// Find the roster entry for an identity.
    ///
    /// An entry keyed by the identity ID wins over an `auto_` entry for the
    /// same identity; the display-name match is only consulted when
    /// neither exists, and never claims an `auto_` entry (its identity is
    /// already known).
    pub fn find_entry(&self, identity_id: &str, display_name: &str) -> Option<usize> {
        self.riders
            .iter()
            .position(|e| e.id == identity_id)
            .or_else(|| {
                self.riders
                    .iter()
                    .position(|e| e.is_placeholder() && e.identity_key() == identity_id)
            })
            .or_else(|| {
                if display_name.is_empty() {
                    None
                } else {
                    self.riders
                        .iter()
                        .position(|e| !e.is_placeholder() && e.name == display_name)
                }
            })
    }

    /// Stamp the last-ingest metadata.
    pub fn record_ingest(
        &mut self,
        at: DateTime<Utc>,
        device_id: Option<&str>,
        start_ts: Option<i64>,
    ) {
        self.last_ingest_at = Some(at);
        self.last_device_id = device_id.map(str::to_string);
        if start_ts.is_some() {
            self.last_start_ts = start_ts;
        }
    }
}

/// Pick the most recent session among those within the lookback window.
///
/// Store queries on unindexed equality filters give no useful order, so
/// the newest occurrence time is selected explicitly.
pub fn select_latest(
    candidates: Vec<Session>,
    now: DateTime<Utc>,
    window: Duration,
) -> Option<Session> {
    candidates
        .into_iter()
        .filter(|s| s.is_within(now, window))
        .max_by_key(|s| s.occurred_at)
}

/// Active-session pointer stored at `meta/activeSession`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveSessionPointer {
    pub id: String,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Rider identity models: the authoritative rider profile and the
//! tag-id index built from it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Rider profile stored in the `users` collection.
///
/// Owned by the profile subsystem; this service only reads it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RiderRecord {
    /// Rider ID (document ID)
    #[serde(alias = "_firestore_id", default, skip_serializing)]
    pub id: String,
    /// Display name shown on rosters and leaderboards
    #[serde(default, alias = "name", alias = "displayName")]
    pub display_name: Option<String>,
    /// Primary tag identifier
    #[serde(default)]
    pub rfid: Option<String>,
    /// Additional assigned tag identifiers
    #[serde(default)]
    pub rfids: Vec<String>,
}

impl RiderRecord {
    /// Whether this rider carries the given tag, either as the primary
    /// tag or in the assigned list.
    pub fn has_tag(&self, tag_id: &str) -> bool {
        self.rfid.as_deref() == Some(tag_id) || self.rfids.iter().any(|t| t == tag_id)
    }

    /// Display name, falling back to the rider ID when unset.
    pub fn name(&self) -> &str {
        match self.display_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.id,
        }
    }
}

/// Entry in the `identityIndex` collection, keyed by tag ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityIndexEntry {
    #[serde(alias = "userId")]
    pub rider_id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A resolved rider identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiderIdentity {
    pub rider_id: String,
    pub display_name: String,
}

impl From<&IdentityIndexEntry> for RiderIdentity {
    fn from(entry: &IdentityIndexEntry) -> Self {
        let display_name = if entry.display_name.is_empty() {
            entry.rider_id.clone()
        } else {
            entry.display_name.clone()
        };
        Self {
            rider_id: entry.rider_id.clone(),
            display_name,
        }
    }
}

impl From<&RiderRecord> for RiderIdentity {
    fn from(record: &RiderRecord) -> Self {
        Self {
            rider_id: record.id.clone(),
            display_name: record.name().to_string(),
        }
    }
}

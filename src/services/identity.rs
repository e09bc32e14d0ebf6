// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tag-to-rider resolution.
//!
//! Resolution is cache-aside over the `identityIndex` collection:
//! 1. Fast path: point read of the index entry for the tag
//! 2. Slow path: scan every rider profile for the tag
//! 3. On a slow-path hit, write the index entry before returning
//!
//! Slow-path misses are remembered per tag for a cooldown so an unknown
//! tag passing a gate repeatedly does not trigger a scan on every read.

use crate::db::TimingStore;
use crate::error::{AppError, Result};
use crate::models::{IdentityIndexEntry, RiderIdentity};
use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Number of remembered misses above which expired ones are pruned.
const MISS_PRUNE_THRESHOLD: usize = 4096;

/// Recent slow-path misses, keyed by tag ID.
pub type MissCache = Arc<DashMap<String, Instant>>;

/// Resolves tag IDs to rider identities.
///
/// Never invents an identity: an unknown tag is always
/// [`AppError::IdentityNotFound`].
#[derive(Clone)]
pub struct IdentityResolver {
    store: Arc<dyn TimingStore>,
    misses: MissCache,
    cooldown: Duration,
}

impl IdentityResolver {
    pub fn new(store: Arc<dyn TimingStore>, cooldown: Duration) -> Self {
        Self {
            store,
            misses: Arc::new(DashMap::new()),
            cooldown,
        }
    }

    /// Resolve a tag ID to a rider.
    pub async fn resolve(&self, tag_id: &str) -> Result<RiderIdentity> {
        if let Some(entry) = self.store.get_identity(tag_id).await? {
            return Ok(RiderIdentity::from(&entry));
        }

        if self.recently_missed(tag_id) {
            tracing::debug!(tag_id, "Tag missed recently, skipping rider scan");
            return Err(AppError::IdentityNotFound(tag_id.to_string()));
        }

        let riders = self.store.list_riders().await?;
        tracing::debug!(tag_id, scanned = riders.len(), "Identity index miss, scanned riders");

        let Some(rider) = riders.iter().find(|r| r.has_tag(tag_id)) else {
            self.remember_miss(tag_id);
            return Err(AppError::IdentityNotFound(tag_id.to_string()));
        };

        let identity = RiderIdentity::from(rider);
        let entry = IdentityIndexEntry {
            rider_id: identity.rider_id.clone(),
            display_name: identity.display_name.clone(),
            updated_at: Some(Utc::now()),
        };
        self.store.put_identity(tag_id, &entry).await?;
        self.misses.remove(tag_id);

        tracing::info!(
            tag_id,
            rider_id = %identity.rider_id,
            "Indexed tag after rider scan"
        );

        Ok(identity)
    }

    fn recently_missed(&self, tag_id: &str) -> bool {
        if self.cooldown.is_zero() {
            return false;
        }
        self.misses
            .get(tag_id)
            .is_some_and(|at| at.elapsed() < self.cooldown)
    }

    fn remember_miss(&self, tag_id: &str) {
        if self.cooldown.is_zero() {
            return;
        }
        if self.misses.len() >= MISS_PRUNE_THRESHOLD {
            let cooldown = self.cooldown;
            self.misses.retain(|_, at| at.elapsed() < cooldown);
        }
        self.misses.insert(tag_id.to_string(), Instant::now());
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tag-read ingestion.
//!
//! Handles the core workflow for every entry point:
//! 1. Resolve tag IDs to riders
//! 2. Locate (or create) the session for the gate
//! 3. Merge sample times into the roster snapshot
//! 4. Write the session back once
//! 5. Offer each sample to the location leaderboard (best effort)

use crate::config::Config;
use crate::db::TimingStore;
use crate::error::{AppError, Result};
use crate::models::reading::sanitize_ms;
use crate::models::{BatchSummary, RiderIdentity, Session, TagRead};
use crate::services::merger::merge_times;
use crate::services::session::{Lookup, SessionStart};
use crate::services::{IdentityResolver, LeaderboardUpdater, SessionLocator};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Result of a single-read ingest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingleIngest {
    pub rider_name: String,
    pub time_added: u64,
    pub session_id: String,
    pub entry_id: String,
}

/// A resolved sample waiting to be merged.
struct Sample {
    rider: RiderIdentity,
    time_ms: u64,
}

/// Orchestrates resolver, locator, merger and leaderboard per request.
#[derive(Clone)]
pub struct IngestService {
    store: Arc<dyn TimingStore>,
    resolver: IdentityResolver,
    locator: SessionLocator,
    leaderboards: LeaderboardUpdater,
}

impl IngestService {
    pub fn new(store: Arc<dyn TimingStore>, config: &Config) -> Self {
        Self {
            resolver: IdentityResolver::new(store.clone(), config.identity_scan_cooldown()),
            locator: SessionLocator::new(
                store.clone(),
                config.read_lookback(),
                config.start_lookback(),
                config.session_candidate_limit,
            ),
            leaderboards: LeaderboardUpdater::new(store.clone()),
            store,
        }
    }

    pub fn leaderboards(&self) -> &LeaderboardUpdater {
        &self.leaderboards
    }

    /// Start (or pick up) the session for a gate and make it the active one.
    pub async fn start_session(&self, device_name: &str) -> Result<SessionStart> {
        self.locator.start(device_name, Utc::now()).await
    }

    /// Record one read. An unknown tag fails the request.
    pub async fn ingest_single(
        &self,
        tag_id: &str,
        time_ms: f64,
        device_id: &str,
    ) -> Result<SingleIngest> {
        let rider = self.resolver.resolve(tag_id).await?;
        let time_ms = sanitize_ms(time_ms);
        let now = Utc::now();

        let mut session = self
            .locator
            .locate(device_id, now, Lookup::Read)
            .await?
            .session;

        let outcome = merge_times(&mut session, &rider, &[time_ms]);
        session.record_ingest(now, Some(device_id), None);
        self.store.save_session_ingest(&session).await?;

        tracing::info!(
            tag_id,
            session_id = %session.id,
            entry_id = %outcome.entry_id,
            created = outcome.created,
            time_ms,
            "Read recorded"
        );

        self.leaderboards
            .record_best_logged(&session.location, &rider.display_name, time_ms, now)
            .await;

        Ok(SingleIngest {
            rider_name: rider.display_name,
            time_added: time_ms,
            session_id: session.id,
            entry_id: outcome.entry_id,
        })
    }

    /// Record a batch of reads from one gate.
    ///
    /// Unknown tags are skipped and counted; the session is located once and
    /// written once. Nothing is touched when no read resolves.
    pub async fn ingest_batch(&self, device_id: &str, reads: &[TagRead]) -> Result<BatchSummary> {
        let (samples, skipped) = self.resolve_reads(reads).await?;
        if samples.is_empty() {
            tracing::info!(device_id, skipped, "Batch had no resolvable reads");
            return Ok(BatchSummary {
                skipped,
                ..Default::default()
            });
        }

        let now = Utc::now();
        let mut session = self
            .locator
            .locate(device_id, now, Lookup::Read)
            .await?
            .session;

        let riders = apply_samples(&mut session, &samples);
        session.record_ingest(now, Some(device_id), None);
        self.store.save_session_ingest(&session).await?;

        let summary = BatchSummary {
            processed: samples.len(),
            skipped,
            riders,
        };
        tracing::info!(
            device_id,
            session_id = %session.id,
            processed = summary.processed,
            skipped = summary.skipped,
            riders = summary.riders,
            "Batch recorded"
        );

        self.offer_to_leaderboard(&session.location, &samples, now)
            .await;

        Ok(summary)
    }

    /// Record a reader payload against the session named by the
    /// `meta/activeSession` pointer.
    ///
    /// Returns the number of distinct roster entries that received times.
    pub async fn ingest_legacy(
        &self,
        device_id: Option<&str>,
        start_ts: i64,
        reads: &[TagRead],
    ) -> Result<usize> {
        let pointer = self
            .store
            .get_active_session()
            .await?
            .ok_or(AppError::NoActiveSession)?;

        let mut session = self
            .store
            .get_session(&pointer.id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Session {}", pointer.id)))?;

        let (samples, skipped) = self.resolve_reads(reads).await?;
        if samples.is_empty() {
            tracing::info!(session_id = %session.id, skipped, "Reader payload had no resolvable reads");
            return Ok(0);
        }

        let now = Utc::now();
        let riders = apply_samples(&mut session, &samples);
        session.record_ingest(now, device_id, Some(start_ts));
        self.store.save_session_ingest(&session).await?;

        tracing::info!(
            session_id = %session.id,
            device_id = ?device_id,
            processed = samples.len(),
            skipped,
            riders,
            "Reader payload recorded"
        );

        self.offer_to_leaderboard(&session.location, &samples, now)
            .await;

        Ok(riders)
    }

    /// Resolve every read, resolving each distinct tag once.
    ///
    /// Returns the resolved samples in arrival order and the number of
    /// reads skipped for unknown tags.
    async fn resolve_reads(&self, reads: &[TagRead]) -> Result<(Vec<Sample>, usize)> {
        let mut known: HashMap<&str, Option<RiderIdentity>> = HashMap::new();
        let mut samples = Vec::with_capacity(reads.len());
        let mut skipped = 0;

        for read in reads {
            let rider = match known.get(read.tag_id.as_str()) {
                Some(cached) => cached.clone(),
                None => {
                    let resolved = match self.resolver.resolve(&read.tag_id).await {
                        Ok(rider) => Some(rider),
                        Err(AppError::IdentityNotFound(_)) => None,
                        Err(e) => return Err(e),
                    };
                    known.insert(read.tag_id.as_str(), resolved.clone());
                    resolved
                }
            };

            match rider {
                Some(rider) => samples.push(Sample {
                    rider,
                    time_ms: sanitize_ms(read.time_ms),
                }),
                None => {
                    tracing::debug!(tag_id = %read.tag_id, "Skipping unknown tag");
                    skipped += 1;
                }
            }
        }

        Ok((samples, skipped))
    }

    /// One independent leaderboard transaction per sample.
    async fn offer_to_leaderboard(&self, location: &str, samples: &[Sample], at: DateTime<Utc>) {
        for sample in samples {
            self.leaderboards
                .record_best_logged(location, &sample.rider.display_name, sample.time_ms, at)
                .await;
        }
    }
}

/// Merge samples into the snapshot; returns the number of distinct entries touched.
fn apply_samples(session: &mut Session, samples: &[Sample]) -> usize {
    let mut touched = HashSet::new();
    for sample in samples {
        let outcome = merge_times(session, &sample.rider, &[sample.time_ms]);
        touched.insert(outcome.entry_id);
    }
    touched.len()
}

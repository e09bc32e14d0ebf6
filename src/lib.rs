// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Gate-Timing: RFID lap timing backend
//!
//! This crate ingests tag reads from race-timing gates, resolves each tag
//! to a rider, appends the times to the current race session and keeps a
//! best-time leaderboard per track location.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::TimingStore;
use services::IngestService;
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn TimingStore>,
    pub ingest: IngestService,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn TimingStore>) -> Self {
        let ingest = IngestService::new(store.clone(), &config);
        Self {
            config,
            store,
            ingest,
        }
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod identity;
pub mod ingest;
pub mod leaderboard;
pub mod merger;
pub mod session;

pub use identity::IdentityResolver;
pub use ingest::{IngestService, SingleIngest};
pub use leaderboard::LeaderboardUpdater;
pub use merger::{merge_times, MergeOutcome};
pub use session::{LocatedSession, Lookup, SessionLocator, SessionStart};

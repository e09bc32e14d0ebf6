// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod identity;
pub mod leaderboard;
pub mod reading;
pub mod session;

pub use identity::{IdentityIndexEntry, RiderIdentity, RiderRecord};
pub use leaderboard::{BestTimeOutcome, BestTimeUpdate, Leaderboard, LeaderboardRecord};
pub use reading::{BatchSummary, TagRead};
pub use session::{ActiveSessionPointer, RiderEntry, Session};

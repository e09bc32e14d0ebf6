// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Merging timing samples into a session roster.
//!
//! Works on an in-memory session snapshot; the caller writes the session
//! back once per request.

use crate::models::{RiderEntry, RiderIdentity, Session};

/// What a merge did to the roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    /// ID of the entry that received the samples
    pub entry_id: String,
    /// A placeholder entry was created for the rider
    pub created: bool,
}

/// Append `samples` (ms, arrival order) to the rider's entry in `session`.
///
/// Samples are appended as given: no sorting, no dedup. The entry's name
/// is refreshed to the resolved display name. When the rider has no entry
/// yet, an `auto_` placeholder is added.
pub fn merge_times(session: &mut Session, rider: &RiderIdentity, samples: &[u64]) -> MergeOutcome {
    match session.find_entry(&rider.rider_id, &rider.display_name) {
        Some(idx) => {
            let entry = &mut session.riders[idx];
            entry.times.extend_from_slice(samples);
            entry.name = rider.display_name.clone();
            MergeOutcome {
                entry_id: entry.id.clone(),
                created: false,
            }
        }
        None => {
            let entry =
                RiderEntry::placeholder(&rider.rider_id, &rider.display_name, samples.to_vec());
            let entry_id = entry.id.clone();
            session.riders.push(entry);
            MergeOutcome {
                entry_id,
                created: true,
            }
        }
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Leaderboard updater tests against the in-memory store.

use chrono::Utc;
use gate_timing::db::{MemoryStore, TimingStore};
use gate_timing::models::leaderboard::{leaderboard_key, LEADERBOARD_CAPACITY};
use gate_timing::models::BestTimeOutcome;
use gate_timing::services::LeaderboardUpdater;
use std::sync::Arc;

const NUM_CONCURRENT_RIDERS: u64 = 12;

#[tokio::test]
async fn test_best_time_sequence() {
    let store = Arc::new(MemoryStore::new());
    let updater = LeaderboardUpdater::new(store.clone());

    updater
        .record_best("Main Track", "Ana", 5000, Utc::now())
        .await
        .unwrap();
    updater
        .record_best("Main Track", "Ana", 4800, Utc::now())
        .await
        .unwrap();

    let board = updater.get("Main Track").await.unwrap();
    assert_eq!(board.records.len(), 1);
    assert_eq!(board.records[0].time_ms, 4800);

    let outcome = updater
        .record_best("Main Track", "Ana", 5200, Utc::now())
        .await
        .unwrap();
    assert_eq!(outcome, BestTimeOutcome::Unchanged { best_ms: 4800 });

    let board = updater.get("Main Track").await.unwrap();
    assert_eq!(board.records.len(), 1);
    assert_eq!(board.best_for("Ana"), Some(4800));
}

#[tokio::test]
async fn test_location_spellings_share_a_board() {
    let store = Arc::new(MemoryStore::new());
    let updater = LeaderboardUpdater::new(store.clone());

    updater
        .record_best("Main  Track", "Ana", 5000, Utc::now())
        .await
        .unwrap();
    updater
        .record_best("main track", "Beto", 4000, Utc::now())
        .await
        .unwrap();

    let stored = store
        .get_leaderboard(&leaderboard_key("MAIN TRACK"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.records.len(), 2);
    assert_eq!(stored.records[0].name, "Beto");
}

#[tokio::test]
async fn test_board_stays_bounded_and_sorted() {
    let store = Arc::new(MemoryStore::new());
    let updater = LeaderboardUpdater::new(store.clone());

    for i in 0..45u64 {
        let time = 90_000 - (i % 15) * 1000 + i;
        updater
            .record_best("Main Track", &format!("rider{}", i), time, Utc::now())
            .await
            .unwrap();

        let board = updater.get("Main Track").await.unwrap();
        assert!(board.records.len() <= LEADERBOARD_CAPACITY);
        assert!(board
            .records
            .windows(2)
            .all(|w| w[0].time_ms <= w[1].time_ms));
    }

    let board = updater.get("Main Track").await.unwrap();
    assert_eq!(board.records.len(), LEADERBOARD_CAPACITY);
}

#[tokio::test]
async fn test_concurrent_riders_are_all_recorded() {
    let store = Arc::new(MemoryStore::new());
    let updater = LeaderboardUpdater::new(store.clone());

    let mut handles = vec![];
    for i in 0..NUM_CONCURRENT_RIDERS {
        let updater = updater.clone();
        handles.push(tokio::spawn(async move {
            updater
                .record_best("Main Track", &format!("rider{}", i), 60_000 + i, Utc::now())
                .await
        }));
    }

    for handle in handles {
        handle
            .await
            .expect("Task join failed")
            .expect("Leaderboard update failed");
    }

    let board = updater.get("Main Track").await.unwrap();
    assert_eq!(board.records.len(), NUM_CONCURRENT_RIDERS as usize);
}

#[tokio::test]
async fn test_failed_transaction_is_logged_not_raised() {
    let store = Arc::new(MemoryStore::new());
    store.set_fail_leaderboards(true);
    let updater = LeaderboardUpdater::new(store.clone());

    assert!(updater
        .record_best("Main Track", "Ana", 5000, Utc::now())
        .await
        .is_err());
    assert!(updater
        .record_best_logged("Main Track", "Ana", 5000, Utc::now())
        .await
        .is_none());
}

#[tokio::test]
async fn test_missing_board_reads_as_empty() {
    let store = Arc::new(MemoryStore::new());
    let board = LeaderboardUpdater::new(store).get("Nowhere").await.unwrap();

    assert_eq!(board.location, "Nowhere");
    assert!(board.records.is_empty());
    assert!(board.updated_at.is_none());
}

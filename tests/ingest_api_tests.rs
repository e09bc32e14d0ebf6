// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! End-to-end ingest tests through the router.
//!
//! These tests verify that:
//! 1. Requests without the shared secret are rejected before any work
//! 2. Malformed payloads are rejected as bad requests
//! 3. Reads land in the right session, roster entry and leaderboard

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use gate_timing::db::TimingStore;
use gate_timing::models::leaderboard::leaderboard_key;
use serde_json::json;
use tower::ServiceExt;

mod common;
use common::{body_json, create_test_app, post_json, rider, session_hours_ago};

const KEY: &str = "test_ingest_key";

#[tokio::test]
async fn test_missing_or_wrong_key_is_unauthorized() {
    let (app, _state, store) = create_test_app();
    store.insert_rider(rider("u1", "Ana", "E1")).await;

    let no_key = Request::builder()
        .method("POST")
        .uri("/ingest/read")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({"tag_id": "E1", "time_ms": 1000, "device_id": "Gate A"}).to_string(),
        ))
        .unwrap();
    let response = app.clone().oneshot(no_key).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(post_json(
            "/ingest/read",
            "wrong",
            json!({"tag_id": "E1", "time_ms": 1000, "device_id": "Gate A"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Nothing was touched
    assert_eq!(store.rider_scan_count(), 0);
    assert_eq!(store.session_count().await, 0);
}

#[tokio::test]
async fn test_health_is_public() {
    let (app, _state, _store) = create_test_app();

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ok");
}

#[tokio::test]
async fn test_bad_payloads_are_rejected_before_store_access() {
    let (app, _state, store) = create_test_app();

    let cases = [
        ("/ingest/read", json!({"tag_id": "E1", "device_id": "Gate A"})),
        ("/ingest/read", json!({"tag_id": "", "time_ms": 1, "device_id": "Gate A"})),
        ("/ingest/batch", json!({"device_id": "Gate A", "items": []})),
        ("/sessions/start", json!({})),
        ("/ingestRfid", json!({"deviceId": "r1", "items": []})),
        ("/ingestRfid", json!({"start_ts": 1700000000000u64})),
    ];

    for (uri, body) in cases {
        let response = app
            .clone()
            .oneshot(post_json(uri, KEY, body.clone()))
            .await
            .unwrap();
        assert_eq!(
            response.status(),
            StatusCode::BAD_REQUEST,
            "{} with {}",
            uri,
            body
        );
    }

    let malformed = Request::builder()
        .method("POST")
        .uri("/ingest/batch")
        .header("content-type", "application/json")
        .header("x-ingest-key", KEY)
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(malformed).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert_eq!(store.rider_scan_count(), 0);
    assert_eq!(store.session_count().await, 0);
}

#[tokio::test]
async fn test_single_read_creates_session_entry_and_leaderboard() {
    let (app, _state, store) = create_test_app();
    store.insert_rider(rider("u1", "Ana", "E1")).await;

    let response = app
        .oneshot(post_json(
            "/ingest/read",
            KEY,
            json!({"tag_id": "E1", "time_ms": 61234.9, "device_id": "Main Track"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["rider_name"], "Ana");
    assert_eq!(body["time_added"], 61234);

    let session_id = body["session_id"].as_str().unwrap();
    let session = store.get_session(session_id).await.unwrap().unwrap();
    assert_eq!(session.location, "Main Track");
    assert_eq!(session.riders.len(), 1);
    assert_eq!(session.riders[0].id, "auto_u1");
    assert_eq!(session.riders[0].times, vec![61234]);
    assert_eq!(session.last_device_id.as_deref(), Some("Main Track"));
    assert!(session.last_ingest_at.is_some());

    let board = store
        .get_leaderboard(&leaderboard_key("Main Track"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(board.best_for("Ana"), Some(61234));
}

#[tokio::test]
async fn test_single_read_unknown_tag_is_not_found() {
    let (app, _state, store) = create_test_app();

    let response = app
        .oneshot(post_json(
            "/ingest/read",
            KEY,
            json!({"tag_id": "E404", "time_ms": 1000, "device_id": "Gate A"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "identity_not_found");
    assert_eq!(store.session_count().await, 0);
}

#[tokio::test]
async fn test_negative_time_is_clamped_not_rejected() {
    let (app, _state, store) = create_test_app();
    store.insert_rider(rider("u1", "Ana", "E1")).await;

    let response = app
        .oneshot(post_json(
            "/ingest/read",
            KEY,
            json!({"tag_id": "E1", "time_ms": -250.5, "device_id": "Gate A"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["time_added"], 0);
}

#[tokio::test]
async fn test_batch_skips_unresolvable_tags() {
    let (app, _state, store) = create_test_app();
    store.insert_rider(rider("u1", "Ana", "E1")).await;

    let response = app
        .oneshot(post_json(
            "/ingest/batch",
            KEY,
            json!({
                "device_id": "Gate A",
                "items": [
                    {"tag_id": "E404", "time_ms": 900},
                    {"tag_id": "E1", "time_ms": 1000}
                ]
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["processed"], 1);
    assert_eq!(body["skipped"], 1);
    assert_eq!(body["riders"], 1);
}

#[tokio::test]
async fn test_batch_merges_into_existing_session_in_arrival_order() {
    let (app, _state, store) = create_test_app();
    store.insert_rider(rider("u1", "Ana", "E1")).await;
    store.insert_rider(rider("u2", "Beto", "E2")).await;
    store
        .insert_session(session_hours_ago("today", "Gate A", 2))
        .await;

    let response = app
        .oneshot(post_json(
            "/ingest/batch",
            KEY,
            json!({
                "device_id": "Gate A",
                "items": [
                    {"tag_id": "E1", "time_ms": 3000},
                    {"tag_id": "E2", "time_ms": 2500},
                    {"tag_id": "E1", "time_ms": 2000},
                    {"tag_id": "E1", "time_ms": 2000}
                ]
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["processed"], 4);
    assert_eq!(body["riders"], 2);

    let session = store.get_session("today").await.unwrap().unwrap();
    assert_eq!(session.riders.len(), 2);
    assert_eq!(session.riders[0].id, "auto_u1");
    assert_eq!(session.riders[0].times, vec![3000, 2000, 2000]);
    assert_eq!(session.riders[1].times, vec![2500]);
    assert_eq!(store.session_count().await, 1);

    let board = store
        .get_leaderboard(&leaderboard_key("Gate A"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(board.best_for("Ana"), Some(2000));
    assert_eq!(board.records[0].name, "Ana");
}

#[tokio::test]
async fn test_batch_with_only_unknown_tags_touches_nothing() {
    let (app, _state, store) = create_test_app();

    let response = app
        .oneshot(post_json(
            "/ingest/batch",
            KEY,
            json!({"device_id": "Gate A", "items": [{"tag_id": "E404", "time_ms": 1}]}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["processed"], 0);
    assert_eq!(store.session_count().await, 0);
}

#[tokio::test]
async fn test_leaderboard_failure_does_not_fail_ingest() {
    let (app, _state, store) = create_test_app();
    store.insert_rider(rider("u1", "Ana", "E1")).await;
    store.set_fail_leaderboards(true);

    let response = app
        .oneshot(post_json(
            "/ingest/batch",
            KEY,
            json!({"device_id": "Gate A", "items": [{"tag_id": "E1", "time_ms": 1000}]}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["processed"], 1);
    assert!(store
        .get_leaderboard(&leaderboard_key("Gate A"))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_start_session_then_legacy_ingest() {
    let (app, _state, store) = create_test_app();
    store.insert_rider(rider("u1", "Ana", "E1")).await;
    store.insert_rider(rider("u2", "Beto", "E2")).await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/sessions/start",
            KEY,
            json!({"device_name": "Main Track"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["reused"], false);
    let session_id = body["session_id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(post_json(
            "/sessions/start",
            KEY,
            json!({"device_name": "Main Track"}),
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["reused"], true);
    assert_eq!(body["session_id"], session_id.as_str());

    let response = app
        .oneshot(post_json(
            "/ingestRfid",
            KEY,
            json!({
                "start_ts": 1760000000000u64,
                "deviceId": "reader-7",
                "items": [
                    {"epc": "E1", "t_ms": 65000.7, "rssi": -51},
                    {"epc": "E2", "t_ms": 64000},
                    {"epc": "E1", "t_ms": 63000},
                    {"epc": "E404", "t_ms": 1}
                ]
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["ok"], true);
    assert_eq!(body["appended"], 2);

    let session = store.get_session(&session_id).await.unwrap().unwrap();
    assert_eq!(session.riders[0].times, vec![65000, 63000]);
    assert_eq!(session.last_device_id.as_deref(), Some("reader-7"));
    assert_eq!(session.last_start_ts, Some(1760000000000));
    assert!(session.active);
}

#[tokio::test]
async fn test_legacy_ingest_without_active_session() {
    let (app, _state, _store) = create_test_app();

    let response = app
        .oneshot(post_json(
            "/ingestRfid",
            KEY,
            json!({"start_ts": 1, "items": [{"epc": "E1", "t_ms": 1}]}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "no_active_session");
}

#[tokio::test]
async fn test_leaderboard_route() {
    let (app, state, _store) = create_test_app();
    state
        .ingest
        .leaderboards()
        .record_best("Main Track", "Ana", 4800, chrono::Utc::now())
        .await
        .unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/leaderboards/main%20track")
                .header("x-ingest-key", KEY)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["records"][0]["name"], "Ana");
    assert_eq!(body["records"][0]["time_ms"], 4800);
}

//! API Regression Tests
//!
//! Drives the /api/v1/* endpoints against an in-process router built with
//! `create_app()`, using `tower::ServiceExt::oneshot()` so no port is bound
//! and no binary is spawned.

use verde_os::api::{create_app, ApiState};
use verde_os::config::{self, CropConfig};
use verde_os::cycle::BoundaryLedger;
use verde_os::normalize;
use verde_os::pipeline::AppState;
use verde_os::storage::MemoryBoundaryStore;
use verde_os::types::{RawReading, SortDirection};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower::ServiceExt;

fn ensure_config() {
    if !config::is_initialized() {
        config::init(CropConfig::default());
    }
}

fn create_test_state() -> ApiState {
    ApiState::new(
        Arc::new(RwLock::new(AppState::default())),
        BoundaryLedger::new(Arc::new(MemoryBoundaryStore::new())),
    )
}

fn raw(id: &str, timestamp: &str) -> RawReading {
    RawReading {
        id: id.to_string(),
        timestamp: timestamp.to_string(),
        temperature: 24.2,
        humidity: 59.0,
        ph: 6.05,
        tds: 830.0,
        predicted_days: Some(30.5),
    }
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let resp = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn post_json(app: axum::Router, uri: &str, body: &str) -> (StatusCode, serde_json::Value) {
    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

/// All GET endpoints should return 200 with the data/meta envelope.
#[tokio::test]
async fn test_get_endpoints_return_enveloped_200() {
    ensure_config();

    let endpoints = [
        "/api/v1/system/health",
        "/api/v1/readings",
        "/api/v1/cycle",
        "/api/v1/config",
    ];

    for endpoint in &endpoints {
        let (status, body) = get(create_app(create_test_state()), endpoint).await;
        assert_eq!(status, StatusCode::OK, "GET {endpoint} returned {status}");
        assert!(body.get("data").is_some(), "GET {endpoint} missing data");
        assert_eq!(body["meta"]["version"], "1", "GET {endpoint} missing meta");
    }
}

/// An unparsable reset date is rejected with 400 and mutates nothing.
#[tokio::test]
async fn test_add_reset_rejects_bad_date() {
    ensure_config();
    let state = create_test_state();

    let (status, body) = post_json(
        create_app(state.clone()),
        "/api/v1/cycle/resets",
        r#"{"date": "not-a-date"}"#,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    let (_, cycle) = get(create_app(state), "/api/v1/cycle").await;
    assert_eq!(cycle["data"]["reset_boundaries"].as_array().unwrap().len(), 0);
}

/// Adding a reset boundary shows up in the cycle view and reclassifies the
/// in-memory table immediately.
#[tokio::test]
async fn test_add_reset_updates_cycle_and_reclassifies() {
    ensure_config();
    let state = create_test_state();

    // Seed the pipeline state with a normalized batch classified as empty-set
    // day-1 defaults.
    {
        let batch = normalize(
            vec![raw("r1", "2024-01-28T08:00:00Z")],
            SortDirection::Descending,
        );
        let mut app = state.app_state.write().await;
        app.readings = batch.readings;
    }

    let (status, body) = post_json(
        create_app(state.clone()),
        "/api/v1/cycle/resets",
        r#"{"date": "2024-01-25"}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_boundaries"], 1);

    let (_, cycle) = get(create_app(state.clone()), "/api/v1/cycle").await;
    assert_eq!(
        cycle["data"]["reset_boundaries"].as_array().unwrap().len(),
        1
    );

    // 2024-01-28 is day 4 of a cycle starting 2024-01-25.
    let (_, readings) = get(create_app(state), "/api/v1/readings").await;
    assert_eq!(readings["data"][0]["day_number"], 4);
    assert_eq!(readings["data"][0]["current_stage"], "Initial");
}

/// Clearing resets empties the set.
#[tokio::test]
async fn test_clear_resets() {
    ensure_config();
    let state = create_test_state();

    post_json(
        create_app(state.clone()),
        "/api/v1/cycle/resets",
        r#"{"date": "2024-01-25"}"#,
    )
    .await;
    let (status, _) = post_json(create_app(state.clone()), "/api/v1/cycle/resets/clear", "{}").await;
    assert_eq!(status, StatusCode::OK);

    let (_, cycle) = get(create_app(state), "/api/v1/cycle").await;
    assert_eq!(cycle["data"]["reset_boundaries"].as_array().unwrap().len(), 0);
}

/// The adjust operation returns the implied day-1 start instant.
#[tokio::test]
async fn test_adjust_start_returns_new_start() {
    ensure_config();
    let state = create_test_state();

    let (status, body) = post_json(
        create_app(state.clone()),
        "/api/v1/cycle/adjust",
        r#"{"date": "2024-02-01", "day": 5}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["new_start"], "2024-01-28T00:00:00Z");

    // Day numbers below 1 are rejected.
    let (status, _) = post_json(
        create_app(state),
        "/api/v1/cycle/adjust",
        r#"{"date": "2024-02-01", "day": 0}"#,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

/// Readings endpoint respects the limit query parameter.
#[tokio::test]
async fn test_readings_limit() {
    ensure_config();
    let state = create_test_state();

    {
        let batch = normalize(
            vec![
                raw("r1", "2024-01-10T08:00:00Z"),
                raw("r2", "2024-01-11T08:00:00Z"),
                raw("r3", "2024-01-12T08:00:00Z"),
            ],
            SortDirection::Descending,
        );
        let mut app = state.app_state.write().await;
        app.table = verde_os::pipeline::classify_batch(
            &batch.readings,
            None,
            verde_os::cycle::ClampPolicy::ClampToOne,
        );
        app.readings = batch.readings;
    }

    let (_, body) = get(create_app(state), "/api/v1/readings?limit=2").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

//! Integration tests for the REST API feature.

#![cfg(feature = "api")]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::util::ServiceExt;

use gridpulse::api::{AppState, router};
use gridpulse::config::ScenarioConfig;
use gridpulse::sim::engine::Simulation;

/// Runs the stress-test preset and returns the API state.
fn build_api_state() -> Arc<AppState> {
    let scenario = ScenarioConfig::stress_test();
    let mut sim = Simulation::from_params(scenario.engine_params()).expect("valid preset");
    let results = sim.run(&scenario.run_plan());
    Arc::new(AppState::from_simulation(&sim, results))
}

async fn get(state: Arc<AppState>, uri: &str) -> (StatusCode, serde_json::Value) {
    let app = router(state);
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn state_reports_full_run() {
    let state = build_api_state();
    let steps = state.results.len();
    let (status, json) = get(state, "/state").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["kpi"]["steps"], steps);
    assert_eq!(json["params"]["houses"], 50);
    assert_eq!(json["latest_step"]["cycle_index"], steps);
    assert!(json["metrics"]["stress_pct"].is_number());
}

#[tokio::test]
async fn telemetry_marks_stress_window() {
    let (status, json) = get(build_api_state(), "/telemetry?from=1&to=8").await;
    assert_eq!(status, StatusCode::OK);

    let flags: Vec<bool> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["stress_test"].as_bool().unwrap())
        .collect();
    // Record cycle N is plan step N - 1; the window covers steps 2..6.
    assert_eq!(
        flags,
        vec![false, false, true, true, true, true, false, false]
    );
}

#[tokio::test]
async fn telemetry_rejects_inverted_range() {
    let (status, _) = get(build_api_state(), "/telemetry?from=9&to=3").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn houses_filters_partition_sensibly() {
    let state = build_api_state();
    let (_, all) = get(state.clone(), "/houses?filter=all").await;
    let (_, ev) = get(state.clone(), "/houses?filter=ev").await;
    let (_, active) = get(state, "/houses?filter=active").await;

    let all = all.as_array().unwrap();
    assert_eq!(all.len(), 50);
    assert!(ev.as_array().unwrap().len() <= all.len());
    for house in active.as_array().unwrap() {
        assert!(!house["cycles"].as_array().unwrap().is_empty());
    }
}

#[tokio::test]
async fn history_is_bounded() {
    let (status, json) = get(build_api_state(), "/history").await;
    assert_eq!(status, StatusCode::OK);
    let samples = json.as_array().unwrap();
    assert_eq!(samples.len(), 24);
    assert!(samples.iter().all(|s| s["stress_pct"].as_f64().unwrap() <= 100.0));
}

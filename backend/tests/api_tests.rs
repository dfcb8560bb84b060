//! API integration tests
//!
//! Drives the full router over the in-memory store with every external
//! provider disabled, so all lookups take their local fallbacks.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use sniffer_backend::{create_app, AppState, Config};

fn app() -> Router {
    let mut config = Config::from_defaults().unwrap();
    config.scoring.seed = Some(2024);
    create_app(AppState::in_memory(config))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body.to_vec())
}

async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let (status, bytes) = send(app, request).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let (status, bytes) = get(app, uri).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health() {
    let app = app();
    let (status, body) = get_json(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["store"], "memory");

    let (status, _) = get_json(&app, "/api/v1/health").await;
    assert_eq!(status, StatusCode::OK);
}

// ============================================================================
// Analyze
// ============================================================================

#[tokio::test]
async fn test_analyze_returns_scored_result() {
    let app = app();
    let (status, body) = post_json(
        &app,
        "/api/v1/analyze",
        json!({
            "target": "funghi",
            "latitude": 45.55,
            "longitude": 10.95,
            "timestamp": "2024-10-12T09:00:00Z",
            "sensorData": {"voc": 1.2, "gas": 15000, "humidity": 82}
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let probability = body["probability"].as_u64().unwrap();
    assert!(probability <= 100);
    assert!(body["analysis"].as_str().unwrap().contains("LESSINIA"));
    assert_eq!(body["zone"], "lessinia");
    assert_eq!(body["zone_hash"], "45.55,10.95");
    assert_eq!(body["season"], "autumn");
    assert!(body["scan_id"].is_string());
    assert!(body["species"].is_array());
}

#[tokio::test]
async fn test_analyze_rejects_missing_coordinates() {
    let app = app();
    let (status, body) = post_json(&app, "/api/v1/analyze", json!({"target": "funghi"})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["field"], "latitude");
}

#[tokio::test]
async fn test_analyze_rejects_out_of_range_latitude() {
    let app = app();
    let (status, body) = post_json(
        &app,
        "/api/v1/analyze",
        json!({"target": "erbe", "latitude": 95.0, "longitude": 10.0}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["field"], "latitude");
}

#[tokio::test]
async fn test_analyze_rejects_malformed_json() {
    let app = app();
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/analyze")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, bytes) = send(&app, request).await;
    let body: Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_BODY");
}

#[tokio::test]
async fn test_environment_lookup() {
    let app = app();
    let (status, body) = post_json(
        &app,
        "/api/v1/environment",
        json!({"latitude": 45.55, "longitude": 10.95}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let elevation = body["elevation"].as_f64().unwrap();
    assert!((400.0..1200.0).contains(&elevation));
    assert_eq!(body["weather"]["live"], false);
    assert_eq!(body["zoneHash"], "45.55,10.95");
}

// ============================================================================
// Feedback and learning
// ============================================================================

fn feedback_body(found: bool, predicted: f64) -> Value {
    json!({
        "scanId": "field-test",
        "found": found,
        "predicted": predicted,
        "lat": 45.5512,
        "lon": 10.9498,
        "elevation": 1050,
        "weather": "nuvoloso, 10°C",
        "analysis": {"probability": predicted},
        "timestamp": "2024-10-03T08:15:00Z"
    })
}

#[tokio::test]
async fn test_feedback_updates_zone_weights() {
    let app = app();

    let (status, body) = post_json(&app, "/api/v1/feedback", feedback_body(true, 82.0)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["feedbackId"].is_string());
    assert_eq!(body["accuracy"], 100.0);
    assert_eq!(body["message"], "Feedback salvato con successo");

    let (_, body) = post_json(&app, "/api/v1/feedback", feedback_body(false, 65.0)).await;
    assert_eq!(body["accuracy"], 50.0);

    let (status, weights) = get_json(&app, "/api/v1/zones/45.551,10.95/weights").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(weights["sample_count"], 2);
    assert_eq!(weights["zone_bias"], -1.0);
}

#[tokio::test]
async fn test_feedback_requires_found() {
    let app = app();
    let (status, body) = post_json(
        &app,
        "/api/v1/feedback",
        json!({"scanId": "x", "lat": 45.0, "lon": 11.0}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["field"], "found");
}

#[tokio::test]
async fn test_unknown_zone_weights_not_found() {
    let app = app();
    let (status, _) = get_json(&app, "/api/v1/zones/12.5,40.25/weights").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Dashboard
// ============================================================================

#[tokio::test]
async fn test_dashboard_requires_type() {
    let app = app();
    let (status, body) = get_json(&app, "/api/v1/dashboard").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["field"], "type");

    let (status, _) = get_json(&app, "/api/v1/dashboard?type=devices").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_dashboard_analytics_and_listings() {
    let app = app();
    post_json(
        &app,
        "/api/v1/analyze",
        json!({"target": "tartufi", "latitude": 45.55, "longitude": 10.95}),
    )
    .await;
    for found in [true, true, false] {
        post_json(&app, "/api/v1/feedback", feedback_body(found, 70.0)).await;
    }

    let (status, analytics) = get_json(&app, "/api/v1/dashboard?type=analytics").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(analytics["summary"]["totalFeedback"], 3);
    assert_eq!(analytics["summary"]["totalScans"], 1);
    assert_eq!(analytics["summary"]["successRate"], 67);
    assert_eq!(analytics["zones"]["topPerformingZones"][0]["zone"], "45.551,10.95");
    assert_eq!(analytics["mlStatus"]["activeZones"], 1);

    let (_, scans) = get_json(&app, "/api/v1/dashboard?type=scans").await;
    assert_eq!(scans.as_array().unwrap().len(), 1);

    let (_, feedback) = get_json(&app, "/api/v1/dashboard?type=feedback").await;
    assert_eq!(feedback.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_dashboard_csv_export() {
    let app = app();
    post_json(&app, "/api/v1/feedback", feedback_body(true, 70.0)).await;

    let (status, bytes) = get(&app, "/api/v1/dashboard?type=feedback&format=csv").await;
    assert_eq!(status, StatusCode::OK);
    let csv = String::from_utf8(bytes).unwrap();
    assert!(csv.starts_with("id,scan_id,found,"));
    assert_eq!(csv.lines().count(), 2);
}

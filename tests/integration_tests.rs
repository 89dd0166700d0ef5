/// End-to-end tests for the HTTP surface
///
/// Run with: cargo test --test integration_tests -- --nocapture

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::NaiveDateTime;
use fire_watch::{
    csv_log::CsvLog,
    history::MAX_HISTORY,
    model::Model,
    router, AppState,
};
use serde_json::{json, Value};
use std::{fs, path::PathBuf};
use tempfile::TempDir;
use tower::ServiceExt;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

fn setup() -> (TempDir, AppState) {
    let dir = tempfile::tempdir().unwrap();
    let model = Model::load(
        &fixture("model_random_forest.json"),
        &fixture("label_encoder.json"),
    )
    .unwrap();
    let log = CsvLog::open(dir.path().join("logs").join("fire_data.csv")).unwrap();
    (dir, AppState::new(model, log))
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

async fn post_predict(app: &Router, body: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("POST")
        .uri("/predict")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let (status, bytes) = send(app, req).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn get_json(app: &Router, uri: &str) -> Value {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let (status, bytes) = send(app, req).await;
    assert_eq!(status, StatusCode::OK);
    serde_json::from_slice(&bytes).unwrap()
}

async fn get_text(app: &Router, uri: &str) -> (StatusCode, String) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let (status, bytes) = send(app, req).await;
    (status, String::from_utf8(bytes).unwrap())
}

#[tokio::test]
async fn test_health_endpoints() {
    println!("\n=== Test: Health Endpoints ===");
    let (_dir, state) = setup();
    let app = router(state);

    let (status, text) = get_text(&app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(text, "API Deteksi Dini Kebakaran Online");

    let (status, text) = get_text(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(text, "OK");

    // Still OK after traffic.
    post_predict(&app, r#"{"suhu": 80, "kelembapan": 20, "gas": 300, "flame": 1}"#).await;
    assert_eq!(get_text(&app, "/health").await.1, "OK");

    println!("✓ All assertions passed");
}

#[tokio::test]
async fn test_latest_before_any_prediction() {
    println!("\n=== Test: Empty Latest ===");
    let (_dir, state) = setup();
    let app = router(state);

    let latest = get_json(&app, "/latest").await;
    assert_eq!(latest, json!({ "last": {}, "history": [] }));
    println!("✓ Empty state returns {{last: {{}}, history: []}}");
}

#[tokio::test]
async fn test_predict_fire_then_latest() {
    println!("\n=== Test: Predict + Latest ===");
    let (dir, state) = setup();
    let app = router(state);

    let (status, out) =
        post_predict(&app, r#"{"suhu": 80, "kelembapan": 20, "gas": 300, "flame": 1}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(out, json!({ "status": "FIRE", "prediction": 0 }));
    println!("✓ Prediction: {}", out);

    let latest = get_json(&app, "/latest").await;
    let last = &latest["last"];
    assert_eq!(last["temp"], json!(80.0));
    assert_eq!(last["hum"], json!(20.0));
    assert_eq!(last["gas"], json!(300.0));
    assert_eq!(last["flame"], json!(1.0));
    assert_eq!(last["status"], json!("FIRE"));
    let ts = last["timestamp"].as_str().unwrap();
    assert!(NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M:%S").is_ok(), "bad timestamp {}", ts);
    assert_eq!(latest["history"], json!([last.clone()]));

    // The CSV row carries the same six values.
    let text = fs::read_to_string(dir.path().join("logs/fire_data.csv")).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines, vec![
        "timestamp,temp,hum,gas,flame,status".to_string(),
        format!("{},80.0,20.0,300.0,1.0,FIRE", ts),
    ]);
    println!("✓ Logged row: {}", lines[1]);
}

#[tokio::test]
async fn test_prediction_matches_model() {
    println!("\n=== Test: Responses Mirror The Model ===");
    let (_dir, state) = setup();
    let model = state.model.clone();
    let app = router(state);

    let cases = [
        ([80.0, 20.0, 300.0, 1.0], "FIRE"),
        ([25.0, 60.0, 50.0, 0.0], "SAFE"),
        ([40.0, 20.0, 400.0, 0.0], "WARNING"),
    ];
    for (features, expected) in cases {
        let body = json!({
            "suhu": features[0], "kelembapan": features[1],
            "gas": features[2], "flame": features[3],
        });
        let (status, out) = post_predict(&app, &body.to_string()).await;
        assert_eq!(status, StatusCode::OK);

        let idx = model.predict(&features).unwrap();
        assert_eq!(out["prediction"], json!(idx));
        assert_eq!(out["status"], json!(model.decode(idx).unwrap()));
        assert_eq!(out["status"], json!(expected));
        println!("  {:?} -> {} ({})", features, expected, idx);
    }
    println!("✓ All assertions passed");
}

#[tokio::test]
async fn test_missing_fields_and_string_coercion() {
    println!("\n=== Test: Defaults And Coercion ===");
    let (_dir, state) = setup();
    let app = router(state);

    let (status, out) = post_predict(&app, "{}").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(out["status"], json!("SAFE"));

    let (status, out) = post_predict(&app, r#"{"suhu": "80", "kelembapan": "20", "gas": "300", "flame": "1"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(out["status"], json!("FIRE"));

    let latest = get_json(&app, "/latest").await;
    let history = latest["history"].as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["temp"], json!(0.0));
    assert_eq!(history[1]["temp"], json!(80.0));
    println!("✓ All assertions passed");
}

#[tokio::test]
async fn test_bad_input_is_client_error() {
    println!("\n=== Test: Bad Input ===");
    let (dir, state) = setup();
    let app = router(state);

    for body in [r#"{"suhu": "panas"}"#, r#"{"gas": null}"#, "[80, 20, 300, 1]", "not json", ""] {
        let req = Request::builder()
            .method("POST")
            .uri("/predict")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();
        let (status, bytes) = send(&app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {:?}", body);
        let err: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(err["status"], json!(400));
        assert!(err["error"].is_string());
    }

    // Rejected requests leave no trace.
    assert_eq!(get_json(&app, "/latest").await, json!({ "last": {}, "history": [] }));
    let text = fs::read_to_string(dir.path().join("logs/fire_data.csv")).unwrap();
    assert_eq!(text.lines().count(), 1);
    println!("✓ All assertions passed");
}

#[tokio::test]
async fn test_history_is_capped() {
    println!("\n=== Test: History Cap ===");
    let (dir, state) = setup();
    let app = router(state);

    let total = MAX_HISTORY + 1;
    for i in 1..=total {
        let body = json!({ "suhu": i, "kelembapan": 50, "gas": 10, "flame": 0 });
        let (status, _) = post_predict(&app, &body.to_string()).await;
        assert_eq!(status, StatusCode::OK);
    }

    let latest = get_json(&app, "/latest").await;
    let history = latest["history"].as_array().unwrap();
    assert_eq!(history.len(), MAX_HISTORY);

    let temps: Vec<f64> = history.iter().map(|r| r["temp"].as_f64().unwrap()).collect();
    let expected: Vec<f64> = (2..=total).map(|i| i as f64).collect();
    assert_eq!(temps, expected);
    assert_eq!(latest["last"]["temp"], json!(total as f64));
    println!("✓ Buffer holds records 2..={} in arrival order", total);

    // The log is never truncated.
    let text = fs::read_to_string(dir.path().join("logs/fire_data.csv")).unwrap();
    assert_eq!(text.lines().count(), total + 1);
    println!("✓ Log holds all {} rows", total);
}

#[tokio::test]
async fn test_log_failure_is_server_error() {
    println!("\n=== Test: Log Append Failure ===");
    let (dir, state) = setup();
    let app = router(state);

    // Replace the log file with a directory so the append cannot open it.
    let log_path = dir.path().join("logs/fire_data.csv");
    fs::remove_file(&log_path).unwrap();
    fs::create_dir(&log_path).unwrap();

    let (status, err) =
        post_predict(&app, r#"{"suhu": 80, "kelembapan": 20, "gas": 300, "flame": 1}"#).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(err["status"], json!(500));

    // No rollback: the record already reached the history buffer.
    let latest = get_json(&app, "/latest").await;
    assert_eq!(latest["history"].as_array().unwrap().len(), 1);
    assert_eq!(latest["last"]["status"], json!("FIRE"));
    println!("✓ 500 returned, history kept the record");
}

#[tokio::test]
async fn test_cors_headers_present() {
    println!("\n=== Test: CORS ===");
    let (_dir, state) = setup();
    let app = router(state);

    let req = Request::builder()
        .uri("/latest")
        .header("origin", "http://dashboard.local")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key("access-control-allow-origin"));
    println!("✓ All assertions passed");
}

use axum::{
    body::Bytes,
    extract::State,
    routing::{get, post},
    Json, Router,
};
use parking_lot::RwLock;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    csv_log::CsvLog,
    error::ApiError,
    history::History,
    model::Model,
    types::{LatestOut, PredictOut, PredictionRecord, SensorReading, TIMESTAMP_FORMAT},
};

pub const GREETING: &str = "API Deteksi Dini Kebakaran Online";

// ---------- Server state ----------

#[derive(Clone)]
pub struct AppState {
    pub model: Model,
    pub history: Arc<RwLock<History>>,
    pub log: Arc<CsvLog>,
    pub log_predictions: bool,
}

impl AppState {
    pub fn new(model: Model, log: CsvLog) -> Self {
        Self {
            model,
            history: Arc::new(RwLock::new(History::default())),
            log: Arc::new(log),
            log_predictions: false,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .route("/predict", post(predict))
        .route("/latest", get(latest))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------- Handlers ----------

async fn predict(State(state): State<AppState>, body: Bytes) -> Result<Json<PredictOut>, ApiError> {
    let reading = SensorReading::from_json(&body)?;
    let (prediction, status) = state.model.classify(&reading.features())?;

    if state.log_predictions {
        tracing::info!(
            "recv suhu={:.3} kelembapan={:.3} gas={:.3} flame={:.3} -> {} ({})",
            reading.temperature,
            reading.humidity,
            reading.gas,
            reading.flame,
            status,
            prediction
        );
    }

    let timestamp = chrono::Utc::now().format(TIMESTAMP_FORMAT).to_string();
    let record = PredictionRecord::new(timestamp, &reading, status.clone());

    // History is not rolled back if the log append below fails.
    let evicted = state.history.write().push(record.clone());
    if let Some(evicted) = evicted {
        tracing::debug!("history full; evicted record from {}", evicted.timestamp);
    }
    state.log.append(&record)?;

    Ok(Json(PredictOut { status, prediction }))
}

async fn latest(State(state): State<AppState>) -> Json<LatestOut> {
    let history = state.history.read();
    Json(LatestOut {
        last: history.last().cloned(),
        history: history.snapshot(),
    })
}

async fn home() -> &'static str {
    GREETING
}

async fn health() -> &'static str {
    "OK"
}

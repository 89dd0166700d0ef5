use serde::{ser::SerializeMap, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::ApiError;

/// Timestamp layout shared by the history buffer and the CSV log.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A coerced `/predict` body. Field order is the model's feature order.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SensorReading {
    pub temperature: f64,
    pub humidity: f64,
    pub gas: f64,
    pub flame: f64,
}

impl SensorReading {
    /// Parses a request body: absent fields are 0, numbers pass through,
    /// numeric strings are parsed, booleans become 1/0.
    pub fn from_json(body: &[u8]) -> Result<Self, ApiError> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| ApiError::BadRequest(format!("request body is not valid JSON: {}", e)))?;
        let Value::Object(map) = value else {
            return Err(ApiError::BadRequest("request body must be a JSON object".to_string()));
        };

        Ok(Self {
            temperature: field(&map, "suhu")?,
            humidity: field(&map, "kelembapan")?,
            gas: field(&map, "gas")?,
            flame: field(&map, "flame")?,
        })
    }

    pub fn features(&self) -> [f64; 4] {
        [self.temperature, self.humidity, self.gas, self.flame]
    }
}

fn field(map: &Map<String, Value>, name: &str) -> Result<f64, ApiError> {
    let v = match map.get(name) {
        None => return Ok(0.0),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(Value::Bool(b)) => Some(if *b { 1.0 } else { 0.0 }),
        Some(_) => None,
    };

    match v {
        Some(x) if x.is_finite() => Ok(x),
        Some(_) => Err(ApiError::BadRequest(format!("field `{}` must be a finite number", name))),
        None => Err(ApiError::BadRequest(format!("field `{}` is not a number", name))),
    }
}

/// One classified reading, as kept in history and written to the log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionRecord {
    pub timestamp: String,
    #[serde(rename = "temp")]
    pub temperature: f64,
    #[serde(rename = "hum")]
    pub humidity: f64,
    pub gas: f64,
    pub flame: f64,
    pub status: String,
}

impl PredictionRecord {
    pub fn new(timestamp: String, reading: &SensorReading, status: String) -> Self {
        Self {
            timestamp,
            temperature: reading.temperature,
            humidity: reading.humidity,
            gas: reading.gas,
            flame: reading.flame,
            status,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PredictOut {
    pub status: String,
    pub prediction: i64,
}

#[derive(Debug, Serialize)]
pub struct LatestOut {
    #[serde(serialize_with = "record_or_empty")]
    pub last: Option<PredictionRecord>,
    pub history: Vec<PredictionRecord>,
}

// An empty history reports `last` as `{}` rather than `null`.
fn record_or_empty<S>(last: &Option<PredictionRecord>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match last {
        Some(record) => record.serialize(serializer),
        None => serializer.serialize_map(Some(0))?.end(),
    }
}

use std::{env, path::PathBuf};

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_MODEL_PATH: &str = "model_random_forest.json";
pub const DEFAULT_ENCODER_PATH: &str = "label_encoder.json";
pub const DEFAULT_LOG_CSV: &str = "logs/fire_data.csv";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub model_path: PathBuf,
    pub encoder_path: PathBuf,
    pub log_csv: PathBuf,
    /// Per-prediction info line (`LOG_PRED=1`).
    pub log_predictions: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            encoder_path: PathBuf::from(DEFAULT_ENCODER_PATH),
            log_csv: PathBuf::from(DEFAULT_LOG_CSV),
            log_predictions: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = match lookup("PORT") {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                tracing::warn!("PORT={:?} is not a valid port; using {}", raw, DEFAULT_PORT);
                DEFAULT_PORT
            }),
            None => defaults.port,
        };

        Self {
            port,
            model_path: lookup("MODEL_PATH").map(PathBuf::from).unwrap_or(defaults.model_path),
            encoder_path: lookup("ENCODER_PATH").map(PathBuf::from).unwrap_or(defaults.encoder_path),
            log_csv: lookup("LOG_CSV").map(PathBuf::from).unwrap_or(defaults.log_csv),
            log_predictions: lookup("LOG_PRED").as_deref() == Some("1"),
        }
    }
}

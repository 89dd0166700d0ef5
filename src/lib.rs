//! Fire-risk classification service.
//!
//! Wraps a pre-trained classifier that labels sensor readings
//! (temperature, humidity, gas, flame), keeps the last
//! [`history::MAX_HISTORY`] predictions in memory for a dashboard and
//! appends every prediction to a CSV log.

pub mod app;
pub mod config;
pub mod csv_log;
pub mod error;
pub mod history;
pub mod model;
pub mod types;

pub use app::{router, AppState};
pub use config::Config;
pub use error::{ApiError, ModelError};

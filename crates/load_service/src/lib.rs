//! HTTP adapter for the load prediction core
//!
//! Loads the column schema, metadata and model once at startup and serves
//! predictions, metadata, health and metrics over axum.

pub mod api;
pub mod config;
pub mod errors;
pub mod health;
pub mod logging;
pub mod metrics;

pub use api::{build_router, AppState};
pub use config::{ConfigManager, Environment, ServiceConfig};
pub use errors::{ApiError, ServiceError};
pub use metrics::{MetricsCollector, MetricsSnapshot};

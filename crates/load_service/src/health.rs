//! Readiness report for `/health`

use loadcast_core::Predictor;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub model: ModelInfo,
    pub checks: BTreeMap<String, CheckResult>,
}

/// Loaded artifact summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub kind: String,
    pub fingerprint: String,
    pub metadata_fingerprint: String,
    pub columns: usize,
    pub catalog_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    pub status: CheckStatus,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum CheckStatus {
    Pass,
    Fail,
    Warn,
}

impl CheckResult {
    fn new(status: CheckStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: Some(message.into()),
        }
    }
}

/// Build the report from the loaded predictor
pub fn health_check(
    predictor: &Predictor,
    model_fingerprint: &str,
    uptime_seconds: u64,
) -> HealthResponse {
    let store = predictor.store();
    let catalog_size = store.metadata().product_id_options.len();
    let mut checks = BTreeMap::new();

    let missing = store.missing_numeric_columns();
    checks.insert(
        "column_schema".to_string(),
        if missing.is_empty() {
            CheckResult::new(
                CheckStatus::Pass,
                format!("{} columns", store.schema().len()),
            )
        } else {
            CheckResult::new(
                CheckStatus::Warn,
                format!("no slot for {}", missing.join(", ")),
            )
        },
    );

    let model = predictor.model();
    checks.insert(
        "model".to_string(),
        match model.feature_names() {
            Some(names) => CheckResult::new(
                CheckStatus::Pass,
                format!("{} model fit on {} named columns", model.kind(), names.len()),
            ),
            None => CheckResult::new(
                CheckStatus::Warn,
                format!(
                    "{} model carries no feature names; column order is checked by width only",
                    model.kind()
                ),
            ),
        },
    );

    checks.insert(
        "catalog".to_string(),
        if catalog_size == 0 {
            CheckResult::new(
                CheckStatus::Warn,
                "metadata lists no products; catalog defaults are unavailable",
            )
        } else {
            CheckResult::new(CheckStatus::Pass, format!("{catalog_size} products"))
        },
    );

    HealthResponse {
        status: determine_health_status(&checks),
        timestamp: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds,
        model: ModelInfo {
            kind: predictor.model().kind().to_string(),
            fingerprint: model_fingerprint.to_string(),
            metadata_fingerprint: store.fingerprint().to_string(),
            columns: store.schema().len(),
            catalog_size,
        },
        checks,
    }
}

/// Any failing check makes the service unhealthy; any warning degrades it
pub fn determine_health_status(checks: &BTreeMap<String, CheckResult>) -> HealthStatus {
    let has_fail = checks.values().any(|c| c.status == CheckStatus::Fail);
    let has_warn = checks.values().any(|c| c.status == CheckStatus::Warn);

    if has_fail {
        HealthStatus::Unhealthy
    } else if has_warn {
        HealthStatus::Degraded
    } else {
        HealthStatus::Healthy
    }
}

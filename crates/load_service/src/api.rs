//! HTTP routes

use crate::config::{ArtifactPaths, CorsConfig};
use crate::errors::{ApiError, Result};
use crate::health::{health_check, HealthResponse};
use crate::metrics::MetricsCollector;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Request, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use loadcast_core::{
    MetadataStore, MetadataView, ModelArtifact, PredictionRequest, PredictionResult, Predictor,
    Regressor,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Loaded artifacts plus request counters
#[derive(Debug, Clone)]
pub struct AppState {
    predictor: Predictor,
    model_fingerprint: String,
    metrics: MetricsCollector,
}

type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(predictor: Predictor, model_fingerprint: impl Into<String>) -> Self {
        Self {
            predictor,
            model_fingerprint: model_fingerprint.into(),
            metrics: MetricsCollector::new(),
        }
    }

    /// Load every artifact; the service must not start if any of them fails
    pub fn load(paths: &ArtifactPaths) -> Result<Self> {
        let store = MetadataStore::load(&paths.columns_path, &paths.metadata_path)?;
        let model = ModelArtifact::load_json(&paths.model_path)?;
        let fingerprint = model.fingerprint()?;
        let kind = model.kind();

        let predictor = Predictor::new(Arc::new(store), Arc::new(model))?;
        info!(
            model = kind,
            model_fingerprint = %fingerprint,
            columns = predictor.store().schema().len(),
            products = predictor.store().metadata().product_id_options.len(),
            "artifacts loaded"
        );
        Ok(Self::new(predictor, fingerprint))
    }

    pub fn predictor(&self) -> &Predictor {
        &self.predictor
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RootResponse {
    pub status: String,
    pub message: String,
    pub model_loaded: bool,
}

pub fn build_router(state: AppState, cors: &CorsConfig) -> Router {
    let shared = Arc::new(state);
    Router::new()
        .route("/", get(handle_root))
        .route("/health", get(handle_health))
        .route("/metrics", get(handle_metrics))
        .route("/api/metadata", get(handle_metadata))
        .route("/api/predict", post(handle_predict))
        .layer(middleware::from_fn_with_state(
            shared.clone(),
            track_requests,
        ))
        .layer(cors_layer(cors))
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}

fn cors_layer(cors: &CorsConfig) -> CorsLayer {
    if cors.allows_any() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = cors
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn track_requests(State(state): State<SharedState>, request: Request, next: Next) -> Response {
    let started = Instant::now();
    let response = next.run(request).await;
    let success = !(response.status().is_client_error() || response.status().is_server_error());
    state
        .metrics
        .record_request(success, started.elapsed().as_millis() as u64);
    response
}

async fn handle_root() -> Json<RootResponse> {
    Json(RootResponse {
        status: "ok".to_string(),
        message: "Optimal Load Prediction API is running".to_string(),
        model_loaded: true,
    })
}

async fn handle_health(State(state): State<SharedState>) -> Json<HealthResponse> {
    state.metrics.record_health();
    Json(health_check(
        &state.predictor,
        &state.model_fingerprint,
        state.metrics.uptime_seconds(),
    ))
}

async fn handle_metrics(State(state): State<SharedState>) -> Response {
    let body = state.metrics.get_snapshot().render_prometheus();
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response()
}

async fn handle_metadata(State(state): State<SharedState>) -> Json<MetadataView> {
    state.metrics.record_metadata();
    Json(state.predictor.store().view())
}

async fn handle_predict(
    State(state): State<SharedState>,
    payload: std::result::Result<Json<PredictionRequest>, JsonRejection>,
) -> std::result::Result<Json<Vec<PredictionResult>>, ApiError> {
    let Json(request) = payload?;
    state.metrics.record_predict(request.products.len());
    let results = state.predictor.predict(&request)?;
    Ok(Json(results))
}

//! Prediction Service
//!
//! Validates a request, derives the shared flight context once, assembles
//! the feature matrix and scores it in a single model call. Scores are
//! rounded half-to-even into the recommended load; any unusable score
//! fails the whole batch.

use crate::batch::{assemble_batch, FeatureMatrix};
use crate::errors::{LoadCoreError, Result};
use crate::features::{FlightContext, ProductLineItem};
use crate::metadata::MetadataStore;
use crate::model::{check_schema, Regressor};
use crate::temporal::{parse_flight_date, TemporalFeatures};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, instrument, warn};

/// One product in a prediction request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRequest {
    pub id: String,
    pub name: String,
    pub proposed_qty: i64,
}

/// Prediction request as exchanged with callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionRequest {
    pub products: Vec<ProductRequest>,
    pub flight_date: String,
    pub origin: String,
    pub flight_type: String,
    pub service_type: String,
    pub passengers: i64,
}

/// Recommended load for one product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResult {
    pub id: String,
    pub name: String,
    pub proposed_qty: i64,
    pub optimal: i64,
    pub diff: i64,
}

/// Totals over a result list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionSummary {
    pub products: usize,
    pub total_proposed: i64,
    pub total_optimal: i64,
    pub total_diff: i64,
}

impl PredictionSummary {
    pub fn from_results(results: &[PredictionResult]) -> Self {
        results.iter().fold(Self::default(), |mut acc, r| {
            acc.products += 1;
            acc.total_proposed = acc.total_proposed.saturating_add(r.proposed_qty);
            acc.total_optimal = acc.total_optimal.saturating_add(r.optimal);
            acc.total_diff = acc.total_diff.saturating_add(r.diff);
            acc
        })
    }
}

impl PredictionRequest {
    /// Reject malformed input before any feature is built
    pub fn validate(&self) -> Result<TemporalFeatures> {
        if self.passengers < 0 {
            return Err(LoadCoreError::InvalidRequest(format!(
                "passengers must not be negative (got {})",
                self.passengers
            )));
        }
        if let Some(product) = self.products.iter().find(|p| p.proposed_qty < 0) {
            return Err(LoadCoreError::InvalidRequest(format!(
                "proposedQty for product '{}' must not be negative (got {})",
                product.id, product.proposed_qty
            )));
        }
        let date = parse_flight_date(&self.flight_date)?;
        Ok(TemporalFeatures::from_date(date))
    }

    /// Shared context for every row of this request
    pub fn flight_context(&self, temporal: TemporalFeatures) -> FlightContext {
        FlightContext {
            origin: self.origin.clone(),
            flight_type: self.flight_type.clone(),
            service_type: self.service_type.clone(),
            passenger_count: self.passengers,
            temporal,
        }
    }

    pub fn line_items(&self) -> Vec<ProductLineItem> {
        self.products
            .iter()
            .map(|p| ProductLineItem {
                product_id: p.id.clone(),
                name: p.name.clone(),
                proposed_qty: p.proposed_qty as f64,
            })
            .collect()
    }

    /// A request covering the whole catalog at default quantities
    pub fn for_catalog(
        store: &MetadataStore,
        flight_date: impl Into<String>,
        origin: impl Into<String>,
        flight_type: impl Into<String>,
        service_type: impl Into<String>,
        passengers: i64,
    ) -> Self {
        Self {
            products: store
                .catalog_defaults()
                .into_iter()
                .map(|entry| ProductRequest {
                    id: entry.id,
                    name: entry.name,
                    proposed_qty: entry.default_qty,
                })
                .collect(),
            flight_date: flight_date.into(),
            origin: origin.into(),
            flight_type: flight_type.into(),
            service_type: service_type.into(),
            passengers,
        }
    }
}

/// 2^63, the first magnitude `i64` cannot hold
const I64_LIMIT: f64 = 9_223_372_036_854_775_808.0;

/// Round a model score the way float64 `round()` does (ties to even)
///
/// `None` when the rounded score is not a representable `i64`.
pub fn round_score(score: f64) -> Option<i64> {
    let rounded = score.round_ties_even();
    if rounded.is_finite() && (-I64_LIMIT..I64_LIMIT).contains(&rounded) {
        Some(rounded as i64)
    } else {
        None
    }
}

/// Metadata store and model, shared read-only by all requests
#[derive(Clone)]
pub struct Predictor {
    store: Arc<MetadataStore>,
    model: Arc<dyn Regressor>,
}

impl std::fmt::Debug for Predictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Predictor")
            .field("columns", &self.store.schema().len())
            .field("model", &self.model.kind())
            .finish()
    }
}

impl Predictor {
    /// Pair a store with a model, refusing a model that cannot read the schema
    pub fn new(store: Arc<MetadataStore>, model: Arc<dyn Regressor>) -> Result<Self> {
        check_schema(model.as_ref(), store.schema())?;
        Ok(Self { store, model })
    }

    pub fn store(&self) -> &MetadataStore {
        &self.store
    }

    pub fn model(&self) -> &dyn Regressor {
        self.model.as_ref()
    }

    /// Validate and assemble the feature matrix for a request
    pub fn features(&self, request: &PredictionRequest) -> Result<FeatureMatrix> {
        let temporal = request.validate()?;
        if request.passengers == 0 {
            warn!("request has zero passengers; Spec_per_Passenger will be very large");
        }
        let context = request.flight_context(temporal);
        Ok(assemble_batch(&self.store, &context, &request.line_items()))
    }

    #[instrument(skip_all, fields(products = request.products.len(), origin = %request.origin))]
    pub fn predict(&self, request: &PredictionRequest) -> Result<Vec<PredictionResult>> {
        let matrix = self.features(request)?;
        if matrix.is_empty() {
            return Ok(Vec::new());
        }

        let scores = self.model.predict(&matrix)?;
        if scores.len() != matrix.n_rows() {
            error!(
                expected = matrix.n_rows(),
                got = scores.len(),
                "model returned wrong number of scores"
            );
            return Err(LoadCoreError::Inference(format!(
                "model returned {} scores for {} rows",
                scores.len(),
                matrix.n_rows()
            )));
        }
        if let Some(idx) = scores.iter().position(|s| !s.is_finite()) {
            error!(row = idx, product = %request.products[idx].id, "non-finite model score");
            return Err(LoadCoreError::Inference(format!(
                "model returned a non-finite score for product '{}'",
                request.products[idx].id
            )));
        }

        let mut results = Vec::with_capacity(scores.len());
        for (product, score) in request.products.iter().zip(scores) {
            let optimal = round_score(score).ok_or_else(|| {
                error!(product = %product.id, score, "model score outside integer range");
                LoadCoreError::Inference(format!(
                    "model score {score} for product '{}' is outside the integer range",
                    product.id
                ))
            })?;
            let diff = optimal.checked_sub(product.proposed_qty).ok_or_else(|| {
                error!(product = %product.id, optimal, "load difference overflows");
                LoadCoreError::Inference(format!(
                    "difference between optimal {optimal} and proposed {} for product '{}' overflows",
                    product.proposed_qty, product.id
                ))
            })?;
            results.push(PredictionResult {
                id: product.id.clone(),
                name: product.name.clone(),
                proposed_qty: product.proposed_qty,
                optimal,
                diff,
            });
        }

        debug!(summary = ?PredictionSummary::from_results(&results), "batch scored");
        Ok(results)
    }
}

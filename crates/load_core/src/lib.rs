//! Optimal catering load prediction core
//!
//! Turns a flight-level prediction request into the exact feature matrix a
//! trained regression model expects and packages the model's scores as
//! per-product load recommendations.
//!
//! Modules:
//! - `metadata`: column schema and training-time metadata (load once, read only)
//! - `temporal`: calendar features derived from the flight date
//! - `features`: schema-driven feature row builder
//! - `batch`: feature matrix assembly for a list of products
//! - `model`: model artifacts and the `Regressor` scoring seam
//! - `prediction`: request validation, scoring and result packaging
//! - `fingerprint`: canonical JSON hashing of artifacts

pub mod batch;
pub mod errors;
pub mod features;
pub mod fingerprint;
pub mod metadata;
pub mod model;
pub mod prediction;
pub mod temporal;

pub use batch::{assemble_batch, FeatureMatrix};
pub use errors::{LoadCoreError, Result};
pub use features::{FeatureRow, FeatureRowBuilder, FlightContext, ProductLineItem, EPSILON};
pub use metadata::{
    CatalogDefault, ColumnSchema, Metadata, MetadataStore, MetadataView, OneHotPrefixes,
    ProductHistory,
};
pub use model::{check_schema, ModelArtifact, Regressor};
pub use prediction::{
    round_score, PredictionRequest, PredictionResult, PredictionSummary, Predictor,
    ProductRequest,
};
pub use temporal::{parse_flight_date, TemporalFeatures};

/// Crate version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

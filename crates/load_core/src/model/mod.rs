//! Trained model artifacts
//!
//! The predictor only needs one capability from a model: given a matrix of
//! N feature rows, return N scores. [`Regressor`] is that seam; the
//! [`ModelArtifact`] enum is the on-disk format for the regressors shipped
//! with this crate.
//!
//! # Artifact format
//!
//! ```json
//! {
//!   "kind": "tree_ensemble",
//!   "version": 1,
//!   "aggregation": "mean",
//!   "base_score": 0.0,
//!   "trees": [
//!     {
//!       "nodes": [
//!         {"id":0,"left":1,"right":2,"feature":1,"threshold":90.5,"leaf":null},
//!         {"id":1,"left":-1,"right":-1,"feature":-1,"threshold":0.0,"leaf":64.0},
//!         {"id":2,"left":-1,"right":-1,"feature":-1,"threshold":0.0,"leaf":118.0}
//!       ],
//!       "weight": 1.0
//!     }
//!   ],
//!   "feature_names": ["Passenger_Count", "Standard_Specification_Qty"]
//! }
//! ```
//!
//! or `{"kind": "linear", "intercept": ..., "coefficients": [...]}`.

pub mod ensemble;
pub mod linear;
pub mod tree;

pub use ensemble::{Aggregation, TreeEnsemble};
pub use linear::LinearModel;
pub use tree::{Node, Tree};

use crate::batch::FeatureMatrix;
use crate::errors::{LoadCoreError, Result};
use crate::fingerprint::{canonical_json, fingerprint_hex};
use crate::metadata::ColumnSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// Opaque scoring capability over a feature matrix
///
/// Implementations are shared across concurrent requests, so they must be
/// safe to call from many threads at once. A model that is not should wrap
/// itself in a lock or a dedicated worker before implementing this trait.
pub trait Regressor: Send + Sync {
    /// Short model family name for health reporting
    fn kind(&self) -> &'static str;

    /// Score a single row
    fn score_row(&self, row: &[f64]) -> f64;

    /// Score every row of the matrix, in order
    fn predict(&self, matrix: &FeatureMatrix) -> Result<Vec<f64>> {
        Ok(matrix
            .rows()
            .iter()
            .map(|row| self.score_row(row.values()))
            .collect())
    }

    /// Column names the model was fit on, when the artifact records them
    fn feature_names(&self) -> Option<&[String]> {
        None
    }

    /// Minimum row width the model can read
    fn min_width(&self) -> usize {
        0
    }

    /// Exact row width the model requires, if it has one
    fn exact_width(&self) -> Option<usize> {
        None
    }
}

/// Serialized model artifact
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    TreeEnsemble(TreeEnsemble),
    Linear(LinearModel),
}

impl ModelArtifact {
    pub fn validate(&self) -> Result<()> {
        match self {
            ModelArtifact::TreeEnsemble(model) => model.validate(),
            ModelArtifact::Linear(model) => model.validate(),
        }
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let artifact: ModelArtifact = serde_json::from_str(&json)?;
        artifact.validate()?;
        info!(
            kind = artifact.kind(),
            path = %path.display(),
            "model artifact loaded"
        );
        Ok(artifact)
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, canonical_json(self)?)?;
        Ok(())
    }

    pub fn fingerprint(&self) -> Result<String> {
        fingerprint_hex(self)
    }
}

impl Regressor for ModelArtifact {
    fn kind(&self) -> &'static str {
        match self {
            ModelArtifact::TreeEnsemble(model) => match model.aggregation {
                Aggregation::Mean => "random_forest",
                Aggregation::Sum => "boosted_trees",
            },
            ModelArtifact::Linear(_) => "linear",
        }
    }

    fn score_row(&self, row: &[f64]) -> f64 {
        match self {
            ModelArtifact::TreeEnsemble(model) => model.score(row),
            ModelArtifact::Linear(model) => model.score(row),
        }
    }

    fn feature_names(&self) -> Option<&[String]> {
        match self {
            ModelArtifact::TreeEnsemble(model) => model.feature_names.as_deref(),
            ModelArtifact::Linear(model) => model.feature_names.as_deref(),
        }
    }

    fn min_width(&self) -> usize {
        match self {
            ModelArtifact::TreeEnsemble(model) => model.min_width(),
            ModelArtifact::Linear(model) => model.coefficients.len(),
        }
    }

    fn exact_width(&self) -> Option<usize> {
        match self {
            ModelArtifact::TreeEnsemble(_) => None,
            ModelArtifact::Linear(model) => Some(model.coefficients.len()),
        }
    }
}

/// Check that a model can consume rows laid out by `schema`
pub fn check_schema(model: &dyn Regressor, schema: &ColumnSchema) -> Result<()> {
    if let Some(names) = model.feature_names() {
        if names != schema.names() {
            let first_diff = names
                .iter()
                .zip(schema.names())
                .position(|(a, b)| a != b)
                .unwrap_or_else(|| names.len().min(schema.len()));
            return Err(LoadCoreError::SchemaMismatch(format!(
                "model was fit on {} columns, schema has {}; first difference at position {}",
                names.len(),
                schema.len(),
                first_diff
            )));
        }
    }

    if let Some(width) = model.exact_width() {
        if width != schema.len() {
            return Err(LoadCoreError::SchemaMismatch(format!(
                "model expects {} features, schema has {}",
                width,
                schema.len()
            )));
        }
    }

    if model.min_width() > schema.len() {
        return Err(LoadCoreError::SchemaMismatch(format!(
            "model reads feature index {} but schema has {} columns",
            model.min_width() - 1,
            schema.len()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn schema(names: &[&str]) -> ColumnSchema {
        ColumnSchema::new(names.iter().map(|n| n.to_string()).collect()).unwrap()
    }

    fn stump_forest() -> ModelArtifact {
        let tree = Tree::new(
            vec![
                Node::split(0, 1, 10.0, 1, 2),
                Node::leaf(1, 5.0),
                Node::leaf(2, 15.0),
            ],
            1.0,
        );
        ModelArtifact::TreeEnsemble(TreeEnsemble::new(Aggregation::Mean, 0.0, vec![tree]))
    }

    #[test]
    fn parses_tagged_artifacts() {
        let linear: ModelArtifact = serde_json::from_str(
            r#"{"kind":"linear","intercept":1.0,"coefficients":[2.0,3.0]}"#,
        )
        .unwrap();
        assert_eq!(linear.kind(), "linear");
        assert_eq!(linear.score_row(&[1.0, 1.0]), 6.0);

        let unknown = serde_json::from_str::<ModelArtifact>(r#"{"kind":"svr"}"#);
        assert!(unknown.is_err());
    }

    #[test]
    fn save_and_load_preserve_model_and_fingerprint() {
        let model = stump_forest();
        let file = NamedTempFile::new().unwrap();
        model.save_json(file.path()).unwrap();

        let loaded = ModelArtifact::load_json(file.path()).unwrap();
        assert_eq!(model, loaded);
        assert_eq!(model.fingerprint().unwrap(), loaded.fingerprint().unwrap());
        assert_eq!(loaded.kind(), "random_forest");
    }

    #[test]
    fn load_rejects_invalid_trees() {
        let file = NamedTempFile::new().unwrap();
        fs::write(
            file.path(),
            r#"{"kind":"tree_ensemble","version":1,"aggregation":"sum","trees":[{"nodes":[]}]}"#,
        )
        .unwrap();
        assert!(matches!(
            ModelArtifact::load_json(file.path()),
            Err(LoadCoreError::InvalidArtifact(_))
        ));
    }

    #[test]
    fn schema_check_compares_feature_names() {
        let ok = ModelArtifact::Linear(LinearModel {
            intercept: 0.0,
            coefficients: vec![1.0, 1.0],
            feature_names: Some(vec!["Month".into(), "Quarter".into()]),
        });
        assert!(check_schema(&ok, &schema(&["Month", "Quarter"])).is_ok());

        let swapped = check_schema(&ok, &schema(&["Quarter", "Month"]));
        assert!(matches!(swapped, Err(LoadCoreError::SchemaMismatch(_))));
    }

    #[test]
    fn schema_check_compares_widths() {
        let linear = ModelArtifact::Linear(LinearModel::new(0.0, vec![1.0, 1.0, 1.0]));
        assert!(check_schema(&linear, &schema(&["A", "B"])).is_err());

        let forest = stump_forest();
        assert!(check_schema(&forest, &schema(&["A"])).is_err());
        assert!(check_schema(&forest, &schema(&["A", "B", "C"])).is_ok());
    }

    #[test]
    fn default_predict_scores_rows_in_order() {
        use crate::batch::assemble_batch;
        use crate::features::{FlightContext, ProductLineItem};
        use crate::metadata::{Metadata, MetadataStore, OneHotPrefixes};
        use crate::temporal::TemporalFeatures;
        use std::collections::BTreeMap;

        let metadata = Metadata {
            onehot_prefixes: OneHotPrefixes {
                origin: "Origin_".into(),
                flight_type: "Flight_Type_".into(),
                service_type: "Service_Type_".into(),
                product_id: "Product_ID_".into(),
            },
            avg_by_product: BTreeMap::new(),
            origin_options: vec![],
            flight_type_options: vec![],
            service_type_options: vec![],
            product_id_options: vec![],
            product_id_to_name: BTreeMap::new(),
            per_product_qty_median: BTreeMap::new(),
        };
        let store = MetadataStore::new(
            schema(&["Passenger_Count", "Standard_Specification_Qty"]),
            metadata,
        )
        .unwrap();
        let flight = FlightContext {
            origin: "JFK".into(),
            flight_type: "Long-Haul".into(),
            service_type: "Economy".into(),
            passenger_count: 100,
            temporal: TemporalFeatures {
                month: 1,
                day_of_week: 0,
                is_weekend: 0,
                quarter: 1,
            },
        };
        let items: Vec<ProductLineItem> = [4.0, 40.0]
            .iter()
            .map(|qty| ProductLineItem {
                product_id: "X".into(),
                name: String::new(),
                proposed_qty: *qty,
            })
            .collect();

        let matrix = assemble_batch(&store, &flight, &items);
        let scores = stump_forest().predict(&matrix).unwrap();
        assert_eq!(scores, vec![5.0, 15.0]);
    }
}

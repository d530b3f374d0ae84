//! Metadata Store
//!
//! Read-only reference data produced alongside the trained model:
//! - the ordered column schema the model was fit on
//! - one-hot prefixes per categorical field
//! - option sets, catalog names and default quantities for UIs
//! - per-product historical averages used as features
//!
//! The store is loaded once at startup and shared behind an `Arc`; nothing
//! mutates it afterwards.

use crate::errors::{LoadCoreError, Result};
use crate::features::columns;
use crate::fingerprint::fingerprint_hex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Default proposed quantity when a product has no recorded median
pub const FALLBACK_DEFAULT_QTY: i64 = 100;

/// Ordered feature columns with a name → position index
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSchema {
    columns: Vec<String>,
    positions: HashMap<String, usize>,
}

impl ColumnSchema {
    /// Build a schema, rejecting empty or duplicated column lists
    pub fn new(columns: Vec<String>) -> Result<Self> {
        if columns.is_empty() {
            return Err(LoadCoreError::InvalidArtifact(
                "column schema is empty".to_string(),
            ));
        }

        let mut positions = HashMap::with_capacity(columns.len());
        for (idx, name) in columns.iter().enumerate() {
            if positions.insert(name.clone(), idx).is_some() {
                return Err(LoadCoreError::InvalidArtifact(format!(
                    "column schema lists '{name}' more than once"
                )));
            }
        }

        Ok(Self { columns, positions })
    }

    /// Load a schema from a JSON array of column names
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        let columns: Vec<String> = serde_json::from_str(&json)?;
        Self::new(columns)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.columns
    }

    /// Position of a column, if the schema has it
    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }
}

/// Prefixes used to name one-hot columns (`prefix + value`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OneHotPrefixes {
    #[serde(rename = "Origin")]
    pub origin: String,
    #[serde(rename = "Flight_Type")]
    pub flight_type: String,
    #[serde(rename = "Service_Type")]
    pub service_type: String,
    #[serde(rename = "Product_ID")]
    pub product_id: String,
}

/// Historical averages for one product
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductHistory {
    #[serde(rename = "Avg_Consumed_Product", default)]
    pub avg_consumed: f64,
    #[serde(rename = "Avg_Returned_Product", default)]
    pub avg_returned: f64,
}

/// Training-time metadata, as stored in `metadata.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub onehot_prefixes: OneHotPrefixes,
    pub avg_by_product: BTreeMap<String, ProductHistory>,
    #[serde(default)]
    pub origin_options: Vec<String>,
    #[serde(default)]
    pub flight_type_options: Vec<String>,
    #[serde(default)]
    pub service_type_options: Vec<String>,
    #[serde(default)]
    pub product_id_options: Vec<String>,
    #[serde(default)]
    pub product_id_to_name: BTreeMap<String, String>,
    #[serde(default)]
    pub per_product_qty_median: BTreeMap<String, f64>,
}

impl Metadata {
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        let metadata: Metadata = serde_json::from_str(&json)?;
        metadata.validate()?;
        Ok(metadata)
    }

    /// Reject metadata whose numeric entries cannot be used as features
    pub fn validate(&self) -> Result<()> {
        for (product_id, history) in &self.avg_by_product {
            if !history.avg_consumed.is_finite() || !history.avg_returned.is_finite() {
                return Err(LoadCoreError::InvalidArtifact(format!(
                    "historical averages for product '{product_id}' are not finite"
                )));
            }
        }
        Ok(())
    }
}

/// Option lists and defaults exposed to UIs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataView {
    pub origin_options: Vec<String>,
    pub flight_type_options: Vec<String>,
    pub service_type_options: Vec<String>,
    pub product_id_options: Vec<String>,
    pub product_id_to_name: BTreeMap<String, String>,
    pub per_product_qty_median: BTreeMap<String, f64>,
}

/// Catalog entry with its default proposed quantity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogDefault {
    pub id: String,
    pub name: String,
    pub default_qty: i64,
}

/// Column schema plus metadata, loaded once and shared read-only
#[derive(Debug, Clone)]
pub struct MetadataStore {
    schema: ColumnSchema,
    metadata: Metadata,
    fingerprint: String,
}

impl MetadataStore {
    pub fn new(schema: ColumnSchema, metadata: Metadata) -> Result<Self> {
        metadata.validate()?;
        let fingerprint = fingerprint_hex(&(schema.names(), &metadata))?;

        let store = Self {
            schema,
            metadata,
            fingerprint,
        };
        let missing = store.missing_numeric_columns();
        if !missing.is_empty() {
            warn!(
                "column schema has no slot for {:?}; these features will not be written",
                missing
            );
        }
        Ok(store)
    }

    /// Numeric feature columns the schema has no slot for
    pub fn missing_numeric_columns(&self) -> Vec<&'static str> {
        columns::NUMERIC
            .iter()
            .copied()
            .filter(|name| !self.schema.contains(name))
            .collect()
    }

    /// Load both artifacts; any failure is fatal for serving
    pub fn load<P: AsRef<Path>, Q: AsRef<Path>>(columns_path: P, metadata_path: Q) -> Result<Self> {
        let columns_path = columns_path.as_ref();
        let metadata_path = metadata_path.as_ref();

        let schema = ColumnSchema::load_json(columns_path).map_err(|e| {
            LoadCoreError::InvalidArtifact(format!(
                "failed to load column schema from {}: {e}",
                columns_path.display()
            ))
        })?;
        let metadata = Metadata::load_json(metadata_path).map_err(|e| {
            LoadCoreError::InvalidArtifact(format!(
                "failed to load metadata from {}: {e}",
                metadata_path.display()
            ))
        })?;

        let store = Self::new(schema, metadata)?;
        info!(
            columns = store.schema.len(),
            products = store.metadata.product_id_options.len(),
            fingerprint = %store.fingerprint,
            "metadata store loaded"
        );
        Ok(store)
    }

    pub fn schema(&self) -> &ColumnSchema {
        &self.schema
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn prefixes(&self) -> &OneHotPrefixes {
        &self.metadata.onehot_prefixes
    }

    /// Historical averages for a product; unseen products read as zero
    pub fn history(&self, product_id: &str) -> ProductHistory {
        self.metadata
            .avg_by_product
            .get(product_id)
            .copied()
            .unwrap_or_default()
    }

    pub fn product_name(&self, product_id: &str) -> Option<&str> {
        self.metadata
            .product_id_to_name
            .get(product_id)
            .map(String::as_str)
    }

    /// Default proposed quantity: the historical median, truncated
    pub fn default_qty(&self, product_id: &str) -> i64 {
        self.metadata
            .per_product_qty_median
            .get(product_id)
            .filter(|qty| qty.is_finite())
            .map(|qty| qty.trunc() as i64)
            .unwrap_or(FALLBACK_DEFAULT_QTY)
    }

    /// One entry per catalog product, in `product_id_options` order
    pub fn catalog_defaults(&self) -> Vec<CatalogDefault> {
        self.metadata
            .product_id_options
            .iter()
            .map(|id| CatalogDefault {
                id: id.clone(),
                name: self.product_name(id).unwrap_or_default().to_string(),
                default_qty: self.default_qty(id),
            })
            .collect()
    }

    pub fn view(&self) -> MetadataView {
        let m = &self.metadata;
        MetadataView {
            origin_options: m.origin_options.clone(),
            flight_type_options: m.flight_type_options.clone(),
            service_type_options: m.service_type_options.clone(),
            product_id_options: m.product_id_options.clone(),
            product_id_to_name: m.product_id_to_name.clone(),
            per_product_qty_median: m.per_product_qty_median.clone(),
        }
    }

    /// blake3 fingerprint of schema and metadata together
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

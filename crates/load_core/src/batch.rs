//! Batch Assembler
//!
//! Applies the row builder to every product of a request, in request order,
//! sharing a single flight context (and so a single set of temporal
//! features) across the whole batch.

use crate::features::{FeatureRow, FeatureRowBuilder, FlightContext, ProductLineItem};
use crate::metadata::MetadataStore;

/// Ordered feature rows of equal width
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    width: usize,
    rows: Vec<FeatureRow>,
}

impl FeatureMatrix {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    pub fn row(&self, idx: usize) -> Option<&[f64]> {
        self.rows.get(idx).map(FeatureRow::values)
    }
}

/// Build one row per item; row `i` corresponds to `items[i]`
pub fn assemble_batch(
    store: &MetadataStore,
    flight: &FlightContext,
    items: &[ProductLineItem],
) -> FeatureMatrix {
    let builder = FeatureRowBuilder::new(store);
    let rows = items.iter().map(|item| builder.build(flight, item)).collect();
    FeatureMatrix {
        width: store.schema().len(),
        rows,
    }
}

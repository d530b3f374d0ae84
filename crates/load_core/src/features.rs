//! Feature Row Builder
//!
//! Turns one (flight context, product line item) pair into a row laid out
//! exactly like the column schema. Every value is written by looking up its
//! column name in the schema; names the schema does not know are dropped,
//! never appended.

use crate::metadata::MetadataStore;
use crate::temporal::TemporalFeatures;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Guard added to the passenger count before dividing
pub const EPSILON: f64 = 1e-9;

/// Column names written by the builder
pub mod columns {
    pub const PASSENGER_COUNT: &str = "Passenger_Count";
    pub const STANDARD_SPECIFICATION_QTY: &str = "Standard_Specification_Qty";
    pub const MONTH: &str = "Month";
    pub const DAY_OF_WEEK: &str = "DayOfWeek";
    pub const IS_WEEKEND: &str = "IsWeekend";
    pub const QUARTER: &str = "Quarter";
    pub const AVG_CONSUMED_PRODUCT: &str = "Avg_Consumed_Product";
    pub const AVG_RETURNED_PRODUCT: &str = "Avg_Returned_Product";
    pub const SPEC_PER_PASSENGER: &str = "Spec_per_Passenger";
    pub const SPEC_X_PASSENGERS: &str = "Spec_x_Passengers";

    pub const NUMERIC: [&str; 10] = [
        PASSENGER_COUNT,
        STANDARD_SPECIFICATION_QTY,
        MONTH,
        DAY_OF_WEEK,
        IS_WEEKEND,
        QUARTER,
        AVG_CONSUMED_PRODUCT,
        AVG_RETURNED_PRODUCT,
        SPEC_PER_PASSENGER,
        SPEC_X_PASSENGERS,
    ];
}

/// Request-wide flight attributes, shared by every product row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightContext {
    pub origin: String,
    pub flight_type: String,
    pub service_type: String,
    pub passenger_count: i64,
    pub temporal: TemporalFeatures,
}

/// One product to score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductLineItem {
    pub product_id: String,
    /// Carried through to results; not a feature
    pub name: String,
    pub proposed_qty: f64,
}

/// Fixed-width numeric row, positioned by the column schema
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    values: Vec<f64>,
}

impl FeatureRow {
    fn zeros(width: usize) -> Self {
        Self {
            values: vec![0.0; width],
        }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Builds schema-shaped rows from a metadata store
#[derive(Debug, Clone, Copy)]
pub struct FeatureRowBuilder<'a> {
    store: &'a MetadataStore,
}

impl<'a> FeatureRowBuilder<'a> {
    pub fn new(store: &'a MetadataStore) -> Self {
        Self { store }
    }

    pub fn build(&self, flight: &FlightContext, item: &ProductLineItem) -> FeatureRow {
        let schema = self.store.schema();
        let mut row = FeatureRow::zeros(schema.len());

        let passengers = flight.passenger_count as f64;
        let qty = item.proposed_qty;
        let temporal = &flight.temporal;
        let history = self.store.history(&item.product_id);

        let numeric = [
            (columns::PASSENGER_COUNT, passengers),
            (columns::STANDARD_SPECIFICATION_QTY, qty),
            (columns::MONTH, f64::from(temporal.month)),
            (columns::DAY_OF_WEEK, f64::from(temporal.day_of_week)),
            (columns::IS_WEEKEND, f64::from(temporal.is_weekend)),
            (columns::QUARTER, f64::from(temporal.quarter)),
            (columns::AVG_CONSUMED_PRODUCT, history.avg_consumed),
            (columns::AVG_RETURNED_PRODUCT, history.avg_returned),
            (columns::SPEC_PER_PASSENGER, qty / (passengers + EPSILON)),
            (columns::SPEC_X_PASSENGERS, qty * passengers),
        ];
        for (name, value) in numeric {
            if let Some(idx) = schema.position(name) {
                row.values[idx] = value;
            }
        }

        let prefixes = self.store.prefixes();
        let categorical = [
            (&prefixes.origin, flight.origin.as_str()),
            (&prefixes.flight_type, flight.flight_type.as_str()),
            (&prefixes.service_type, flight.service_type.as_str()),
            (&prefixes.product_id, item.product_id.as_str()),
        ];
        for (prefix, value) in categorical {
            let column = format!("{prefix}{value}");
            match schema.position(&column) {
                Some(idx) => row.values[idx] = 1.0,
                None => debug!(column = %column, "no one-hot column for value; left unset"),
            }
        }

        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{ColumnSchema, Metadata, MetadataStore, OneHotPrefixes, ProductHistory};
    use std::collections::BTreeMap;

    fn store(columns: &[&str]) -> MetadataStore {
        let mut avg_by_product = BTreeMap::new();
        avg_by_product.insert(
            "DRK023".to_string(),
            ProductHistory {
                avg_consumed: 61.5,
                avg_returned: 38.5,
            },
        );
        let metadata = Metadata {
            onehot_prefixes: OneHotPrefixes {
                origin: "Origin_".into(),
                flight_type: "Flight_Type_".into(),
                service_type: "Service_Type_".into(),
                product_id: "Product_ID_".into(),
            },
            avg_by_product,
            origin_options: vec!["JFK".into()],
            flight_type_options: vec![],
            service_type_options: vec![],
            product_id_options: vec![],
            product_id_to_name: BTreeMap::new(),
            per_product_qty_median: BTreeMap::new(),
        };
        let schema = ColumnSchema::new(columns.iter().map(|c| c.to_string()).collect()).unwrap();
        MetadataStore::new(schema, metadata).unwrap()
    }

    fn flight(passengers: i64) -> FlightContext {
        FlightContext {
            origin: "JFK".into(),
            flight_type: "Long-Haul".into(),
            service_type: "Economy".into(),
            passenger_count: passengers,
            temporal: TemporalFeatures {
                month: 9,
                day_of_week: 0,
                is_weekend: 0,
                quarter: 3,
            },
        }
    }

    fn item(id: &str, qty: f64) -> ProductLineItem {
        ProductLineItem {
            product_id: id.into(),
            name: String::new(),
            proposed_qty: qty,
        }
    }

    #[test]
    fn row_width_matches_schema() {
        let store = store(&["Month", "Origin_JFK", "Unrelated"]);
        let row = FeatureRowBuilder::new(&store).build(&flight(180), &item("DRK023", 100.0));
        assert_eq!(row.len(), 3);
        assert_eq!(row.values(), &[9.0, 1.0, 0.0]);
    }

    #[test]
    fn interaction_features() {
        let store = store(&["Spec_per_Passenger", "Spec_x_Passengers"]);
        let row = FeatureRowBuilder::new(&store).build(&flight(180), &item("DRK023", 100.0));
        assert!((row.values()[0] - 100.0 / 180.0).abs() < 1e-9);
        assert_eq!(row.values()[1], 18_000.0);
    }

    #[test]
    fn zero_passengers_yields_large_finite_ratio() {
        let store = store(&["Spec_per_Passenger", "Passenger_Count"]);
        let row = FeatureRowBuilder::new(&store).build(&flight(0), &item("DRK023", 5.0));
        let ratio = row.values()[0];
        assert!(ratio.is_finite());
        assert_eq!(ratio, 5.0 / EPSILON);
        assert_eq!(row.values()[1], 0.0);
    }

    #[test]
    fn history_is_looked_up_per_product() {
        let store = store(&["Avg_Consumed_Product", "Avg_Returned_Product"]);
        let builder = FeatureRowBuilder::new(&store);
        let known = builder.build(&flight(10), &item("DRK023", 1.0));
        let unknown = builder.build(&flight(10), &item("ZZZ999", 1.0));
        assert_eq!(known.values(), &[61.5, 38.5]);
        assert_eq!(unknown.values(), &[0.0, 0.0]);
    }

    #[test]
    fn unknown_categories_leave_row_untouched() {
        let store = store(&["Origin_JFK", "Product_ID_DRK023"]);
        let mut ctx = flight(10);
        ctx.origin = "XXX".into();
        let row = FeatureRowBuilder::new(&store).build(&ctx, &item("NEW001", 3.0));
        assert_eq!(row.values(), &[0.0, 0.0]);
    }

    #[test]
    fn build_is_bit_identical_across_calls() {
        let store = store(&["Passenger_Count", "Spec_per_Passenger", "Origin_JFK"]);
        let builder = FeatureRowBuilder::new(&store);
        let a = builder.build(&flight(7), &item("DRK023", 3.0));
        let b = builder.build(&flight(7), &item("DRK023", 3.0));
        let bits = |r: &FeatureRow| r.values().iter().map(|v| v.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&a), bits(&b));
    }
}

use chrono::{Datelike, NaiveDate, Weekday};
use loadcast_core::{
    assemble_batch, features::columns, FeatureRowBuilder, FlightContext, MetadataStore,
    ProductLineItem, TemporalFeatures, EPSILON,
};
use proptest::prelude::*;
use std::path::PathBuf;
use std::sync::OnceLock;

fn demo_store() -> &'static MetadataStore {
    static STORE: OnceLock<MetadataStore> = OnceLock::new();
    STORE.get_or_init(|| {
        let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../artifacts");
        MetadataStore::load(dir.join("columns.json"), dir.join("metadata.json")).unwrap()
    })
}

fn any_date() -> impl Strategy<Value = NaiveDate> {
    // 1990-01-01 .. 2060-01-01
    (0i64..25_567).prop_map(|offset| {
        NaiveDate::from_ymd_opt(1990, 1, 1).unwrap() + chrono::Duration::days(offset)
    })
}

fn category() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("JFK".to_string()),
        Just("DOH".to_string()),
        Just("Long-Haul".to_string()),
        Just("Short-Haul".to_string()),
        Just("Economy".to_string()),
        Just("Business".to_string()),
        "[A-Z]{3}",
    ]
}

fn product_id() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("DRK023".to_string()),
        Just("SNK001".to_string()),
        Just("BRD001".to_string()),
        "[A-Z]{3}[0-9]{3}",
    ]
}

fn flight() -> impl Strategy<Value = FlightContext> {
    (category(), category(), category(), 0i64..600, any_date()).prop_map(
        |(origin, flight_type, service_type, passenger_count, date)| FlightContext {
            origin,
            flight_type,
            service_type,
            passenger_count,
            temporal: TemporalFeatures::from_date(date),
        },
    )
}

fn line_item() -> impl Strategy<Value = ProductLineItem> {
    (product_id(), 0u32..2_000).prop_map(|(product_id, qty)| ProductLineItem {
        product_id,
        name: String::new(),
        proposed_qty: f64::from(qty),
    })
}

proptest! {
    #[test]
    fn calendar_features_follow_the_date(date in any_date()) {
        let t = TemporalFeatures::from_date(date);
        prop_assert_eq!(t.month, date.month());
        prop_assert!((1..=4).contains(&t.quarter));
        prop_assert_eq!(t.quarter, (date.month() + 2) / 3);
        prop_assert!(t.day_of_week <= 6);
        let weekend = matches!(date.weekday(), Weekday::Sat | Weekday::Sun);
        prop_assert_eq!(t.is_weekend == 1, weekend);
        prop_assert_eq!(t.is_weekend == 1, t.day_of_week >= 5);
    }
}

proptest! {
    #[test]
    fn rows_match_schema_and_are_deterministic(flight in flight(), item in line_item()) {
        let store = demo_store();
        let builder = FeatureRowBuilder::new(store);
        let row = builder.build(&flight, &item);
        prop_assert_eq!(row.len(), store.schema().len());
        prop_assert!(row.values().iter().all(|v| v.is_finite()));

        let again = builder.build(&flight, &item);
        let bits: Vec<u64> = row.values().iter().map(|v| v.to_bits()).collect();
        let bits_again: Vec<u64> = again.values().iter().map(|v| v.to_bits()).collect();
        prop_assert_eq!(bits, bits_again);

        let schema = store.schema();
        let value = |name: &str| row.values()[schema.position(name).unwrap()];
        let pax = flight.passenger_count as f64;
        prop_assert_eq!(value(columns::SPEC_PER_PASSENGER), item.proposed_qty / (pax + EPSILON));
        prop_assert_eq!(value(columns::SPEC_X_PASSENGERS), item.proposed_qty * pax);
    }
}

proptest! {
    #[test]
    fn one_hot_groups_have_at_most_one_bit(flight in flight(), item in line_item()) {
        let store = demo_store();
        let row = FeatureRowBuilder::new(store).build(&flight, &item);
        let prefixes = store.prefixes();

        for prefix in [
            &prefixes.origin,
            &prefixes.flight_type,
            &prefixes.service_type,
            &prefixes.product_id,
        ] {
            let hot: Vec<f64> = store
                .schema()
                .names()
                .iter()
                .zip(row.values())
                .filter(|(name, _)| name.starts_with(prefix.as_str()))
                .map(|(_, value)| *value)
                .collect();
            prop_assert!(hot.iter().all(|v| *v == 0.0 || *v == 1.0));
            prop_assert!(hot.iter().sum::<f64>() <= 1.0);
        }

        let product_col = format!("{}{}", prefixes.product_id, item.product_id);
        if let Some(pos) = store.schema().position(&product_col) {
            prop_assert_eq!(row.values()[pos], 1.0);
        }
    }
}

proptest! {
    #[test]
    fn batch_preserves_length_and_order(
        flight in flight(),
        items in prop::collection::vec(line_item(), 0..30),
    ) {
        let store = demo_store();
        let matrix = assemble_batch(store, &flight, &items);
        prop_assert_eq!(matrix.n_rows(), items.len());
        prop_assert_eq!(matrix.width(), store.schema().len());

        let builder = FeatureRowBuilder::new(store);
        for (idx, item) in items.iter().enumerate() {
            let expected = builder.build(&flight, item);
            prop_assert_eq!(matrix.row(idx).unwrap(), expected.values());
        }
    }
}

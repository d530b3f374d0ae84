//! Table and CSV output for prediction results and feature matrices

use anyhow::Result;
use loadcast_core::{FeatureMatrix, PredictionResult, PredictionSummary};
use std::fmt::Write as _;
use std::io;

/// Column header of the results export
pub const RESULTS_CSV_HEADER: [&str; 5] = [
    "Product_ID",
    "Product_Name",
    "Proposed_Qty",
    "Optimal_Load_Pred",
    "Diff",
];

pub fn write_results_csv<W: io::Write>(writer: W, results: &[PredictionResult]) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(RESULTS_CSV_HEADER)?;
    for result in results {
        csv.write_record([
            result.id.clone(),
            result.name.clone(),
            result.proposed_qty.to_string(),
            result.optimal.to_string(),
            result.diff.to_string(),
        ])?;
    }
    csv.flush()?;
    Ok(())
}

/// Feature matrix with the schema column names as header
pub fn write_features_csv<W: io::Write>(
    writer: W,
    columns: &[String],
    matrix: &FeatureMatrix,
) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(columns)?;
    for row in matrix.rows() {
        csv.write_record(row.values().iter().map(|v| v.to_string()))?;
    }
    csv.flush()?;
    Ok(())
}

/// Fixed-width results table followed by the summary totals
pub fn render_table(results: &[PredictionResult]) -> String {
    let summary = PredictionSummary::from_results(results);
    let name_width = results
        .iter()
        .map(|r| r.name.chars().count())
        .chain(std::iter::once("Name".len()))
        .max()
        .unwrap_or(4);
    let id_width = results
        .iter()
        .map(|r| r.id.chars().count())
        .chain(std::iter::once("Product".len()))
        .max()
        .unwrap_or(7);

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<id_width$}  {:<name_width$}  {:>8}  {:>8}  {:>6}",
        "Product", "Name", "Proposed", "Optimal", "Diff"
    );
    for r in results {
        let _ = writeln!(
            out,
            "{:<id_width$}  {:<name_width$}  {:>8}  {:>8}  {:>+6}",
            r.id, r.name, r.proposed_qty, r.optimal, r.diff
        );
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "Products:       {}", summary.products);
    let _ = writeln!(out, "Total proposed: {}", summary.total_proposed);
    let _ = writeln!(out, "Total optimal:  {}", summary.total_optimal);
    let _ = writeln!(out, "Difference:     {:+}", summary.total_diff);
    out
}

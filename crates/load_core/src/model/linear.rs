//! Linear (ridge) regressor

use crate::errors::{LoadCoreError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LinearModel {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,
}

impl LinearModel {
    pub fn new(intercept: f64, coefficients: Vec<f64>) -> Self {
        Self {
            intercept,
            coefficients,
            feature_names: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.coefficients.is_empty() {
            return Err(LoadCoreError::InvalidArtifact(
                "linear model has no coefficients".to_string(),
            ));
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(LoadCoreError::InvalidArtifact(
                "linear model has non-finite parameters".to_string(),
            ));
        }
        Ok(())
    }

    /// Intercept plus dot product; NaN when the row width differs
    pub fn score(&self, features: &[f64]) -> f64 {
        if features.len() != self.coefficients.len() {
            return f64::NAN;
        }
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(features)
                .map(|(c, x)| c * x)
                .sum::<f64>()
    }
}

//! Calendar features derived from the flight date

use crate::errors::{LoadCoreError, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Date format accepted for `flightDate`
pub const FLIGHT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Date-derived features shared by every product row of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporalFeatures {
    /// Month of year, 1..=12
    pub month: u32,
    /// Day of week, 0 = Monday .. 6 = Sunday
    pub day_of_week: u32,
    /// 1 on Saturday and Sunday, 0 otherwise
    pub is_weekend: u32,
    /// Calendar quarter, 1..=4
    pub quarter: u32,
}

impl TemporalFeatures {
    pub fn from_date(date: NaiveDate) -> Self {
        let month = date.month();
        let day_of_week = date.weekday().num_days_from_monday();
        Self {
            month,
            day_of_week,
            is_weekend: u32::from(day_of_week >= 5),
            quarter: (month - 1) / 3 + 1,
        }
    }
}

/// Parse a `YYYY-MM-DD` flight date
pub fn parse_flight_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), FLIGHT_DATE_FORMAT).map_err(|e| {
        LoadCoreError::InvalidRequest(format!(
            "flightDate '{raw}' is not a valid YYYY-MM-DD date: {e}"
        ))
    })
}

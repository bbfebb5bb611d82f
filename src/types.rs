//! Core data types for the crop cycle classification pipeline.

use crate::stage::GrowthStage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw sensor reading as delivered by the external feed.
///
/// The timestamp is still a string at this point; nothing is validated.
/// `predicted_days` is supplied by the upstream prediction service and is
/// passed through, never derived here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawReading {
    /// Opaque unique identifier assigned by the feed
    pub id: String,

    /// Timestamp string (ISO 8601 or equivalent parseable form)
    pub timestamp: String,

    /// Air temperature in °C
    pub temperature: f64,

    /// Relative humidity in %
    pub humidity: f64,

    /// Nutrient solution pH
    pub ph: f64,

    /// Total dissolved solids in ppm
    pub tds: f64,

    /// Predicted maturity in days, if the prediction service supplied one
    #[serde(default)]
    pub predicted_days: Option<f64>,
}

/// A normalized reading with a validated timestamp.
///
/// Immutable once ingested; the timestamp is the source of truth for
/// ordering and boundary resolution. Sensor values are carried through
/// unmodified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub temperature: f64,
    pub humidity: f64,
    pub ph: f64,
    pub tds: f64,
    pub predicted_days: Option<f64>,
}

/// One classified output record per input reading.
///
/// This is the shape exposed to the presentation layer: the reading itself
/// plus the derived day number and stage labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedReading {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub temperature: f64,
    pub humidity: f64,
    pub ph: f64,
    pub tds: f64,

    /// Day number within the current growth cycle (see [`crate::cycle`])
    pub day_number: i64,

    /// Stage derived from `day_number`
    pub current_stage: GrowthStage,

    /// Externally supplied maturity estimate, passed through
    pub predicted_days: Option<f64>,

    /// Stage derived from `predicted_days`; `None` exactly when the
    /// prediction is absent
    pub predicted_stage: Option<GrowthStage>,
}

/// Sort direction for a normalized batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    /// Oldest reading first
    Ascending,
    /// Newest reading first (feed/table default)
    Descending,
}

impl Default for SortDirection {
    fn default() -> Self {
        SortDirection::Descending
    }
}

impl std::fmt::Display for SortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortDirection::Ascending => write!(f, "ascending"),
            SortDirection::Descending => write!(f, "descending"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_reading_predicted_days_defaults_to_none() {
        let json = r#"{
            "id": "-NxAbc123",
            "timestamp": "2024-01-10T08:00:00Z",
            "temperature": 24.1,
            "humidity": 61.0,
            "ph": 6.1,
            "tds": 840.0
        }"#;
        let raw: RawReading = serde_json::from_str(json).unwrap();
        assert_eq!(raw.predicted_days, None);
    }

    #[test]
    fn test_sort_direction_default_is_descending() {
        assert_eq!(SortDirection::default(), SortDirection::Descending);
    }
}

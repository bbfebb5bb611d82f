//! Classification pass over a normalized batch.
//!
//! Pure: one output record per input reading, none dropped or merged, and
//! each record depends only on its own reading plus the boundary
//! configuration — reordering the batch cannot change any individual
//! record's day number or stage.

use crate::cycle::{resolve_day_number, BoundaryConfig, ClampPolicy, DayResolution};
use crate::stage::GrowthStage;
use crate::types::{ClassifiedReading, Reading};

/// Classify every reading in a batch against the boundary configuration.
///
/// `config` is `None` when no boundary has ever been recorded (single policy
/// before bootstrap); every reading then takes the defined day-1 default.
#[must_use]
pub fn classify_batch(
    readings: &[Reading],
    config: Option<&BoundaryConfig>,
    clamp: ClampPolicy,
) -> Vec<ClassifiedReading> {
    readings
        .iter()
        .map(|reading| classify_reading(reading, config, clamp))
        .collect()
}

/// Classify a single reading.
#[must_use]
pub fn classify_reading(
    reading: &Reading,
    config: Option<&BoundaryConfig>,
    clamp: ClampPolicy,
) -> ClassifiedReading {
    let resolution = match config {
        Some(config) => resolve_day_number(reading.timestamp, config),
        None => DayResolution::Defaulted,
    };
    let day_number = clamp.apply(resolution.day_number());

    ClassifiedReading {
        id: reading.id.clone(),
        timestamp: reading.timestamp,
        temperature: reading.temperature,
        humidity: reading.humidity,
        ph: reading.ph,
        tds: reading.tds,
        day_number,
        current_stage: GrowthStage::classify(day_number as f64),
        predicted_days: reading.predicted_days,
        predicted_stage: reading.predicted_days.map(GrowthStage::classify),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn reading(id: &str, timestamp: &str, predicted: Option<f64>) -> Reading {
        Reading {
            id: id.to_string(),
            timestamp: ts(timestamp),
            temperature: 23.5,
            humidity: 60.0,
            ph: 6.0,
            tds: 820.0,
            predicted_days: predicted,
        }
    }

    fn config() -> BoundaryConfig {
        BoundaryConfig::multi(vec![ts("2024-01-01T00:00:00Z"), ts("2024-01-15T00:00:00Z")])
    }

    #[test]
    fn test_every_reading_produces_one_record() {
        let readings = vec![
            reading("a", "2024-01-10T00:00:00Z", Some(31.0)),
            reading("b", "2024-01-16T00:00:00Z", None),
        ];
        let classified = classify_batch(&readings, Some(&config()), ClampPolicy::ClampToOne);

        assert_eq!(classified.len(), 2);
        assert_eq!(classified[0].day_number, 10);
        assert_eq!(classified[0].current_stage, GrowthStage::RapidGrowth);
        assert_eq!(classified[1].day_number, 2);
        assert_eq!(classified[1].current_stage, GrowthStage::Initial);
    }

    #[test]
    fn test_predicted_stage_tracks_predicted_days() {
        let readings = vec![
            reading("a", "2024-01-10T00:00:00Z", Some(31.0)),
            reading("b", "2024-01-10T00:00:00Z", None),
        ];
        let classified = classify_batch(&readings, Some(&config()), ClampPolicy::ClampToOne);

        assert_eq!(classified[0].predicted_stage, Some(GrowthStage::Senescent));
        assert_eq!(classified[1].predicted_stage, None);
    }

    #[test]
    fn test_reordering_does_not_change_any_record() {
        let forward = vec![
            reading("a", "2024-01-10T00:00:00Z", Some(31.0)),
            reading("b", "2024-01-16T00:00:00Z", None),
            reading("c", "2024-02-02T00:00:00Z", Some(12.0)),
        ];
        let mut reversed = forward.clone();
        reversed.reverse();

        let mut from_forward =
            classify_batch(&forward, Some(&config()), ClampPolicy::ClampToOne);
        let mut from_reversed =
            classify_batch(&reversed, Some(&config()), ClampPolicy::ClampToOne);

        from_forward.sort_by(|a, b| a.id.cmp(&b.id));
        from_reversed.sort_by(|a, b| a.id.cmp(&b.id));
        assert_eq!(from_forward, from_reversed);
    }

    #[test]
    fn test_missing_config_defaults_every_reading_to_day_one() {
        let readings = vec![reading("a", "2024-06-01T00:00:00Z", None)];
        let classified = classify_batch(&readings, None, ClampPolicy::ClampToOne);

        assert_eq!(classified[0].day_number, 1);
        assert_eq!(classified[0].current_stage, GrowthStage::Initial);
    }

    #[test]
    fn test_clamp_policy_governs_pre_boundary_readings() {
        let single = BoundaryConfig::single(ts("2024-01-10T00:00:00Z"), ts("2024-02-01T00:00:00Z"));
        let readings = vec![reading("early", "2024-01-05T00:00:00Z", None)];

        let clamped = classify_batch(&readings, Some(&single), ClampPolicy::ClampToOne);
        assert_eq!(clamped[0].day_number, 1);

        let raw = classify_batch(&readings, Some(&single), ClampPolicy::Propagate);
        assert_eq!(raw[0].day_number, -4);
        // Negative days still land in the first stage bucket.
        assert_eq!(raw[0].current_stage, GrowthStage::Initial);
    }
}

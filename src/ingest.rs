//! Reading ingestion and normalization (CSV snapshots + feed batches)
//!
//! Turns raw feed records into timestamp-validated, ordered [`Reading`]s.
//! A malformed timestamp rejects only that reading; the rest of the batch
//! proceeds and callers decide whether to drop or halt on the rejects.

use crate::types::{RawReading, Reading, SortDirection};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::fs::File;
use std::io::{BufRead, BufReader};

/// Per-reading ingestion failure.
#[derive(Debug, Clone, thiserror::Error)]
pub enum IngestError {
    #[error("reading '{id}': cannot parse timestamp '{raw}'")]
    InvalidTimestamp { id: String, raw: String },
}

impl IngestError {
    /// Identifier of the rejected reading.
    #[must_use]
    pub fn reading_id(&self) -> &str {
        match self {
            IngestError::InvalidTimestamp { id, .. } => id,
        }
    }
}

/// Result of one normalization pass: the ordered readings plus the
/// per-reading rejects.
#[derive(Debug, Clone, Default)]
pub struct NormalizedBatch {
    pub readings: Vec<Reading>,
    pub rejected: Vec<IngestError>,
}

impl NormalizedBatch {
    /// Timestamp of the oldest reading in the batch, if any.
    #[must_use]
    pub fn oldest_timestamp(&self) -> Option<DateTime<Utc>> {
        self.readings.iter().map(|r| r.timestamp).min()
    }
}

/// Normalize a raw batch: validate timestamps and order by timestamp in the
/// requested direction.
///
/// The sort is stable, so readings with equal timestamps keep their original
/// relative order. Pure and idempotent: the same input and direction always
/// yield identical output.
#[must_use]
pub fn normalize(raw: Vec<RawReading>, direction: SortDirection) -> NormalizedBatch {
    let mut readings = Vec::with_capacity(raw.len());
    let mut rejected = Vec::new();

    for entry in raw {
        match parse_timestamp(&entry.timestamp) {
            Some(timestamp) => readings.push(Reading {
                id: entry.id,
                timestamp,
                temperature: entry.temperature,
                humidity: entry.humidity,
                ph: entry.ph,
                tds: entry.tds,
                predicted_days: entry.predicted_days,
            }),
            None => rejected.push(IngestError::InvalidTimestamp {
                id: entry.id,
                raw: entry.timestamp,
            }),
        }
    }

    match direction {
        SortDirection::Ascending => readings.sort_by(|a, b| a.timestamp.cmp(&b.timestamp)),
        SortDirection::Descending => readings.sort_by(|a, b| b.timestamp.cmp(&a.timestamp)),
    }

    NormalizedBatch { readings, rejected }
}

/// Parse a feed timestamp at millisecond precision.
///
/// Accepts RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS[.fff]` (assumed UTC), and
/// a bare `YYYY-MM-DD` (UTC midnight) — the forms the feed actually emits.
#[must_use]
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    // Naive datetime without offset: assume UTC.
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(naive.and_utc());
    }

    // Bare calendar date: UTC midnight.
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date.and_time(chrono::NaiveTime::MIN).and_utc());
    }

    None
}

/// Read a raw snapshot from a CSV file with the header
/// `id,timestamp,temperature,humidity,ph,tds,predicted_days`
/// (`predicted_days` may be empty or absent).
///
/// Malformed lines are logged and skipped; timestamp validation happens
/// later in [`normalize`].
pub fn read_csv_snapshot(path: &str) -> Vec<RawReading> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            tracing::error!(path, error = %e, "Cannot open CSV snapshot");
            return Vec::new();
        }
    };

    let mut readings = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                tracing::warn!(line = idx + 1, error = %e, "Unreadable CSV line, skipping");
                continue;
            }
        };
        let trimmed = line.trim();
        if trimmed.is_empty() || (idx == 0 && trimmed.starts_with("id")) {
            continue;
        }
        match parse_csv_line(trimmed) {
            Ok(reading) => readings.push(reading),
            Err(e) => tracing::warn!(line = idx + 1, error = %e, "Bad CSV line, skipping"),
        }
    }

    tracing::info!(count = readings.len(), path, "CSV snapshot loaded");
    readings
}

/// Parse one CSV record; the caller attaches the line number when logging.
fn parse_csv_line(line: &str) -> Result<RawReading, String> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() < 6 {
        return Err(format!("expected at least 6 fields, got {}", fields.len()));
    }

    let numeric = |value: &str, name: &str| {
        value
            .parse::<f64>()
            .map_err(|_| format!("{name} is not numeric: '{value}'"))
    };

    let predicted_days = match fields.get(6) {
        Some(&"") | None => None,
        Some(value) => Some(numeric(value, "predicted_days")?),
    };

    Ok(RawReading {
        id: fields[0].to_string(),
        timestamp: fields[1].to_string(),
        temperature: numeric(fields[2], "temperature")?,
        humidity: numeric(fields[3], "humidity")?,
        ph: numeric(fields[4], "ph")?,
        tds: numeric(fields[5], "tds")?,
        predicted_days,
    })
}

/// Generate a synthetic 35-day crop cycle snapshot.
///
/// Two readings per day across germination, rapid growth, and senescence,
/// with the predicted-maturity estimate converging on the standard cycle
/// length. Used by the demo mode and tests.
#[must_use]
pub fn generate_demo_snapshot() -> Vec<RawReading> {
    let mut readings = Vec::new();
    let base = match "2024-01-01T06:00:00Z".parse::<DateTime<Utc>>() {
        Ok(dt) => dt,
        Err(_) => return readings,
    };

    for day in 0..35i64 {
        for sample in 0..2i64 {
            let ts = base + chrono::Duration::hours(day * 24 + sample * 12);
            let phase_temp = if day < 6 {
                21.5 + (day as f64) * 0.2
            } else if day < 27 {
                23.0 + ((day as f64) * 0.4).sin() * 1.5
            } else {
                22.0
            };

            readings.push(RawReading {
                id: format!("demo-{:03}-{}", day, sample),
                timestamp: ts.to_rfc3339(),
                temperature: phase_temp,
                humidity: 58.0 + ((day + sample) as f64 * 0.7).cos() * 6.0,
                ph: 5.9 + ((day as f64) * 0.3).sin() * 0.25,
                tds: 780.0 + (day as f64) * 9.0,
                predicted_days: Some(30.0 + ((35 - day) as f64) * 0.08),
            });
        }
    }

    tracing::debug!(count = readings.len(), "Generated synthetic crop cycle snapshot");
    readings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(id: &str, ts: &str) -> RawReading {
        RawReading {
            id: id.to_string(),
            timestamp: ts.to_string(),
            temperature: 24.0,
            humidity: 60.0,
            ph: 6.0,
            tds: 800.0,
            predicted_days: None,
        }
    }

    #[test]
    fn test_parse_timestamp_rfc3339() {
        let ts = parse_timestamp("2024-01-10T08:15:30.250Z").unwrap();
        assert_eq!(ts.timestamp_millis(), 1704874530250);
    }

    #[test]
    fn test_parse_timestamp_naive_assumed_utc() {
        let ts = parse_timestamp("2024-01-10T08:15:30").unwrap();
        assert_eq!(ts, "2024-01-10T08:15:30Z".parse::<DateTime<Utc>>().unwrap());
    }

    #[test]
    fn test_parse_timestamp_bare_date_is_midnight() {
        let ts = parse_timestamp("2024-01-10").unwrap();
        assert_eq!(ts, "2024-01-10T00:00:00Z".parse::<DateTime<Utc>>().unwrap());
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn test_normalize_rejects_only_the_bad_reading() {
        let batch = normalize(
            vec![
                raw("a", "2024-01-10T08:00:00Z"),
                raw("b", "not-a-timestamp"),
                raw("c", "2024-01-09T08:00:00Z"),
            ],
            SortDirection::Ascending,
        );

        assert_eq!(batch.readings.len(), 2);
        assert_eq!(batch.rejected.len(), 1);
        assert_eq!(batch.rejected[0].reading_id(), "b");
    }

    #[test]
    fn test_normalize_orders_by_direction() {
        let input = vec![
            raw("a", "2024-01-10T08:00:00Z"),
            raw("b", "2024-01-12T08:00:00Z"),
            raw("c", "2024-01-11T08:00:00Z"),
        ];

        let asc = normalize(input.clone(), SortDirection::Ascending);
        let ids: Vec<&str> = asc.readings.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["a", "c", "b"]);

        let desc = normalize(input, SortDirection::Descending);
        let ids: Vec<&str> = desc.readings.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["b", "c", "a"]);
    }

    #[test]
    fn test_normalize_stable_for_equal_timestamps() {
        let input = vec![
            raw("first", "2024-01-10T08:00:00Z"),
            raw("second", "2024-01-10T08:00:00Z"),
            raw("third", "2024-01-10T08:00:00Z"),
        ];

        let asc = normalize(input.clone(), SortDirection::Ascending);
        let ids: Vec<&str> = asc.readings.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["first", "second", "third"]);

        // Descending is stable too: equal elements keep original order.
        let desc = normalize(input, SortDirection::Descending);
        let ids: Vec<&str> = desc.readings.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["first", "second", "third"]);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let input = vec![
            raw("a", "2024-01-12T08:00:00Z"),
            raw("b", "2024-01-10T08:00:00Z"),
        ];
        let once = normalize(input.clone(), SortDirection::Descending);
        let twice = normalize(input, SortDirection::Descending);
        assert_eq!(once.readings, twice.readings);
    }

    #[test]
    fn test_oldest_timestamp() {
        let batch = normalize(
            vec![
                raw("a", "2024-01-12T08:00:00Z"),
                raw("b", "2024-01-10T08:00:00Z"),
            ],
            SortDirection::Descending,
        );
        assert_eq!(
            batch.oldest_timestamp().unwrap(),
            "2024-01-10T08:00:00Z".parse::<DateTime<Utc>>().unwrap()
        );
    }

    #[test]
    fn test_parse_csv_line_optional_prediction() {
        let with = parse_csv_line("r1,2024-01-10T08:00:00Z,24.0,60.0,6.1,840,31.5").unwrap();
        assert_eq!(with.predicted_days, Some(31.5));

        let without = parse_csv_line("r2,2024-01-10T08:00:00Z,24.0,60.0,6.1,840").unwrap();
        assert_eq!(without.predicted_days, None);

        let empty = parse_csv_line("r3,2024-01-10T08:00:00Z,24.0,60.0,6.1,840,").unwrap();
        assert_eq!(empty.predicted_days, None);
    }

    #[test]
    fn test_generate_demo_snapshot_spans_full_cycle() {
        let snapshot = generate_demo_snapshot();
        assert_eq!(snapshot.len(), 70);
        assert!(snapshot.iter().all(|r| r.predicted_days.is_some()));
    }
}

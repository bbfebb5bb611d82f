//! Snapshot source abstraction for reading ingestion.
//!
//! Provides a unified trait for receiving raw reading snapshots from
//! different feeds: CSV files (one snapshot), and stdin (JSON, one full
//! snapshot per line). Each delivered snapshot is the complete current
//! dataset, so the pipeline recomputes everything per delivery instead of
//! patching incrementally.

use crate::types::RawReading;
use anyhow::Result;
use async_trait::async_trait;

/// Events produced by a snapshot source.
pub enum SnapshotEvent {
    /// A full current snapshot of raw readings was delivered.
    Snapshot(Vec<RawReading>),
    /// Source reached end of data (EOF for files/stdin).
    Eof,
}

/// Trait abstracting where reading snapshots come from.
///
/// Implementations handle format parsing internally. The processing loop
/// calls [`next_snapshot`](ReadingSource::next_snapshot) in a select! with
/// cancellation.
#[async_trait]
pub trait ReadingSource: Send + 'static {
    /// Read the next full snapshot from the source.
    ///
    /// Returns `SnapshotEvent::Eof` when no more data is available.
    /// Returns `Err` on unrecoverable errors.
    async fn next_snapshot(&mut self) -> Result<SnapshotEvent>;

    /// Human-readable name for logging (e.g. "CSV", "stdin").
    fn source_name(&self) -> &str;
}

// ============================================================================
// CSV Source (file / demo snapshot)
// ============================================================================

/// Delivers a pre-loaded batch of raw readings as a single snapshot.
///
/// The HTTP server stays up after the snapshot is consumed, so boundary
/// adjustments keep reclassifying the loaded data.
pub struct CsvSource {
    snapshot: Option<Vec<RawReading>>,
}

impl CsvSource {
    #[must_use]
    pub fn new(readings: Vec<RawReading>) -> Self {
        Self {
            snapshot: Some(readings),
        }
    }
}

#[async_trait]
impl ReadingSource for CsvSource {
    async fn next_snapshot(&mut self) -> Result<SnapshotEvent> {
        match self.snapshot.take() {
            Some(readings) => Ok(SnapshotEvent::Snapshot(readings)),
            None => Ok(SnapshotEvent::Eof),
        }
    }

    fn source_name(&self) -> &str {
        "CSV"
    }
}

// ============================================================================
// Stdin Source (JSON snapshots, one per line)
// ============================================================================

/// Reads JSON-formatted snapshots from stdin, one array per line.
///
/// Each line is the feed's full current dataset, the way a live database
/// subscription delivers the whole collection on every change. Used with
/// the simulator: `verde-sim | verde-os --stdin`
pub struct StdinSource {
    reader: tokio::io::BufReader<tokio::io::Stdin>,
    line_buffer: String,
}

impl StdinSource {
    #[must_use]
    pub fn new() -> Self {
        Self {
            reader: tokio::io::BufReader::new(tokio::io::stdin()),
            line_buffer: String::with_capacity(8192),
        }
    }
}

impl Default for StdinSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReadingSource for StdinSource {
    async fn next_snapshot(&mut self) -> Result<SnapshotEvent> {
        use tokio::io::AsyncBufReadExt;
        loop {
            self.line_buffer.clear();
            let bytes = self.reader.read_line(&mut self.line_buffer).await?;
            if bytes == 0 {
                return Ok(SnapshotEvent::Eof);
            }
            let line = self.line_buffer.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<Vec<RawReading>>(line) {
                Ok(readings) => return Ok(SnapshotEvent::Snapshot(readings)),
                Err(e) => {
                    tracing::warn!("[StdinSource] Failed to parse snapshot: {}", e);
                    // Skip malformed lines and keep reading
                }
            }
        }
    }

    fn source_name(&self) -> &str {
        "stdin"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_csv_source_yields_snapshot_then_eof() {
        let mut source = CsvSource::new(vec![RawReading {
            id: "r1".to_string(),
            timestamp: "2024-01-10T08:00:00Z".to_string(),
            temperature: 24.0,
            humidity: 60.0,
            ph: 6.0,
            tds: 800.0,
            predicted_days: None,
        }]);

        match source.next_snapshot().await.unwrap() {
            SnapshotEvent::Snapshot(readings) => assert_eq!(readings.len(), 1),
            SnapshotEvent::Eof => panic!("expected snapshot before EOF"),
        }
        assert!(matches!(
            source.next_snapshot().await.unwrap(),
            SnapshotEvent::Eof
        ));
    }
}

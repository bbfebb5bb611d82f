//! Shared pipeline state.
//!
//! One [`AppState`] value lives behind an `Arc<RwLock<_>>`. The feed
//! processor swaps a fresh classified table in on every snapshot; API
//! handlers read it, and boundary mutations reclassify `readings` in place.

use crate::types::{ClassifiedReading, Reading};
use std::time::Instant;

/// State shared between the feed processor and the API handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Latest normalized batch, in feed order
    pub readings: Vec<Reading>,

    /// Classified table derived from `readings`, same order
    pub table: Vec<ClassifiedReading>,

    /// Snapshots processed this session
    pub snapshots_processed: u64,

    /// Readings classified across all snapshots
    pub readings_classified: u64,

    /// Readings rejected for unparsable timestamps
    pub readings_rejected: u64,

    /// When the last classification pass ran
    pub last_classified_time: Option<chrono::DateTime<chrono::Utc>>,

    /// Current system status
    pub status: SystemStatus,

    started: Instant,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            readings: Vec::new(),
            table: Vec::new(),
            snapshots_processed: 0,
            readings_classified: 0,
            readings_rejected: 0,
            last_classified_time: None,
            status: SystemStatus::Initializing,
            started: Instant::now(),
        }
    }
}

impl AppState {
    /// Seconds since this state was created.
    #[must_use]
    pub fn uptime_secs(&self) -> u64 {
        self.started.elapsed().as_secs()
    }
}

/// System operational status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemStatus {
    /// Starting up, no snapshot processed yet
    Initializing,
    /// Normal operation, classifying incoming snapshots
    Monitoring,
    /// Boundary configuration could not be loaded; table may be stale
    Error,
}

impl std::fmt::Display for SystemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            SystemStatus::Initializing => "Initializing",
            SystemStatus::Monitoring => "Monitoring",
            SystemStatus::Error => "Error",
        };
        f.write_str(label)
    }
}

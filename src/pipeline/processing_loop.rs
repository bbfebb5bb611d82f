//! Unified snapshot processing loop shared across all input modes.
//!
//! Every delivered snapshot runs through the same atomic pass:
//! normalize -> bootstrap start -> load boundary config -> classify ->
//! swap into shared state. The pass is idempotent, so replaying the same
//! snapshot against the same boundary configuration always produces the
//! same table.

use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::processor::classify_batch;
use super::source::{ReadingSource, SnapshotEvent};
use super::{AppState, SystemStatus};
use crate::config::CropConfig;
use crate::cycle::{BoundaryLedger, ClampPolicy, CyclePolicy};
use crate::ingest::normalize;
use crate::types::{RawReading, SortDirection};

// ============================================================================
// Pipeline Options
// ============================================================================

/// Per-deployment knobs the loop threads through each classification pass.
#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    pub policy: CyclePolicy,
    pub clamp: ClampPolicy,
    pub sort: SortDirection,
}

impl PipelineOptions {
    /// Extract the pipeline-relevant fields from the loaded configuration.
    #[must_use]
    pub fn from_config(config: &CropConfig) -> Self {
        Self {
            policy: config.cycle.policy,
            clamp: config.cycle.clamp_policy(),
            sort: config.feed.sort,
        }
    }
}

// ============================================================================
// Snapshot Statistics
// ============================================================================

/// Final statistics returned by [`ProcessingLoop::run`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SnapshotStats {
    pub snapshots_processed: u64,
    pub readings_classified: u64,
    pub readings_rejected: u64,
}

// ============================================================================
// Processing Loop
// ============================================================================

/// Owns all state needed for the unified snapshot processing loop.
///
/// Built with [`new()`](ProcessingLoop::new), then consumed by
/// [`run()`](ProcessingLoop::run).
pub struct ProcessingLoop {
    ledger: BoundaryLedger,
    app_state: Arc<RwLock<AppState>>,
    options: PipelineOptions,
    cancel_token: CancellationToken,
}

impl ProcessingLoop {
    #[must_use]
    pub fn new(
        ledger: BoundaryLedger,
        app_state: Arc<RwLock<AppState>>,
        options: PipelineOptions,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            ledger,
            app_state,
            options,
            cancel_token,
        }
    }

    /// Run the processing loop until the source is exhausted or cancellation.
    ///
    /// Returns final snapshot statistics.
    pub async fn run<S: ReadingSource>(self, source: &mut S) -> SnapshotStats {
        let mut stats = SnapshotStats::default();

        info!(
            source = source.source_name(),
            policy = %self.options.policy,
            "Processing reading snapshots"
        );

        loop {
            let event = tokio::select! {
                _ = self.cancel_token.cancelled() => {
                    info!("[FeedProcessor] Shutdown signal received");
                    break;
                }
                result = source.next_snapshot() => {
                    match result {
                        Ok(ev) => ev,
                        Err(e) => {
                            warn!("[FeedProcessor] Source error: {}", e);
                            break;
                        }
                    }
                }
            };

            let raw = match event {
                SnapshotEvent::Snapshot(r) => r,
                SnapshotEvent::Eof => {
                    info!(
                        "[FeedProcessor] Source reached end ({} snapshots processed)",
                        stats.snapshots_processed
                    );
                    break;
                }
            };

            stats.snapshots_processed += 1;
            self.process_snapshot(raw, &mut stats).await;
        }

        info!(
            snapshots = stats.snapshots_processed,
            readings = stats.readings_classified,
            rejected = stats.readings_rejected,
            "[FeedProcessor] Final statistics"
        );

        stats
    }

    /// One atomic classification pass over a delivered snapshot.
    async fn process_snapshot(&self, raw: Vec<RawReading>, stats: &mut SnapshotStats) {
        let batch = normalize(raw, self.options.sort);

        for reject in &batch.rejected {
            warn!("[FeedProcessor] Rejected reading: {}", reject);
        }
        stats.readings_rejected += batch.rejected.len() as u64;

        // First-write-wins: record the original start from the oldest ever
        // observed reading. A no-op on every snapshot after the first.
        if let Some(oldest) = batch.oldest_timestamp() {
            if let Err(e) = self.ledger.bootstrap_original_start(oldest) {
                warn!("[FeedProcessor] Failed to bootstrap cycle start: {}", e);
            }
        }

        let config = match self.ledger.load_config(self.options.policy) {
            Ok(config) => config,
            Err(e) => {
                warn!("[FeedProcessor] Failed to load boundary config: {}", e);
                let mut state = self.app_state.write().await;
                state.status = SystemStatus::Error;
                return;
            }
        };

        let table = classify_batch(&batch.readings, config.as_ref(), self.options.clamp);
        stats.readings_classified += table.len() as u64;

        let mut state = self.app_state.write().await;
        state.snapshots_processed = stats.snapshots_processed;
        state.readings_classified = stats.readings_classified;
        state.readings_rejected = stats.readings_rejected;
        state.last_classified_time = Some(chrono::Utc::now());
        state.status = SystemStatus::Monitoring;
        state.readings = batch.readings;
        state.table = table;
    }
}

//! API handlers — consistent envelope, typed responses, ISO-8601 timestamps.
//!
//! All handlers return `Response` via [`ApiResponse::ok`] or
//! [`ApiErrorResponse`]. Boundary mutations reclassify the in-memory table
//! immediately, so historical readings pick up the new configuration without
//! waiting for the next snapshot.

use axum::extract::{Query, State};
use axum::response::Response;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::envelope::{ApiErrorResponse, ApiResponse};
use crate::config;
use crate::cycle::{BoundaryConfig, BoundaryLedger, LedgerError};
use crate::pipeline::{classify_batch, AppState};
use crate::types::ClassifiedReading;

// ============================================================================
// Shared State
// ============================================================================

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    /// Application state from the pipeline
    pub app_state: Arc<RwLock<AppState>>,
    /// Handle on the persisted boundary configuration
    pub ledger: BoundaryLedger,
}

impl ApiState {
    #[must_use]
    pub fn new(app_state: Arc<RwLock<AppState>>, ledger: BoundaryLedger) -> Self {
        Self { app_state, ledger }
    }
}

// ============================================================================
// Request / Response Types
// ============================================================================

/// System health for `GET /api/v1/system/health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub crop: String,
    pub policy: String,
    pub uptime_secs: u64,
    pub snapshots_processed: u64,
    pub readings_classified: u64,
    pub readings_rejected: u64,
    pub last_classified_time: Option<DateTime<Utc>>,
}

/// Boundary configuration view for `GET /api/v1/cycle`.
#[derive(Debug, Serialize)]
pub struct CycleResponse {
    pub policy: String,
    /// Effective configuration for the active policy; absent before any
    /// start has been recorded under the single policy
    pub config: Option<BoundaryConfig>,
    /// The stored reset set, regardless of active policy
    pub reset_boundaries: Vec<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct AddResetRequest {
    /// Calendar date of the new day-1 boundary (`YYYY-MM-DD`)
    pub date: String,
}

#[derive(Debug, Serialize)]
pub struct AddResetResponse {
    pub boundary: DateTime<Utc>,
    pub total_boundaries: usize,
}

#[derive(Debug, Deserialize)]
pub struct AdjustRequest {
    /// Calendar date the grower is pinning (`YYYY-MM-DD`)
    pub date: String,
    /// Day number that date should resolve to
    pub day: i64,
}

#[derive(Debug, Serialize)]
pub struct AdjustResponse {
    pub new_start: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

// ============================================================================
// Read Handlers
// ============================================================================

/// GET /api/v1/system/health
pub async fn system_health(State(state): State<ApiState>) -> Response {
    let cfg = config::get();
    let app = state.app_state.read().await;
    ApiResponse::ok(HealthResponse {
        status: app.status.to_string(),
        crop: cfg.crop.name.clone(),
        policy: cfg.cycle.policy.to_string(),
        uptime_secs: app.uptime_secs(),
        snapshots_processed: app.snapshots_processed,
        readings_classified: app.readings_classified,
        readings_rejected: app.readings_rejected,
        last_classified_time: app.last_classified_time,
    })
}

/// GET /api/v1/readings?limit=100 — the classified table, in feed order.
pub async fn readings(
    State(state): State<ApiState>,
    Query(q): Query<LimitQuery>,
) -> Response {
    let app = state.app_state.read().await;
    let table: Vec<ClassifiedReading> = match q.limit {
        Some(limit) => app.table.iter().take(limit).cloned().collect(),
        None => app.table.clone(),
    };
    ApiResponse::ok(table)
}

/// GET /api/v1/cycle — active policy and its boundary configuration.
pub async fn get_cycle(State(state): State<ApiState>) -> Response {
    let policy = config::get().cycle.policy;
    let config = match state.ledger.load_config(policy) {
        Ok(c) => c,
        Err(e) => return ledger_error(&e),
    };
    let reset_boundaries = match state.ledger.reset_boundaries() {
        Ok(b) => b,
        Err(e) => return ledger_error(&e),
    };
    ApiResponse::ok(CycleResponse {
        policy: policy.to_string(),
        config,
        reset_boundaries,
    })
}

/// GET /api/v1/config — the loaded deployment configuration.
pub async fn get_config() -> Response {
    ApiResponse::ok(config::get().clone())
}

// ============================================================================
// Boundary Mutation Handlers
// ============================================================================

/// POST /api/v1/cycle/resets — add a reset boundary at the given date.
pub async fn add_reset(
    State(state): State<ApiState>,
    axum::Json(req): axum::Json<AddResetRequest>,
) -> Response {
    let boundary = match state.ledger.add_reset_boundary(&req.date) {
        Ok(b) => b,
        Err(e) => return ledger_error(&e),
    };
    let total_boundaries = match state.ledger.reset_boundaries() {
        Ok(b) => b.len(),
        Err(e) => return ledger_error(&e),
    };
    reclassify(&state).await;
    ApiResponse::ok(AddResetResponse {
        boundary,
        total_boundaries,
    })
}

/// POST /api/v1/cycle/resets/clear — empty the reset boundary set.
pub async fn clear_resets(State(state): State<ApiState>) -> Response {
    if let Err(e) = state.ledger.clear_reset_boundaries() {
        return ledger_error(&e);
    }
    reclassify(&state).await;
    ApiResponse::ok(serde_json::json!({ "cleared": true }))
}

/// POST /api/v1/cycle/adjust — declare that `date` is day `day` of the cycle.
pub async fn adjust_start(
    State(state): State<ApiState>,
    axum::Json(req): axum::Json<AdjustRequest>,
) -> Response {
    let new_start = match state.ledger.adjust_single_start(&req.date, req.day) {
        Ok(s) => s,
        Err(e) => return ledger_error(&e),
    };
    reclassify(&state).await;
    ApiResponse::ok(AdjustResponse { new_start })
}

// ============================================================================
// Helpers
// ============================================================================

/// Recompute the classified table from the current batch and configuration.
///
/// A failed config load leaves the table untouched; the next snapshot pass
/// surfaces the error state.
async fn reclassify(state: &ApiState) {
    let cycle_cfg = &config::get().cycle;
    let config = match state.ledger.load_config(cycle_cfg.policy) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!("Reclassification skipped, config load failed: {}", e);
            return;
        }
    };

    let mut app = state.app_state.write().await;
    let table = classify_batch(&app.readings, config.as_ref(), cycle_cfg.clamp_policy());
    app.last_classified_time = Some(Utc::now());
    app.table = table;
}

/// Map a ledger error onto the envelope: invalid input is the caller's
/// fault, storage failures are ours.
fn ledger_error(err: &LedgerError) -> Response {
    match err {
        LedgerError::InvalidDateInput(_) | LedgerError::InvalidDayNumber(_) => {
            ApiErrorResponse::bad_request(err.to_string())
        }
        LedgerError::Storage(_) => ApiErrorResponse::internal(err.to_string()),
    }
}

//! Boundary configuration lifecycle.
//!
//! The mutating operations the surrounding system drives: bootstrapping the
//! original start from the oldest observed reading, the "calendar date D =
//! day N" adjustment, and the accumulating reset set. State lives behind a
//! [`BoundaryStore`]; every operation either fully applies or leaves the
//! stored configuration unchanged.

use crate::cycle::resolver::{midnight_utc, start_for_target_day, BoundaryConfig, CyclePolicy};
use crate::storage::{BoundaryStore, StorageError};
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;
use tracing::info;

/// Errors from lifecycle operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// A reset/adjust operation received an unparsable date; prior
    /// configuration is left unchanged.
    #[error("invalid date input: '{0}'")]
    InvalidDateInput(String),
    /// The "date = day N" adjustment requires N >= 1.
    #[error("target day number must be at least 1, got {0}")]
    InvalidDayNumber(i64),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Handle on the persisted boundary configuration.
#[derive(Clone)]
pub struct BoundaryLedger {
    store: Arc<dyn BoundaryStore>,
}

impl BoundaryLedger {
    pub fn new(store: Arc<dyn BoundaryStore>) -> Self {
        info!(backend = store.backend_name(), "Boundary ledger ready");
        Self { store }
    }

    /// Record the original cycle start from the oldest observed reading.
    ///
    /// First write wins: once any start is recorded this is a no-op, so the
    /// feed processor may call it on every snapshot. Returns the effective
    /// start either way.
    pub fn bootstrap_original_start(
        &self,
        oldest_reading: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, LedgerError> {
        if let Some(existing) = self.store.load_original_start()? {
            return Ok(existing);
        }
        self.store.save_original_start(oldest_reading)?;
        info!(start = %oldest_reading, "Bootstrapped original cycle start from oldest reading");
        Ok(oldest_reading)
    }

    /// Declare that calendar date `D` is day `N` of the cycle, replacing the
    /// stored original start with `D - (N - 1)` days (UTC midnight).
    ///
    /// Does not touch the cutover; the two single-policy controls are
    /// deliberately independent.
    pub fn adjust_single_start(
        &self,
        calendar_date: &str,
        target_day: i64,
    ) -> Result<DateTime<Utc>, LedgerError> {
        if target_day < 1 {
            return Err(LedgerError::InvalidDayNumber(target_day));
        }
        let date = parse_calendar_date(calendar_date)?;
        let new_start = start_for_target_day(date, target_day);
        self.store.save_original_start(new_start)?;
        info!(
            date = %date,
            day = target_day,
            new_start = %new_start,
            "Adjusted cycle start"
        );
        Ok(new_start)
    }

    /// Declare the cutover date: day numbering restarts from this calendar
    /// date's midnight for all readings at or after it.
    pub fn set_cutover(&self, calendar_date: &str) -> Result<DateTime<Utc>, LedgerError> {
        let date = parse_calendar_date(calendar_date)?;
        let cutover = midnight_utc(date);
        self.store.save_cutover(cutover)?;
        info!(cutover = %cutover, "Cutover declared");
        Ok(cutover)
    }

    /// Validate and append a reset boundary, keeping the set sorted and
    /// unique. Rejects unparsable input without mutating the stored set.
    pub fn add_reset_boundary(&self, calendar_date: &str) -> Result<DateTime<Utc>, LedgerError> {
        let date = parse_calendar_date(calendar_date)?;
        let boundary = midnight_utc(date);

        let mut boundaries = self.store.load_reset_boundaries()?;
        boundaries.push(boundary);
        boundaries.sort_unstable();
        boundaries.dedup();
        self.store.save_reset_boundaries(&boundaries)?;

        info!(boundary = %boundary, total = boundaries.len(), "Reset boundary added");
        Ok(boundary)
    }

    /// Empty the reset boundary set.
    pub fn clear_reset_boundaries(&self) -> Result<(), LedgerError> {
        self.store.clear_reset_boundaries()?;
        info!("Reset boundaries cleared");
        Ok(())
    }

    /// The stored reset boundary set (sorted ascending).
    pub fn reset_boundaries(&self) -> Result<Vec<DateTime<Utc>>, LedgerError> {
        Ok(self.store.load_reset_boundaries()?)
    }

    /// Assemble the [`BoundaryConfig`] for a classification pass under the
    /// given policy.
    ///
    /// Returns `None` for the single policy when no start has ever been
    /// recorded (no readings observed yet); every reading then defaults to
    /// day 1. Under the multi policy an empty set is a valid config — the
    /// resolver itself produces the day-1 default.
    pub fn load_config(&self, policy: CyclePolicy) -> Result<Option<BoundaryConfig>, LedgerError> {
        match policy {
            CyclePolicy::Multi => Ok(Some(BoundaryConfig::multi(
                self.store.load_reset_boundaries()?,
            ))),
            CyclePolicy::Single => {
                let Some(original_start) = self.store.load_original_start()? else {
                    return Ok(None);
                };
                // With no declared cutover the config collapses to a single
                // regime: the start's own calendar midnight.
                let cutover = self
                    .store
                    .load_cutover()?
                    .unwrap_or(original_start);
                Ok(Some(BoundaryConfig::single(original_start, cutover)))
            }
        }
    }
}

/// Parse a calendar date: `YYYY-MM-DD`, or a full RFC 3339 instant whose
/// date part is taken.
fn parse_calendar_date(input: &str) -> Result<NaiveDate, LedgerError> {
    let trimmed = input.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }
    trimmed
        .parse::<DateTime<Utc>>()
        .map(|dt| dt.date_naive())
        .map_err(|_| LedgerError::InvalidDateInput(input.to_string()))
}

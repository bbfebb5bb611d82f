//! Boundary resolution and day arithmetic.
//!
//! A boundary is an instant marking the start of day 1 of a growth cycle.
//! For a reading at instant `t` governed by boundary `b`, the day number is
//! `(t - b) in whole days + 1`, so the boundary day itself is day 1.
//!
//! Whole-day truncation uses integer division of the millisecond difference
//! (truncation toward zero). For readings at or after their boundary this is
//! exact; a reading timestamped *before* its governing boundary produces a
//! day ≤ 0, which [`ClampPolicy`] handles downstream.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Milliseconds per whole day.
pub const MS_PER_DAY: i64 = 86_400_000;

/// Which boundary lifecycle policy a deployment runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CyclePolicy {
    /// One adjustable start plus a single cutover instant
    Single,
    /// Accumulating set of reset boundaries
    Multi,
}

impl std::fmt::Display for CyclePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CyclePolicy::Single => write!(f, "single"),
            CyclePolicy::Multi => write!(f, "multi"),
        }
    }
}

/// Boundary configuration supplied to the resolver on each call.
///
/// The two variants are the two divergent policies the product exposes;
/// they are alternatives, not layers, and are never combined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum BoundaryConfig {
    /// Exactly two regimes split at one cutover instant: readings before the
    /// cutover count from the original start, readings at or after it count
    /// from the cutover itself.
    Single {
        original_start: DateTime<Utc>,
        /// Normalized to UTC midnight of its calendar date by [`BoundaryConfig::single`]
        cutover: DateTime<Utc>,
    },
    /// Order-independent set of reset boundaries; the latest boundary not
    /// after the reading governs it.
    Multi {
        /// Kept sorted ascending and unique
        boundaries: Vec<DateTime<Utc>>,
    },
}

impl BoundaryConfig {
    /// Build a single-policy config. The cutover is floored to UTC midnight
    /// of its calendar date, matching the grower's "new day 1 starts on date
    /// D" declaration.
    #[must_use]
    pub fn single(original_start: DateTime<Utc>, cutover: DateTime<Utc>) -> Self {
        BoundaryConfig::Single {
            original_start,
            cutover: midnight_utc(cutover.date_naive()),
        }
    }

    /// Build a multi-policy config, sorting and deduplicating the set.
    #[must_use]
    pub fn multi(mut boundaries: Vec<DateTime<Utc>>) -> Self {
        boundaries.sort_unstable();
        boundaries.dedup();
        BoundaryConfig::Multi { boundaries }
    }

    /// The policy tag of this config.
    #[must_use]
    pub fn policy(&self) -> CyclePolicy {
        match self {
            BoundaryConfig::Single { .. } => CyclePolicy::Single,
            BoundaryConfig::Multi { .. } => CyclePolicy::Multi,
        }
    }
}

/// Outcome of resolving a reading against a boundary configuration.
///
/// `Defaulted` is the defined day-1 fallback when no boundary governs the
/// reading (empty set, or every boundary is in the future). It is not an
/// error, but it must stay distinguishable from a genuinely resolved day 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayResolution {
    /// A boundary governs the reading
    Resolved {
        day: i64,
        boundary: DateTime<Utc>,
    },
    /// No boundary at or before the reading; day number defaults to 1
    Defaulted,
}

impl DayResolution {
    /// The day number this resolution yields, before clamping.
    #[must_use]
    pub fn day_number(&self) -> i64 {
        match self {
            DayResolution::Resolved { day, .. } => *day,
            DayResolution::Defaulted => 1,
        }
    }

    /// Whether this is the no-boundary default rather than a computed value.
    #[must_use]
    pub fn is_defaulted(&self) -> bool {
        matches!(self, DayResolution::Defaulted)
    }
}

/// How non-positive day numbers (reading before its boundary) are surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClampPolicy {
    /// Pass the raw day through, zero or negative included
    Propagate,
    /// Floor the day number at 1
    ClampToOne,
}

impl ClampPolicy {
    /// Apply this policy to a raw day number.
    #[must_use]
    pub fn apply(&self, day: i64) -> i64 {
        match self {
            ClampPolicy::Propagate => day,
            ClampPolicy::ClampToOne => day.max(1),
        }
    }
}

/// Resolve the day number for a reading timestamp under the given
/// boundary configuration.
///
/// Pure function of its inputs; safe to call repeatedly and concurrently.
#[must_use]
pub fn resolve_day_number(ts: DateTime<Utc>, config: &BoundaryConfig) -> DayResolution {
    match config {
        BoundaryConfig::Single {
            original_start,
            cutover,
        } => {
            // Two regimes, split at the cutover midnight.
            let boundary = if ts < *cutover { *original_start } else { *cutover };
            DayResolution::Resolved {
                day: elapsed_whole_days(boundary, ts) + 1,
                boundary,
            }
        }
        BoundaryConfig::Multi { boundaries } => {
            // Floor lookup: greatest boundary <= ts. Boundaries are sorted
            // ascending, so partition_point gives the count of candidates.
            let idx = boundaries.partition_point(|b| *b <= ts);
            if idx == 0 {
                return DayResolution::Defaulted;
            }
            let boundary = boundaries[idx - 1];
            DayResolution::Resolved {
                day: elapsed_whole_days(boundary, ts) + 1,
                boundary,
            }
        }
    }
}

/// Whole days elapsed from `from` to `to`, truncated toward zero.
fn elapsed_whole_days(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    (to - from).num_milliseconds() / MS_PER_DAY
}

/// UTC midnight instant of a calendar date.
#[must_use]
pub(crate) fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

/// Shift a calendar date back so that it lands on `target_day` of a cycle,
/// returning the implied day-1 start instant (UTC midnight).
#[must_use]
pub(crate) fn start_for_target_day(date: NaiveDate, target_day: i64) -> DateTime<Utc> {
    midnight_utc(date) - Duration::days(target_day - 1)
}

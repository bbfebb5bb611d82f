//! Boundary Store Round-Trip Tests
//!
//! Persists boundary configuration through the sled backend, reopens the
//! database, and verifies exact instant membership plus identical
//! resolution results for a fixed probe set of timestamps.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use verde_os::cycle::{BoundaryLedger, CyclePolicy, DayResolution};
use verde_os::resolve_day_number;
use verde_os::storage::{BoundaryStore, SledBoundaryStore};

fn ts(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

/// Probe timestamps spanning before, between, and after the boundaries.
fn probe_set() -> Vec<DateTime<Utc>> {
    vec![
        ts("2023-12-25T00:00:00Z"),
        ts("2024-01-01T00:00:00Z"),
        ts("2024-01-09T23:59:59.999Z"),
        ts("2024-01-15T12:30:00Z"),
        ts("2024-02-29T08:00:00Z"),
    ]
}

#[test]
fn reset_set_survives_reopen_with_identical_resolution() {
    let dir = tempfile::tempdir().unwrap();

    let before: Vec<DayResolution> = {
        let store = Arc::new(SledBoundaryStore::open(dir.path()).unwrap());
        let ledger = BoundaryLedger::new(store);
        ledger.add_reset_boundary("2024-01-01").unwrap();
        ledger.add_reset_boundary("2024-01-15").unwrap();

        let config = ledger.load_config(CyclePolicy::Multi).unwrap().unwrap();
        probe_set()
            .into_iter()
            .map(|probe| resolve_day_number(probe, &config))
            .collect()
    };
    // First handle dropped; reopen the same directory.

    let store = Arc::new(SledBoundaryStore::open(dir.path()).unwrap());
    let ledger = BoundaryLedger::new(store);

    assert_eq!(
        ledger.reset_boundaries().unwrap(),
        vec![ts("2024-01-01T00:00:00Z"), ts("2024-01-15T00:00:00Z")]
    );

    let config = ledger.load_config(CyclePolicy::Multi).unwrap().unwrap();
    let after: Vec<DayResolution> = probe_set()
        .into_iter()
        .map(|probe| resolve_day_number(probe, &config))
        .collect();

    assert_eq!(before, after);
}

#[test]
fn single_policy_state_survives_reopen_at_millisecond_precision() {
    let dir = tempfile::tempdir().unwrap();

    {
        let store = SledBoundaryStore::open(dir.path()).unwrap();
        store
            .save_original_start(ts("2024-01-03T07:12:44.387Z"))
            .unwrap();
        store.save_cutover(ts("2024-01-20T00:00:00Z")).unwrap();
    }

    let store = SledBoundaryStore::open(dir.path()).unwrap();
    assert_eq!(
        store.load_original_start().unwrap(),
        Some(ts("2024-01-03T07:12:44.387Z"))
    );
    assert_eq!(store.load_cutover().unwrap(), Some(ts("2024-01-20T00:00:00Z")));
}

#[test]
fn clear_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();

    {
        let ledger = BoundaryLedger::new(Arc::new(SledBoundaryStore::open(dir.path()).unwrap()));
        ledger.add_reset_boundary("2024-01-01").unwrap();
        ledger.clear_reset_boundaries().unwrap();
    }

    let ledger = BoundaryLedger::new(Arc::new(SledBoundaryStore::open(dir.path()).unwrap()));
    assert!(ledger.reset_boundaries().unwrap().is_empty());

    // Empty set resolves to the defined day-1 default.
    let config = ledger.load_config(CyclePolicy::Multi).unwrap().unwrap();
    assert!(resolve_day_number(ts("2024-06-01T00:00:00Z"), &config).is_defaulted());
}

//! BoundaryStore trait — pluggable boundary configuration persistence
//!
//! Abstracts start/cutover/reset-set storage so different backends can be
//! swapped without touching cycle code:
//! - `MemoryBoundaryStore`: In-memory store for testing and minimal deployments
//! - `SledBoundaryStore`: durable sled backend used by the server binary
//!
//! Instants round-trip at whole-millisecond precision: each is persisted as
//! its millisecond epoch value and reconstructed exactly on load.

use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::Arc;

const KEY_ORIGINAL_START: &[u8] = b"original_start";
const KEY_CUTOVER: &[u8] = b"cutover";
const KEY_RESET_BOUNDARIES: &[u8] = b"reset_boundaries";

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("corrupt stored value for {0}")]
    CorruptValue(&'static str),
}

impl From<sled::Error> for StorageError {
    fn from(err: sled::Error) -> Self {
        StorageError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Trait for pluggable boundary configuration backends
///
/// Implementations must be thread-safe (Send + Sync) for shared access
/// across async tasks. Every mutation is all-or-nothing: a failed write
/// leaves the previously stored value intact.
pub trait BoundaryStore: Send + Sync {
    /// The persisted original cycle start, if one was ever recorded
    fn load_original_start(&self) -> Result<Option<DateTime<Utc>>, StorageError>;

    /// Replace the persisted original cycle start
    fn save_original_start(&self, ts: DateTime<Utc>) -> Result<(), StorageError>;

    /// The persisted cutover instant, if one was declared
    fn load_cutover(&self) -> Result<Option<DateTime<Utc>>, StorageError>;

    /// Replace the persisted cutover instant
    fn save_cutover(&self, ts: DateTime<Utc>) -> Result<(), StorageError>;

    /// The persisted reset boundary set (sorted ascending, unique)
    fn load_reset_boundaries(&self) -> Result<Vec<DateTime<Utc>>, StorageError>;

    /// Replace the persisted reset boundary set
    fn save_reset_boundaries(&self, boundaries: &[DateTime<Utc>]) -> Result<(), StorageError>;

    /// Empty the persisted reset boundary set
    fn clear_reset_boundaries(&self) -> Result<(), StorageError>;

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}

fn to_millis(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_millis()
}

fn from_millis(ms: i64, key: &'static str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::<Utc>::from_timestamp_millis(ms).ok_or(StorageError::CorruptValue(key))
}

// ============================================================================
// Sled backend
// ============================================================================

/// Durable boundary store backed by sled.
#[derive(Clone)]
pub struct SledBoundaryStore {
    db: Arc<sled::Db>,
}

impl SledBoundaryStore {
    /// Open or create the boundary store at the specified path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = sled::open(path.as_ref())?;
        tracing::info!(path = %path.as_ref().display(), "Boundary store opened");
        Ok(Self { db: Arc::new(db) })
    }

    fn load_instant(&self, key: &[u8], name: &'static str) -> Result<Option<DateTime<Utc>>, StorageError> {
        match self.db.get(key)? {
            Some(value) => {
                let bytes: [u8; 8] = value
                    .as_ref()
                    .try_into()
                    .map_err(|_| StorageError::CorruptValue(name))?;
                Ok(Some(from_millis(i64::from_be_bytes(bytes), name)?))
            }
            None => Ok(None),
        }
    }

    fn save_instant(&self, key: &[u8], ts: DateTime<Utc>) -> Result<(), StorageError> {
        self.db.insert(key, to_millis(ts).to_be_bytes().to_vec())?;
        self.db.flush()?;
        Ok(())
    }
}

impl BoundaryStore for SledBoundaryStore {
    fn load_original_start(&self) -> Result<Option<DateTime<Utc>>, StorageError> {
        self.load_instant(KEY_ORIGINAL_START, "original_start")
    }

    fn save_original_start(&self, ts: DateTime<Utc>) -> Result<(), StorageError> {
        self.save_instant(KEY_ORIGINAL_START, ts)
    }

    fn load_cutover(&self) -> Result<Option<DateTime<Utc>>, StorageError> {
        self.load_instant(KEY_CUTOVER, "cutover")
    }

    fn save_cutover(&self, ts: DateTime<Utc>) -> Result<(), StorageError> {
        self.save_instant(KEY_CUTOVER, ts)
    }

    fn load_reset_boundaries(&self) -> Result<Vec<DateTime<Utc>>, StorageError> {
        match self.db.get(KEY_RESET_BOUNDARIES)? {
            Some(value) => {
                let millis: Vec<i64> = serde_json::from_slice(&value)?;
                millis
                    .into_iter()
                    .map(|ms| from_millis(ms, "reset_boundaries"))
                    .collect()
            }
            None => Ok(Vec::new()),
        }
    }

    fn save_reset_boundaries(&self, boundaries: &[DateTime<Utc>]) -> Result<(), StorageError> {
        // Serialize fully before touching the tree so a failure here cannot
        // corrupt the stored set.
        let millis: Vec<i64> = boundaries.iter().map(|b| to_millis(*b)).collect();
        let value = serde_json::to_vec(&millis)?;
        self.db.insert(KEY_RESET_BOUNDARIES, value)?;
        self.db.flush()?;
        Ok(())
    }

    fn clear_reset_boundaries(&self) -> Result<(), StorageError> {
        self.db.remove(KEY_RESET_BOUNDARIES)?;
        self.db.flush()?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "Sled"
    }
}

// ============================================================================
// In-memory backend
// ============================================================================

/// In-memory boundary store for testing and minimal deployments
///
/// Thread-safe via `RwLock`. Not durable — configuration lost on restart.
#[derive(Default)]
pub struct MemoryBoundaryStore {
    original_start: std::sync::RwLock<Option<DateTime<Utc>>>,
    cutover: std::sync::RwLock<Option<DateTime<Utc>>>,
    reset_boundaries: std::sync::RwLock<Vec<DateTime<Utc>>>,
}

impl MemoryBoundaryStore {
    /// Create a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl BoundaryStore for MemoryBoundaryStore {
    fn load_original_start(&self) -> Result<Option<DateTime<Utc>>, StorageError> {
        self.original_start
            .read()
            .map(|guard| *guard)
            .map_err(|e| StorageError::Database(e.to_string()))
    }

    fn save_original_start(&self, ts: DateTime<Utc>) -> Result<(), StorageError> {
        self.original_start
            .write()
            .map(|mut guard| *guard = Some(ts))
            .map_err(|e| StorageError::Database(e.to_string()))
    }

    fn load_cutover(&self) -> Result<Option<DateTime<Utc>>, StorageError> {
        self.cutover
            .read()
            .map(|guard| *guard)
            .map_err(|e| StorageError::Database(e.to_string()))
    }

    fn save_cutover(&self, ts: DateTime<Utc>) -> Result<(), StorageError> {
        self.cutover
            .write()
            .map(|mut guard| *guard = Some(ts))
            .map_err(|e| StorageError::Database(e.to_string()))
    }

    fn load_reset_boundaries(&self) -> Result<Vec<DateTime<Utc>>, StorageError> {
        self.reset_boundaries
            .read()
            .map(|guard| guard.clone())
            .map_err(|e| StorageError::Database(e.to_string()))
    }

    fn save_reset_boundaries(&self, boundaries: &[DateTime<Utc>]) -> Result<(), StorageError> {
        self.reset_boundaries
            .write()
            .map(|mut guard| *guard = boundaries.to_vec())
            .map_err(|e| StorageError::Database(e.to_string()))
    }

    fn clear_reset_boundaries(&self) -> Result<(), StorageError> {
        self.reset_boundaries
            .write()
            .map(|mut guard| guard.clear())
            .map_err(|e| StorageError::Database(e.to_string()))
    }

    fn backend_name(&self) -> &'static str {
        "InMemory"
    }
}

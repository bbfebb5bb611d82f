//! VERDE-OS: Hydroponic Crop Cycle Intelligence
//!
//! Ingests timestamped environmental sensor readings for a hydroponic crop
//! cycle and derives, per reading, a relative day number within the current
//! growth cycle plus growth-stage labels for both the observed day and the
//! externally predicted maturity estimate.
//!
//! ## Architecture
//!
//! - **Ingest**: timestamp validation and stable ordering of raw feed batches
//! - **Cycle**: boundary resolution, day arithmetic, and the boundary
//!   configuration lifecycle
//! - **Stage**: pure threshold classification of day counts
//! - **Pipeline**: snapshot sources, the per-snapshot classification pass,
//!   and shared application state
//! - **API**: JSON presentation surface over Axum

pub mod api;
pub mod config;
pub mod cycle;
pub mod ingest;
pub mod pipeline;
pub mod stage;
pub mod storage;
pub mod types;

// Re-export the core engine surface
pub use cycle::{
    resolve_day_number, BoundaryConfig, BoundaryLedger, ClampPolicy, CyclePolicy, DayResolution,
    LedgerError,
};
pub use ingest::{normalize, IngestError, NormalizedBatch};
pub use stage::GrowthStage;

// Re-export commonly used types
pub use types::{ClassifiedReading, RawReading, Reading, SortDirection};

// Re-export storage
pub use storage::{BoundaryStore, MemoryBoundaryStore, SledBoundaryStore, StorageError};

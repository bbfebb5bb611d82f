//! Boundary Configuration Storage
//!
//! Persistent storage for cycle-start configuration using Sled DB, behind a
//! trait so the core stays testable with an injected in-memory backend.

mod boundary_store;

pub use boundary_store::{BoundaryStore, MemoryBoundaryStore, SledBoundaryStore, StorageError};

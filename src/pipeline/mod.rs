//! Snapshot processing pipeline.
//!
//! Wires the feed sources to the classification core: each delivered
//! snapshot is normalized, resolved against the current boundary
//! configuration, classified, and swapped into the shared application state.

pub mod processing_loop;
pub mod processor;
pub mod source;
pub mod state;

pub use processing_loop::ProcessingLoop;
pub use processor::classify_batch;
pub use state::{AppState, SystemStatus};

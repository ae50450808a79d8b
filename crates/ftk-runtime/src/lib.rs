//! ftk-runtime
//!
//! Run-level wiring: configuration and the orchestrator that drives one
//! synchronization cycle from roster fetch to committed snapshot.

pub mod config;
pub mod orchestrator;

pub use config::SyncConfig;
pub use orchestrator::{SyncError, SyncOrchestrator, SyncReport};

//! ftk-engine
//!
//! The reconciliation engine: per-identity, field-level merge of baseline
//! snapshot values, freshly fetched telemetry and enrichment results under
//! the staleness policy, with per-vessel failure isolation and run counters.
//!
//! Pacing (`pace`) is the explicit rate-limiter seam between the engine's
//! sequential loop and real time, so throttling is testable without sleeping.

pub mod engine;
pub mod pace;

pub use engine::{EngineConfig, ReconcileEngine};
pub use pace::{JitterPacer, NoopPacer, PaceConfig, PaceLane, Pacer};

//! ftk-telemetry
//!
//! Telemetry provider boundary: the wire-key mapping table, the provider
//! trait with its AIS HTTP implementation (bounded retry-with-fixed-delay),
//! and raw→typed coercion.
//!
//! This crate never decides *which* fields to fetch — the reconciliation
//! engine computes the wanted set and passes it in.

pub mod coerce;
pub mod provider;
pub mod wire;

pub use coerce::{coerce, CoerceError, TelemetryReading};
pub use provider::{
    AisTelemetryProvider, RawTelemetry, TelemetryConfig, TelemetryError, TelemetryProvider,
};
pub use wire::{validate_field_table, FieldSpec, FieldTableError, FIELD_TABLE};

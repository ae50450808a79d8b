//! Per-run observability counters for the reconciliation engine.

use crate::fields::TelemetryField;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregate outcome counts of one reconciliation pass.
///
/// `refreshed` / `inherited` are keyed by field so skip behavior of each
/// fixable field is visible individually. Enrichment outcomes are soft by
/// design and get their own tallies; only telemetry failures remove vessels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncCounters {
    /// Fields re-fetched from the telemetry provider, per field.
    pub refreshed: BTreeMap<TelemetryField, u32>,
    /// Fixable fields carried verbatim from the baseline, per field.
    pub inherited: BTreeMap<TelemetryField, u32>,
    /// Vessels excluded from this cycle after telemetry or coercion failure.
    pub dropped: u32,

    /// Page URL reused from baseline (incremental skip).
    pub page_reused: u32,
    /// Page probe resolved to a URL.
    pub page_found: u32,
    /// Page probe resolved to absent (including soft probe failures).
    pub page_absent: u32,

    /// Image extracted from the descriptive page.
    pub image_from_page: u32,
    /// Image resolved through the fallback source.
    pub image_fallback: u32,
    /// Image fell back to the default placeholder.
    pub image_default: u32,
}

impl SyncCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn note_refreshed(&mut self, field: TelemetryField) {
        *self.refreshed.entry(field).or_insert(0) += 1;
    }

    pub fn note_inherited(&mut self, field: TelemetryField) {
        *self.inherited.entry(field).or_insert(0) += 1;
    }

    pub fn refreshed_count(&self, field: TelemetryField) -> u32 {
        self.refreshed.get(&field).copied().unwrap_or(0)
    }

    pub fn inherited_count(&self, field: TelemetryField) -> u32 {
        self.inherited.get(&field).copied().unwrap_or(0)
    }
}

//! Typed telemetry field enumeration and field-set arithmetic.
//!
//! The field set is the contract between the reconciliation engine and the
//! telemetry provider: the engine decides *which* fields it wants for a
//! vessel on this cycle, the provider fetches exactly those.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Staleness classification of a telemetry field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldClass {
    /// Re-fetched on every cycle regardless of prior value.
    AlwaysRefreshed,
    /// Fetched once, then treated as stable; re-fetched only while unknown.
    Fixable,
}

/// One telemetry attribute of a tracked vessel.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum TelemetryField {
    Longitude,
    Latitude,
    Speed,
    Heading,
    LastPosition,
    Flag,
    ShipId,
}

impl TelemetryField {
    /// Every field, in canonical order.
    pub const ALL: [TelemetryField; 7] = [
        TelemetryField::Longitude,
        TelemetryField::Latitude,
        TelemetryField::Speed,
        TelemetryField::Heading,
        TelemetryField::LastPosition,
        TelemetryField::Flag,
        TelemetryField::ShipId,
    ];

    pub fn class(&self) -> FieldClass {
        match self {
            TelemetryField::Longitude
            | TelemetryField::Latitude
            | TelemetryField::Speed
            | TelemetryField::Heading
            | TelemetryField::LastPosition => FieldClass::AlwaysRefreshed,
            TelemetryField::Flag | TelemetryField::ShipId => FieldClass::Fixable,
        }
    }

    /// Stable lowercase name used in counters, logs and reports.
    pub fn name(&self) -> &'static str {
        match self {
            TelemetryField::Longitude => "longitude",
            TelemetryField::Latitude => "latitude",
            TelemetryField::Speed => "speed",
            TelemetryField::Heading => "heading",
            TelemetryField::LastPosition => "last_position",
            TelemetryField::Flag => "flag",
            TelemetryField::ShipId => "ship_id",
        }
    }
}

/// Ordered set of telemetry fields wanted for one provider lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSet(BTreeSet<TelemetryField>);

impl FieldSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The set every lookup carries: all always-refreshed fields.
    pub fn always_refreshed() -> Self {
        Self(
            TelemetryField::ALL
                .iter()
                .copied()
                .filter(|f| f.class() == FieldClass::AlwaysRefreshed)
                .collect(),
        )
    }

    /// All fixable fields.
    pub fn fixable() -> Self {
        Self(
            TelemetryField::ALL
                .iter()
                .copied()
                .filter(|f| f.class() == FieldClass::Fixable)
                .collect(),
        )
    }

    /// Every field — the wanted set of a full run.
    pub fn full() -> Self {
        Self(TelemetryField::ALL.iter().copied().collect())
    }

    pub fn insert(&mut self, field: TelemetryField) {
        self.0.insert(field);
    }

    pub fn contains(&self, field: TelemetryField) -> bool {
        self.0.contains(&field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = TelemetryField> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<TelemetryField> for FieldSet {
    fn from_iter<I: IntoIterator<Item = TelemetryField>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

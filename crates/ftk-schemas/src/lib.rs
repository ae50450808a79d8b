//! ftk-schemas
//!
//! Core data model shared by every crate: vessel identity, telemetry and
//! enrichment field sets, the merged `Vessel` record, the `FleetTable`
//! collection, run modes and run counters.
//!
//! This crate holds **only** types. No I/O, no providers, no policy.

pub mod counters;
pub mod fields;

pub use counters::SyncCounters;
pub use fields::{FieldClass, FieldSet, TelemetryField};

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Run mode
// ---------------------------------------------------------------------------

/// Refresh mode for one synchronization run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncMode {
    /// Every field of every identity is treated as unknown and re-fetched.
    Full,
    /// Fixable fields already known in the baseline snapshot are inherited.
    Incremental,
}

impl SyncMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncMode::Full => "full",
            SyncMode::Incremental => "incremental",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ParseModeError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(SyncMode::Full),
            "incremental" | "incr" => Ok(SyncMode::Incremental),
            other => Err(ParseModeError {
                raw: other.to_string(),
            }),
        }
    }
}

/// Error returned by [`SyncMode::parse`] for an unrecognized mode string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseModeError {
    pub raw: String,
}

impl fmt::Display for ParseModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid sync mode '{}'. expected one of: full | incremental",
            self.raw
        )
    }
}

impl std::error::Error for ParseModeError {}

// ---------------------------------------------------------------------------
// Vessel record
// ---------------------------------------------------------------------------

/// Immutable per-roster-entry identity. Unique by `mmsi` within a snapshot.
///
/// Rows without a valid MMSI never become a `VesselIdentity`: they cannot be
/// correlated across refresh cycles and are excluded by the roster normalizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VesselIdentity {
    /// Unique numeric identifier correlating the vessel across cycles.
    pub mmsi: i64,
    /// Display name exactly as the roster carries it.
    pub name: String,
    /// Owner / skipper reference from the roster, when present.
    pub skipper: Option<i64>,
}

/// Mutable vessel-scoped telemetry.
///
/// Always-refreshed fields are plain values: a vessel that cannot produce
/// them is dropped before a snapshot is written, so a committed record always
/// carries them. Fixable fields use `Option` as the single absent
/// representation — unknown until first observed, stable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryFields {
    pub longitude: f64,
    pub latitude: f64,
    /// Speed over ground, knots.
    pub speed: f64,
    /// Heading / course over ground, degrees.
    pub heading: f64,
    /// Last-observed position timestamp, UTC epoch seconds.
    pub last_position: i64,
    /// Two-letter country flag code (fixable).
    pub flag: Option<String>,
    /// External ship identifier at the telemetry service (fixable).
    pub ship_id: Option<i64>,
}

impl TelemetryFields {
    /// Whether this record already carries a value for `field`.
    ///
    /// Always-refreshed fields are present by construction.
    pub fn has(&self, field: TelemetryField) -> bool {
        match field {
            TelemetryField::Flag => self.flag.is_some(),
            TelemetryField::ShipId => self.ship_id.is_some(),
            _ => true,
        }
    }
}

/// Descriptive-page and image enrichment layered on top of telemetry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentFields {
    /// Descriptive page URL. Absent is a valid terminal state, not an error.
    pub page_url: Option<String>,
    /// Image URL. Always populated; falls back to a placeholder.
    pub image_url: String,
}

/// The unit of reconciliation: identity + telemetry + enrichment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vessel {
    pub identity: VesselIdentity,
    pub telemetry: TelemetryFields,
    pub enrichment: EnrichmentFields,
}

// ---------------------------------------------------------------------------
// Fleet table
// ---------------------------------------------------------------------------

/// Ordered collection of merged vessel records, keyed by MMSI.
///
/// Within one run vessels are appended in roster order, but the only
/// cross-run guarantee is set membership: each surviving identity appears
/// exactly once.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FleetTable {
    vessels: Vec<Vessel>,
}

impl FleetTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vessels(vessels: Vec<Vessel>) -> Self {
        Self { vessels }
    }

    pub fn push(&mut self, vessel: Vessel) {
        self.vessels.push(vessel);
    }

    pub fn len(&self) -> usize {
        self.vessels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vessels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Vessel> {
        self.vessels.iter()
    }

    /// Lookup by identity key.
    pub fn get(&self, mmsi: i64) -> Option<&Vessel> {
        self.vessels.iter().find(|v| v.identity.mmsi == mmsi)
    }

    pub fn contains(&self, mmsi: i64) -> bool {
        self.get(mmsi).is_some()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn vessel(mmsi: i64, name: &str) -> Vessel {
        Vessel {
            identity: VesselIdentity {
                mmsi,
                name: name.to_string(),
                skipper: None,
            },
            telemetry: TelemetryFields {
                longitude: 1.0,
                latitude: 2.0,
                speed: 5.0,
                heading: 90.0,
                last_position: 1_700_000_000,
                flag: Some("FR".to_string()),
                ship_id: Some(9),
            },
            enrichment: EnrichmentFields {
                page_url: None,
                image_url: "https://example.test/boat.png".to_string(),
            },
        }
    }

    #[test]
    fn mode_parse_accepts_canonical_strings() {
        assert_eq!(SyncMode::parse("full").unwrap(), SyncMode::Full);
        assert_eq!(SyncMode::parse("Incremental").unwrap(), SyncMode::Incremental);
        assert_eq!(SyncMode::parse("incr").unwrap(), SyncMode::Incremental);
        assert!(SyncMode::parse("partial").is_err());
    }

    #[test]
    fn mode_parse_error_display_names_input() {
        let err = SyncMode::parse("bogus").unwrap_err();
        assert!(err.to_string().contains("bogus"));
    }

    #[test]
    fn telemetry_has_tracks_fixable_presence() {
        let mut t = vessel(1, "Alpha").telemetry;
        assert!(t.has(TelemetryField::Flag));
        t.flag = None;
        assert!(!t.has(TelemetryField::Flag));
        t.ship_id = None;
        assert!(!t.has(TelemetryField::ShipId));
        // always-refreshed fields are present by construction
        assert!(t.has(TelemetryField::Longitude));
        assert!(t.has(TelemetryField::LastPosition));
    }

    #[test]
    fn fleet_table_lookup_by_mmsi() {
        let table = FleetTable::from_vessels(vec![vessel(111, "Alpha"), vessel(222, "Beta")]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(222).unwrap().identity.name, "Beta");
        assert!(table.get(333).is_none());
        assert!(table.contains(111));
    }

    #[test]
    fn vessel_roundtrips_through_json() {
        let v = vessel(111, "Alpha");
        let json = serde_json::to_string(&v).unwrap();
        let back: Vessel = serde_json::from_str(&json).unwrap();
        assert_eq!(v, back);
    }
}

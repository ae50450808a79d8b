//! Roster normalization: raw rows → canonical identity set.
//!
//! Deterministic and side-effect-free. Rules:
//! - discard rows without a valid MMSI (present, parseable, positive) —
//!   such vessels cannot be correlated across refresh cycles;
//! - de-duplicate by MMSI, keeping the first occurrence;
//! - coerce MMSI (and the optional skipper reference) to integers.

use crate::ingest_csv::RosterRow;
use ftk_schemas::VesselIdentity;
use std::collections::BTreeSet;

/// Result of normalizing one raw roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRoster {
    /// Canonical identity set, first-occurrence order preserved.
    pub identities: Vec<VesselIdentity>,
    /// Raw rows seen, duplicates included.
    pub total: usize,
    /// Rows that produced a tracked identity.
    pub identified: usize,
    /// Rows discarded for lacking a valid identifier (or duplicating one).
    pub unidentified: usize,
}

fn parse_mmsi(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok().filter(|v| *v > 0)
}

/// Normalize raw roster rows into the canonical identity set.
pub fn normalize_roster(rows: &[RosterRow]) -> NormalizedRoster {
    let mut seen: BTreeSet<i64> = BTreeSet::new();
    let mut identities: Vec<VesselIdentity> = Vec::new();

    for row in rows {
        let Some(mmsi) = row.mmsi.as_deref().and_then(parse_mmsi) else {
            continue;
        };
        if !seen.insert(mmsi) {
            // duplicate identifier: keep the first occurrence
            continue;
        }
        identities.push(VesselIdentity {
            mmsi,
            name: row.name.clone(),
            skipper: row.skipper.as_deref().and_then(|s| s.trim().parse().ok()),
        });
    }

    let total = rows.len();
    let identified = identities.len();
    NormalizedRoster {
        total,
        identified,
        unidentified: total - identified,
        identities,
    }
}

//! CSV decoding for the published roster sheet.
//!
//! Read side only: turns CSV text into [`RosterRow`] values. Identifier
//! validation, deduplication and integer coercion live in
//! [`crate::normalizer`].
//!
//! ## CSV column contract (case-insensitive, order-independent)
//!
//! | Column    | Example   | Notes                               |
//! |-----------|-----------|-------------------------------------|
//! | `name`    | `Alpha`   | Required header                     |
//! | `mmsi`    | `227006760` | Optional header, optional value   |
//! | `skipper` | `7`       | Optional header, optional value     |

use crate::RosterError;
use std::collections::HashMap;

/// One raw roster row, before validation.
///
/// `mmsi` and `skipper` stay as strings here; the normalizer owns coercion
/// so malformed identifiers are counted rather than silently lost at decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterRow {
    pub name: String,
    pub mmsi: Option<String>,
    pub skipper: Option<String>,
}

/// Parse roster CSV text into rows.
///
/// The `name` header is required; `mmsi` and `skipper` headers are optional
/// (a roster without them yields rows with those fields absent). Cell values
/// are trimmed; empty cells become `None`.
pub fn parse_roster_csv(text: &str) -> Result<Vec<RosterRow>, RosterError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = rdr
        .headers()
        .map_err(|e| RosterError::Decode(e.to_string()))?
        .clone();

    let mut index: HashMap<String, usize> = HashMap::new();
    for (i, h) in headers.iter().enumerate() {
        index.insert(h.trim().to_ascii_lowercase(), i);
    }

    let name_idx = *index
        .get("name")
        .ok_or(RosterError::MissingHeader("name"))?;
    let mmsi_idx = index.get("mmsi").copied();
    let skipper_idx = index.get("skipper").copied();

    let cell = |rec: &csv::StringRecord, idx: Option<usize>| -> Option<String> {
        idx.and_then(|i| rec.get(i))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    let mut rows = Vec::new();
    for rec in rdr.records() {
        let rec = rec.map_err(|e| RosterError::Decode(e.to_string()))?;
        let name = rec.get(name_idx).unwrap_or("").trim().to_string();
        rows.push(RosterRow {
            name,
            mmsi: cell(&rec, mmsi_idx),
            skipper: cell(&rec, skipper_idx),
        });
    }

    Ok(rows)
}

//! Wire-key mapping between typed telemetry fields and the AIS service.
//!
//! Each [`TelemetryField`] carries two keys: the column name used in the
//! lookup request and the key under which the value comes back in the
//! response row. The table is static data validated at provider
//! construction — a malformed table is a startup error, never a silent
//! per-request misroute.

use ftk_schemas::TelemetryField;
use std::fmt;

/// Wire binding of one telemetry field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub field: TelemetryField,
    /// Column name in the lookup request.
    pub request_key: &'static str,
    /// Key of the value in a response row.
    pub response_key: &'static str,
}

/// The complete field table, one entry per [`TelemetryField`].
pub const FIELD_TABLE: &[FieldSpec] = &[
    FieldSpec {
        field: TelemetryField::Longitude,
        request_key: "lon_of_latest_position",
        response_key: "LON",
    },
    FieldSpec {
        field: TelemetryField::Latitude,
        request_key: "lat_of_latest_position",
        response_key: "LAT",
    },
    FieldSpec {
        field: TelemetryField::Speed,
        request_key: "speed",
        response_key: "SPEED",
    },
    FieldSpec {
        field: TelemetryField::Heading,
        request_key: "course",
        response_key: "COURSE",
    },
    FieldSpec {
        field: TelemetryField::LastPosition,
        request_key: "time_of_latest_position",
        response_key: "LAST_POS",
    },
    FieldSpec {
        field: TelemetryField::Flag,
        request_key: "flag",
        response_key: "CODE2",
    },
    FieldSpec {
        field: TelemetryField::ShipId,
        request_key: "imo",
        response_key: "SHIP_ID",
    },
];

/// Field-table validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldTableError {
    /// A field appears more than once.
    DuplicateField(TelemetryField),
    /// Two fields share a request key.
    DuplicateRequestKey(&'static str),
    /// Two fields share a response key.
    DuplicateResponseKey(&'static str),
    /// A field has no table entry.
    MissingField(TelemetryField),
}

impl fmt::Display for FieldTableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldTableError::DuplicateField(field) => {
                write!(f, "field table: duplicate entry for field '{}'", field.name())
            }
            FieldTableError::DuplicateRequestKey(k) => {
                write!(f, "field table: duplicate request key '{k}'")
            }
            FieldTableError::DuplicateResponseKey(k) => {
                write!(f, "field table: duplicate response key '{k}'")
            }
            FieldTableError::MissingField(field) => {
                write!(f, "field table: no entry for field '{}'", field.name())
            }
        }
    }
}

impl std::error::Error for FieldTableError {}

/// Validate [`FIELD_TABLE`]: every field bound exactly once, all wire keys
/// unique. Called at provider construction.
pub fn validate_field_table() -> Result<(), FieldTableError> {
    validate(FIELD_TABLE)
}

fn validate(table: &[FieldSpec]) -> Result<(), FieldTableError> {
    let mut fields = std::collections::BTreeSet::new();
    let mut req_keys = std::collections::BTreeSet::new();
    let mut resp_keys = std::collections::BTreeSet::new();

    for spec in table {
        if !fields.insert(spec.field) {
            return Err(FieldTableError::DuplicateField(spec.field));
        }
        if !req_keys.insert(spec.request_key) {
            return Err(FieldTableError::DuplicateRequestKey(spec.request_key));
        }
        if !resp_keys.insert(spec.response_key) {
            return Err(FieldTableError::DuplicateResponseKey(spec.response_key));
        }
    }

    for field in TelemetryField::ALL {
        if !fields.contains(&field) {
            return Err(FieldTableError::MissingField(field));
        }
    }

    Ok(())
}

/// Table entry for `field`. The table is validated at startup, so a miss
/// here indicates a construction-order bug and surfaces as `MissingField`.
pub fn spec_for(field: TelemetryField) -> Result<FieldSpec, FieldTableError> {
    FIELD_TABLE
        .iter()
        .copied()
        .find(|s| s.field == field)
        .ok_or(FieldTableError::MissingField(field))
}

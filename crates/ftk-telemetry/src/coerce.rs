//! Raw→typed coercion of telemetry readings.
//!
//! A wanted field that is missing or unparseable makes the whole reading
//! invalid: stale or wrong position data is considered worse than temporary
//! absence, so the engine treats a coercion failure exactly like a provider
//! failure and drops the vessel for this cycle.

use crate::provider::RawTelemetry;
use ftk_schemas::{FieldSet, TelemetryField};
use serde_json::Value;
use std::fmt;

/// A fully coerced telemetry reading.
///
/// Always-refreshed fields are mandatory in every reading (they are wanted
/// on every cycle). Fixable fields are present exactly when they were in the
/// wanted set.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryReading {
    pub longitude: f64,
    pub latitude: f64,
    pub speed: f64,
    pub heading: f64,
    pub last_position: i64,
    pub flag: Option<String>,
    pub ship_id: Option<i64>,
}

/// Coercion failures.
#[derive(Debug, Clone, PartialEq)]
pub enum CoerceError {
    /// A wanted field was absent from the reading.
    Missing { field: TelemetryField },
    /// A value could not be read as a float.
    BadNumber { field: TelemetryField, raw: String },
    /// A value could not be read as an integer.
    BadInteger { field: TelemetryField, raw: String },
    /// The flag code is not a short alphabetic country code.
    BadFlag { raw: String },
}

impl fmt::Display for CoerceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoerceError::Missing { field } => {
                write!(f, "wanted field '{}' missing from reading", field.name())
            }
            CoerceError::BadNumber { field, raw } => {
                write!(f, "field '{}' is not a number: '{raw}'", field.name())
            }
            CoerceError::BadInteger { field, raw } => {
                write!(f, "field '{}' is not an integer: '{raw}'", field.name())
            }
            CoerceError::BadFlag { raw } => {
                write!(f, "flag code is not a 2-3 letter country code: '{raw}'")
            }
        }
    }
}

impl std::error::Error for CoerceError {}

fn render(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn as_f64(field: TelemetryField, v: &Value) -> Result<f64, CoerceError> {
    let parsed = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|x| x.is_finite())
        .ok_or_else(|| CoerceError::BadNumber {
            field,
            raw: render(v),
        })
}

fn as_i64(field: TelemetryField, v: &Value) -> Result<i64, CoerceError> {
    let parsed = match v {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| CoerceError::BadInteger {
        field,
        raw: render(v),
    })
}

fn as_flag(v: &Value) -> Result<String, CoerceError> {
    let Value::String(s) = v else {
        return Err(CoerceError::BadFlag { raw: render(v) });
    };
    let code = s.trim();
    let ok = (2..=3).contains(&code.len()) && code.chars().all(|c| c.is_ascii_alphabetic());
    if !ok {
        return Err(CoerceError::BadFlag {
            raw: s.to_string(),
        });
    }
    Ok(code.to_ascii_uppercase())
}

fn require(raw: &RawTelemetry, field: TelemetryField) -> Result<&Value, CoerceError> {
    raw.get(field).ok_or(CoerceError::Missing { field })
}

/// Coerce a raw reading against the wanted set it was fetched for.
///
/// Every always-refreshed field must be present and well-formed; a fixable
/// field is required exactly when `wanted` contains it.
pub fn coerce(raw: &RawTelemetry, wanted: &FieldSet) -> Result<TelemetryReading, CoerceError> {
    let longitude = as_f64(
        TelemetryField::Longitude,
        require(raw, TelemetryField::Longitude)?,
    )?;
    let latitude = as_f64(
        TelemetryField::Latitude,
        require(raw, TelemetryField::Latitude)?,
    )?;
    let speed = as_f64(TelemetryField::Speed, require(raw, TelemetryField::Speed)?)?;
    let heading = as_f64(
        TelemetryField::Heading,
        require(raw, TelemetryField::Heading)?,
    )?;
    let last_position = as_i64(
        TelemetryField::LastPosition,
        require(raw, TelemetryField::LastPosition)?,
    )?;

    let flag = if wanted.contains(TelemetryField::Flag) {
        Some(as_flag(require(raw, TelemetryField::Flag)?)?)
    } else {
        None
    };

    let ship_id = if wanted.contains(TelemetryField::ShipId) {
        Some(as_i64(
            TelemetryField::ShipId,
            require(raw, TelemetryField::ShipId)?,
        )?)
    } else {
        None
    };

    Ok(TelemetryReading {
        longitude,
        latitude,
        speed,
        heading,
        last_position,
        flag,
        ship_id,
    })
}

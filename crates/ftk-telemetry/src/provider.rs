//! Telemetry provider trait and the AIS HTTP implementation.
//!
//! The provider is rate-sensitive and fallible: the HTTP implementation
//! applies its own bounded retry-with-fixed-delay budget, and once that is
//! exhausted the error surfaces to the caller (the reconciliation engine
//! converts it into a per-vessel drop).

use crate::wire::{spec_for, validate_field_table, FieldTableError};
use ftk_schemas::{FieldSet, TelemetryField};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Raw reading
// ---------------------------------------------------------------------------

/// One vessel's telemetry as it came off the wire, keyed by typed field.
///
/// Values stay as raw JSON so coercion (`crate::coerce`) is a separate,
/// independently testable step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTelemetry {
    values: BTreeMap<TelemetryField, Value>,
}

impl RawTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, field: TelemetryField, value: Value) {
        self.values.insert(field, value);
    }

    pub fn with(mut self, field: TelemetryField, value: Value) -> Self {
        self.set(field, value);
        self
    }

    pub fn get(&self, field: TelemetryField) -> Option<&Value> {
        self.values.get(&field)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors a [`TelemetryProvider`] implementation may return.
#[derive(Debug)]
pub enum TelemetryError {
    /// Network or transport failure (after the retry budget).
    Transport(String),
    /// The service answered with a non-success status (after the retry budget).
    Http { status: u16 },
    /// The service has no record for this identity.
    NotFound { mmsi: i64 },
    /// A response payload could not be decoded.
    Decode(String),
    /// The wire mapping table failed startup validation.
    Table(FieldTableError),
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::Transport(msg) => write!(f, "telemetry transport error: {msg}"),
            TelemetryError::Http { status } => {
                write!(f, "telemetry http error status={status}")
            }
            TelemetryError::NotFound { mmsi } => {
                write!(f, "telemetry lookup found no record for mmsi={mmsi}")
            }
            TelemetryError::Decode(msg) => write!(f, "telemetry decode error: {msg}"),
            TelemetryError::Table(e) => write!(f, "telemetry field table invalid: {e}"),
        }
    }
}

impl std::error::Error for TelemetryError {}

impl From<FieldTableError> for TelemetryError {
    fn from(e: FieldTableError) -> Self {
        TelemetryError::Table(e)
    }
}

// ---------------------------------------------------------------------------
// Provider trait
// ---------------------------------------------------------------------------

/// Live telemetry source for one vessel identity.
///
/// Implementations must be object-safe (`Box<dyn TelemetryProvider>`) and
/// `Send + Sync`.
#[async_trait::async_trait]
pub trait TelemetryProvider: Send + Sync {
    /// Human-readable name identifying this source (e.g. `"ais"`).
    fn source_name(&self) -> &'static str;

    /// Look up the wanted fields for `mmsi`. One call per vessel per cycle.
    async fn lookup(&self, mmsi: i64, wanted: &FieldSet)
        -> Result<RawTelemetry, TelemetryError>;
}

// ---------------------------------------------------------------------------
// AIS HTTP provider
// ---------------------------------------------------------------------------

/// Configuration of the AIS HTTP telemetry provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Lookup endpoint base URL.
    pub base_url: String,
    /// Retry attempts after the first failure.
    pub retries: u32,
    /// Fixed wait between attempts, milliseconds.
    pub retry_wait_ms: u64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.marinetraffic.com/en/data".to_string(),
            retries: 8,
            retry_wait_ms: 5_000,
        }
    }
}

/// AIS-backed telemetry provider.
///
/// Blocks the caller for the duration of its own retry budget; there is no
/// caller-level timeout beyond it.
#[derive(Debug, Clone)]
pub struct AisTelemetryProvider {
    http: reqwest::Client,
    cfg: TelemetryConfig,
}

impl AisTelemetryProvider {
    /// Construct the provider, validating the wire mapping table up front.
    pub fn new(cfg: TelemetryConfig) -> Result<Self, TelemetryError> {
        validate_field_table()?;
        Ok(Self {
            http: reqwest::Client::new(),
            cfg,
        })
    }

    fn columns_param(wanted: &FieldSet) -> Result<String, TelemetryError> {
        let mut keys = Vec::with_capacity(wanted.len());
        for field in wanted.iter() {
            keys.push(spec_for(field)?.request_key);
        }
        Ok(keys.join(","))
    }

    async fn lookup_once(
        &self,
        mmsi: i64,
        columns: &str,
        wanted: &FieldSet,
    ) -> Result<RawTelemetry, TelemetryError> {
        let resp = self
            .http
            .get(self.cfg.base_url.trim_end_matches('/'))
            .query(&[
                ("asset_type", "vessels"),
                ("columns", columns),
                ("mmsi", &mmsi.to_string()),
            ])
            .send()
            .await
            .map_err(|e| TelemetryError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(TelemetryError::Http {
                status: status.as_u16(),
            });
        }

        let rows: Vec<BTreeMap<String, Value>> = resp
            .json()
            .await
            .map_err(|e| TelemetryError::Decode(e.to_string()))?;

        let Some(row) = rows.into_iter().next() else {
            return Err(TelemetryError::NotFound { mmsi });
        };

        let mut raw = RawTelemetry::new();
        for field in wanted.iter() {
            let key = spec_for(field)?.response_key;
            if let Some(v) = row.get(key) {
                raw.set(field, v.clone());
            }
        }
        Ok(raw)
    }
}

#[async_trait::async_trait]
impl TelemetryProvider for AisTelemetryProvider {
    fn source_name(&self) -> &'static str {
        "ais"
    }

    async fn lookup(
        &self,
        mmsi: i64,
        wanted: &FieldSet,
    ) -> Result<RawTelemetry, TelemetryError> {
        let columns = Self::columns_param(wanted)?;

        let mut attempt = 0u32;
        loop {
            match self.lookup_once(mmsi, &columns, wanted).await {
                Ok(raw) => return Ok(raw),
                Err(e) if attempt < self.cfg.retries => {
                    attempt += 1;
                    tracing::debug!(
                        mmsi,
                        attempt,
                        retries = self.cfg.retries,
                        error = %e,
                        "telemetry lookup failed, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(self.cfg.retry_wait_ms)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

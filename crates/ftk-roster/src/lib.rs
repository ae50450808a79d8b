//! ftk-roster
//!
//! Roster provider boundary and roster normalization.
//!
//! The roster is the authoritative identity table for the fleet. Fetching it
//! is the only run-fatal provider interaction: there is no meaningful
//! fallback identity set, so a fetch failure aborts the whole run upstream.
//!
//! Normalization (`normalizer`) is pure data-cleaning and never fetches.

pub mod ingest_csv;
pub mod normalizer;

pub use ingest_csv::{parse_roster_csv, RosterRow};
pub use normalizer::{normalize_roster, NormalizedRoster};

use std::fmt;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors a [`RosterProvider`] implementation may return.
#[derive(Debug)]
pub enum RosterError {
    /// Network or transport failure.
    Transport(String),
    /// The roster endpoint answered with a non-success status.
    Http { status: u16 },
    /// The response body could not be parsed as a roster table.
    Decode(String),
    /// The CSV header is missing a required column.
    MissingHeader(&'static str),
}

impl fmt::Display for RosterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RosterError::Transport(msg) => write!(f, "roster transport error: {msg}"),
            RosterError::Http { status } => write!(f, "roster http error status={status}"),
            RosterError::Decode(msg) => write!(f, "roster decode error: {msg}"),
            RosterError::MissingHeader(col) => {
                write!(f, "roster csv missing required header column: '{col}'")
            }
        }
    }
}

impl std::error::Error for RosterError {}

// ---------------------------------------------------------------------------
// Provider trait
// ---------------------------------------------------------------------------

/// Authoritative roster source.
///
/// Implementations must be object-safe (`Box<dyn RosterProvider>`) and
/// `Send + Sync` so they can cross async task boundaries.
#[async_trait::async_trait]
pub trait RosterProvider: Send + Sync {
    /// Human-readable name identifying this source (e.g. `"sheet"`).
    fn source_name(&self) -> &'static str;

    /// Fetch the raw roster rows. Failure is fatal to the caller's run.
    async fn fetch_roster(&self) -> Result<Vec<RosterRow>, RosterError>;
}

// ---------------------------------------------------------------------------
// HTTP CSV roster source
// ---------------------------------------------------------------------------

/// Roster source backed by a published CSV sheet fetched over HTTP.
#[derive(Debug, Clone)]
pub struct SheetRosterProvider {
    http: reqwest::Client,
    url: String,
}

impl SheetRosterProvider {
    pub fn new(url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            url,
        }
    }
}

#[async_trait::async_trait]
impl RosterProvider for SheetRosterProvider {
    fn source_name(&self) -> &'static str {
        "sheet"
    }

    async fn fetch_roster(&self) -> Result<Vec<RosterRow>, RosterError> {
        let resp = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| RosterError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(RosterError::Http {
                status: status.as_u16(),
            });
        }

        let body = resp
            .text()
            .await
            .map_err(|e| RosterError::Transport(e.to_string()))?;

        let rows = parse_roster_csv(&body)?;
        tracing::debug!(rows = rows.len(), "roster fetched");
        Ok(rows)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

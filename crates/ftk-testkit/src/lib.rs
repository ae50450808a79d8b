//! ftk-testkit
//!
//! In-process scripted providers for end-to-end scenario tests. Every
//! provider is `Clone` over shared interior state, so a test can hand one
//! clone to the orchestrator as a `Box<dyn …>` and keep another to reprogram
//! outcomes between runs or to inspect recorded calls afterwards.
//!
//! No network, no sleeping: pair these with `ftk_engine::NoopPacer`.

use ftk_enrich::{EnrichError, EnrichmentProvider, PageProbe};
use ftk_roster::{RosterError, RosterProvider, RosterRow};
use ftk_schemas::{FieldSet, TelemetryField};
use ftk_telemetry::{RawTelemetry, TelemetryError, TelemetryProvider};
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

// ---------------------------------------------------------------------------
// Roster
// ---------------------------------------------------------------------------

/// Roster source serving a fixed row set, with a failure switch.
#[derive(Clone, Default)]
pub struct StaticRosterProvider {
    inner: Arc<Mutex<RosterScript>>,
}

#[derive(Default)]
struct RosterScript {
    rows: Vec<RosterRow>,
    failing: bool,
}

impl StaticRosterProvider {
    pub fn new(rows: Vec<RosterRow>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(RosterScript {
                rows,
                failing: false,
            })),
        }
    }

    /// Make every subsequent fetch fail with a transport error.
    pub fn fail(&self) {
        self.inner.lock().unwrap().failing = true;
    }

    pub fn set_rows(&self, rows: Vec<RosterRow>) {
        self.inner.lock().unwrap().rows = rows;
    }
}

#[async_trait::async_trait]
impl RosterProvider for StaticRosterProvider {
    fn source_name(&self) -> &'static str {
        "static"
    }

    async fn fetch_roster(&self) -> Result<Vec<RosterRow>, RosterError> {
        let script = self.inner.lock().unwrap();
        if script.failing {
            return Err(RosterError::Transport("scripted failure".to_string()));
        }
        Ok(script.rows.clone())
    }
}

/// Raw roster row shorthand.
pub fn roster_row(name: &str, mmsi: Option<&str>, skipper: Option<&str>) -> RosterRow {
    RosterRow {
        name: name.to_string(),
        mmsi: mmsi.map(str::to_string),
        skipper: skipper.map(str::to_string),
    }
}

// ---------------------------------------------------------------------------
// Telemetry
// ---------------------------------------------------------------------------

/// Telemetry source with canned per-vessel readings and recorded lookups.
///
/// Like the real endpoint, it answers only the fields asked for: the canned
/// reading is filtered down to the wanted set.
#[derive(Clone, Default)]
pub struct ScriptedTelemetryProvider {
    inner: Arc<Mutex<TelemetryScript>>,
}

#[derive(Default)]
struct TelemetryScript {
    readings: BTreeMap<i64, RawTelemetry>,
    failing: BTreeSet<i64>,
    calls: Vec<(i64, FieldSet)>,
}

impl ScriptedTelemetryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, mmsi: i64, raw: RawTelemetry) {
        self.inner.lock().unwrap().readings.insert(mmsi, raw);
    }

    /// Make lookups for `mmsi` fail until [`ScriptedTelemetryProvider::heal`].
    pub fn fail(&self, mmsi: i64) {
        self.inner.lock().unwrap().failing.insert(mmsi);
    }

    pub fn heal(&self, mmsi: i64) {
        self.inner.lock().unwrap().failing.remove(&mmsi);
    }

    /// Every `(mmsi, wanted)` pair looked up so far, in call order.
    pub fn calls(&self) -> Vec<(i64, FieldSet)> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn reset_calls(&self) {
        self.inner.lock().unwrap().calls.clear();
    }
}

#[async_trait::async_trait]
impl TelemetryProvider for ScriptedTelemetryProvider {
    fn source_name(&self) -> &'static str {
        "scripted"
    }

    async fn lookup(&self, mmsi: i64, wanted: &FieldSet) -> Result<RawTelemetry, TelemetryError> {
        let mut script = self.inner.lock().unwrap();
        script.calls.push((mmsi, wanted.clone()));

        if script.failing.contains(&mmsi) {
            return Err(TelemetryError::Transport("scripted failure".to_string()));
        }
        let canned = script
            .readings
            .get(&mmsi)
            .ok_or(TelemetryError::NotFound { mmsi })?;

        let mut raw = RawTelemetry::new();
        for field in wanted.iter() {
            if let Some(value) = canned.get(field) {
                raw.set(field, value.clone());
            }
        }
        Ok(raw)
    }
}

/// A complete canned reading covering every telemetry field.
pub fn raw_full(lon: f64, lat: f64, flag: &str, ship_id: i64) -> RawTelemetry {
    RawTelemetry::new()
        .with(TelemetryField::Longitude, json!(lon))
        .with(TelemetryField::Latitude, json!(lat))
        .with(TelemetryField::Speed, json!(7.5))
        .with(TelemetryField::Heading, json!(270.0))
        .with(TelemetryField::LastPosition, json!(1_700_000_000i64))
        .with(TelemetryField::Flag, json!(flag))
        .with(TelemetryField::ShipId, json!(ship_id))
}

// ---------------------------------------------------------------------------
// Enrichment
// ---------------------------------------------------------------------------

/// Enrichment source with scripted page, image and fallback outcomes.
#[derive(Clone, Default)]
pub struct StubEnrichmentProvider {
    inner: Arc<Mutex<EnrichScript>>,
}

#[derive(Default)]
struct EnrichScript {
    /// vessel name -> page url
    pages: BTreeMap<String, String>,
    /// page url -> image url
    page_images: BTreeMap<String, String>,
    /// ship id -> fallback image url
    fallbacks: BTreeMap<i64, String>,
    probe_failing: bool,
    probes: Vec<String>,
}

impl StubEnrichmentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(&self, name: &str, url: &str) {
        self.inner
            .lock()
            .unwrap()
            .pages
            .insert(name.to_string(), url.to_string());
    }

    pub fn page_image(&self, page_url: &str, image_url: &str) {
        self.inner
            .lock()
            .unwrap()
            .page_images
            .insert(page_url.to_string(), image_url.to_string());
    }

    pub fn fallback(&self, ship_id: i64, image_url: &str) {
        self.inner
            .lock()
            .unwrap()
            .fallbacks
            .insert(ship_id, image_url.to_string());
    }

    /// Make every subsequent probe fail with a transport error.
    pub fn fail_probes(&self) {
        self.inner.lock().unwrap().probe_failing = true;
    }

    /// Vessel names probed so far, in call order.
    pub fn probes(&self) -> Vec<String> {
        self.inner.lock().unwrap().probes.clone()
    }
}

#[async_trait::async_trait]
impl EnrichmentProvider for StubEnrichmentProvider {
    fn source_name(&self) -> &'static str {
        "stub"
    }

    async fn probe_page(&self, name: &str) -> Result<PageProbe, EnrichError> {
        let mut script = self.inner.lock().unwrap();
        script.probes.push(name.to_string());
        if script.probe_failing {
            return Err(EnrichError::Transport("scripted failure".to_string()));
        }
        Ok(match script.pages.get(name) {
            Some(url) => PageProbe::Found(url.clone()),
            None => PageProbe::Absent,
        })
    }

    async fn extract_image(&self, page_url: &str) -> Result<String, EnrichError> {
        self.inner
            .lock()
            .unwrap()
            .page_images
            .get(page_url)
            .cloned()
            .ok_or_else(|| EnrichError::NoImage {
                page_url: page_url.to_string(),
            })
    }

    async fn fallback_image(&self, ship_id: i64) -> Result<String, EnrichError> {
        self.inner
            .lock()
            .unwrap()
            .fallbacks
            .get(&ship_id)
            .cloned()
            .ok_or(EnrichError::Http { status: 404 })
    }
}

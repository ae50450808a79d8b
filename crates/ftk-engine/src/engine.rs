//! The reconciliation pass.
//!
//! For each identity, in roster order:
//! 1. compute the wanted telemetry field set from the run mode and the
//!    baseline snapshot, fetch once, coerce; any failure drops the vessel
//!    from this cycle (uniform policy in both modes — stale position data is
//!    worse than temporary absence);
//! 2. merge: always-refreshed fields take the fetched value, unwanted
//!    fixable fields inherit the baseline value verbatim;
//! 3. resolve the descriptive page (reused from baseline on incremental
//!    runs) and the image (page → fallback service → default placeholder);
//!    enrichment failures are soft and never drop a vessel.
//!
//! Per-identity failures are isolated; the engine is infallible as a whole.

use crate::pace::{PaceLane, Pacer};
use ftk_enrich::{EnrichmentProvider, PageProbe};
use ftk_schemas::{
    EnrichmentFields, FieldClass, FieldSet, FleetTable, SyncCounters, SyncMode, TelemetryField,
    TelemetryFields, Vessel, VesselIdentity,
};
use ftk_telemetry::{coerce, TelemetryProvider};
use serde::{Deserialize, Serialize};

/// Engine policy knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Placeholder used when no image source yields anything.
    pub default_image_url: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_image_url:
                "https://upload.wikimedia.org/wikipedia/commons/thumb/e/e1/Sail_plan_schooner.svg/1200px-Sail_plan_schooner.svg.png"
                    .to_string(),
        }
    }
}

/// Field-level merge engine for one synchronization run.
pub struct ReconcileEngine<'a> {
    telemetry: &'a dyn TelemetryProvider,
    enrich: &'a dyn EnrichmentProvider,
    pacer: &'a dyn Pacer,
    cfg: EngineConfig,
}

impl<'a> ReconcileEngine<'a> {
    pub fn new(
        telemetry: &'a dyn TelemetryProvider,
        enrich: &'a dyn EnrichmentProvider,
        pacer: &'a dyn Pacer,
        cfg: EngineConfig,
    ) -> Self {
        Self {
            telemetry,
            enrich,
            pacer,
            cfg,
        }
    }

    /// The field set to fetch for one identity on this cycle.
    ///
    /// Always-refreshed fields are always wanted. A fixable field is wanted
    /// on a full run, or when the baseline carries no value for it (no
    /// baseline vessel counts as no value).
    pub fn wanted_fields(mode: SyncMode, baseline: Option<&Vessel>) -> FieldSet {
        let mut wanted = FieldSet::always_refreshed();
        for field in TelemetryField::ALL {
            if field.class() != FieldClass::Fixable {
                continue;
            }
            let known = baseline.map(|v| v.telemetry.has(field)).unwrap_or(false);
            if mode == SyncMode::Full || !known {
                wanted.insert(field);
            }
        }
        wanted
    }

    /// Run the reconciliation pass over `identities` in roster order.
    pub async fn reconcile(
        &self,
        identities: &[VesselIdentity],
        mode: SyncMode,
        baseline: Option<&FleetTable>,
    ) -> (FleetTable, SyncCounters) {
        let mut table = FleetTable::new();
        let mut counters = SyncCounters::new();

        for (i, identity) in identities.iter().enumerate() {
            if i > 0 {
                self.pacer.pause(PaceLane::Telemetry).await;
            }

            let prev = baseline.and_then(|b| b.get(identity.mmsi));
            let wanted = Self::wanted_fields(mode, prev);

            let raw = match self.telemetry.lookup(identity.mmsi, &wanted).await {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::warn!(
                        mmsi = identity.mmsi,
                        name = %identity.name,
                        error = %e,
                        "telemetry lookup failed, dropping vessel for this cycle"
                    );
                    counters.dropped += 1;
                    continue;
                }
            };

            let reading = match coerce(&raw, &wanted) {
                Ok(reading) => reading,
                Err(e) => {
                    tracing::warn!(
                        mmsi = identity.mmsi,
                        name = %identity.name,
                        error = %e,
                        "telemetry coercion failed, dropping vessel for this cycle"
                    );
                    counters.dropped += 1;
                    continue;
                }
            };

            for field in wanted.iter() {
                counters.note_refreshed(field);
            }
            for field in FieldSet::fixable().iter() {
                if !wanted.contains(field) {
                    counters.note_inherited(field);
                }
            }

            let telemetry = TelemetryFields {
                longitude: reading.longitude,
                latitude: reading.latitude,
                speed: reading.speed,
                heading: reading.heading,
                last_position: reading.last_position,
                flag: if wanted.contains(TelemetryField::Flag) {
                    reading.flag
                } else {
                    prev.and_then(|v| v.telemetry.flag.clone())
                },
                ship_id: if wanted.contains(TelemetryField::ShipId) {
                    reading.ship_id
                } else {
                    prev.and_then(|v| v.telemetry.ship_id)
                },
            };

            let page_url = self
                .resolve_page(identity, mode, prev, &mut counters)
                .await;
            let image_url = self
                .resolve_image(identity, page_url.as_deref(), telemetry.ship_id, &mut counters)
                .await;

            table.push(Vessel {
                identity: identity.clone(),
                telemetry,
                enrichment: EnrichmentFields {
                    page_url,
                    image_url,
                },
            });
        }

        tracing::info!(
            vessels = table.len(),
            dropped = counters.dropped,
            "reconciliation pass complete"
        );
        (table, counters)
    }

    /// Descriptive-page resolution.
    ///
    /// The source page is assumed immutable once discovered, so incremental
    /// runs reuse a baseline URL without probing. A probe failure is a soft
    /// outcome: the page is recorded absent, never the vessel dropped.
    async fn resolve_page(
        &self,
        identity: &VesselIdentity,
        mode: SyncMode,
        prev: Option<&Vessel>,
        counters: &mut SyncCounters,
    ) -> Option<String> {
        if mode == SyncMode::Incremental {
            if let Some(url) = prev.and_then(|v| v.enrichment.page_url.clone()) {
                counters.page_reused += 1;
                return Some(url);
            }
        }

        self.pacer.pause(PaceLane::Probe).await;
        match self.enrich.probe_page(&identity.name).await {
            Ok(PageProbe::Found(url)) => {
                counters.page_found += 1;
                Some(url)
            }
            Ok(PageProbe::Absent) => {
                counters.page_absent += 1;
                None
            }
            Err(e) => {
                tracing::warn!(
                    mmsi = identity.mmsi,
                    name = %identity.name,
                    error = %e,
                    "page probe failed, recording page as absent"
                );
                counters.page_absent += 1;
                None
            }
        }
    }

    /// Image resolution chain: page extraction, then the fallback photo
    /// service, then the default placeholder. Always re-attempted — page
    /// content can change, so there is no caching shortcut here.
    async fn resolve_image(
        &self,
        identity: &VesselIdentity,
        page_url: Option<&str>,
        ship_id: Option<i64>,
        counters: &mut SyncCounters,
    ) -> String {
        if let Some(page) = page_url {
            match self.enrich.extract_image(page).await {
                Ok(url) => {
                    counters.image_from_page += 1;
                    return url;
                }
                Err(e) => {
                    tracing::debug!(
                        mmsi = identity.mmsi,
                        error = %e,
                        "image extraction from page failed, trying fallback"
                    );
                }
            }
        }

        if let Some(id) = ship_id {
            match self.enrich.fallback_image(id).await {
                Ok(url) => {
                    counters.image_fallback += 1;
                    return url;
                }
                Err(e) => {
                    tracing::debug!(
                        mmsi = identity.mmsi,
                        ship_id = id,
                        error = %e,
                        "fallback image lookup failed, using placeholder"
                    );
                }
            }
        }

        counters.image_default += 1;
        self.cfg.default_image_url.clone()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pace::NoopPacer;
    use ftk_telemetry::{RawTelemetry, TelemetryError};
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    fn identity(mmsi: i64, name: &str) -> VesselIdentity {
        VesselIdentity {
            mmsi,
            name: name.to_string(),
            skipper: None,
        }
    }

    fn full_raw(flag: &str, ship_id: i64) -> RawTelemetry {
        RawTelemetry::new()
            .with(TelemetryField::Longitude, json!(1.0))
            .with(TelemetryField::Latitude, json!(2.0))
            .with(TelemetryField::Speed, json!(5.0))
            .with(TelemetryField::Heading, json!(90.0))
            .with(TelemetryField::LastPosition, json!(1_700_000_000i64))
            .with(TelemetryField::Flag, json!(flag))
            .with(TelemetryField::ShipId, json!(ship_id))
    }

    /// In-process telemetry stub recording every wanted set it is asked for.
    struct StubTelemetry {
        responses: BTreeMap<i64, RawTelemetry>,
        failing: Vec<i64>,
        calls: Mutex<Vec<(i64, FieldSet)>>,
    }

    impl StubTelemetry {
        fn new() -> Self {
            Self {
                responses: BTreeMap::new(),
                failing: Vec::new(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn with_vessel(mut self, mmsi: i64, raw: RawTelemetry) -> Self {
            self.responses.insert(mmsi, raw);
            self
        }

        fn failing_for(mut self, mmsi: i64) -> Self {
            self.failing.push(mmsi);
            self
        }

        fn calls(&self) -> Vec<(i64, FieldSet)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl TelemetryProvider for StubTelemetry {
        fn source_name(&self) -> &'static str {
            "stub"
        }

        async fn lookup(
            &self,
            mmsi: i64,
            wanted: &FieldSet,
        ) -> Result<RawTelemetry, TelemetryError> {
            self.calls.lock().unwrap().push((mmsi, wanted.clone()));
            if self.failing.contains(&mmsi) {
                return Err(TelemetryError::NotFound { mmsi });
            }
            self.responses
                .get(&mmsi)
                .cloned()
                .ok_or(TelemetryError::NotFound { mmsi })
        }
    }

    /// Enrichment stub where every outcome is scripted.
    struct StubEnrich {
        page: Option<String>,
        page_error: bool,
        image_from_page: Option<String>,
        fallback: Option<String>,
    }

    impl StubEnrich {
        fn nothing() -> Self {
            Self {
                page: None,
                page_error: false,
                image_from_page: None,
                fallback: None,
            }
        }
    }

    #[async_trait::async_trait]
    impl EnrichmentProvider for StubEnrich {
        fn source_name(&self) -> &'static str {
            "stub"
        }

        async fn probe_page(&self, _name: &str) -> Result<PageProbe, ftk_enrich::EnrichError> {
            if self.page_error {
                return Err(ftk_enrich::EnrichError::Transport("boom".to_string()));
            }
            Ok(match &self.page {
                Some(url) => PageProbe::Found(url.clone()),
                None => PageProbe::Absent,
            })
        }

        async fn extract_image(&self, page_url: &str) -> Result<String, ftk_enrich::EnrichError> {
            self.image_from_page
                .clone()
                .ok_or_else(|| ftk_enrich::EnrichError::NoImage {
                    page_url: page_url.to_string(),
                })
        }

        async fn fallback_image(&self, _ship_id: i64) -> Result<String, ftk_enrich::EnrichError> {
            self.fallback
                .clone()
                .ok_or(ftk_enrich::EnrichError::Http { status: 404 })
        }
    }

    fn baseline_vessel(mmsi: i64, flag: Option<&str>, ship_id: Option<i64>) -> Vessel {
        Vessel {
            identity: identity(mmsi, "Baseline"),
            telemetry: TelemetryFields {
                longitude: 10.0,
                latitude: 20.0,
                speed: 1.0,
                heading: 180.0,
                last_position: 1_600_000_000,
                flag: flag.map(str::to_string),
                ship_id,
            },
            enrichment: EnrichmentFields {
                page_url: None,
                image_url: "old".to_string(),
            },
        }
    }

    #[test]
    fn full_mode_wants_every_field() {
        let prev = baseline_vessel(1, Some("FR"), Some(9));
        let wanted = ReconcileEngine::wanted_fields(SyncMode::Full, Some(&prev));
        assert_eq!(wanted, FieldSet::full());
    }

    #[test]
    fn incremental_mode_skips_known_fixable_fields() {
        let prev = baseline_vessel(1, Some("FR"), None);
        let wanted = ReconcileEngine::wanted_fields(SyncMode::Incremental, Some(&prev));
        assert!(!wanted.contains(TelemetryField::Flag));
        assert!(wanted.contains(TelemetryField::ShipId));
        assert!(wanted.contains(TelemetryField::Longitude));
    }

    #[test]
    fn incremental_without_baseline_vessel_wants_everything() {
        let wanted = ReconcileEngine::wanted_fields(SyncMode::Incremental, None);
        assert_eq!(wanted, FieldSet::full());
    }

    #[tokio::test]
    async fn failed_vessel_is_dropped_others_survive() {
        let telemetry = StubTelemetry::new()
            .with_vessel(111, full_raw("FR", 9))
            .failing_for(222);
        let enrich = StubEnrich::nothing();
        let engine = ReconcileEngine::new(&telemetry, &enrich, &NoopPacer, EngineConfig::default());

        let ids = [identity(111, "Alpha"), identity(222, "Beta")];
        let (table, counters) = engine.reconcile(&ids, SyncMode::Full, None).await;

        assert_eq!(table.len(), 1);
        assert!(table.contains(111));
        assert!(!table.contains(222));
        assert_eq!(counters.dropped, 1);
    }

    #[tokio::test]
    async fn incremental_inherits_fixable_and_refreshes_position() {
        // baseline knows flag + ship_id; provider reports different values
        let baseline = FleetTable::from_vessels(vec![baseline_vessel(111, Some("FR"), Some(9))]);
        let telemetry = StubTelemetry::new().with_vessel(111, full_raw("GB", 42));
        let enrich = StubEnrich::nothing();
        let engine = ReconcileEngine::new(&telemetry, &enrich, &NoopPacer, EngineConfig::default());

        let ids = [identity(111, "Alpha")];
        let (table, counters) = engine
            .reconcile(&ids, SyncMode::Incremental, Some(&baseline))
            .await;

        let v = table.get(111).unwrap();
        // fixable fields carried verbatim from baseline
        assert_eq!(v.telemetry.flag.as_deref(), Some("FR"));
        assert_eq!(v.telemetry.ship_id, Some(9));
        // always-refreshed fields take the fetched values
        assert_eq!(v.telemetry.longitude, 1.0);
        assert_eq!(v.telemetry.last_position, 1_700_000_000);

        assert_eq!(counters.inherited_count(TelemetryField::Flag), 1);
        assert_eq!(counters.inherited_count(TelemetryField::ShipId), 1);
        assert_eq!(counters.refreshed_count(TelemetryField::Longitude), 1);
        assert_eq!(counters.refreshed_count(TelemetryField::Flag), 0);

        // and the provider was never asked for the known fixable fields
        let calls = telemetry.calls();
        assert_eq!(calls.len(), 1);
        assert!(!calls[0].1.contains(TelemetryField::Flag));
        assert!(!calls[0].1.contains(TelemetryField::ShipId));
    }

    #[tokio::test]
    async fn probe_error_yields_absent_page_not_a_drop() {
        let telemetry = StubTelemetry::new().with_vessel(111, full_raw("FR", 9));
        let enrich = StubEnrich {
            page_error: true,
            ..StubEnrich::nothing()
        };
        let engine = ReconcileEngine::new(&telemetry, &enrich, &NoopPacer, EngineConfig::default());

        let ids = [identity(111, "Alpha")];
        let (table, counters) = engine.reconcile(&ids, SyncMode::Full, None).await;

        let v = table.get(111).unwrap();
        assert_eq!(v.enrichment.page_url, None);
        assert_eq!(counters.page_absent, 1);
        assert_eq!(counters.dropped, 0);
    }

    #[tokio::test]
    async fn incremental_reuses_baseline_page_without_probing() {
        let mut prev = baseline_vessel(111, Some("FR"), Some(9));
        prev.enrichment.page_url = Some("https://pages.example/alpha".to_string());
        let baseline = FleetTable::from_vessels(vec![prev]);

        let telemetry = StubTelemetry::new().with_vessel(111, full_raw("FR", 9));
        // a probe would error loudly; reuse must not probe at all
        let enrich = StubEnrich {
            page_error: true,
            ..StubEnrich::nothing()
        };
        let engine = ReconcileEngine::new(&telemetry, &enrich, &NoopPacer, EngineConfig::default());

        let ids = [identity(111, "Alpha")];
        let (table, counters) = engine
            .reconcile(&ids, SyncMode::Incremental, Some(&baseline))
            .await;

        assert_eq!(
            table.get(111).unwrap().enrichment.page_url.as_deref(),
            Some("https://pages.example/alpha")
        );
        assert_eq!(counters.page_reused, 1);
        assert_eq!(counters.page_absent, 0);
    }

    #[tokio::test]
    async fn image_chain_falls_back_to_default() {
        let telemetry = StubTelemetry::new().with_vessel(111, full_raw("FR", 9));
        let enrich = StubEnrich::nothing(); // no page, fallback 404s
        let cfg = EngineConfig {
            default_image_url: "https://img.example/default.png".to_string(),
        };
        let engine = ReconcileEngine::new(&telemetry, &enrich, &NoopPacer, cfg);

        let ids = [identity(111, "Alpha")];
        let (table, counters) = engine.reconcile(&ids, SyncMode::Full, None).await;

        assert_eq!(
            table.get(111).unwrap().enrichment.image_url,
            "https://img.example/default.png"
        );
        assert_eq!(counters.image_default, 1);
        assert_eq!(counters.image_fallback, 0);
    }

    #[tokio::test]
    async fn image_extracted_from_page_when_available() {
        let telemetry = StubTelemetry::new().with_vessel(111, full_raw("FR", 9));
        let enrich = StubEnrich {
            page: Some("https://pages.example/alpha".to_string()),
            image_from_page: Some("https://pages.example/alpha.jpg".to_string()),
            ..StubEnrich::nothing()
        };
        let engine = ReconcileEngine::new(&telemetry, &enrich, &NoopPacer, EngineConfig::default());

        let ids = [identity(111, "Alpha")];
        let (table, counters) = engine.reconcile(&ids, SyncMode::Full, None).await;

        assert_eq!(
            table.get(111).unwrap().enrichment.image_url,
            "https://pages.example/alpha.jpg"
        );
        assert_eq!(counters.image_from_page, 1);
        assert_eq!(counters.page_found, 1);
    }

    #[tokio::test]
    async fn page_extraction_failure_falls_back_to_ship_id_lookup() {
        let telemetry = StubTelemetry::new().with_vessel(111, full_raw("FR", 9));
        let enrich = StubEnrich {
            page: Some("https://pages.example/alpha".to_string()),
            image_from_page: None, // extraction fails
            fallback: Some("https://photos.example/9.jpg".to_string()),
            ..StubEnrich::nothing()
        };
        let engine = ReconcileEngine::new(&telemetry, &enrich, &NoopPacer, EngineConfig::default());

        let ids = [identity(111, "Alpha")];
        let (table, counters) = engine.reconcile(&ids, SyncMode::Full, None).await;

        assert_eq!(
            table.get(111).unwrap().enrichment.image_url,
            "https://photos.example/9.jpg"
        );
        assert_eq!(counters.image_fallback, 1);
    }
}

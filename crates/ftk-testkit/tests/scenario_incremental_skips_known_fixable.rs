//! Scenario: incremental runs leave settled fields alone.
//!
//! # Invariant under test
//! On an incremental run, a fixable field with a baseline value is never
//! re-requested — the baseline value is carried into the new snapshot
//! verbatim — while positional fields are re-fetched for every vessel, every
//! run. A discovered page URL is likewise reused without a fresh probe.

use ftk_engine::NoopPacer;
use ftk_runtime::{SyncConfig, SyncOrchestrator};
use ftk_schemas::{SyncMode, TelemetryField};
use ftk_store::SnapshotStore;
use ftk_testkit::{
    raw_full, roster_row, ScriptedTelemetryProvider, StaticRosterProvider, StubEnrichmentProvider,
};

#[tokio::test]
async fn settled_fixable_fields_are_not_refetched() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = SyncConfig::default();

    let roster = StaticRosterProvider::new(vec![
        roster_row("Alpha", Some("111"), None),
        roster_row("Beta", Some("222"), None),
    ]);

    let telemetry = ScriptedTelemetryProvider::new();
    telemetry.insert(111, raw_full(1.0, 2.0, "FR", 9));
    telemetry.insert(222, raw_full(3.0, 4.0, "GB", 42));

    let enrich = StubEnrichmentProvider::new();
    enrich.page("Alpha", "https://pages.example/alpha");
    enrich.page_image("https://pages.example/alpha", "https://pages.example/alpha.jpg");

    let orch = SyncOrchestrator::new(
        SnapshotStore::open(dir.path(), cfg.retention).unwrap(),
        Box::new(roster),
        Box::new(telemetry.clone()),
        Box::new(enrich.clone()),
        Box::new(NoopPacer),
        &cfg,
    );

    // seed the baseline with a full run
    let first = orch.run(SyncMode::Full).await.unwrap();
    assert_eq!(first.vessels, 2);
    telemetry.reset_calls();

    // the provider now reports moved positions and a changed flag
    telemetry.insert(111, raw_full(10.0, 20.0, "DE", 999));
    telemetry.insert(222, raw_full(30.0, 40.0, "ES", 888));

    let second = orch.run(SyncMode::Incremental).await.unwrap();
    assert_eq!(second.mode_effective, SyncMode::Incremental);

    // neither lookup asked for the settled fixable fields
    let calls = telemetry.calls();
    assert_eq!(calls.len(), 2);
    for (_, wanted) in &calls {
        assert!(!wanted.contains(TelemetryField::Flag));
        assert!(!wanted.contains(TelemetryField::ShipId));
        assert!(wanted.contains(TelemetryField::Longitude));
        assert!(wanted.contains(TelemetryField::LastPosition));
    }

    let table = orch.store().load(second.stamp).unwrap();
    let alpha = table.get(111).unwrap();

    // positions refreshed, identity-like fields inherited
    assert_eq!(alpha.telemetry.longitude, 10.0);
    assert_eq!(alpha.telemetry.latitude, 20.0);
    assert_eq!(alpha.telemetry.flag.as_deref(), Some("FR"));
    assert_eq!(alpha.telemetry.ship_id, Some(9));

    assert_eq!(second.counters.inherited_count(TelemetryField::Flag), 2);
    assert_eq!(second.counters.inherited_count(TelemetryField::ShipId), 2);
    assert_eq!(
        second.counters.refreshed_count(TelemetryField::Longitude),
        2
    );
    assert_eq!(second.counters.refreshed_count(TelemetryField::Flag), 0);
}

#[tokio::test]
async fn discovered_page_is_reused_without_a_new_probe() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = SyncConfig::default();

    let roster = StaticRosterProvider::new(vec![roster_row("Alpha", Some("111"), None)]);
    let telemetry = ScriptedTelemetryProvider::new();
    telemetry.insert(111, raw_full(1.0, 2.0, "FR", 9));

    let enrich = StubEnrichmentProvider::new();
    enrich.page("Alpha", "https://pages.example/alpha");
    enrich.page_image("https://pages.example/alpha", "https://pages.example/alpha.jpg");

    let orch = SyncOrchestrator::new(
        SnapshotStore::open(dir.path(), cfg.retention).unwrap(),
        Box::new(roster),
        Box::new(telemetry),
        Box::new(enrich.clone()),
        Box::new(NoopPacer),
        &cfg,
    );

    orch.run(SyncMode::Full).await.unwrap();
    assert_eq!(enrich.probes(), vec!["Alpha"]);

    let second = orch.run(SyncMode::Incremental).await.unwrap();

    // no second probe, page carried from the baseline
    assert_eq!(enrich.probes(), vec!["Alpha"]);
    assert_eq!(second.counters.page_reused, 1);
    let table = orch.store().load(second.stamp).unwrap();
    assert_eq!(
        table.get(111).unwrap().enrichment.page_url.as_deref(),
        Some("https://pages.example/alpha")
    );
}

//! Scenario: a vessel whose telemetry cannot be fetched sits out one cycle.
//!
//! # Invariant under test
//! A failed lookup drops only that vessel from the snapshot being built;
//! the rest of the fleet is unaffected and the snapshot is still committed.
//! A run where every lookup fails commits an empty snapshot — the trail of
//! snapshots records that the run happened.

use ftk_engine::NoopPacer;
use ftk_runtime::{SyncConfig, SyncOrchestrator};
use ftk_schemas::SyncMode;
use ftk_store::SnapshotStore;
use ftk_testkit::{
    raw_full, roster_row, ScriptedTelemetryProvider, StaticRosterProvider, StubEnrichmentProvider,
};

fn orchestrator(
    dir: &std::path::Path,
    telemetry: ScriptedTelemetryProvider,
) -> SyncOrchestrator {
    let cfg = SyncConfig::default();
    let roster = StaticRosterProvider::new(vec![
        roster_row("Alpha", Some("111"), None),
        roster_row("Beta", Some("222"), None),
    ]);
    SyncOrchestrator::new(
        SnapshotStore::open(dir, cfg.retention).unwrap(),
        Box::new(roster),
        Box::new(telemetry),
        Box::new(StubEnrichmentProvider::new()),
        Box::new(NoopPacer),
        &cfg,
    )
}

#[tokio::test]
async fn failing_vessel_is_absent_from_the_committed_snapshot() {
    let dir = tempfile::tempdir().unwrap();

    let telemetry = ScriptedTelemetryProvider::new();
    telemetry.insert(111, raw_full(1.0, 2.0, "FR", 9));
    telemetry.insert(222, raw_full(3.0, 4.0, "GB", 42));
    telemetry.fail(222);

    let orch = orchestrator(dir.path(), telemetry.clone());
    let report = orch.run(SyncMode::Full).await.unwrap();

    assert_eq!(report.vessels, 1);
    assert_eq!(report.counters.dropped, 1);

    let table = orch.store().load(report.stamp).unwrap();
    assert!(table.contains(111));
    assert!(!table.contains(222));

    // the vessel returns on the next cycle once the source recovers, and is
    // treated as new: nothing to inherit, so everything is fetched in full
    telemetry.heal(222);
    let next = orch.run(SyncMode::Incremental).await.unwrap();
    assert_eq!(next.vessels, 2);
    let table = orch.store().load(next.stamp).unwrap();
    assert_eq!(table.get(222).unwrap().telemetry.flag.as_deref(), Some("GB"));
}

#[tokio::test]
async fn run_with_every_lookup_failing_still_commits_a_snapshot() {
    let dir = tempfile::tempdir().unwrap();

    let telemetry = ScriptedTelemetryProvider::new();
    telemetry.fail(111);
    telemetry.fail(222);

    let orch = orchestrator(dir.path(), telemetry);
    let report = orch.run(SyncMode::Full).await.unwrap();

    assert_eq!(report.vessels, 0);
    assert_eq!(report.counters.dropped, 2);

    let stamp = orch.store().latest().unwrap().expect("snapshot written");
    assert!(orch.store().load(stamp).unwrap().is_empty());
}

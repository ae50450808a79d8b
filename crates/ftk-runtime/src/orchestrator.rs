//! The synchronization orchestrator.
//!
//! Wires one run end to end: fetch and normalize the roster (fatal on
//! failure), pick the baseline for the requested mode, hand the identity set
//! to the reconciliation engine, and persist the resulting table. Every run
//! that gets past the roster produces a snapshot, even an empty one — the
//! snapshot trail is the system's heartbeat.
//!
//! An incremental run with no persisted snapshot escalates to a full run;
//! there is nothing to be incremental against.

use crate::config::SyncConfig;
use chrono::NaiveDateTime;
use ftk_engine::{EngineConfig, Pacer, ReconcileEngine};
use ftk_enrich::EnrichmentProvider;
use ftk_roster::{normalize_roster, RosterError, RosterProvider};
use ftk_schemas::{SyncCounters, SyncMode};
use ftk_store::{SnapshotStore, StoreError};
use ftk_telemetry::TelemetryProvider;
use std::fmt;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Fatal failures of a synchronization run.
///
/// Only the roster fetch and the snapshot store can abort a run; provider
/// failures for individual vessels are absorbed by the engine.
#[derive(Debug)]
pub enum SyncError {
    Roster(RosterError),
    Store(StoreError),
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::Roster(e) => write!(f, "roster fetch failed: {e}"),
            SyncError::Store(e) => write!(f, "snapshot store failed: {e}"),
        }
    }
}

impl std::error::Error for SyncError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SyncError::Roster(e) => Some(e),
            SyncError::Store(e) => Some(e),
        }
    }
}

impl From<RosterError> for SyncError {
    fn from(e: RosterError) -> Self {
        SyncError::Roster(e)
    }
}

impl From<StoreError> for SyncError {
    fn from(e: StoreError) -> Self {
        SyncError::Store(e)
    }
}

// ---------------------------------------------------------------------------
// Run report
// ---------------------------------------------------------------------------

/// Summary of one completed synchronization run.
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub mode_requested: SyncMode,
    /// Differs from `mode_requested` only when an incremental run escalated.
    pub mode_effective: SyncMode,
    /// Timestamp of the snapshot this run wrote.
    pub stamp: NaiveDateTime,
    /// Raw roster rows seen.
    pub roster_total: usize,
    /// Rows that yielded a tracked identity.
    pub roster_identified: usize,
    /// Rows discarded during normalization.
    pub roster_unidentified: usize,
    /// Vessels in the committed snapshot.
    pub vessels: usize,
    pub counters: SyncCounters,
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Owns the providers and the store for repeated runs.
pub struct SyncOrchestrator {
    store: SnapshotStore,
    roster: Box<dyn RosterProvider>,
    telemetry: Box<dyn TelemetryProvider>,
    enrich: Box<dyn EnrichmentProvider>,
    pacer: Box<dyn Pacer>,
    engine_cfg: EngineConfig,
}

impl SyncOrchestrator {
    pub fn new(
        store: SnapshotStore,
        roster: Box<dyn RosterProvider>,
        telemetry: Box<dyn TelemetryProvider>,
        enrich: Box<dyn EnrichmentProvider>,
        pacer: Box<dyn Pacer>,
        cfg: &SyncConfig,
    ) -> Self {
        Self {
            store,
            roster,
            telemetry,
            enrich,
            pacer,
            engine_cfg: cfg.engine.clone(),
        }
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Execute one synchronization run in the requested mode.
    pub async fn run(&self, mode: SyncMode) -> Result<SyncReport, SyncError> {
        tracing::info!(
            mode = mode.as_str(),
            roster = self.roster.source_name(),
            telemetry = self.telemetry.source_name(),
            "synchronization run starting"
        );

        let (mode_effective, baseline) = match mode {
            SyncMode::Full => (SyncMode::Full, None),
            SyncMode::Incremental => match self.store.latest()? {
                Some(stamp) => (SyncMode::Incremental, Some(self.store.load(stamp)?)),
                None => {
                    tracing::info!("no snapshot to be incremental against, escalating to full");
                    (SyncMode::Full, None)
                }
            },
        };

        let rows = self.roster.fetch_roster().await?;
        let roster = normalize_roster(&rows);
        tracing::info!(
            total = roster.total,
            identified = roster.identified,
            unidentified = roster.unidentified,
            "roster normalized"
        );

        let engine = ReconcileEngine::new(
            self.telemetry.as_ref(),
            self.enrich.as_ref(),
            self.pacer.as_ref(),
            self.engine_cfg.clone(),
        );
        let (table, counters) = engine
            .reconcile(&roster.identities, mode_effective, baseline.as_ref())
            .await;

        let stamp = self.store.save(&table)?;

        let report = SyncReport {
            mode_requested: mode,
            mode_effective,
            stamp,
            roster_total: roster.total,
            roster_identified: roster.identified,
            roster_unidentified: roster.unidentified,
            vessels: table.len(),
            counters,
        };
        tracing::info!(
            mode = report.mode_effective.as_str(),
            vessels = report.vessels,
            dropped = report.counters.dropped,
            stamp = %report.stamp,
            "synchronization run complete"
        );
        Ok(report)
    }
}

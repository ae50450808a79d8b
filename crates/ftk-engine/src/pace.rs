//! Inter-request pacing.
//!
//! The run is single-threaded and sequential by design; the only rate
//! limiting is a randomized delay between consecutive identities. The page
//! probe lane is narrower than the telemetry lane because that service is
//! more tolerant.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which external service the next request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaceLane {
    Telemetry,
    Probe,
}

/// Jitter bounds per lane, milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaceConfig {
    pub telemetry_min_ms: u64,
    pub telemetry_max_ms: u64,
    pub probe_min_ms: u64,
    pub probe_max_ms: u64,
}

impl Default for PaceConfig {
    fn default() -> Self {
        Self {
            telemetry_min_ms: 200,
            telemetry_max_ms: 400,
            probe_min_ms: 100,
            probe_max_ms: 200,
        }
    }
}

impl PaceConfig {
    /// `(min, max)` bounds for one lane, normalized so `min <= max`.
    pub fn bounds(&self, lane: PaceLane) -> (u64, u64) {
        let (min, max) = match lane {
            PaceLane::Telemetry => (self.telemetry_min_ms, self.telemetry_max_ms),
            PaceLane::Probe => (self.probe_min_ms, self.probe_max_ms),
        };
        if min <= max {
            (min, max)
        } else {
            (max, min)
        }
    }
}

/// Rate-limiter seam between the engine loop and real time.
#[async_trait::async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self, lane: PaceLane);
}

/// Production pacer: sleeps a uniformly random duration within the lane's
/// configured bounds.
#[derive(Debug, Clone)]
pub struct JitterPacer {
    cfg: PaceConfig,
}

impl JitterPacer {
    pub fn new(cfg: PaceConfig) -> Self {
        Self { cfg }
    }
}

#[async_trait::async_trait]
impl Pacer for JitterPacer {
    async fn pause(&self, lane: PaceLane) {
        let (min, max) = self.cfg.bounds(lane);
        let ms = if max > min {
            // rng is dropped before the await point
            rand::thread_rng().gen_range(min..=max)
        } else {
            min
        };
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

/// Test pacer: never waits.
#[derive(Debug, Clone, Default)]
pub struct NoopPacer;

#[async_trait::async_trait]
impl Pacer for NoopPacer {
    async fn pause(&self, _lane: PaceLane) {}
}

//! Run configuration.
//!
//! One flat struct covering every tunable of a synchronization run. All
//! sections carry working defaults except `roster_url`, which has no
//! meaningful fallback and must be supplied by the operator.

use ftk_engine::{EngineConfig, PaceConfig};
use ftk_enrich::EnrichConfig;
use ftk_store::DEFAULT_RETENTION;
use ftk_telemetry::TelemetryConfig;
use serde::{Deserialize, Serialize};

/// Full configuration of a synchronization run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Published CSV roster endpoint. Required.
    pub roster_url: String,
    /// Maximum number of snapshot files to keep.
    pub retention: usize,
    pub telemetry: TelemetryConfig,
    pub enrich: EnrichConfig,
    pub pace: PaceConfig,
    pub engine: EngineConfig,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            roster_url: String::new(),
            retention: DEFAULT_RETENTION,
            telemetry: TelemetryConfig::default(),
            enrich: EnrichConfig::default(),
            pace: PaceConfig::default(),
            engine: EngineConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_json_fills_defaults() {
        let cfg: SyncConfig =
            serde_json::from_str(r#"{"roster_url": "https://sheets.example/fleet.csv"}"#).unwrap();
        assert_eq!(cfg.roster_url, "https://sheets.example/fleet.csv");
        assert_eq!(cfg.retention, DEFAULT_RETENTION);
        assert_eq!(cfg.telemetry.retries, 8);
    }

    #[test]
    fn sections_override_independently() {
        let cfg: SyncConfig = serde_json::from_str(
            r#"{
                "roster_url": "https://sheets.example/fleet.csv",
                "retention": 2,
                "telemetry": {"retries": 1}
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.retention, 2);
        assert_eq!(cfg.telemetry.retries, 1);
        // untouched sections keep defaults
        assert_eq!(cfg.pace.telemetry_min_ms, 200);
    }
}

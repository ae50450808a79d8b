//! Flattened CSV schema of one vessel record.
//!
//! Absent optional values serialize as empty cells; the reverse mapping
//! treats an empty cell as `None`. Any other parse failure is a corrupt
//! snapshot, surfaced by the store.

use ftk_schemas::{EnrichmentFields, TelemetryFields, Vessel, VesselIdentity};
use serde::{Deserialize, Serialize};

/// One row of a persisted snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRow {
    pub mmsi: i64,
    pub name: String,
    pub skipper: Option<i64>,
    pub longitude: f64,
    pub latitude: f64,
    pub speed: f64,
    pub heading: f64,
    pub last_position: i64,
    pub flag: Option<String>,
    pub ship_id: Option<i64>,
    pub page_url: Option<String>,
    pub image_url: String,
}

impl SnapshotRow {
    pub fn from_vessel(vessel: &Vessel) -> Self {
        Self {
            mmsi: vessel.identity.mmsi,
            name: vessel.identity.name.clone(),
            skipper: vessel.identity.skipper,
            longitude: vessel.telemetry.longitude,
            latitude: vessel.telemetry.latitude,
            speed: vessel.telemetry.speed,
            heading: vessel.telemetry.heading,
            last_position: vessel.telemetry.last_position,
            flag: vessel.telemetry.flag.clone(),
            ship_id: vessel.telemetry.ship_id,
            page_url: vessel.enrichment.page_url.clone(),
            image_url: vessel.enrichment.image_url.clone(),
        }
    }

    pub fn into_vessel(self) -> Vessel {
        Vessel {
            identity: VesselIdentity {
                mmsi: self.mmsi,
                name: self.name,
                skipper: self.skipper,
            },
            telemetry: TelemetryFields {
                longitude: self.longitude,
                latitude: self.latitude,
                speed: self.speed,
                heading: self.heading,
                last_position: self.last_position,
                flag: self.flag,
                ship_id: self.ship_id,
            },
            enrichment: EnrichmentFields {
                page_url: self.page_url,
                image_url: self.image_url,
            },
        }
    }
}

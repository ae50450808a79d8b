//! ftk-store
//!
//! Snapshot persistence: one CSV file per snapshot, named with an embedded
//! fixed-format timestamp, bounded history with oldest-first eviction.
//!
//! The store owns the persisted file set exclusively for the duration of a
//! `save`; concurrent runs against the same directory are a non-goal and no
//! locking is attempted. Filesystem side effects only — no network.

pub mod row;

pub use row::SnapshotRow;

use chrono::NaiveDateTime;
use ftk_schemas::FleetTable;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Snapshot filename prefix and timestamp encoding, e.g.
/// `SAVE__14_02_2026_06_30_00.csv`.
pub const SNAPSHOT_PREFIX: &str = "SAVE__";
pub const SNAPSHOT_EXT: &str = ".csv";
pub const STAMP_FORMAT: &str = "%d_%m_%Y_%H_%M_%S";

/// Default retention bound: at most this many snapshot files are kept.
pub const DEFAULT_RETENTION: usize = 5;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors surfaced by the snapshot store.
#[derive(Debug)]
pub enum StoreError {
    /// Filesystem failure (read, write or delete).
    Io(String),
    /// A file in the snapshot directory does not match the timestamp encoding.
    MalformedTimestamp { file_name: String },
    /// The requested snapshot does not exist.
    NotFound { stamp: NaiveDateTime },
    /// The stored table cannot be parsed into the expected schema.
    CorruptSnapshot {
        stamp: NaiveDateTime,
        detail: String,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io(msg) => write!(f, "snapshot io error: {msg}"),
            StoreError::MalformedTimestamp { file_name } => {
                write!(f, "snapshot file name has malformed timestamp: '{file_name}'")
            }
            StoreError::NotFound { stamp } => {
                write!(f, "snapshot not found: {}", stamp.format(STAMP_FORMAT))
            }
            StoreError::CorruptSnapshot { stamp, detail } => {
                write!(
                    f,
                    "snapshot {} is corrupt: {detail}",
                    stamp.format(STAMP_FORMAT)
                )
            }
        }
    }
}

impl std::error::Error for StoreError {}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Filesystem snapshot store with a fixed retention bound.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    root: PathBuf,
    retention: usize,
}

impl SnapshotStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>, retention: usize) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| StoreError::Io(e.to_string()))?;
        Ok(Self { root, retention })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn retention(&self) -> usize {
        self.retention
    }

    fn file_path(&self, stamp: NaiveDateTime) -> PathBuf {
        self.root.join(format!(
            "{SNAPSHOT_PREFIX}{}{SNAPSHOT_EXT}",
            stamp.format(STAMP_FORMAT)
        ))
    }

    /// All persisted snapshot timestamps, ascending.
    ///
    /// Every file in the directory must match the snapshot naming scheme;
    /// anything else fails with `MalformedTimestamp` rather than being
    /// silently skipped.
    pub fn list(&self) -> Result<Vec<NaiveDateTime>, StoreError> {
        let mut stamps = Vec::new();

        let entries = fs::read_dir(&self.root).map_err(|e| StoreError::Io(e.to_string()))?;
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::Io(e.to_string()))?;
            if entry.path().is_dir() {
                continue;
            }
            let file_name = entry.file_name().to_string_lossy().into_owned();
            stamps.push(parse_snapshot_file_name(&file_name)?);
        }

        stamps.sort();
        Ok(stamps)
    }

    /// Timestamp of the newest snapshot, or `None` when the store is empty.
    pub fn latest(&self) -> Result<Option<NaiveDateTime>, StoreError> {
        Ok(self.list()?.into_iter().max())
    }

    /// Load one snapshot into a fleet table.
    pub fn load(&self, stamp: NaiveDateTime) -> Result<FleetTable, StoreError> {
        let path = self.file_path(stamp);
        if !path.exists() {
            return Err(StoreError::NotFound { stamp });
        }

        let mut rdr = csv::Reader::from_path(&path).map_err(|e| StoreError::Io(e.to_string()))?;
        let mut table = FleetTable::new();
        for rec in rdr.deserialize::<SnapshotRow>() {
            let row = rec.map_err(|e| StoreError::CorruptSnapshot {
                stamp,
                detail: e.to_string(),
            })?;
            table.push(row.into_vessel());
        }
        Ok(table)
    }

    /// Persist `table` tagged with the current time, evicting the oldest
    /// snapshot first when the retention bound is reached.
    pub fn save(&self, table: &FleetTable) -> Result<NaiveDateTime, StoreError> {
        self.save_at(table, chrono::Utc::now().naive_utc())
    }

    /// Deterministic entry point behind [`SnapshotStore::save`]; also used by
    /// tests that need distinct explicit stamps.
    pub fn save_at(
        &self,
        table: &FleetTable,
        stamp: NaiveDateTime,
    ) -> Result<NaiveDateTime, StoreError> {
        // truncate sub-second precision so the stamp roundtrips the filename
        let stamp = truncate_to_seconds(stamp);

        let existing = self.list()?;
        if existing.len() >= self.retention {
            if let Some(oldest) = existing.first().copied() {
                tracing::info!(
                    evicted = %oldest.format(STAMP_FORMAT),
                    retention = self.retention,
                    "retention bound reached, deleting oldest snapshot"
                );
                fs::remove_file(self.file_path(oldest))
                    .map_err(|e| StoreError::Io(e.to_string()))?;
            }
        }

        let path = self.file_path(stamp);
        let mut wtr = csv::Writer::from_path(&path).map_err(|e| StoreError::Io(e.to_string()))?;
        for vessel in table.iter() {
            wtr.serialize(SnapshotRow::from_vessel(vessel))
                .map_err(|e| StoreError::Io(e.to_string()))?;
        }
        wtr.flush().map_err(|e| StoreError::Io(e.to_string()))?;

        tracing::info!(
            stamp = %stamp.format(STAMP_FORMAT),
            vessels = table.len(),
            "snapshot written"
        );
        Ok(stamp)
    }
}

fn truncate_to_seconds(stamp: NaiveDateTime) -> NaiveDateTime {
    stamp - chrono::Duration::nanoseconds(i64::from(stamp.and_utc().timestamp_subsec_nanos()))
}

/// Parse `SAVE__<stamp>.csv` into its timestamp.
pub fn parse_snapshot_file_name(file_name: &str) -> Result<NaiveDateTime, StoreError> {
    let malformed = || StoreError::MalformedTimestamp {
        file_name: file_name.to_string(),
    };

    let stem = file_name
        .strip_prefix(SNAPSHOT_PREFIX)
        .and_then(|s| s.strip_suffix(SNAPSHOT_EXT))
        .ok_or_else(malformed)?;

    NaiveDateTime::parse_from_str(stem, STAMP_FORMAT).map_err(|_| malformed())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

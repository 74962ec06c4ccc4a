//! Persistence boundary for the last successful calibration timestamp.
//!
//! The pipeline persists exactly one datum: when calibration last
//! completed. It is read once at session start for the staleness
//! check and written whenever the machine transitions to Completed.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use tracing::warn;

/// Error writing the calibration timestamp.
#[derive(Debug, thiserror::Error)]
pub enum CalibrationStoreError {
    /// Underlying write failed.
    #[error("failed to write calibration timestamp to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Stores the last successful calibration timestamp.
///
/// Reads are infallible by design: a missing or unreadable record is
/// indistinguishable from "never calibrated", which the staleness
/// policy already handles.
pub trait CalibrationStore: Send + Sync {
    /// When calibration last completed, if ever recorded.
    fn last_completed(&self) -> Option<DateTime<Utc>>;

    /// Record a completion.
    fn record_completed(&self, at: DateTime<Utc>) -> Result<(), CalibrationStoreError>;
}

/// In-memory store for tests and the CLI harness.
#[derive(Debug, Default)]
pub struct MemoryCalibrationStore {
    last: Mutex<Option<DateTime<Utc>>>,
}

impl MemoryCalibrationStore {
    /// Create an empty store (never calibrated).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with a prior completion.
    pub fn with_last_completed(at: DateTime<Utc>) -> Self {
        Self {
            last: Mutex::new(Some(at)),
        }
    }
}

impl CalibrationStore for MemoryCalibrationStore {
    fn last_completed(&self) -> Option<DateTime<Utc>> {
        *self.last.lock().unwrap()
    }

    fn record_completed(&self, at: DateTime<Utc>) -> Result<(), CalibrationStoreError> {
        *self.last.lock().unwrap() = Some(at);
        Ok(())
    }
}

/// File-backed store: one RFC 3339 timestamp in a single file.
#[derive(Debug)]
pub struct FileCalibrationStore {
    path: PathBuf,
}

impl FileCalibrationStore {
    /// Create a store backed by the given file. The file need not
    /// exist yet; it is created on the first recorded completion.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CalibrationStore for FileCalibrationStore {
    fn last_completed(&self) -> Option<DateTime<Utc>> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read calibration record");
                return None;
            }
        };
        match DateTime::parse_from_rfc3339(contents.trim()) {
            Ok(parsed) => Some(parsed.with_timezone(&Utc)),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Malformed calibration record");
                None
            }
        }
    }

    fn record_completed(&self, at: DateTime<Utc>) -> Result<(), CalibrationStoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| CalibrationStoreError::Write {
                path: self.path.clone(),
                source,
            })?;
        }
        std::fs::write(&self.path, at.to_rfc3339()).map_err(|source| CalibrationStoreError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

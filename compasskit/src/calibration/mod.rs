//! Calibration state machine and staleness policy.
//!
//! Calibration is a user-driven procedure to improve heading accuracy.
//! The machine is driven from three directions:
//!
//! - explicit start/stop intents from the UI,
//! - sensor-quality failures reported by the adapter,
//! - a once-per-session staleness check against the last recorded
//!   completion (see [`StalenessPolicy`]).
//!
//! A stale calibration is not an error; it reuses the Failed state so
//! the UI's existing recalibration prompt fires without a second
//! surface.

mod store;

pub use store::{CalibrationStore, CalibrationStoreError, FileCalibrationStore, MemoryCalibrationStore};

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

/// Calibration lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CalibrationState {
    /// No calibration has run this session.
    #[default]
    NotStarted,
    /// A calibration session is running.
    InProgress,
    /// The last session completed successfully.
    Completed,
    /// The last session failed, or the sensor reported a quality
    /// failure, or the last success is stale.
    Failed,
}

impl std::fmt::Display for CalibrationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::NotStarted => "NotStarted",
            Self::InProgress => "InProgress",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
        };
        write!(f, "{}", label)
    }
}

/// Tracks the calibration lifecycle.
///
/// Only one session may be in progress at a time; starting while
/// already InProgress is a no-op.
#[derive(Debug, Default)]
pub struct CalibrationStateMachine {
    state: CalibrationState,
}

impl CalibrationStateMachine {
    /// Create a machine in the initial NotStarted state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> CalibrationState {
        self.state
    }

    /// Start a calibration session.
    ///
    /// Valid from NotStarted, Completed and Failed. Returns true if a
    /// session actually started.
    pub fn start(&mut self) -> bool {
        match self.state {
            CalibrationState::InProgress => {
                debug!("Calibration start ignored, session already in progress");
                false
            }
            from => {
                info!(%from, "Calibration started");
                self.state = CalibrationState::InProgress;
                true
            }
        }
    }

    /// Stop the running session, marking it completed.
    ///
    /// Returns true if a session was actually completed; stopping
    /// while no session is running is a no-op.
    pub fn stop(&mut self) -> bool {
        match self.state {
            CalibrationState::InProgress => {
                info!("Calibration completed");
                self.state = CalibrationState::Completed;
                true
            }
            state => {
                debug!(%state, "Calibration stop ignored, no session in progress");
                false
            }
        }
    }

    /// Force the machine into Failed from any state.
    ///
    /// Used for sensor heading-quality failures, the conservative
    /// fallback for unclassified sensor failures, and staleness.
    pub fn fail(&mut self) {
        if self.state != CalibrationState::Failed {
            warn!(from = %self.state, "Calibration marked failed");
            self.state = CalibrationState::Failed;
        }
    }
}

/// Once-per-session staleness rule for the last successful calibration.
///
/// Completions older than `max_age` (or missing entirely) force the
/// machine to Failed after a short grace delay, so the recalibration
/// prompt does not flash before the UI has settled.
#[derive(Debug, Clone)]
pub struct StalenessPolicy {
    /// A completion older than this is stale.
    pub max_age: chrono::Duration,

    /// Grace delay before flagging a stale completion.
    pub stale_grace: Duration,

    /// Grace delay before flagging a device that has never been
    /// calibrated; slightly longer so first launches are not greeted
    /// with a prompt.
    pub never_calibrated_grace: Duration,
}

impl Default for StalenessPolicy {
    fn default() -> Self {
        Self {
            max_age: chrono::Duration::days(30),
            stale_grace: Duration::from_secs(2),
            never_calibrated_grace: Duration::from_secs(3),
        }
    }
}

impl StalenessPolicy {
    /// Evaluate the policy against the last recorded completion.
    ///
    /// Returns the grace delay after which calibration should be
    /// forced to Failed, or None if the last completion is fresh.
    pub fn evaluate(&self, last_completed: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Option<Duration> {
        match last_completed {
            None => {
                debug!("No recorded calibration, scheduling staleness prompt");
                Some(self.never_calibrated_grace)
            }
            Some(at) if now - at > self.max_age => {
                debug!(last_completed = %at, "Last calibration is stale, scheduling prompt");
                Some(self.stale_grace)
            }
            Some(at) => {
                debug!(last_completed = %at, "Last calibration is fresh");
                None
            }
        }
    }
}

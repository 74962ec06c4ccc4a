//! Platform sensor boundary.
//!
//! [`SensorSource`] is the control surface of the platform's location
//! manager; [`PlatformEvent`] is its callback surface, delivered
//! serially over a channel. The platform guarantees at most one
//! in-flight callback stream, so no ordering recovery is needed on
//! this side.

use std::time::Instant;

use crate::permission::PermissionState;

use super::error::SensorFailure;

/// Raw heading sample as the platform reports it, before
/// normalization.
#[derive(Debug, Clone)]
pub struct RawHeading {
    /// Magnetic heading in degrees (unnormalized).
    pub magnetic_heading: f64,
    /// True-north heading in degrees.
    pub true_heading: f64,
    /// Precision estimate in degrees; negative means invalid.
    pub accuracy: f64,
    /// When the platform took the sample.
    pub timestamp: Instant,
}

impl RawHeading {
    /// Sample stamped with the current time.
    pub fn new(magnetic_heading: f64, true_heading: f64, accuracy: f64) -> Self {
        Self {
            magnetic_heading,
            true_heading,
            accuracy,
            timestamp: Instant::now(),
        }
    }
}

/// Raw position fix as the platform reports it.
#[derive(Debug, Clone)]
pub struct RawPosition {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub accuracy: f64,
    /// When the platform took the fix.
    pub timestamp: Instant,
}

impl RawPosition {
    /// Fix stamped with the current time.
    pub fn new(latitude: f64, longitude: f64, altitude: f64, accuracy: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude,
            accuracy,
            timestamp: Instant::now(),
        }
    }
}

/// A platform sensor callback.
#[derive(Debug, Clone)]
pub enum PlatformEvent {
    /// New heading sample.
    Heading(RawHeading),
    /// Batch of position fixes; only the most recent one is used.
    Positions(Vec<RawPosition>),
    /// Authorization state changed.
    Authorization(PermissionState),
    /// The sensor source failed.
    Failure(SensorFailure),
}

/// Control surface of the platform sensor manager.
///
/// Implementations must be cheap to call; every method is
/// fire-and-forget and results (readings, authorization changes,
/// failures) arrive asynchronously as [`PlatformEvent`]s.
pub trait SensorSource: Send + Sync {
    /// Current authorization state.
    fn authorization_status(&self) -> PermissionState;

    /// Ask the platform to show its permission prompt.
    fn request_permission(&self);

    /// Begin heading and position updates.
    fn start_updates(&self);

    /// Halt heading and position updates.
    fn stop_updates(&self);

    /// Hint the platform to dismiss its calibration display.
    fn dismiss_calibration_display(&self);
}

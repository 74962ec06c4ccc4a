//! Snapshot types and the consumer-facing handle.
//!
//! The orchestrator publishes one consistent [`CompassSnapshot`] over
//! a watch channel; [`SharedCompass`] wraps the watch receiver and the
//! intent channel into a clone-able handle the UI layer holds.
//!
//! - [`CompassProvider`] - Query API (pull)
//! - [`CompassBroadcaster`] - Subscription API (push)

use tokio::sync::{broadcast, mpsc, watch};
use tracing::warn;

use crate::calibration::CalibrationState;
use crate::permission::PermissionState;
use crate::reading::{HeadingReading, PositionReading};

/// A heading passed near a cardinal boundary. Carries no payload; the
/// crossing itself is the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdCrossingEvent;

/// An intent issued by the UI layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    RequestPermission,
    Start,
    Stop,
    StartCalibration,
    StopCalibration,
    ToggleLocationDetail,
}

/// One consistent view of the whole pipeline, published after every
/// state change.
#[derive(Debug, Clone, Default)]
pub struct CompassSnapshot {
    /// Latest heading reading, if any arrived this session.
    pub heading: Option<HeadingReading>,

    /// Latest position reading, if any arrived this session.
    pub position: Option<PositionReading>,

    /// Authorization state.
    pub permission: PermissionState,

    /// Calibration lifecycle state.
    pub calibration: CalibrationState,

    /// UI-owned flag: the location detail panel is open.
    pub show_location_detail: bool,

    /// Rotation target for the dial needle: the negated heading, so
    /// the dial counter-rotates relative to true north. The
    /// presentation layer animates toward this value.
    pub needle_rotation: f64,

    /// The user must grant permission manually in the system settings.
    pub permission_prompt_needed: bool,
}

impl CompassSnapshot {
    /// True if sensor updates may run.
    pub fn is_authorized(&self) -> bool {
        self.permission.is_authorized()
    }

    /// Display heading, `"---°"` until a reading arrives.
    pub fn formatted_heading(&self) -> String {
        self.heading
            .as_ref()
            .map(HeadingReading::formatted_heading)
            .unwrap_or_else(|| "---°".to_string())
    }

    /// Cardinal label, `"---"` until a reading arrives.
    pub fn cardinal_label(&self) -> &'static str {
        self.heading
            .as_ref()
            .map(|reading| reading.cardinal_direction().label())
            .unwrap_or("---")
    }

    /// Accuracy tier label, `"Unknown"` until a reading arrives.
    pub fn accuracy_label(&self) -> &'static str {
        self.heading
            .as_ref()
            .map(|reading| reading.accuracy_tier().label())
            .unwrap_or("Unknown")
    }

    /// Display coordinates, `"Unknown Location"` until a fix arrives.
    pub fn formatted_coordinates(&self) -> String {
        self.position
            .as_ref()
            .map(PositionReading::formatted_coordinate)
            .unwrap_or_else(|| "Unknown Location".to_string())
    }

    /// Display altitude, `"Unknown Altitude"` until a fix arrives.
    pub fn formatted_altitude(&self) -> String {
        self.position
            .as_ref()
            .map(PositionReading::formatted_altitude)
            .unwrap_or_else(|| "Unknown Altitude".to_string())
    }
}

/// Pull API over the aggregated snapshot.
pub trait CompassProvider: Send + Sync {
    /// Current snapshot.
    fn snapshot(&self) -> CompassSnapshot;

    /// Current authorization state.
    fn permission_state(&self) -> PermissionState;

    /// Current calibration state.
    fn calibration_state(&self) -> CalibrationState;

    /// Latest heading reading, if any.
    fn heading(&self) -> Option<HeadingReading>;
}

/// Push API over the aggregated snapshot.
pub trait CompassBroadcaster: Send + Sync {
    /// Observe every published snapshot.
    fn watch(&self) -> watch::Receiver<CompassSnapshot>;

    /// Subscribe to discrete threshold-crossing events.
    fn subscribe_crossings(&self) -> broadcast::Receiver<ThresholdCrossingEvent>;
}

/// Clone-able handle the UI layer holds: snapshot observation plus
/// intent submission.
#[derive(Clone)]
pub struct SharedCompass {
    snapshot_rx: watch::Receiver<CompassSnapshot>,
    crossing_tx: broadcast::Sender<ThresholdCrossingEvent>,
    intent_tx: mpsc::Sender<Intent>,
}

impl SharedCompass {
    pub(crate) fn new(
        snapshot_rx: watch::Receiver<CompassSnapshot>,
        crossing_tx: broadcast::Sender<ThresholdCrossingEvent>,
        intent_tx: mpsc::Sender<Intent>,
    ) -> Self {
        Self {
            snapshot_rx,
            crossing_tx,
            intent_tx,
        }
    }

    /// Ask for sensor permission.
    pub fn request_permission(&self) {
        self.submit(Intent::RequestPermission);
    }

    /// Start sensor updates.
    pub fn start(&self) {
        self.submit(Intent::Start);
    }

    /// Stop sensor updates.
    pub fn stop(&self) {
        self.submit(Intent::Stop);
    }

    /// Start a calibration session.
    pub fn start_calibration(&self) {
        self.submit(Intent::StartCalibration);
    }

    /// Finish the running calibration session.
    pub fn stop_calibration(&self) {
        self.submit(Intent::StopCalibration);
    }

    /// Toggle the location detail panel.
    pub fn toggle_location_detail(&self) {
        self.submit(Intent::ToggleLocationDetail);
    }

    fn submit(&self, intent: Intent) {
        if let Err(e) = self.intent_tx.try_send(intent) {
            warn!(?intent, error = %e, "Dropped UI intent, orchestrator not keeping up");
        }
    }
}

impl CompassProvider for SharedCompass {
    fn snapshot(&self) -> CompassSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    fn permission_state(&self) -> PermissionState {
        self.snapshot_rx.borrow().permission
    }

    fn calibration_state(&self) -> CalibrationState {
        self.snapshot_rx.borrow().calibration
    }

    fn heading(&self) -> Option<HeadingReading> {
        self.snapshot_rx.borrow().heading.clone()
    }
}

impl CompassBroadcaster for SharedCompass {
    fn watch(&self) -> watch::Receiver<CompassSnapshot> {
        self.snapshot_rx.clone()
    }

    fn subscribe_crossings(&self) -> broadcast::Receiver<ThresholdCrossingEvent> {
        self.crossing_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_default_fallbacks() {
        let snapshot = CompassSnapshot::default();

        assert_eq!(snapshot.formatted_heading(), "---°");
        assert_eq!(snapshot.cardinal_label(), "---");
        assert_eq!(snapshot.accuracy_label(), "Unknown");
        assert_eq!(snapshot.formatted_coordinates(), "Unknown Location");
        assert_eq!(snapshot.formatted_altitude(), "Unknown Altitude");
        assert!(!snapshot.is_authorized());
        assert_eq!(snapshot.permission, PermissionState::Undetermined);
        assert_eq!(snapshot.calibration, CalibrationState::NotStarted);
    }

    #[test]
    fn test_snapshot_with_readings() {
        let snapshot = CompassSnapshot {
            heading: Some(HeadingReading::new(272.0, 273.0, 4.0)),
            position: Some(PositionReading::new(53.55, 10.0, 12.0, 5.0)),
            permission: PermissionState::AuthorizedWhileInUse,
            ..Default::default()
        };

        assert_eq!(snapshot.formatted_heading(), "272°");
        assert_eq!(snapshot.cardinal_label(), "W");
        assert_eq!(snapshot.accuracy_label(), "High");
        assert_eq!(snapshot.formatted_coordinates(), "53.550000, 10.000000");
        assert_eq!(snapshot.formatted_altitude(), "12.0 m");
        assert!(snapshot.is_authorized());
    }

    #[tokio::test]
    async fn test_shared_compass_forwards_intents() {
        let (snapshot_tx, snapshot_rx) = watch::channel(CompassSnapshot::default());
        let (crossing_tx, _) = broadcast::channel(8);
        let (intent_tx, mut intent_rx) = mpsc::channel(8);
        let shared = SharedCompass::new(snapshot_rx, crossing_tx, intent_tx);

        shared.start();
        shared.start_calibration();
        shared.toggle_location_detail();

        assert_eq!(intent_rx.try_recv().unwrap(), Intent::Start);
        assert_eq!(intent_rx.try_recv().unwrap(), Intent::StartCalibration);
        assert_eq!(intent_rx.try_recv().unwrap(), Intent::ToggleLocationDetail);

        drop(snapshot_tx);
    }
}

//! Sensor adapter - bridges the platform sensor source to typed events.
//!
//! The adapter owns the start/stop lifecycle of the platform source
//! and turns its raw callbacks into [`SensorEvent`]s on an mpsc
//! channel:
//!
//! - heading samples become normalized [`HeadingReading`]s,
//! - position batches collapse to their most recent fix,
//! - authorization changes are republished (auto-starting updates on
//!   a new grant, stopping them on a new denial),
//! - failures are classified into the permission prompt path or the
//!   calibration-failed path.
//!
//! # Stop semantics
//!
//! `stop()` must synchronously prevent any further readings from being
//! published, even if platform callbacks are already in flight. The
//! adapter keeps an atomic running flag plus the instant of the last
//! stop; the pump drops any reading that arrives while stopped or
//! whose timestamp predates the stop call.
//!
//! # Example
//!
//! ```ignore
//! let (platform_tx, platform_rx) = mpsc::channel(32);
//! let (event_tx, mut event_rx) = mpsc::channel(32);
//!
//! let adapter = SensorAdapter::new(source, event_tx);
//! let pump = adapter.spawn_pump(platform_rx);
//! adapter.start();
//!
//! while let Some(event) = event_rx.recv().await {
//!     // Handle typed sensor events
//! }
//! ```

mod error;
pub mod simulated;
mod source;

pub use error::SensorFailure;
pub use simulated::{SimulatedSensorSource, SimulatedSourceConfig};
pub use source::{PlatformEvent, RawHeading, RawPosition, SensorSource};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use crate::permission::PermissionState;
use crate::reading::{HeadingReading, PositionReading};

/// A typed event published by the sensor adapter.
#[derive(Debug, Clone)]
pub enum SensorEvent {
    /// New heading reading.
    Heading(HeadingReading),
    /// New position reading.
    Position(PositionReading),
    /// Authorization state changed.
    Permission(PermissionState),
    /// The user must grant permission manually; no re-prompt will
    /// happen.
    PermissionNeeded,
    /// A sensor failure that lands calibration in Failed.
    CalibrationFault(SensorFailure),
}

struct AdapterShared {
    source: Arc<dyn SensorSource>,
    event_tx: mpsc::Sender<SensorEvent>,
    running: AtomicBool,
    stopped_at: Mutex<Option<Instant>>,
}

impl AdapterShared {
    fn emit(&self, event: SensorEvent) {
        if let Err(e) = self.event_tx.try_send(event) {
            warn!(error = %e, "Dropped sensor event, consumer not keeping up");
        }
    }

    fn begin_updates(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            debug!("Sensor updates already running, start ignored");
            return;
        }
        info!("Starting sensor updates");
        self.source.start_updates();
    }

    fn halt_updates(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            debug!("Sensor updates already stopped, stop ignored");
            return;
        }
        // Barrier first: anything stamped before this instant is stale
        // by the time stop() returns.
        *self.stopped_at.lock().unwrap() = Some(Instant::now());
        info!("Stopping sensor updates");
        self.source.stop_updates();
    }

    fn should_publish(&self, taken_at: Instant) -> bool {
        if !self.running.load(Ordering::SeqCst) {
            return false;
        }
        match *self.stopped_at.lock().unwrap() {
            Some(stopped_at) => taken_at > stopped_at,
            None => true,
        }
    }
}

/// Bridges the platform sensor source to typed events.
///
/// Cheap to clone; all clones share the same lifecycle state.
#[derive(Clone)]
pub struct SensorAdapter {
    shared: Arc<AdapterShared>,
}

impl SensorAdapter {
    /// Create an adapter over a platform source.
    pub fn new(source: Arc<dyn SensorSource>, event_tx: mpsc::Sender<SensorEvent>) -> Self {
        Self {
            shared: Arc::new(AdapterShared {
                source,
                event_tx,
                running: AtomicBool::new(false),
                stopped_at: Mutex::new(None),
            }),
        }
    }

    /// Current platform authorization state.
    pub fn authorization_status(&self) -> PermissionState {
        self.shared.source.authorization_status()
    }

    /// True while sensor updates are running.
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// Request sensor permission.
    ///
    /// Undetermined prompts the platform; Denied/Restricted surfaces
    /// the permission-needed signal instead of re-prompting; an
    /// already-authorized state starts updates directly.
    pub fn request_permission(&self) {
        let status = self.shared.source.authorization_status();
        if status.is_authorized() {
            self.start();
        } else if status.is_blocked() {
            info!(%status, "Permission blocked, surfacing settings prompt");
            self.shared.emit(SensorEvent::PermissionNeeded);
        } else {
            info!("Requesting sensor permission from the platform");
            self.shared.source.request_permission();
        }
    }

    /// Start heading and position updates.
    ///
    /// Guarded: without authorization this delegates to
    /// [`request_permission`](Self::request_permission). Idempotent
    /// while already running.
    pub fn start(&self) {
        if !self.shared.source.authorization_status().is_authorized() {
            self.request_permission();
            return;
        }
        self.shared.begin_updates();
    }

    /// Stop heading and position updates. Idempotent.
    ///
    /// Synchronous cut-off: after this returns, no reading taken
    /// before the call will be published.
    pub fn stop(&self) {
        self.shared.halt_updates();
    }

    /// Forward the calibration-display dismissal hint for a starting
    /// calibration session.
    pub fn start_calibration(&self) {
        self.shared.source.dismiss_calibration_display();
    }

    /// Forward the calibration-display dismissal hint for a finished
    /// calibration session.
    pub fn stop_calibration(&self) {
        self.shared.source.dismiss_calibration_display();
    }

    /// Spawn the pump task that consumes platform callbacks.
    ///
    /// The task ends when the platform channel closes or every event
    /// consumer is gone.
    pub fn spawn_pump(&self, platform_rx: mpsc::Receiver<PlatformEvent>) -> tokio::task::JoinHandle<()> {
        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move {
            run_pump(shared, platform_rx).await;
        })
    }
}

async fn run_pump(shared: Arc<AdapterShared>, mut platform_rx: mpsc::Receiver<PlatformEvent>) {
    debug!("Sensor pump started");
    let mut readings_published: u64 = 0;
    let mut readings_dropped: u64 = 0;

    while let Some(event) = platform_rx.recv().await {
        if shared.event_tx.is_closed() {
            debug!("Event channel closed, stopping sensor pump");
            break;
        }
        match event {
            PlatformEvent::Heading(raw) => {
                if !shared.should_publish(raw.timestamp) {
                    readings_dropped += 1;
                    trace!("Dropped heading reading taken before stop");
                    continue;
                }
                let reading = HeadingReading::with_timestamp(
                    raw.magnetic_heading,
                    raw.true_heading,
                    raw.accuracy,
                    raw.timestamp,
                );
                readings_published += 1;
                shared.emit(SensorEvent::Heading(reading));
            }
            PlatformEvent::Positions(batch) => {
                // A batch can carry several fixes; only the most
                // recent one matters.
                let Some(raw) = batch.into_iter().last() else {
                    continue;
                };
                if !shared.should_publish(raw.timestamp) {
                    readings_dropped += 1;
                    trace!("Dropped position reading taken before stop");
                    continue;
                }
                let reading = PositionReading {
                    latitude: raw.latitude,
                    longitude: raw.longitude,
                    altitude: raw.altitude,
                    accuracy: raw.accuracy,
                    timestamp: raw.timestamp,
                };
                readings_published += 1;
                shared.emit(SensorEvent::Position(reading));
            }
            PlatformEvent::Authorization(status) => {
                info!(%status, "Platform authorization changed");
                shared.emit(SensorEvent::Permission(status));
                if status.is_authorized() {
                    shared.begin_updates();
                } else if status.is_blocked() {
                    shared.halt_updates();
                    shared.emit(SensorEvent::PermissionNeeded);
                }
            }
            PlatformEvent::Failure(failure) => {
                warn!(%failure, "Sensor source reported a failure");
                if failure.is_permission() {
                    shared.emit(SensorEvent::PermissionNeeded);
                } else {
                    // Heading-quality and unclassified failures both
                    // land calibration in Failed.
                    shared.emit(SensorEvent::CalibrationFault(failure));
                }
            }
        }
    }

    info!(readings_published, readings_dropped, "Sensor pump stopped");
}

//! Scripted platform source for tests and the CLI harness.
//!
//! Behaves like a compliant platform sensor manager: it answers
//! permission prompts with a configured response, honors
//! start/stop of updates, and pushes serial [`PlatformEvent`]s over
//! the platform channel. Tests drive it sample by sample with the
//! `emit_*`/`inject_*` methods; the CLI runs the continuous rotation
//! driver instead.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use crate::permission::PermissionState;

use super::error::SensorFailure;
use super::source::{PlatformEvent, RawHeading, RawPosition, SensorSource};

/// Configuration for the simulated source.
#[derive(Debug, Clone)]
pub struct SimulatedSourceConfig {
    /// Authorization state before any prompt.
    pub initial_status: PermissionState,

    /// What the "user" answers when the platform prompt shows.
    pub prompt_response: PermissionState,

    /// Degrees per second the rotation driver sweeps the heading.
    pub rotation_rate: f64,

    /// Precision estimate attached to driver-generated samples.
    pub accuracy: f64,

    /// Interval between driver-generated samples.
    pub sample_interval: Duration,
}

impl Default for SimulatedSourceConfig {
    fn default() -> Self {
        Self {
            initial_status: PermissionState::Undetermined,
            prompt_response: PermissionState::AuthorizedWhileInUse,
            rotation_rate: 15.0,
            accuracy: 3.0,
            sample_interval: Duration::from_millis(100),
        }
    }
}

/// Scripted sensor source.
pub struct SimulatedSensorSource {
    config: SimulatedSourceConfig,
    platform_tx: mpsc::Sender<PlatformEvent>,
    status: Mutex<PermissionState>,
    heading: Mutex<f64>,
    updating: AtomicBool,
}

impl SimulatedSensorSource {
    /// Create a simulated source that pushes callbacks over the given
    /// platform channel.
    pub fn new(config: SimulatedSourceConfig, platform_tx: mpsc::Sender<PlatformEvent>) -> Self {
        let status = config.initial_status;
        Self {
            config,
            platform_tx,
            status: Mutex::new(status),
            heading: Mutex::new(0.0),
            updating: AtomicBool::new(false),
        }
    }

    /// Create with default configuration.
    pub fn with_defaults(platform_tx: mpsc::Sender<PlatformEvent>) -> Self {
        Self::new(SimulatedSourceConfig::default(), platform_tx)
    }

    /// True while updates are running.
    pub fn is_updating(&self) -> bool {
        self.updating.load(Ordering::SeqCst)
    }

    /// Push one heading sample.
    pub fn emit_heading(&self, magnetic_heading: f64, accuracy: f64) {
        *self.heading.lock().unwrap() = magnetic_heading;
        self.push(PlatformEvent::Heading(RawHeading::new(
            magnetic_heading,
            magnetic_heading,
            accuracy,
        )));
    }

    /// Push one position fix.
    pub fn emit_position(&self, latitude: f64, longitude: f64, altitude: f64, accuracy: f64) {
        self.push(PlatformEvent::Positions(vec![RawPosition::new(
            latitude, longitude, altitude, accuracy,
        )]));
    }

    /// Push a multi-fix position batch.
    pub fn emit_position_batch(&self, batch: Vec<RawPosition>) {
        self.push(PlatformEvent::Positions(batch));
    }

    /// Push a sensor failure callback.
    pub fn inject_failure(&self, failure: SensorFailure) {
        self.push(PlatformEvent::Failure(failure));
    }

    /// Change authorization out of band, as if the user flipped the
    /// system settings.
    pub fn change_authorization(&self, status: PermissionState) {
        *self.status.lock().unwrap() = status;
        self.push(PlatformEvent::Authorization(status));
    }

    /// Spawn the continuous rotation driver.
    ///
    /// Sweeps the heading at the configured rate while updates are
    /// running, pushing a sample per interval. Ends when the platform
    /// channel closes.
    pub fn spawn_rotation(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let source = Arc::clone(self);
        tokio::spawn(async move {
            debug!(
                rate = source.config.rotation_rate,
                "Simulated rotation driver started"
            );
            let mut ticker = tokio::time::interval(source.config.sample_interval);
            loop {
                ticker.tick().await;
                if source.platform_tx.is_closed() {
                    debug!("Platform channel closed, stopping rotation driver");
                    break;
                }
                if !source.is_updating() {
                    continue;
                }
                let step =
                    source.config.rotation_rate * source.config.sample_interval.as_secs_f64();
                let heading = {
                    let mut heading = source.heading.lock().unwrap();
                    *heading = (*heading + step).rem_euclid(360.0);
                    *heading
                };
                trace!(heading, "Simulated heading sample");
                source.push(PlatformEvent::Heading(RawHeading::new(
                    heading,
                    heading,
                    source.config.accuracy,
                )));
            }
        })
    }

    fn push(&self, event: PlatformEvent) {
        if let Err(e) = self.platform_tx.try_send(event) {
            warn!(error = %e, "Simulated source dropped a platform event");
        }
    }
}

impl SensorSource for SimulatedSensorSource {
    fn authorization_status(&self) -> PermissionState {
        *self.status.lock().unwrap()
    }

    fn request_permission(&self) {
        let response = self.config.prompt_response;
        debug!(%response, "Simulated permission prompt answered");
        *self.status.lock().unwrap() = response;
        self.push(PlatformEvent::Authorization(response));
    }

    fn start_updates(&self) {
        self.updating.store(true, Ordering::SeqCst);
    }

    fn stop_updates(&self) {
        self.updating.store(false, Ordering::SeqCst);
    }

    fn dismiss_calibration_display(&self) {
        trace!("Simulated calibration display dismissed");
    }
}

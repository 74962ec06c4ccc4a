//! High-level service facade for the compass pipeline.
//!
//! Encapsulates all component wiring: the sensor adapter and its pump,
//! the orchestrator with both state machines, and the channels between
//! them. Callers supply a platform [`SensorSource`] and get back a
//! [`SharedCompass`] handle for the UI layer.
//!
//! # Example
//!
//! ```ignore
//! use compasskit::service::{CompassService, ServiceConfig};
//!
//! let service = CompassService::new(
//!     source,
//!     platform_rx,
//!     settings,
//!     store,
//!     ServiceConfig::default(),
//! )?;
//!
//! let compass = service.handle();
//! compass.start();
//! ```

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, info};

use crate::calibration::CalibrationStore;
use crate::orchestrator::{
    CompassSnapshot, Orchestrator, OrchestratorConfig, SharedCompass, ThresholdCrossingEvent,
};
use crate::sensor::{PlatformEvent, SensorAdapter, SensorSource};
use crate::settings::Settings;

/// Errors from service construction.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Invalid configuration value.
    #[error("invalid service configuration: {0}")]
    Config(String),
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Capacity of the typed sensor event channel.
    pub event_capacity: usize,

    /// Capacity of the UI intent channel.
    pub intent_capacity: usize,

    /// Capacity of the threshold-crossing broadcast channel.
    pub crossing_capacity: usize,

    /// Request sensor permission as soon as the service starts, so an
    /// undetermined user is prompted without an explicit intent.
    pub request_permission_on_start: bool,

    /// Orchestrator configuration.
    pub orchestrator: OrchestratorConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            event_capacity: 64,
            intent_capacity: 16,
            crossing_capacity: 16,
            request_permission_on_start: true,
            orchestrator: OrchestratorConfig::default(),
        }
    }
}

impl ServiceConfig {
    fn validate(&self) -> Result<(), ServiceError> {
        if self.event_capacity == 0 {
            return Err(ServiceError::Config("event_capacity must be nonzero".into()));
        }
        if self.intent_capacity == 0 {
            return Err(ServiceError::Config(
                "intent_capacity must be nonzero".into(),
            ));
        }
        if self.crossing_capacity == 0 {
            return Err(ServiceError::Config(
                "crossing_capacity must be nonzero".into(),
            ));
        }
        Ok(())
    }
}

/// Wires the compass pipeline together and owns its background tasks.
pub struct CompassService {
    adapter: SensorAdapter,
    handle: SharedCompass,
    pump: tokio::task::JoinHandle<()>,
    orchestrator: tokio::task::JoinHandle<()>,
}

impl CompassService {
    /// Create and start the pipeline over a platform sensor source.
    ///
    /// `platform_rx` is the receiving half of the channel the source
    /// publishes its raw callbacks on.
    pub fn new(
        source: Arc<dyn SensorSource>,
        platform_rx: mpsc::Receiver<PlatformEvent>,
        settings: Settings,
        store: Arc<dyn CalibrationStore>,
        config: ServiceConfig,
    ) -> Result<Self, ServiceError> {
        config.validate()?;

        let (event_tx, event_rx) = mpsc::channel(config.event_capacity);
        let (intent_tx, intent_rx) = mpsc::channel(config.intent_capacity);
        let (crossing_tx, _) = broadcast::channel::<ThresholdCrossingEvent>(config.crossing_capacity);

        let adapter = SensorAdapter::new(source, event_tx);
        let pump = adapter.spawn_pump(platform_rx);

        let (snapshot_tx, snapshot_rx) = watch::channel(CompassSnapshot::default());
        let handle = SharedCompass::new(snapshot_rx, crossing_tx.clone(), intent_tx);

        let haptics = settings.haptics();
        let orchestrator = Orchestrator::with_config(
            adapter.clone(),
            event_rx,
            intent_rx,
            snapshot_tx,
            crossing_tx,
            settings,
            haptics,
            store,
            config.orchestrator,
        )
        .start();

        info!("Compass service started");
        if config.request_permission_on_start {
            adapter.request_permission();
        }

        Ok(Self {
            adapter,
            handle,
            pump,
            orchestrator,
        })
    }

    /// Clone-able handle for the UI layer.
    pub fn handle(&self) -> SharedCompass {
        self.handle.clone()
    }

    /// True while sensor updates are running.
    pub fn is_running(&self) -> bool {
        self.adapter.is_running()
    }

    /// Stop sensor updates and tear down the background tasks.
    pub async fn shutdown(self) {
        debug!("Shutting down compass service");
        self.adapter.stop();
        self.pump.abort();
        self.orchestrator.abort();
        let _ = self.pump.await;
        let _ = self.orchestrator.await;
        info!("Compass service stopped");
    }
}

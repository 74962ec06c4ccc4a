//! Orchestrator - the single consumer of the pipeline.
//!
//! Merges sensor events and UI intents into one consistent
//! [`CompassSnapshot`], owns both state machines, and dispatches the
//! side effects the UI layer expects:
//!
//! - needle rotation target (negated heading) on every reading,
//! - edge-triggered haptic pulses for cardinal threshold crossings,
//! - acknowledgment pulses for calibration intents,
//! - the once-per-session calibration staleness check.
//!
//! # Concurrency
//!
//! All state mutation happens inside this one task; the sensor pump
//! and the UI only touch channels. That single-writer handoff is the
//! pipeline's only synchronization point - no locks guard the state
//! machines because nothing else can reach them.
//!
//! # Example
//!
//! ```ignore
//! let orchestrator = Orchestrator::new(
//!     adapter, event_rx, intent_rx, snapshot_tx, crossing_tx,
//!     settings, haptics, store,
//! );
//! let handle = orchestrator.start();
//! ```

mod edge;
mod snapshot;

pub use edge::CardinalEdgeTrigger;
pub use snapshot::{
    CompassBroadcaster, CompassProvider, CompassSnapshot, Intent, SharedCompass,
    ThresholdCrossingEvent,
};

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, info, warn};

use crate::calibration::{CalibrationStateMachine, CalibrationStore, StalenessPolicy};
use crate::haptics::HapticEngine;
use crate::permission::{PermissionAction, PermissionStateMachine};
use crate::reading::{HeadingReading, PositionReading};
use crate::sensor::{SensorAdapter, SensorEvent, SensorFailure};
use crate::settings::Settings;

/// Orchestrator configuration.
#[derive(Debug, Clone, Default)]
pub struct OrchestratorConfig {
    /// Staleness rule applied once at session start.
    pub staleness: StalenessPolicy,
}

/// The single consumer task: merges streams, owns the state machines,
/// publishes snapshots.
pub struct Orchestrator {
    adapter: SensorAdapter,
    event_rx: mpsc::Receiver<SensorEvent>,
    intent_rx: mpsc::Receiver<Intent>,
    snapshot_tx: watch::Sender<CompassSnapshot>,
    crossing_tx: broadcast::Sender<ThresholdCrossingEvent>,
    settings: Settings,
    haptics: Arc<dyn HapticEngine>,
    store: Arc<dyn CalibrationStore>,
    permission: PermissionStateMachine,
    calibration: CalibrationStateMachine,
    edge: CardinalEdgeTrigger,
    config: OrchestratorConfig,
    snapshot: CompassSnapshot,
}

impl Orchestrator {
    /// Create an orchestrator with the default configuration.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        adapter: SensorAdapter,
        event_rx: mpsc::Receiver<SensorEvent>,
        intent_rx: mpsc::Receiver<Intent>,
        snapshot_tx: watch::Sender<CompassSnapshot>,
        crossing_tx: broadcast::Sender<ThresholdCrossingEvent>,
        settings: Settings,
        haptics: Arc<dyn HapticEngine>,
        store: Arc<dyn CalibrationStore>,
    ) -> Self {
        Self::with_config(
            adapter,
            event_rx,
            intent_rx,
            snapshot_tx,
            crossing_tx,
            settings,
            haptics,
            store,
            OrchestratorConfig::default(),
        )
    }

    /// Create with custom configuration.
    #[allow(clippy::too_many_arguments)]
    pub fn with_config(
        adapter: SensorAdapter,
        event_rx: mpsc::Receiver<SensorEvent>,
        intent_rx: mpsc::Receiver<Intent>,
        snapshot_tx: watch::Sender<CompassSnapshot>,
        crossing_tx: broadcast::Sender<ThresholdCrossingEvent>,
        settings: Settings,
        haptics: Arc<dyn HapticEngine>,
        store: Arc<dyn CalibrationStore>,
        config: OrchestratorConfig,
    ) -> Self {
        let initial_permission = adapter.authorization_status();
        let snapshot = CompassSnapshot {
            permission: initial_permission,
            ..Default::default()
        };
        Self {
            adapter,
            event_rx,
            intent_rx,
            snapshot_tx,
            crossing_tx,
            settings,
            haptics,
            store,
            permission: PermissionStateMachine::new(initial_permission),
            calibration: CalibrationStateMachine::new(),
            edge: CardinalEdgeTrigger::new(),
            config,
            snapshot,
        }
    }

    /// Start the orchestrator task.
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) {
        debug!("Orchestrator started");
        self.publish();

        // Staleness is evaluated once per session, with a grace delay
        // so the prompt does not flash before the UI is ready.
        let stale_delay = self
            .config
            .staleness
            .evaluate(self.store.last_completed(), Utc::now());
        let mut stale_armed = stale_delay.is_some();
        let stale_timer = tokio::time::sleep(stale_delay.unwrap_or_default());
        tokio::pin!(stale_timer);

        loop {
            tokio::select! {
                event = self.event_rx.recv() => {
                    match event {
                        Some(event) => self.on_event(event),
                        None => {
                            debug!("Sensor event channel closed, stopping orchestrator");
                            break;
                        }
                    }
                }
                intent = self.intent_rx.recv() => {
                    match intent {
                        Some(intent) => self.on_intent(intent),
                        None => {
                            debug!("Intent channel closed, stopping orchestrator");
                            break;
                        }
                    }
                }
                () = &mut stale_timer, if stale_armed => {
                    stale_armed = false;
                    self.on_stale_calibration();
                }
            }
        }

        info!("Orchestrator stopped");
    }

    fn on_event(&mut self, event: SensorEvent) {
        match event {
            SensorEvent::Heading(reading) => self.on_heading(reading),
            SensorEvent::Position(reading) => self.on_position(reading),
            SensorEvent::Permission(state) => {
                if self.permission.on_platform_change(state) {
                    self.snapshot.permission = state;
                    if state.is_authorized() {
                        self.snapshot.permission_prompt_needed = false;
                    }
                    self.publish();
                }
            }
            SensorEvent::PermissionNeeded => {
                info!("Surfacing permission-needed prompt");
                self.snapshot.permission_prompt_needed = true;
                self.publish();
            }
            SensorEvent::CalibrationFault(failure) => self.on_calibration_fault(failure),
        }
    }

    fn on_heading(&mut self, reading: HeadingReading) {
        self.snapshot.needle_rotation = -reading.heading;
        let fired = self.edge.observe(reading.heading);
        self.snapshot.heading = Some(reading);

        if fired.is_some() {
            let _ = self.crossing_tx.send(ThresholdCrossingEvent);
            if self.settings.is_haptic_enabled() {
                self.haptics.light_feedback();
            }
        }
        self.publish();
    }

    fn on_position(&mut self, reading: PositionReading) {
        self.snapshot.position = Some(reading);
        self.publish();
    }

    fn on_calibration_fault(&mut self, failure: SensorFailure) {
        warn!(%failure, "Calibration failed from sensor fault");
        self.calibration.fail();
        self.snapshot.calibration = self.calibration.state();
        self.publish();
    }

    fn on_intent(&mut self, intent: Intent) {
        debug!(?intent, "UI intent");
        match intent {
            Intent::RequestPermission => match self.permission.request_action() {
                PermissionAction::PromptSystem => self.adapter.request_permission(),
                PermissionAction::NotifyPermissionNeeded => {
                    self.snapshot.permission_prompt_needed = true;
                    self.publish();
                }
                PermissionAction::StartUpdates => self.adapter.start(),
            },
            Intent::Start => self.adapter.start(),
            Intent::Stop => {
                self.adapter.stop();
                // Latches belong to the stopped stream; a restarted
                // stream begins fresh.
                self.edge.reset();
            }
            Intent::StartCalibration => {
                if self.calibration.start() {
                    self.adapter.start_calibration();
                    if self.settings.is_haptic_enabled() {
                        self.haptics.medium_feedback();
                    }
                    self.snapshot.calibration = self.calibration.state();
                    self.publish();
                }
            }
            Intent::StopCalibration => {
                if self.calibration.stop() {
                    self.adapter.stop_calibration();
                    if let Err(e) = self.store.record_completed(Utc::now()) {
                        warn!(error = %e, "Failed to persist calibration completion");
                    }
                    if self.settings.is_haptic_enabled() {
                        self.haptics.selection_feedback();
                    }
                    self.snapshot.calibration = self.calibration.state();
                    self.publish();
                }
            }
            Intent::ToggleLocationDetail => {
                self.snapshot.show_location_detail = !self.snapshot.show_location_detail;
                if self.settings.is_haptic_enabled() {
                    self.haptics.selection_feedback();
                }
                self.publish();
            }
        }
    }

    fn on_stale_calibration(&mut self) {
        info!("Last calibration is stale, prompting recalibration");
        self.calibration.fail();
        self.snapshot.calibration = self.calibration.state();
        self.publish();
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.snapshot.clone());
    }
}

//! Integration tests for the compass pipeline.
//!
//! These tests verify the complete flows through the service facade:
//! - Permission prompt → grant/denial → sensor lifecycle
//! - Heading readings → snapshot → cardinal crossing haptics
//! - Calibration intents, sensor faults and the staleness check
//! - Stop cut-off semantics
//!
//! Run with: `cargo test --test pipeline_integration`

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;

use compasskit::calibration::{
    CalibrationState, CalibrationStore, FileCalibrationStore, MemoryCalibrationStore,
    StalenessPolicy,
};
use compasskit::haptics::{HapticPulse, RecordingHaptics};
use compasskit::orchestrator::{
    CompassBroadcaster, CompassProvider, CompassSnapshot, OrchestratorConfig, SharedCompass,
};
use compasskit::permission::PermissionState;
use compasskit::sensor::{SensorFailure, SensorSource, SimulatedSensorSource, SimulatedSourceConfig};
use compasskit::service::{CompassService, ServiceConfig};
use compasskit::settings::Settings;

// ============================================================================
// Test Helpers
// ============================================================================

struct TestPipeline {
    service: CompassService,
    compass: SharedCompass,
    source: Arc<SimulatedSensorSource>,
    haptics: RecordingHaptics,
}

fn build_pipeline(
    source_config: SimulatedSourceConfig,
    store: Arc<dyn CalibrationStore>,
    service_config: ServiceConfig,
) -> TestPipeline {
    let (platform_tx, platform_rx) = mpsc::channel(64);
    let source = Arc::new(SimulatedSensorSource::new(source_config, platform_tx));
    let haptics = RecordingHaptics::new();
    let settings = Settings::new(Arc::new(haptics.clone()));

    let service = CompassService::new(
        Arc::clone(&source) as Arc<dyn SensorSource>,
        platform_rx,
        settings,
        store,
        service_config,
    )
    .expect("service construction");
    let compass = service.handle();

    TestPipeline {
        service,
        compass,
        source,
        haptics,
    }
}

/// Pipeline with an immediately granted permission and a fresh
/// calibration record.
fn build_granted_pipeline() -> TestPipeline {
    build_pipeline(
        SimulatedSourceConfig::default(),
        Arc::new(MemoryCalibrationStore::with_last_completed(Utc::now())),
        ServiceConfig::default(),
    )
}

async fn wait_for_snapshot(
    compass: &SharedCompass,
    mut predicate: impl FnMut(&CompassSnapshot) -> bool,
) -> CompassSnapshot {
    let mut rx = compass.watch();
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            {
                let snapshot = rx.borrow_and_update();
                if predicate(&snapshot) {
                    return snapshot.clone();
                }
            }
            rx.changed().await.expect("snapshot channel closed");
        }
    })
    .await
    .expect("condition not reached in time")
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time")
}

// ============================================================================
// Permission Flow Tests
// ============================================================================

#[tokio::test]
async fn test_permission_grant_auto_starts_updates() {
    let pipeline = build_granted_pipeline();

    let snapshot =
        wait_for_snapshot(&pipeline.compass, |s| s.permission.is_authorized()).await;
    assert_eq!(snapshot.permission, PermissionState::AuthorizedWhileInUse);
    assert!(!snapshot.permission_prompt_needed);

    wait_until(|| pipeline.service.is_running()).await;
    pipeline.service.shutdown().await;
}

#[tokio::test]
async fn test_permission_denial_surfaces_settings_prompt() {
    let pipeline = build_pipeline(
        SimulatedSourceConfig {
            prompt_response: PermissionState::Denied,
            ..Default::default()
        },
        Arc::new(MemoryCalibrationStore::with_last_completed(Utc::now())),
        ServiceConfig::default(),
    );

    let snapshot = wait_for_snapshot(&pipeline.compass, |s| s.permission_prompt_needed).await;
    assert_eq!(snapshot.permission, PermissionState::Denied);
    assert!(!pipeline.service.is_running());
    pipeline.service.shutdown().await;
}

#[tokio::test]
async fn test_external_settings_change_recovers_denial() {
    let pipeline = build_pipeline(
        SimulatedSourceConfig {
            prompt_response: PermissionState::Denied,
            ..Default::default()
        },
        Arc::new(MemoryCalibrationStore::with_last_completed(Utc::now())),
        ServiceConfig::default(),
    );
    wait_for_snapshot(&pipeline.compass, |s| s.permission_prompt_needed).await;

    // The user flips the permission in the system settings; the
    // platform reports it as a fresh authorization callback.
    pipeline
        .source
        .change_authorization(PermissionState::AuthorizedWhileInUse);

    let snapshot =
        wait_for_snapshot(&pipeline.compass, |s| s.permission.is_authorized()).await;
    assert!(!snapshot.permission_prompt_needed);
    wait_until(|| pipeline.service.is_running()).await;
    pipeline.service.shutdown().await;
}

// ============================================================================
// Heading and Crossing Tests
// ============================================================================

#[tokio::test]
async fn test_heading_flows_into_snapshot() {
    let pipeline = build_granted_pipeline();
    wait_until(|| pipeline.service.is_running()).await;

    pipeline.source.emit_heading(42.0, 3.0);

    let snapshot = wait_for_snapshot(&pipeline.compass, |s| s.heading.is_some()).await;
    assert_eq!(snapshot.formatted_heading(), "42°");
    assert_eq!(snapshot.cardinal_label(), "NE");
    assert_eq!(snapshot.accuracy_label(), "High");
    assert_eq!(snapshot.needle_rotation, -42.0);
    pipeline.service.shutdown().await;
}

#[tokio::test]
async fn test_cardinal_crossing_haptics_are_debounced() {
    let pipeline = build_granted_pipeline();
    wait_until(|| pipeline.service.is_running()).await;
    let mut crossings = pipeline.compass.subscribe_crossings();

    // One crossing over East, a lingering reading inside the band, an
    // exit, a re-entry, and a trailing sentinel far from any boundary.
    for heading in [85.0, 95.0, 91.0, 100.0, 91.0, 120.0] {
        pipeline.source.emit_heading(heading, 3.0);
    }
    wait_for_snapshot(&pipeline.compass, |s| {
        s.heading.as_ref().map(|h| h.heading) == Some(120.0)
    })
    .await;

    assert_eq!(pipeline.haptics.count(HapticPulse::Light), 2);
    assert!(crossings.try_recv().is_ok());
    assert!(crossings.try_recv().is_ok());
    assert!(crossings.try_recv().is_err());
    pipeline.service.shutdown().await;
}

#[tokio::test]
async fn test_north_wrap_crossing() {
    let pipeline = build_granted_pipeline();
    wait_until(|| pipeline.service.is_running()).await;

    for heading in [355.0, 3.0, 10.0] {
        pipeline.source.emit_heading(heading, 3.0);
    }
    wait_for_snapshot(&pipeline.compass, |s| {
        s.heading.as_ref().map(|h| h.heading) == Some(10.0)
    })
    .await;

    assert_eq!(pipeline.haptics.count(HapticPulse::Light), 1);
    pipeline.service.shutdown().await;
}

#[tokio::test]
async fn test_position_flows_into_snapshot() {
    let pipeline = build_granted_pipeline();
    wait_until(|| pipeline.service.is_running()).await;

    pipeline.source.emit_position(53.630278, 9.988333, 16.0, 5.0);

    let snapshot = wait_for_snapshot(&pipeline.compass, |s| s.position.is_some()).await;
    assert_eq!(snapshot.formatted_coordinates(), "53.630278, 9.988333");
    assert_eq!(snapshot.formatted_altitude(), "16.0 m");
    pipeline.service.shutdown().await;
}

#[tokio::test]
async fn test_rotating_source_streams_headings() {
    let pipeline = build_pipeline(
        SimulatedSourceConfig {
            rotation_rate: 90.0,
            sample_interval: Duration::from_millis(10),
            ..Default::default()
        },
        Arc::new(MemoryCalibrationStore::with_last_completed(Utc::now())),
        ServiceConfig::default(),
    );
    wait_until(|| pipeline.service.is_running()).await;
    let _driver = pipeline.source.spawn_rotation();

    let first = wait_for_snapshot(&pipeline.compass, |s| s.heading.is_some()).await;
    let first_heading = first.heading.unwrap().heading;
    wait_for_snapshot(&pipeline.compass, |s| {
        s.heading.as_ref().map(|h| h.heading) != Some(first_heading)
    })
    .await;
    pipeline.service.shutdown().await;
}

// ============================================================================
// Calibration Tests
// ============================================================================

#[tokio::test]
async fn test_calibration_lifecycle_with_persistence() {
    let store = Arc::new(MemoryCalibrationStore::new());
    let pipeline = build_pipeline(
        SimulatedSourceConfig::default(),
        Arc::clone(&store) as Arc<dyn CalibrationStore>,
        ServiceConfig {
            // Staleness would fire for an empty store; keep the check
            // out of this test's way.
            orchestrator: OrchestratorConfig {
                staleness: StalenessPolicy {
                    never_calibrated_grace: Duration::from_secs(60),
                    ..Default::default()
                },
            },
            ..Default::default()
        },
    );
    wait_until(|| pipeline.service.is_running()).await;

    pipeline.compass.start_calibration();
    wait_for_snapshot(&pipeline.compass, |s| {
        s.calibration == CalibrationState::InProgress
    })
    .await;
    assert_eq!(pipeline.haptics.count(HapticPulse::Medium), 1);

    pipeline.compass.stop_calibration();
    wait_for_snapshot(&pipeline.compass, |s| {
        s.calibration == CalibrationState::Completed
    })
    .await;
    assert_eq!(pipeline.haptics.count(HapticPulse::Selection), 1);
    assert!(store.last_completed().is_some());
    pipeline.service.shutdown().await;
}

#[tokio::test]
async fn test_calibration_completion_written_to_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("calibration");
    let store = Arc::new(FileCalibrationStore::new(&path));
    let pipeline = build_pipeline(
        SimulatedSourceConfig::default(),
        Arc::clone(&store) as Arc<dyn CalibrationStore>,
        ServiceConfig {
            orchestrator: OrchestratorConfig {
                staleness: StalenessPolicy {
                    never_calibrated_grace: Duration::from_secs(60),
                    ..Default::default()
                },
            },
            ..Default::default()
        },
    );

    pipeline.compass.start_calibration();
    pipeline.compass.stop_calibration();
    wait_for_snapshot(&pipeline.compass, |s| {
        s.calibration == CalibrationState::Completed
    })
    .await;

    // A second store over the same path sees the completion.
    let reloaded = FileCalibrationStore::new(&path);
    assert!(reloaded.last_completed().is_some());
    pipeline.service.shutdown().await;
}

#[tokio::test]
async fn test_heading_quality_failure_fails_calibration() {
    let pipeline = build_granted_pipeline();
    wait_until(|| pipeline.service.is_running()).await;

    pipeline.compass.start_calibration();
    wait_for_snapshot(&pipeline.compass, |s| {
        s.calibration == CalibrationState::InProgress
    })
    .await;

    pipeline
        .source
        .inject_failure(SensorFailure::HeadingQuality("magnetic interference".into()));
    wait_for_snapshot(&pipeline.compass, |s| {
        s.calibration == CalibrationState::Failed
    })
    .await;
    pipeline.service.shutdown().await;
}

#[tokio::test]
async fn test_stale_calibration_prompts_recalibration() {
    let pipeline = build_pipeline(
        SimulatedSourceConfig::default(),
        Arc::new(MemoryCalibrationStore::with_last_completed(
            Utc::now() - chrono::Duration::days(31),
        )),
        ServiceConfig {
            orchestrator: OrchestratorConfig {
                staleness: StalenessPolicy {
                    stale_grace: Duration::from_millis(50),
                    ..Default::default()
                },
            },
            ..Default::default()
        },
    );

    wait_for_snapshot(&pipeline.compass, |s| {
        s.calibration == CalibrationState::Failed
    })
    .await;
    pipeline.service.shutdown().await;
}

#[tokio::test]
async fn test_never_calibrated_prompts_recalibration() {
    let pipeline = build_pipeline(
        SimulatedSourceConfig::default(),
        Arc::new(MemoryCalibrationStore::new()),
        ServiceConfig {
            orchestrator: OrchestratorConfig {
                staleness: StalenessPolicy {
                    never_calibrated_grace: Duration::from_millis(50),
                    ..Default::default()
                },
            },
            ..Default::default()
        },
    );

    wait_for_snapshot(&pipeline.compass, |s| {
        s.calibration == CalibrationState::Failed
    })
    .await;
    pipeline.service.shutdown().await;
}

// ============================================================================
// Stop Semantics Tests
// ============================================================================

#[tokio::test]
async fn test_stop_cuts_off_further_readings() {
    let pipeline = build_granted_pipeline();
    wait_until(|| pipeline.service.is_running()).await;

    pipeline.source.emit_heading(45.0, 3.0);
    wait_for_snapshot(&pipeline.compass, |s| s.heading.is_some()).await;

    pipeline.compass.stop();
    wait_until(|| !pipeline.service.is_running()).await;

    pipeline.source.emit_heading(200.0, 3.0);
    tokio::time::sleep(Duration::from_millis(50)).await;

    let snapshot = pipeline.compass.snapshot();
    assert_eq!(snapshot.heading.unwrap().heading, 45.0);
    pipeline.service.shutdown().await;
}

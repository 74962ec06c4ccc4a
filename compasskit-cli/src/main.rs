//! CompassKit CLI - Command-line interface
//!
//! Drives the compass pipeline with a simulated sensor source and
//! prints the aggregated snapshot as the heading sweeps, so the full
//! flow (permission, readings, crossings, haptics) can be observed
//! without device hardware.

use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::mpsc;

use compasskit::calibration::MemoryCalibrationStore;
use compasskit::haptics::RecordingHaptics;
use compasskit::orchestrator::{CompassBroadcaster, CompassProvider};
use compasskit::permission::PermissionState;
use compasskit::sensor::{SensorSource, SimulatedSensorSource, SimulatedSourceConfig};
use compasskit::service::{CompassService, ServiceConfig};
use compasskit::settings::Settings;

#[derive(Parser)]
#[command(name = "compasskit")]
#[command(version = compasskit::VERSION)]
#[command(about = "Run the compass pipeline against a simulated sensor", long_about = None)]
struct Args {
    /// How long to run, in seconds
    #[arg(long, default_value = "5")]
    duration: u64,

    /// Simulated rotation rate in degrees per second
    #[arg(long, default_value = "45.0")]
    rotation_rate: f64,

    /// Simulated sample interval in milliseconds
    #[arg(long, default_value = "100")]
    interval_ms: u64,

    /// Simulated heading accuracy in degrees
    #[arg(long, default_value = "3.0")]
    accuracy: f64,

    /// Disable haptic feedback
    #[arg(long)]
    no_haptics: bool,

    /// Answer the permission prompt with a denial
    #[arg(long)]
    deny_permission: bool,

    /// Directory to write the session log to (logging is disabled
    /// when omitted)
    #[arg(long)]
    log_dir: Option<String>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if args.duration == 0 {
        eprintln!("Error: duration must be at least 1 second");
        process::exit(1);
    }
    if !args.rotation_rate.is_finite() {
        eprintln!("Error: rotation rate must be finite");
        process::exit(1);
    }

    let _logging_guard = match &args.log_dir {
        Some(dir) => match compasskit::logging::init_logging(dir, compasskit::logging::default_log_file()) {
            Ok(guard) => Some(guard),
            Err(e) => {
                eprintln!("Error initializing logging: {}", e);
                process::exit(1);
            }
        },
        None => None,
    };

    let (platform_tx, platform_rx) = mpsc::channel(64);
    let source_config = SimulatedSourceConfig {
        prompt_response: if args.deny_permission {
            PermissionState::Denied
        } else {
            PermissionState::AuthorizedWhileInUse
        },
        rotation_rate: args.rotation_rate,
        accuracy: args.accuracy,
        sample_interval: Duration::from_millis(args.interval_ms.max(1)),
        ..Default::default()
    };
    let source = Arc::new(SimulatedSensorSource::new(source_config, platform_tx));

    let haptics = RecordingHaptics::new();
    let settings = Settings::with_values(
        Arc::new(haptics.clone()),
        !args.no_haptics,
        Default::default(),
    );
    let store = Arc::new(MemoryCalibrationStore::with_last_completed(chrono::Utc::now()));

    let service = match CompassService::new(
        Arc::clone(&source) as Arc<dyn SensorSource>,
        platform_rx,
        settings,
        store,
        ServiceConfig::default(),
    ) {
        Ok(service) => service,
        Err(e) => {
            eprintln!("Error starting compass service: {}", e);
            process::exit(1);
        }
    };
    let compass = service.handle();
    let _driver = source.spawn_rotation();

    println!(
        "Running for {}s at {} deg/s (sample every {}ms)",
        args.duration, args.rotation_rate, args.interval_ms
    );
    println!();

    let mut snapshots = compass.watch();
    let mut crossings = compass.subscribe_crossings();
    let mut crossing_count: u64 = 0;
    let deadline = tokio::time::sleep(Duration::from_secs(args.duration));
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            () = &mut deadline => break,
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                if snapshot.permission_prompt_needed {
                    println!("Permission needed: enable location access in the system settings");
                    break;
                }
                if snapshot.heading.is_some() {
                    println!(
                        "{:>6}  {:<3}  accuracy {:<7}  needle {:>7.1}  {}",
                        snapshot.formatted_heading(),
                        snapshot.cardinal_label(),
                        snapshot.accuracy_label(),
                        snapshot.needle_rotation,
                        snapshot.formatted_coordinates(),
                    );
                }
            }
            crossing = crossings.recv() => {
                if crossing.is_ok() {
                    crossing_count += 1;
                    println!("        >>> cardinal crossing");
                }
            }
        }
    }

    println!();
    println!(
        "Final state: permission {}, calibration {}",
        compass.permission_state(),
        compass.calibration_state()
    );
    println!("Cardinal crossings: {}", crossing_count);
    println!("Haptic pulses recorded: {}", haptics.pulses().len());

    service.shutdown().await;
}

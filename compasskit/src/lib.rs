//! CompassKit - heading and position pipeline for compass applications
//!
//! This library turns raw platform sensor callbacks into an aggregated,
//! display-ready compass state: normalized heading readings with
//! cardinal sectors and accuracy tiers, permission and calibration
//! state machines, edge-triggered cardinal crossing events for haptic
//! feedback, and a single snapshot the UI layer observes.
//!
//! # High-Level API
//!
//! For most use cases, the [`service`] module provides a facade that
//! wires the whole pipeline:
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

pub mod calibration;
pub mod haptics;
pub mod logging;
pub mod orchestrator;
pub mod permission;
pub mod reading;
pub mod sensor;
pub mod service;
pub mod settings;

/// Version of the CompassKit library and CLI.
///
/// Synchronized across all components in the workspace; defined in
/// `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

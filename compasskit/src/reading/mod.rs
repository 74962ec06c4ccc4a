//! Reading types and pure derivation.
//!
//! This module defines the value types that flow through the pipeline
//! and the pure functions that derive presentation values from them:
//!
//! - [`HeadingReading`] - One orientation sample, heading normalized to `[0,360)`
//! - [`PositionReading`] - One position fix
//! - [`CardinalDirection`] - 8-way compass point derived from a heading
//! - [`AccuracyTier`] - Coarse precision classification of a heading sample
//! - [`aggregate`] - Normalization, cardinal-boundary proximity and crossing detection
//!
//! Readings are immutable snapshots: a new reading replaces, never
//! mutates, the previous one.

mod aggregate;
mod state;

pub use aggregate::{
    angular_distance, boundary_crossed, near_cardinal, normalize_heading, CARDINAL_BOUNDARIES,
    CARDINAL_TOLERANCE_DEG,
};
pub use state::{AccuracyTier, CardinalDirection, HeadingReading, PositionReading};

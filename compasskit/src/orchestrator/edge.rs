//! Edge-triggered detection of cardinal boundary crossings.
//!
//! The pure geometry (tolerance band, arc crossing) lives in
//! [`crate::reading`]; this latch turns it into events that
//! fire once per crossing instead of once per reading while the
//! heading lingers near a boundary.

use crate::reading::{angular_distance, boundary_crossed, CARDINAL_BOUNDARIES, CARDINAL_TOLERANCE_DEG};

/// Per-boundary latch state for threshold-crossing events.
///
/// A boundary fires when the heading enters its tolerance band or when
/// a consecutive reading pair sweeps across it, and is then latched
/// until a reading lands outside the band without crossing it. At most
/// one boundary fires per reading.
#[derive(Debug, Default)]
pub struct CardinalEdgeTrigger {
    latched: [bool; 4],
    last_heading: Option<f64>,
}

impl CardinalEdgeTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe the next heading; returns the index into
    /// [`CARDINAL_BOUNDARIES`] of the boundary that fired, if any.
    pub fn observe(&mut self, heading: f64) -> Option<usize> {
        let previous = self.last_heading.replace(heading);
        let crossed = previous.and_then(|prev| boundary_crossed(prev, heading));

        let mut fired = None;
        for (index, &boundary) in CARDINAL_BOUNDARIES.iter().enumerate() {
            let within = angular_distance(heading, boundary) < CARDINAL_TOLERANCE_DEG;
            let crossed_here = crossed == Some(index);

            if !self.latched[index] && (within || crossed_here) {
                if fired.is_none() {
                    self.latched[index] = true;
                    fired = Some(index);
                }
            } else if self.latched[index] && !within && !crossed_here {
                // Left the band without sweeping back across; re-arm.
                self.latched[index] = false;
            }
        }
        fired
    }

    /// Forget all latch state, e.g. after a sensor restart.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

//! Haptic actuator boundary.
//!
//! The orchestrator fires discrete, fire-and-forget pulses; what a
//! pulse physically does belongs to the platform. [`NullHaptics`] is
//! for headless runs, [`RecordingHaptics`] captures pulses so tests
//! and the CLI can observe exactly what fired.

use std::sync::{Arc, Mutex};

/// Discrete haptic pulses the pipeline can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HapticPulse {
    Light,
    Medium,
    Heavy,
    Selection,
    Error,
}

/// Fire-and-forget haptic actuator.
pub trait HapticEngine: Send + Sync {
    /// Light impact - cardinal threshold crossings.
    fn light_feedback(&self);
    /// Medium impact - calibration start acknowledgment.
    fn medium_feedback(&self);
    /// Heavy impact.
    fn heavy_feedback(&self);
    /// Selection tick - toggles and calibration completion.
    fn selection_feedback(&self);
    /// Error notification.
    fn error_feedback(&self);
}

/// Haptic engine that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullHaptics;

impl HapticEngine for NullHaptics {
    fn light_feedback(&self) {}
    fn medium_feedback(&self) {}
    fn heavy_feedback(&self) {}
    fn selection_feedback(&self) {}
    fn error_feedback(&self) {}
}

/// Haptic engine that records every pulse in order.
#[derive(Debug, Default, Clone)]
pub struct RecordingHaptics {
    pulses: Arc<Mutex<Vec<HapticPulse>>>,
}

impl RecordingHaptics {
    pub fn new() -> Self {
        Self::default()
    }

    /// All pulses fired so far, in order.
    pub fn pulses(&self) -> Vec<HapticPulse> {
        self.pulses.lock().unwrap().clone()
    }

    /// How many times the given pulse fired.
    pub fn count(&self, pulse: HapticPulse) -> usize {
        self.pulses.lock().unwrap().iter().filter(|p| **p == pulse).count()
    }

    /// Discard the recorded pulses.
    pub fn clear(&self) {
        self.pulses.lock().unwrap().clear();
    }

    fn record(&self, pulse: HapticPulse) {
        self.pulses.lock().unwrap().push(pulse);
    }
}

impl HapticEngine for RecordingHaptics {
    fn light_feedback(&self) {
        self.record(HapticPulse::Light);
    }

    fn medium_feedback(&self) {
        self.record(HapticPulse::Medium);
    }

    fn heavy_feedback(&self) {
        self.record(HapticPulse::Heavy);
    }

    fn selection_feedback(&self) {
        self.record(HapticPulse::Selection);
    }

    fn error_feedback(&self) {
        self.record(HapticPulse::Error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_haptics_preserves_order() {
        let haptics = RecordingHaptics::new();
        haptics.light_feedback();
        haptics.medium_feedback();
        haptics.light_feedback();

        assert_eq!(
            haptics.pulses(),
            vec![HapticPulse::Light, HapticPulse::Medium, HapticPulse::Light]
        );
        assert_eq!(haptics.count(HapticPulse::Light), 2);
        assert_eq!(haptics.count(HapticPulse::Error), 0);
    }

    #[test]
    fn test_recording_haptics_clear() {
        let haptics = RecordingHaptics::new();
        haptics.selection_feedback();
        haptics.clear();
        assert!(haptics.pulses().is_empty());
    }
}

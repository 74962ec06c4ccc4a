//! Settings collaborator: observable user preferences.
//!
//! Exposes `is_haptic_enabled` and `selected_theme` as watch-observable
//! values. The core pipeline reads only the haptic flag before firing
//! any pulse; theme data is carried for the UI layer and never
//! interpreted here (rendering is out of scope).

use std::sync::Arc;

use tokio::sync::watch;

use crate::haptics::HapticEngine;

/// Visual theme names, carried as opaque data for the UI layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Classic,
    Modern,
    Minimal,
    Military,
    Ocean,
    Sunset,
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Classic => "Classic",
            Self::Modern => "Modern",
            Self::Minimal => "Minimal",
            Self::Military => "Military",
            Self::Ocean => "Ocean",
            Self::Sunset => "Sunset",
        };
        write!(f, "{}", label)
    }
}

struct SettingsInner {
    haptic_enabled: watch::Sender<bool>,
    theme: watch::Sender<Theme>,
    haptics: Arc<dyn HapticEngine>,
}

/// Clone-able settings handle.
///
/// Setters acknowledge changes with a selection pulse when haptics are
/// enabled, matching the settings screen's tactile behavior.
#[derive(Clone)]
pub struct Settings {
    inner: Arc<SettingsInner>,
}

impl Settings {
    /// Create settings with defaults: haptics on, Classic theme.
    pub fn new(haptics: Arc<dyn HapticEngine>) -> Self {
        Self::with_values(haptics, true, Theme::default())
    }

    /// Create settings with explicit initial values.
    pub fn with_values(haptics: Arc<dyn HapticEngine>, haptic_enabled: bool, theme: Theme) -> Self {
        let (haptic_tx, _) = watch::channel(haptic_enabled);
        let (theme_tx, _) = watch::channel(theme);
        Self {
            inner: Arc::new(SettingsInner {
                haptic_enabled: haptic_tx,
                theme: theme_tx,
                haptics,
            }),
        }
    }

    /// The haptic engine feedback is dispatched through.
    pub fn haptics(&self) -> Arc<dyn HapticEngine> {
        Arc::clone(&self.inner.haptics)
    }

    /// Whether haptic feedback is enabled.
    pub fn is_haptic_enabled(&self) -> bool {
        *self.inner.haptic_enabled.borrow()
    }

    /// The currently selected theme.
    pub fn selected_theme(&self) -> Theme {
        *self.inner.theme.borrow()
    }

    /// Observe the haptic flag.
    pub fn watch_haptic_enabled(&self) -> watch::Receiver<bool> {
        self.inner.haptic_enabled.subscribe()
    }

    /// Observe the selected theme.
    pub fn watch_theme(&self) -> watch::Receiver<Theme> {
        self.inner.theme.subscribe()
    }

    /// Enable or disable haptic feedback.
    pub fn set_haptic_enabled(&self, enabled: bool) {
        self.inner.haptic_enabled.send_replace(enabled);
        if enabled {
            self.inner.haptics.selection_feedback();
        }
    }

    /// Select a theme.
    pub fn set_theme(&self, theme: Theme) {
        self.inner.theme.send_replace(theme);
        if self.is_haptic_enabled() {
            self.inner.haptics.selection_feedback();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::haptics::{HapticPulse, RecordingHaptics};

    #[test]
    fn test_defaults() {
        let settings = Settings::new(Arc::new(RecordingHaptics::new()));
        assert!(settings.is_haptic_enabled());
        assert_eq!(settings.selected_theme(), Theme::Classic);
    }

    #[test]
    fn test_setters_are_observable() {
        let settings = Settings::new(Arc::new(RecordingHaptics::new()));
        let haptic_rx = settings.watch_haptic_enabled();
        let theme_rx = settings.watch_theme();

        settings.set_haptic_enabled(false);
        settings.set_theme(Theme::Ocean);

        assert!(!*haptic_rx.borrow());
        assert_eq!(*theme_rx.borrow(), Theme::Ocean);
    }

    #[test]
    fn test_theme_change_ticks_when_haptics_enabled() {
        let haptics = RecordingHaptics::new();
        let settings = Settings::new(Arc::new(haptics.clone()));

        settings.set_theme(Theme::Military);
        assert_eq!(haptics.count(HapticPulse::Selection), 1);

        settings.set_haptic_enabled(false);
        settings.set_theme(Theme::Sunset);
        assert_eq!(haptics.count(HapticPulse::Selection), 1);
    }

    #[test]
    fn test_enabling_haptics_ticks_disabling_does_not() {
        let haptics = RecordingHaptics::new();
        let settings = Settings::with_values(Arc::new(haptics.clone()), false, Theme::Classic);

        settings.set_haptic_enabled(false);
        assert_eq!(haptics.count(HapticPulse::Selection), 0);

        settings.set_haptic_enabled(true);
        assert_eq!(haptics.count(HapticPulse::Selection), 1);
    }
}

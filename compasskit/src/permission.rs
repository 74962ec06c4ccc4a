//! Permission state machine for the location/heading sensors.
//!
//! The machine owns [`PermissionState`]. Only platform authorization
//! callbacks move it; the app can never force its way out of
//! Denied/Restricted - the only exit is an external settings change
//! that shows up as a fresh platform callback. What the app *can* do
//! with a request intent is captured by [`PermissionAction`].

use tracing::{debug, info};

/// Platform authorization state for the sensor source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PermissionState {
    /// The user has not yet been asked.
    #[default]
    Undetermined,
    /// Authorized while the app is in use.
    AuthorizedWhileInUse,
    /// Authorized at all times.
    AuthorizedAlways,
    /// The user explicitly declined.
    Denied,
    /// Blocked by device policy (parental controls, MDM).
    Restricted,
}

impl PermissionState {
    /// True if sensor updates may be started.
    pub fn is_authorized(&self) -> bool {
        matches!(self, Self::AuthorizedWhileInUse | Self::AuthorizedAlways)
    }

    /// True if the user must change permissions in the system settings.
    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Denied | Self::Restricted)
    }
}

impl std::fmt::Display for PermissionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Undetermined => "Undetermined",
            Self::AuthorizedWhileInUse => "AuthorizedWhileInUse",
            Self::AuthorizedAlways => "AuthorizedAlways",
            Self::Denied => "Denied",
            Self::Restricted => "Restricted",
        };
        write!(f, "{}", label)
    }
}

/// What a permission request intent resolves to in the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionAction {
    /// Ask the platform to show its permission prompt.
    PromptSystem,
    /// Surface the "needs manual settings change" signal; never
    /// re-prompt a blocked user.
    NotifyPermissionNeeded,
    /// Already authorized - go straight to starting updates.
    StartUpdates,
}

/// Tracks authorization state and resolves permission request intents.
#[derive(Debug, Default)]
pub struct PermissionStateMachine {
    state: PermissionState,
}

impl PermissionStateMachine {
    /// Create a machine seeded with the platform's current state.
    pub fn new(initial: PermissionState) -> Self {
        Self { state: initial }
    }

    /// Current authorization state.
    pub fn state(&self) -> PermissionState {
        self.state
    }

    /// Apply a platform authorization callback.
    ///
    /// Returns true if the state changed.
    pub fn on_platform_change(&mut self, new_state: PermissionState) -> bool {
        if new_state == self.state {
            debug!(state = %new_state, "Authorization callback with unchanged state");
            return false;
        }
        info!(from = %self.state, to = %new_state, "Authorization state changed");
        self.state = new_state;
        true
    }

    /// Resolve a permission request intent against the current state.
    pub fn request_action(&self) -> PermissionAction {
        match self.state {
            PermissionState::Undetermined => PermissionAction::PromptSystem,
            PermissionState::Denied | PermissionState::Restricted => {
                PermissionAction::NotifyPermissionNeeded
            }
            PermissionState::AuthorizedWhileInUse | PermissionState::AuthorizedAlways => {
                PermissionAction::StartUpdates
            }
        }
    }
}

//! Label smoothing between consecutive classified windows.

use proxima_types::PresenceState;

/// Two-slot smoothing of per-window labels.
///
/// The smoothed state is "left behind" only when both of the last two window
/// labels were negative. Both slots start positive so a session begins "with
/// user".
#[derive(Clone, Debug)]
pub struct Hysteresis {
    history: [bool; 2],
}

impl Default for Hysteresis {
    fn default() -> Self {
        Self::new()
    }
}

impl Hysteresis {
    pub fn new() -> Self {
        Self {
            history: [true, true],
        }
    }

    /// Shift in a new window label and return the smoothed state.
    pub fn push(&mut self, with_user: bool) -> PresenceState {
        self.history = [self.history[1], with_user];
        self.state()
    }

    pub fn state(&self) -> PresenceState {
        PresenceState::from_with_user(self.history.iter().any(|v| *v))
    }

    pub fn reset(&mut self) {
        self.history = [true, true];
    }
}

//! Presence and attendance state enums.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Timestamp;

/// Whether the sensing device is being carried by a person.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresenceState {
    WithUser,
    LeftBehind,
}

impl PresenceState {
    pub fn from_with_user(with_user: bool) -> Self {
        if with_user {
            Self::WithUser
        } else {
            Self::LeftBehind
        }
    }

    pub fn is_with_user(&self) -> bool {
        matches!(self, Self::WithUser)
    }
}

impl fmt::Display for PresenceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WithUser => f.write_str("WITH USER"),
            Self::LeftBehind => f.write_str("LEFT BEHIND"),
        }
    }
}

/// What the presence classifier currently reports to the rest of the system.
///
/// Only [`PresenceStatus::Classified`] with [`PresenceState::WithUser`] counts as
/// "with user"; every other status keeps the proof gate closed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "detail")]
pub enum PresenceStatus {
    /// Capture has not been started.
    Idle,
    /// Capture is running but no window has been classified yet.
    Capturing,
    /// Smoothed state after the latest classified window.
    Classified(PresenceState),
    /// The classifier failed on the latest window.
    Error(String),
    /// The motion source is unavailable for this session.
    Disabled(String),
}

impl PresenceStatus {
    pub fn is_with_user(&self) -> bool {
        matches!(self, Self::Classified(PresenceState::WithUser))
    }

    pub fn state(&self) -> Option<PresenceState> {
        match self {
            Self::Classified(state) => Some(*state),
            _ => None,
        }
    }
}

impl fmt::Display for PresenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("Idle"),
            Self::Capturing => f.write_str("Capturing"),
            Self::Classified(state) => write!(f, "{state}"),
            Self::Error(reason) => write!(f, "Error: {reason}"),
            Self::Disabled(reason) => write!(f, "Motion unavailable: {reason}"),
        }
    }
}

/// Outcome of an attendance window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    Absent,
}

impl AttendanceStatus {
    pub fn from_present(present: bool) -> Self {
        if present {
            Self::Present
        } else {
            Self::Absent
        }
    }

    /// Status string sent to the persistence collaborator.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Absent => "absent",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal decision of one attendance window.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceVerdict {
    pub status: AttendanceStatus,
    pub present_samples: usize,
    pub absent_samples: usize,
    pub decided_at: Timestamp,
}

impl AttendanceVerdict {
    pub fn is_confirmed(&self) -> bool {
        self.status == AttendanceStatus::Present
    }
}

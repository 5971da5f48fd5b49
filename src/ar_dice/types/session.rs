//! Tracking session value types

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaneDetection {
    None,
    #[default]
    Horizontal,
}

/// Configuration a session is started with. Immutable once running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrackingConfiguration {
    pub plane_detection: PlaneDetection,
}

impl TrackingConfiguration {
    /// World tracking with horizontal plane detection
    pub fn horizontal_planes() -> Self {
        Self {
            plane_detection: PlaneDetection::Horizontal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Stopped,
    Running,
    Interrupted,
}

/// What to do with placed dice once an interruption ends.
///
/// Anchors may have drifted or been dropped while tracking was interrupted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InterruptionPolicy {
    #[default]
    KeepDice,
    ResetSession,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeSeverity {
    Info,
    Warning,
    Error,
}

/// User-visible message about the tracking state
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingNotice {
    pub severity: NoticeSeverity,
    pub message: String,
}

impl TrackingNotice {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: NoticeSeverity::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: NoticeSeverity::Error,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            severity: NoticeSeverity::Info,
            message: message.into(),
        }
    }
}

//! Error types for the AR dice scene

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ArDiceError>;

/// Faults reported by a tracking session.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrackingError {
    #[error("camera unavailable: {reason}")]
    CameraUnavailable { reason: String },

    #[error("world tracking failed: {reason}")]
    WorldTrackingFailed { reason: String },

    #[error("configuration not supported: {reason}")]
    UnsupportedConfiguration { reason: String },
}

#[derive(Error, Debug)]
pub enum ArDiceError {
    #[error("Failed to load die model {path}: {reason}")]
    AssetLoad { path: String, reason: String },

    #[error("Tracking failure: {0}")]
    Tracking(#[from] TrackingError),

    #[error("Invalid config at {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("RON parse error: {0}")]
    RonParse(#[from] ron::error::SpannedError),

    #[error("RON error: {0}")]
    Ron(#[from] ron::Error),
}

impl ArDiceError {
    pub fn asset_load(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::AssetLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_load_message_names_path() {
        let err = ArDiceError::asset_load("models/dice.glb#Scene0", "file not found");
        assert_eq!(
            err.to_string(),
            "Failed to load die model models/dice.glb#Scene0: file not found"
        );
    }

    #[test]
    fn test_tracking_error_converts() {
        let err: ArDiceError = TrackingError::CameraUnavailable {
            reason: "denied".to_string(),
        }
        .into();
        assert!(matches!(err, ArDiceError::Tracking(_)));
        assert_eq!(err.to_string(), "Tracking failure: camera unavailable: denied");
    }
}

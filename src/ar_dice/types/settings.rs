//! Application settings
//!
//! Settings are read from a RON file. Every field has a default so partial
//! files are accepted.

use std::fs;
use std::path::Path;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::die::DieModelSource;
use super::error::{ArDiceError, Result};
use super::roll::{DEFAULT_ROLL_DURATION_SECS, DEFAULT_SPIN_MULTIPLIER, MAX_SPIN_MULTIPLIER};
use super::session::InterruptionPolicy;

#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArDiceSettings {
    pub die_model: DieModelSource,
    /// Pip atlas wrapped onto the cube die, one cell per face
    pub die_face_texture: Option<String>,
    /// Texture drawn on detected-plane markers
    pub grid_texture: Option<String>,
    pub roll_duration_secs: f32,
    pub spin_multiplier: u32,
    /// Fixed seed for the roll generator; random when absent
    pub seed: Option<u64>,
    pub interruption_policy: InterruptionPolicy,
    pub session: SimulatedSessionSettings,
}

impl Default for ArDiceSettings {
    fn default() -> Self {
        Self {
            die_model: DieModelSource::default(),
            die_face_texture: Some("textures/die_faces.png".to_string()),
            grid_texture: Some("textures/grid.png".to_string()),
            roll_duration_secs: DEFAULT_ROLL_DURATION_SECS,
            spin_multiplier: DEFAULT_SPIN_MULTIPLIER,
            seed: None,
            interruption_policy: InterruptionPolicy::default(),
            session: SimulatedSessionSettings::default(),
        }
    }
}

impl ArDiceSettings {
    pub fn from_ron_str(text: &str) -> Result<Self> {
        Ok(ron::from_str::<ArDiceSettings>(text)?)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let settings = Self::from_ron_str(&text).map_err(|e| ArDiceError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        settings.validate(path)?;
        Ok(settings)
    }

    pub fn to_ron_string(&self) -> Result<String> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::default(),
        )?)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        let invalid = |message: &str| ArDiceError::Config {
            path: path.to_path_buf(),
            message: message.to_string(),
        };

        // Comparisons are written so NaN fails them.
        if !(self.roll_duration_secs >= 0.0 && self.roll_duration_secs.is_finite()) {
            return Err(invalid("roll_duration_secs must be a finite, non-negative number"));
        }
        if !(1..=MAX_SPIN_MULTIPLIER).contains(&self.spin_multiplier) {
            return Err(invalid(&format!(
                "spin_multiplier must be between 1 and {MAX_SPIN_MULTIPLIER}"
            )));
        }
        let radius = self.die_model.bounding_radius();
        if !(radius > 0.0 && radius.is_finite()) {
            return Err(invalid("die model must have a positive bounding radius"));
        }
        self.session.validate().map_err(|message| invalid(&message))
    }
}

/// Desktop stand-in for the device's tracking hardware.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatedSessionSettings {
    pub device: DevicePose,
    pub fov_y_degrees: f32,
    pub planes: Vec<ScriptedPlane>,
    pub interruptions: Vec<ScriptedInterruption>,
}

impl SimulatedSessionSettings {
    fn validate(&self) -> std::result::Result<(), String> {
        let fov = self.fov_y_degrees;
        if !(fov > 0.0 && fov < 180.0) {
            return Err(format!("fov_y_degrees must be within (0, 180), got {fov}"));
        }

        let device = &self.device;
        if !(device.distance > 0.0 && device.distance.is_finite()) {
            return Err("device distance must be positive".to_string());
        }
        if !(device.yaw_degrees.is_finite() && device.pitch_degrees.is_finite()) {
            return Err("device yaw and pitch must be finite".to_string());
        }

        for plane in &self.planes {
            if !plane.center.iter().all(|c| c.is_finite()) {
                return Err("plane centers must be finite".to_string());
            }
            if !(plane.extent[0] > 0.0 && plane.extent[1] > 0.0)
                || !plane.extent.iter().all(|e| e.is_finite())
            {
                return Err("plane extents must be positive".to_string());
            }
            if !(plane.detect_after_secs >= 0.0) {
                return Err("detect_after_secs must not be negative".to_string());
            }
        }

        for interruption in &self.interruptions {
            let (start, end) = (interruption.start_secs, interruption.end_secs);
            if !(start >= 0.0 && end >= start) {
                return Err("interruptions must start at 0 or later and not end early".to_string());
            }
        }
        Ok(())
    }
}

impl Default for SimulatedSessionSettings {
    fn default() -> Self {
        Self {
            device: DevicePose::default(),
            fov_y_degrees: 60.0,
            planes: vec![
                ScriptedPlane {
                    center: [0.0, 0.0, 0.0],
                    extent: [1.2, 0.8],
                    detect_after_secs: 1.0,
                },
                ScriptedPlane {
                    center: [1.0, 0.4, -0.8],
                    extent: [0.6, 0.6],
                    detect_after_secs: 2.5,
                },
            ],
            interruptions: Vec::new(),
        }
    }
}

/// Orbit pose of the simulated device around the world origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DevicePose {
    pub yaw_degrees: f32,
    pub pitch_degrees: f32,
    pub distance: f32,
}

impl Default for DevicePose {
    fn default() -> Self {
        Self {
            yaw_degrees: 0.0,
            pitch_degrees: 45.0,
            distance: 2.0,
        }
    }
}

/// A surface the simulated session "finds" after running for a while.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScriptedPlane {
    /// World position of the anchor
    pub center: [f32; 3],
    /// Width (X) and depth (Z)
    pub extent: [f32; 2],
    pub detect_after_secs: f32,
}

/// A tracking interruption replayed by the simulated session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScriptedInterruption {
    pub start_secs: f32,
    pub end_secs: f32,
}

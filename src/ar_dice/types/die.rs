//! Die types
//!
//! A placed die is a scene node carrying the [`Die`] component. The model it
//! is built from is described by [`DieModelSource`].

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Component attached to each placed die entity
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Die {
    /// Radius of the model's bounding sphere, used to rest it on a surface
    pub bounding_radius: f32,
}

/// Where the die model comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DieModelSource {
    /// A glTF scene loaded through the asset server (e.g. `models/dice.glb#Scene0`).
    Scene { path: String, bounding_radius: f32 },
    /// A procedural cube with the given edge length.
    Cube { size: f32 },
}

impl Default for DieModelSource {
    fn default() -> Self {
        DieModelSource::Cube { size: 0.1 }
    }
}

impl DieModelSource {
    pub fn bounding_radius(&self) -> f32 {
        match self {
            DieModelSource::Scene {
                bounding_radius, ..
            } => *bounding_radius,
            // Half the space diagonal
            DieModelSource::Cube { size } => size * 3.0_f32.sqrt() / 2.0,
        }
    }

    /// Short name used in log lines and error messages
    pub fn label(&self) -> String {
        match self {
            DieModelSource::Scene { path, .. } => path.clone(),
            DieModelSource::Cube { size } => format!("cube({size})"),
        }
    }
}

/// A die node created by the scene but not yet attached anywhere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnedDie<N> {
    pub node: N,
    pub bounding_radius: f32,
}

/// Columns and rows of the face atlas; value `n` sits in cell `n - 1`.
pub const DIE_FACE_ATLAS_COLS: u32 = 3;
pub const DIE_FACE_ATLAS_ROWS: u32 = 2;

/// Face value shown on the side whose outward normal is closest to `normal`.
/// Opposite faces add up to seven.
pub fn face_value_for_normal(normal: Vec3) -> u32 {
    let abs = normal.abs();
    if abs.y >= abs.x && abs.y >= abs.z {
        if normal.y >= 0.0 { 6 } else { 1 }
    } else if abs.x >= abs.z {
        if normal.x >= 0.0 { 3 } else { 4 }
    } else if normal.z >= 0.0 {
        2
    } else {
        5
    }
}

/// UV rectangle of a face value's cell in the atlas, `v` growing downwards.
pub fn die_face_uv_rect(value: u32) -> Rect {
    let idx = value.clamp(1, DIE_FACE_ATLAS_COLS * DIE_FACE_ATLAS_ROWS) - 1;
    let col = (idx % DIE_FACE_ATLAS_COLS) as f32;
    let row = (idx / DIE_FACE_ATLAS_COLS) as f32;
    let cell = Vec2::new(
        1.0 / DIE_FACE_ATLAS_COLS as f32,
        1.0 / DIE_FACE_ATLAS_ROWS as f32,
    );
    let min = Vec2::new(col, row) * cell;
    Rect::from_corners(min, min + cell)
}

/// Radius of the smallest origin-centred sphere holding every point.
pub fn bounding_radius_of(points: impl IntoIterator<Item = Vec3>) -> Option<f32> {
    points
        .into_iter()
        .map(Vec3::length)
        .fold(None, |max, r| Some(max.map_or(r, |m: f32| m.max(r))))
}

/// Position that rests a die with the given bounding radius on `hit`.
pub fn resting_position(hit: Vec3, bounding_radius: f32) -> Vec3 {
    Vec3::new(hit.x, hit.y + bounding_radius, hit.z)
}

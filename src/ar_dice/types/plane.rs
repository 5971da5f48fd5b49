//! Anchor and plane-marker types

use std::f32::consts::FRAC_PI_2;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Identifier the tracking session assigns to an anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnchorId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaneAlignment {
    #[default]
    Horizontal,
    Vertical,
}

/// A detected flat surface, expressed in its anchor's local space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneAnchor {
    /// Center of the detected extent, relative to the anchor origin
    pub center: Vec3,
    /// Width (local X) and height (local Z) of the surface
    pub extent: Vec2,
    pub alignment: PlaneAlignment,
}

impl PlaneAnchor {
    /// True if the local point lies within the detected extent.
    pub fn contains_local(&self, local: Vec3) -> bool {
        let half = self.extent / 2.0;
        (local.x - self.center.x).abs() <= half.x && (local.z - self.center.z).abs() <= half.y
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnchorKind {
    Plane(PlaneAnchor),
    Point,
}

/// A tracked real-world reference reported by the session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub id: AnchorId,
    /// Anchor pose in world space
    pub transform: Transform,
    pub kind: AnchorKind,
}

impl Anchor {
    pub fn plane(&self) -> Option<&PlaneAnchor> {
        match &self.kind {
            AnchorKind::Plane(plane) => Some(plane),
            AnchorKind::Point => None,
        }
    }
}

/// Geometry and local placement of a detected-plane marker.
///
/// The marker quad is built in its own XY plane, so it is turned a quarter
/// turn about X to lie flat on the surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneMarkerSpec {
    pub width: f32,
    pub height: f32,
    pub translation: Vec3,
    pub rotation: Quat,
}

impl PlaneMarkerSpec {
    pub fn for_plane(plane: &PlaneAnchor) -> Self {
        Self {
            width: plane.extent.x,
            height: plane.extent.y,
            translation: Vec3::new(plane.center.x, 0.0, plane.center.z),
            rotation: Quat::from_rotation_x(-FRAC_PI_2),
        }
    }

    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.translation).with_rotation(self.rotation)
    }
}

/// Component on the host-owned node that follows an anchor
#[derive(Component, Debug, Clone, Copy)]
pub struct AnchorNode {
    pub id: AnchorId,
}

/// Component on the visual marker of a detected plane
#[derive(Component, Debug, Clone, Copy)]
pub struct PlaneMarker {
    pub width: f32,
    pub height: f32,
}

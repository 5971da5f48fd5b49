//! Tracking Module
//!
//! The contract the dice controller consumes from a world-tracking host:
//! starting and pausing a session, the events it reports, and ray casts
//! against the surfaces it has detected. `SimulatedSession` is a desktop
//! implementation driven by settings.

mod simulated;

pub use simulated::*;

use bevy::prelude::*;

use crate::ar_dice::scene::SceneGraph;
use crate::ar_dice::types::{
    Anchor, AnchorId, PlaneAlignment, PlaneAnchor, TrackingConfiguration, TrackingError,
};

/// The running tracking session, as a Bevy resource
#[derive(Resource)]
pub struct ArSession(pub SimulatedSession);

/// Events a session reports while it runs.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    AnchorAdded(Anchor),
    /// The anchor is gone; its node should be removed by the host.
    AnchorRemoved(AnchorId),
    Failed(TrackingError),
    Interrupted,
    InterruptionEnded,
}

/// Which tracked geometry a ray cast may hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaycastTarget {
    /// Detected planes, limited to their reported extent
    ExistingPlaneGeometry,
    /// Detected planes treated as infinite
    ExistingPlaneInfinite,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastQuery {
    pub origin: Vec3,
    pub direction: Dir3,
    pub target: RaycastTarget,
    pub alignment: PlaneAlignment,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    /// World transform of the hit; `w_axis` holds the hit point
    pub world_transform: Mat4,
    pub distance: f32,
    pub anchor: AnchorId,
}

impl RaycastHit {
    pub fn point(&self) -> Vec3 {
        self.world_transform.w_axis.truncate()
    }
}

/// How `run` treats state left over from an earlier run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunOptions {
    /// Keep tracking state and detected anchors
    #[default]
    Resume,
    /// Drop every anchor and start detection over
    ResetTracking,
}

/// A world-tracking session.
pub trait TrackingSession {
    /// Start tracking with `configuration`, replacing any earlier one.
    fn run(&mut self, configuration: &TrackingConfiguration, options: RunOptions);

    fn pause(&mut self);

    fn is_running(&self) -> bool;

    /// Advance the session clock and collect the events raised meanwhile.
    fn update(&mut self, dt: f32) -> Vec<SessionEvent>;

    /// Pose of the tracked device in world space
    fn camera_transform(&self) -> Transform;

    /// Build a ray cast from a screen point. `None` when no ray can be formed
    /// (session not running, point outside the viewport).
    fn raycast_query(
        &self,
        screen_point: Vec2,
        viewport: Vec2,
        target: RaycastTarget,
        alignment: PlaneAlignment,
    ) -> Option<RaycastQuery>;

    /// Hits sorted nearest first
    fn raycast(&self, query: &RaycastQuery) -> Vec<RaycastHit>;
}

/// Callbacks a session host delivers to whoever owns the scene content.
pub trait SessionDelegate<S: SceneGraph> {
    /// The host created `node` to follow `anchor`. Returns the marker built
    /// for a plane anchor; other anchors are ignored.
    fn on_node_added(&mut self, scene: &mut S, node: S::Node, anchor: &Anchor) -> Option<S::Node> {
        anchor
            .plane()
            .map(|plane| self.on_plane_detected(scene, node, plane))
    }

    fn on_plane_detected(&mut self, scene: &mut S, node: S::Node, plane: &PlaneAnchor) -> S::Node;

    fn on_session_failed(&mut self, error: &TrackingError);

    fn on_interrupted(&mut self);

    fn on_interruption_ended(&mut self, scene: &mut S, session: &mut dyn TrackingSession);
}

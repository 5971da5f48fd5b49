//! Simulated tracking session
//!
//! Replays the planes and interruptions listed in the settings on a session
//! clock, and casts rays from a pinhole camera orbiting the world origin.

use bevy::prelude::*;

use super::{RaycastHit, RaycastQuery, RaycastTarget, RunOptions, SessionEvent, TrackingSession};
use crate::ar_dice::types::{
    Anchor, AnchorId, AnchorKind, DevicePose, PlaneAlignment, PlaneAnchor, PlaneDetection,
    SessionState, SimulatedSessionSettings, TrackingConfiguration, TrackingError,
};

const MIN_PITCH_DEGREES: f32 = 5.0;
const MAX_PITCH_DEGREES: f32 = 89.0;
const MIN_DISTANCE: f32 = 0.3;
const MAX_DISTANCE: f32 = 10.0;

pub struct SimulatedSession {
    settings: SimulatedSessionSettings,
    device: DevicePose,
    state: SessionState,
    configuration: TrackingConfiguration,
    /// Running time since the last reset
    clock: f32,
    /// Running time since creation; drives scripted interruptions
    uptime: f32,
    /// (scripted plane index, anchor)
    detected: Vec<(usize, Anchor)>,
    next_anchor_id: u64,
    scripted_interruption: bool,
    manual_interruption: bool,
    pending: Vec<SessionEvent>,
}

impl SimulatedSession {
    pub fn new(settings: SimulatedSessionSettings) -> Self {
        let device = settings.device;
        Self {
            settings,
            device,
            state: SessionState::Stopped,
            configuration: TrackingConfiguration::default(),
            clock: 0.0,
            uptime: 0.0,
            detected: Vec::new(),
            next_anchor_id: 1,
            scripted_interruption: false,
            manual_interruption: false,
            pending: Vec::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn clock(&self) -> f32 {
        self.clock
    }

    pub fn fov_y(&self) -> f32 {
        self.settings.fov_y_degrees.to_radians()
    }

    pub fn anchors(&self) -> impl Iterator<Item = &Anchor> {
        self.detected.iter().map(|(_, anchor)| anchor)
    }

    /// Move the device around its orbit.
    pub fn orbit(&mut self, yaw_degrees: f32, pitch_degrees: f32, distance: f32) {
        self.device.yaw_degrees = (self.device.yaw_degrees + yaw_degrees).rem_euclid(360.0);
        self.device.pitch_degrees = (self.device.pitch_degrees + pitch_degrees)
            .clamp(MIN_PITCH_DEGREES, MAX_PITCH_DEGREES);
        self.device.distance = (self.device.distance + distance).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    /// Toggle a user-triggered interruption (e.g. the app losing the camera).
    pub fn set_interrupted(&mut self, interrupted: bool) {
        if self.manual_interruption == interrupted {
            return;
        }
        self.manual_interruption = interrupted;
        self.refresh_interruption();
    }

    pub fn toggle_interruption(&mut self) {
        self.set_interrupted(!self.manual_interruption);
    }

    pub fn is_interrupted(&self) -> bool {
        self.state == SessionState::Interrupted
    }

    /// Report a fault and stop, the way a hardware session gives up.
    pub fn fail(&mut self, error: TrackingError) {
        self.state = SessionState::Stopped;
        self.pending.push(SessionEvent::Failed(error));
    }

    fn refresh_interruption(&mut self) {
        if self.state == SessionState::Stopped {
            return;
        }
        let interrupted = self.manual_interruption || self.scripted_interruption;
        match (self.state, interrupted) {
            (SessionState::Running, true) => {
                self.state = SessionState::Interrupted;
                self.pending.push(SessionEvent::Interrupted);
            }
            (SessionState::Interrupted, false) => {
                self.state = SessionState::Running;
                self.pending.push(SessionEvent::InterruptionEnded);
            }
            _ => {}
        }
    }

    fn detect_planes(&mut self) {
        if self.configuration.plane_detection != PlaneDetection::Horizontal {
            return;
        }

        for (index, plane) in self.settings.planes.iter().enumerate() {
            if plane.detect_after_secs > self.clock {
                continue;
            }
            if self.detected.iter().any(|(i, _)| *i == index) {
                continue;
            }

            let anchor = Anchor {
                id: AnchorId(self.next_anchor_id),
                transform: Transform::from_translation(Vec3::from_array(plane.center)),
                kind: AnchorKind::Plane(PlaneAnchor {
                    center: Vec3::ZERO,
                    extent: Vec2::from_array(plane.extent),
                    alignment: PlaneAlignment::Horizontal,
                }),
            };
            self.next_anchor_id += 1;
            self.detected.push((index, anchor));
            self.pending.push(SessionEvent::AnchorAdded(anchor));
        }
    }
}

impl TrackingSession for SimulatedSession {
    fn run(&mut self, configuration: &TrackingConfiguration, options: RunOptions) {
        let fov = self.settings.fov_y_degrees;
        if !(fov > 0.0 && fov < 180.0) {
            self.fail(TrackingError::UnsupportedConfiguration {
                reason: format!("vertical field of view {fov} is out of range"),
            });
            return;
        }

        self.configuration = *configuration;
        if options == RunOptions::ResetTracking {
            for (_, anchor) in self.detected.drain(..) {
                self.pending.push(SessionEvent::AnchorRemoved(anchor.id));
            }
            self.clock = 0.0;
        }

        self.state = SessionState::Running;
        self.refresh_interruption();
    }

    fn pause(&mut self) {
        self.state = SessionState::Stopped;
    }

    fn is_running(&self) -> bool {
        self.state != SessionState::Stopped
    }

    fn update(&mut self, dt: f32) -> Vec<SessionEvent> {
        if self.state != SessionState::Stopped {
            let dt = dt.max(0.0);
            self.clock += dt;
            self.uptime += dt;

            let uptime = self.uptime;
            self.scripted_interruption = self
                .settings
                .interruptions
                .iter()
                .any(|i| uptime >= i.start_secs && uptime < i.end_secs);
            self.refresh_interruption();

            if self.state == SessionState::Running {
                self.detect_planes();
            }
        }

        std::mem::take(&mut self.pending)
    }

    fn camera_transform(&self) -> Transform {
        let yaw = self.device.yaw_degrees.to_radians();
        let pitch = self.device.pitch_degrees.to_radians();
        let distance = self.device.distance;

        let position = Vec3::new(
            distance * pitch.cos() * yaw.sin(),
            distance * pitch.sin(),
            distance * pitch.cos() * yaw.cos(),
        );
        Transform::from_translation(position).looking_at(Vec3::ZERO, Vec3::Y)
    }

    fn raycast_query(
        &self,
        screen_point: Vec2,
        viewport: Vec2,
        target: RaycastTarget,
        alignment: PlaneAlignment,
    ) -> Option<RaycastQuery> {
        if self.state != SessionState::Running {
            return None;
        }
        if viewport.x <= 0.0 || viewport.y <= 0.0 {
            return None;
        }
        if screen_point.x < 0.0
            || screen_point.y < 0.0
            || screen_point.x > viewport.x
            || screen_point.y > viewport.y
        {
            return None;
        }

        // Screen space has +Y down, view space +Y up and looks along -Z
        let ndc = Vec2::new(
            2.0 * screen_point.x / viewport.x - 1.0,
            1.0 - 2.0 * screen_point.y / viewport.y,
        );
        let half_height = (self.fov_y() / 2.0).tan();
        let aspect = viewport.x / viewport.y;
        let view_dir = Vec3::new(ndc.x * half_height * aspect, ndc.y * half_height, -1.0);

        let camera = self.camera_transform();
        let direction = Dir3::new(camera.rotation * view_dir).ok()?;

        Some(RaycastQuery {
            origin: camera.translation,
            direction,
            target,
            alignment,
        })
    }

    fn raycast(&self, query: &RaycastQuery) -> Vec<RaycastHit> {
        if self.state != SessionState::Running {
            return Vec::new();
        }

        let mut hits: Vec<RaycastHit> = self
            .anchors()
            .filter_map(|anchor| {
                let plane = anchor.plane()?;
                if plane.alignment != query.alignment {
                    return None;
                }

                let rotation = anchor.transform.rotation;
                let normal = rotation * Vec3::Y;
                let plane_point = anchor.transform.translation + rotation * plane.center;

                let denom = normal.dot(*query.direction);
                if denom.abs() < 1e-6 {
                    return None;
                }
                let distance = normal.dot(plane_point - query.origin) / denom;
                if distance < 0.0 {
                    return None;
                }

                let point = query.origin + *query.direction * distance;
                if query.target == RaycastTarget::ExistingPlaneGeometry {
                    let local = rotation.inverse() * (point - anchor.transform.translation);
                    if !plane.contains_local(local) {
                        return None;
                    }
                }

                Some(RaycastHit {
                    world_transform: Mat4::from_rotation_translation(rotation, point),
                    distance,
                    anchor: anchor.id,
                })
            })
            .collect();

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ar_dice::types::{ScriptedInterruption, ScriptedPlane};

    fn settings_with(planes: Vec<ScriptedPlane>) -> SimulatedSessionSettings {
        SimulatedSessionSettings {
            planes,
            ..Default::default()
        }
    }

    fn floor(detect_after_secs: f32) -> ScriptedPlane {
        ScriptedPlane {
            center: [0.0, 0.0, 0.0],
            extent: [2.0, 2.0],
            detect_after_secs,
        }
    }

    #[test]
    fn test_stopped_session_reports_nothing() {
        let mut session = SimulatedSession::new(settings_with(vec![floor(0.0)]));
        assert!(session.update(1.0).is_empty());
        assert!(!session.is_running());
    }

    #[test]
    fn test_planes_detected_after_delay_once() {
        let mut session = SimulatedSession::new(settings_with(vec![floor(1.0)]));
        session.run(&TrackingConfiguration::horizontal_planes(), RunOptions::Resume);

        assert!(session.update(0.5).is_empty());
        let events = session.update(0.6);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], SessionEvent::AnchorAdded(_)));
        assert!(session.update(1.0).is_empty());
    }

    #[test]
    fn test_no_detection_without_plane_detection() {
        let mut session = SimulatedSession::new(settings_with(vec![floor(0.0)]));
        session.run(
            &TrackingConfiguration {
                plane_detection: PlaneDetection::None,
            },
            RunOptions::Resume,
        );
        assert!(session.update(1.0).is_empty());
    }

    #[test]
    fn test_pause_stops_clock() {
        let mut session = SimulatedSession::new(settings_with(vec![floor(1.0)]));
        session.run(&TrackingConfiguration::horizontal_planes(), RunOptions::Resume);
        session.update(0.5);
        session.pause();
        assert!(session.update(5.0).is_empty());
        assert_eq!(session.clock(), 0.5);
    }

    #[test]
    fn test_reset_removes_anchors() {
        let mut session = SimulatedSession::new(settings_with(vec![floor(0.0)]));
        session.run(&TrackingConfiguration::horizontal_planes(), RunOptions::Resume);
        let added = session.update(0.1);
        let SessionEvent::AnchorAdded(anchor) = added[0] else {
            panic!("expected an anchor");
        };

        session.run(
            &TrackingConfiguration::horizontal_planes(),
            RunOptions::ResetTracking,
        );
        let events = session.update(0.1);
        assert_eq!(events[0], SessionEvent::AnchorRemoved(anchor.id));
        // Rediscovered under a fresh id
        match events[1] {
            SessionEvent::AnchorAdded(again) => assert_ne!(again.id, anchor.id),
            ref other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_scripted_interruption() {
        let mut settings = settings_with(vec![]);
        settings.interruptions = vec![ScriptedInterruption {
            start_secs: 1.0,
            end_secs: 2.0,
        }];
        let mut session = SimulatedSession::new(settings);
        session.run(&TrackingConfiguration::horizontal_planes(), RunOptions::Resume);

        assert!(session.update(0.5).is_empty());
        assert_eq!(session.update(0.6), vec![SessionEvent::Interrupted]);
        assert!(session.is_interrupted());
        assert_eq!(session.update(1.0), vec![SessionEvent::InterruptionEnded]);
        assert!(!session.is_interrupted());
    }

    #[test]
    fn test_manual_interruption_toggle() {
        let mut session = SimulatedSession::new(settings_with(vec![floor(0.0)]));
        session.run(&TrackingConfiguration::horizontal_planes(), RunOptions::Resume);
        session.update(0.1);

        session.toggle_interruption();
        assert_eq!(session.update(0.1), vec![SessionEvent::Interrupted]);
        // No ray casts while interrupted
        let query = RaycastQuery {
            origin: Vec3::Y,
            direction: Dir3::NEG_Y,
            target: RaycastTarget::ExistingPlaneGeometry,
            alignment: PlaneAlignment::Horizontal,
        };
        assert!(session.raycast(&query).is_empty());

        session.toggle_interruption();
        assert_eq!(session.update(0.1), vec![SessionEvent::InterruptionEnded]);
        assert_eq!(session.raycast(&query).len(), 1);
    }

    #[test]
    fn test_invalid_fov_fails() {
        let mut settings = settings_with(vec![]);
        settings.fov_y_degrees = 0.0;
        let mut session = SimulatedSession::new(settings);
        session.run(&TrackingConfiguration::horizontal_planes(), RunOptions::Resume);
        let events = session.update(0.1);
        assert!(matches!(events[0], SessionEvent::Failed(_)));
        assert!(!session.is_running());
    }

    #[test]
    fn test_orbit_clamps_pitch() {
        let mut session = SimulatedSession::new(settings_with(vec![]));
        session.orbit(0.0, 200.0, 0.0);
        let camera = session.camera_transform();
        // Nearly straight above the origin
        assert!(camera.translation.y > 1.9);
    }
}

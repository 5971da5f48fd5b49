//! Scene controller
//!
//! Owns the placed dice and turns tracking and input events into scene-graph
//! mutations. The session and the scene are always passed in by the caller.

use std::fmt::Debug;

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::ar_dice::scene::SceneGraph;
use crate::ar_dice::tracking::{RaycastTarget, RunOptions, SessionDelegate, TrackingSession};
use crate::ar_dice::types::error::Result;
use crate::ar_dice::types::{
    resting_position, ArDiceSettings, DieModelSource, InterruptionPolicy, NoticeSeverity,
    PlaneAlignment, PlaneAnchor, PlaneMarkerSpec, RollAction, TrackingConfiguration,
    TrackingError, TrackingNotice,
};

/// How long an info notice stays on screen
pub const INFO_NOTICE_SECS: f32 = 4.0;

#[derive(Resource)]
pub struct SceneController<N = Entity> {
    /// Placed dice in placement order. Every entry is attached to the scene.
    dice: Vec<N>,
    rng: StdRng,
    die_model: DieModelSource,
    roll_duration_secs: f32,
    spin_multiplier: u32,
    interruption_policy: InterruptionPolicy,
    notice: Option<TrackingNotice>,
    notice_age: f32,
}

impl<N: Copy + Eq + Debug> SceneController<N> {
    pub fn new(settings: &ArDiceSettings, rng: StdRng) -> Self {
        Self {
            dice: Vec::new(),
            rng,
            die_model: settings.die_model.clone(),
            roll_duration_secs: settings.roll_duration_secs,
            spin_multiplier: settings.spin_multiplier,
            interruption_policy: settings.interruption_policy,
            notice: None,
            notice_age: 0.0,
        }
    }

    /// Seeded from the settings when a seed is given, from entropy otherwise.
    pub fn from_settings(settings: &ArDiceSettings) -> Self {
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::new(settings, rng)
    }

    pub fn dice(&self) -> &[N] {
        &self.dice
    }

    pub fn notice(&self) -> Option<&TrackingNotice> {
        self.notice.as_ref()
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }

    /// Age the current notice. Info notices are dropped after
    /// [`INFO_NOTICE_SECS`]; warnings and errors stay until tracking restarts.
    /// Returns true when the notice was dropped.
    pub fn tick_notice(&mut self, dt: f32) -> bool {
        let Some(notice) = &self.notice else {
            return false;
        };
        self.notice_age += dt;
        if notice.severity == NoticeSeverity::Info && self.notice_age >= INFO_NOTICE_SECS {
            self.notice = None;
            return true;
        }
        false
    }

    fn set_notice(&mut self, notice: TrackingNotice) {
        self.notice = Some(notice);
        self.notice_age = 0.0;
    }

    /// Run tracking with horizontal plane detection. Clears any notice left
    /// from an earlier failure or interruption.
    pub fn start(&mut self, session: &mut dyn TrackingSession) {
        info!("Starting world tracking (horizontal planes)");
        self.clear_notice();
        session.run(&TrackingConfiguration::horizontal_planes(), RunOptions::Resume);
    }

    /// Pause tracking. Scene content is kept.
    pub fn stop(&mut self, session: &mut dyn TrackingSession) {
        info!("Pausing world tracking");
        session.pause();
    }

    /// Attach a flat marker sized to the plane under its anchor node.
    pub fn handle_plane_detected<S: SceneGraph<Node = N>>(
        &mut self,
        scene: &mut S,
        anchor_node: N,
        plane: &PlaneAnchor,
    ) -> N {
        let spec = PlaneMarkerSpec::for_plane(plane);
        let marker = scene.spawn_plane_marker(&spec);
        scene.attach_child(anchor_node, marker);
        debug!(
            "Plane detected: {:.2} x {:.2} at {:?}",
            spec.width, spec.height, plane.center
        );
        marker
    }

    /// Spawn a die resting on the hit point held in `world_transform.w_axis`
    /// and give it a first roll.
    pub fn place_die<S: SceneGraph<Node = N>>(
        &mut self,
        scene: &mut S,
        world_transform: Mat4,
    ) -> Result<N> {
        let hit = world_transform.w_axis.truncate();
        let spawned = scene.instantiate_die(&self.die_model).inspect_err(|err| {
            error!("{err}");
        })?;

        let position = resting_position(hit, spawned.bounding_radius);
        scene.set_translation(spawned.node, position);
        scene.attach_to_root(spawned.node);
        self.dice.push(spawned.node);
        info!("Placed die {} at {:?}", self.dice.len(), position);

        self.roll_die(scene, spawned.node);
        Ok(spawned.node)
    }

    /// Schedule a random spin around X and Z on `die`.
    pub fn roll_die<S: SceneGraph<Node = N>>(&mut self, scene: &mut S, die: N) -> RollAction {
        let roll = RollAction::random(
            &mut self.rng,
            self.spin_multiplier,
            self.roll_duration_secs,
        );
        scene.run_roll(die, roll);
        roll
    }

    /// Roll every placed die. Returns how many were rolled.
    pub fn roll_all<S: SceneGraph<Node = N>>(&mut self, scene: &mut S) -> usize {
        let dice = self.dice.clone();
        for die in &dice {
            self.roll_die(scene, *die);
        }
        dice.len()
    }

    /// Detach every die from the scene and forget it. Returns how many were removed.
    pub fn remove_all<S: SceneGraph<Node = N>>(&mut self, scene: &mut S) -> usize {
        let count = self.dice.len();
        for die in self.dice.drain(..) {
            scene.detach(die);
        }
        if count > 0 {
            info!("Removed {count} dice");
        }
        count
    }

    /// Cast from `screen_point` against detected horizontal planes and place a
    /// die on the nearest hit. `Ok(None)` when nothing was hit.
    pub fn handle_tap<S: SceneGraph<Node = N>>(
        &mut self,
        scene: &mut S,
        session: &dyn TrackingSession,
        screen_point: Vec2,
        viewport: Vec2,
    ) -> Result<Option<N>> {
        let Some(query) = session.raycast_query(
            screen_point,
            viewport,
            RaycastTarget::ExistingPlaneGeometry,
            PlaneAlignment::Horizontal,
        ) else {
            return Ok(None);
        };

        let Some(hit) = session.raycast(&query).into_iter().next() else {
            debug!("Tap at {screen_point:?} hit no detected plane");
            return Ok(None);
        };

        self.place_die(scene, hit.world_transform).map(Some)
    }

    pub fn handle_shake<S: SceneGraph<Node = N>>(&mut self, scene: &mut S) -> usize {
        self.roll_all(scene)
    }

    pub fn handle_tracking_failure(&mut self, error: &TrackingError) {
        error!("Tracking session failed: {error}");
        self.set_notice(TrackingNotice::error(format!("Tracking stopped: {error}")));
    }

    pub fn handle_interruption(&mut self) {
        warn!("Tracking session interrupted");
        self.set_notice(TrackingNotice::warning(
            "Tracking interrupted. Dice may drift until it resumes.",
        ));
    }

    /// Anchors may be stale after an interruption; the policy decides
    /// whether to keep the dice or start over.
    pub fn handle_interruption_ended<S: SceneGraph<Node = N>>(
        &mut self,
        scene: &mut S,
        session: &mut dyn TrackingSession,
    ) {
        match self.interruption_policy {
            InterruptionPolicy::KeepDice => {
                info!("Tracking resumed; keeping {} dice", self.dice.len());
                self.set_notice(TrackingNotice::info("Tracking resumed"));
            }
            InterruptionPolicy::ResetSession => {
                info!("Tracking resumed; resetting session");
                self.remove_all(scene);
                session.run(
                    &TrackingConfiguration::horizontal_planes(),
                    RunOptions::ResetTracking,
                );
                self.set_notice(TrackingNotice::info(
                    "Tracking resumed. Scan the surface again to place dice.",
                ));
            }
        }
    }
}

impl<S: SceneGraph> SessionDelegate<S> for SceneController<S::Node> {
    fn on_plane_detected(&mut self, scene: &mut S, node: S::Node, plane: &PlaneAnchor) -> S::Node {
        self.handle_plane_detected(scene, node, plane)
    }

    fn on_session_failed(&mut self, error: &TrackingError) {
        self.handle_tracking_failure(error);
    }

    fn on_interrupted(&mut self) {
        self.handle_interruption();
    }

    fn on_interruption_ended(&mut self, scene: &mut S, session: &mut dyn TrackingSession) {
        self.handle_interruption_ended(scene, session);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ar_dice::scene::{MemoryScene, NodeId};

    fn controller(seed: u64) -> SceneController<NodeId> {
        SceneController::new(&ArDiceSettings::default(), StdRng::seed_from_u64(seed))
    }

    #[test]
    fn test_place_rolls_immediately() {
        let mut scene = MemoryScene::new();
        let mut ctrl = controller(1);
        let die = ctrl
            .place_die(&mut scene, Mat4::from_translation(Vec3::new(0.2, 0.0, -0.3)))
            .expect("placed");
        assert_eq!(scene.node(die).map(|n| n.rolls.len()), Some(1));
    }

    #[test]
    fn test_failed_asset_places_nothing() {
        let mut scene = MemoryScene::new();
        scene.fail_asset_loads("missing file");
        let mut ctrl = controller(1);
        let result = ctrl.place_die(&mut scene, Mat4::IDENTITY);
        assert!(result.is_err());
        assert!(ctrl.dice().is_empty());
        assert!(scene.attached_dice().is_empty());
    }

    #[test]
    fn test_same_seed_same_rolls() {
        let mut scene_a = MemoryScene::new();
        let mut scene_b = MemoryScene::new();
        let mut a = controller(99);
        let mut b = controller(99);
        let die_a = a.place_die(&mut scene_a, Mat4::IDENTITY).expect("placed");
        let die_b = b.place_die(&mut scene_b, Mat4::IDENTITY).expect("placed");
        assert_eq!(a.roll_die(&mut scene_a, die_a), b.roll_die(&mut scene_b, die_b));
    }

    #[test]
    fn test_failure_sets_error_notice() {
        let mut ctrl = controller(1);
        ctrl.handle_tracking_failure(&TrackingError::CameraUnavailable {
            reason: "denied".to_string(),
        });
        let notice = ctrl.notice().expect("notice");
        assert_eq!(notice.severity, NoticeSeverity::Error);
        assert!(notice.message.contains("denied"));

        ctrl.clear_notice();
        assert!(ctrl.notice().is_none());
    }

    #[test]
    fn test_info_notice_expires_but_error_stays() {
        let mut ctrl = controller(1);
        let mut scene = MemoryScene::new();
        let mut session = crate::ar_dice::tracking::SimulatedSession::new(Default::default());
        ctrl.handle_interruption_ended(&mut scene, &mut session);
        assert!(!ctrl.tick_notice(INFO_NOTICE_SECS / 2.0));
        assert!(ctrl.notice().is_some());
        assert!(ctrl.tick_notice(INFO_NOTICE_SECS));
        assert!(ctrl.notice().is_none());

        ctrl.handle_tracking_failure(&TrackingError::WorldTrackingFailed {
            reason: "lost".to_string(),
        });
        assert!(!ctrl.tick_notice(INFO_NOTICE_SECS * 10.0));
        assert!(ctrl.notice().is_some());
    }
}

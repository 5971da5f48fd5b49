//! Tests for the scene controller against the in-memory scene

use ardice::ar_dice::{
    Anchor, AnchorId, AnchorKind, ArDiceSettings, DieModelSource, InterruptionPolicy, MemoryScene,
    NodeId, NodeKind, PlaneAlignment, PlaneAnchor, SceneController, ScriptedPlane,
    SessionDelegate, SessionEvent, SimulatedSession, SimulatedSessionSettings, TrackingError,
    TrackingSession,
};
use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

const VIEWPORT: Vec2 = Vec2::new(1280.0, 720.0);

fn controller_with(settings: &ArDiceSettings, seed: u64) -> SceneController<NodeId> {
    SceneController::new(settings, StdRng::seed_from_u64(seed))
}

fn controller(seed: u64) -> SceneController<NodeId> {
    controller_with(&ArDiceSettings::default(), seed)
}

fn floor_session() -> SimulatedSession {
    SimulatedSession::new(SimulatedSessionSettings {
        planes: vec![ScriptedPlane {
            center: [0.0, 0.0, 0.0],
            extent: [4.0, 4.0],
            detect_after_secs: 0.0,
        }],
        ..Default::default()
    })
}

/// Run the session until its planes are found and give each one an anchor node.
fn detect_planes(
    controller: &mut SceneController<NodeId>,
    scene: &mut MemoryScene,
    session: &mut SimulatedSession,
) {
    controller.start(session);
    for event in session.update(0.1) {
        if let SessionEvent::AnchorAdded(anchor) = event {
            let node = scene.add_anchor_node(anchor.id, anchor.transform.translation);
            controller.on_node_added(scene, node, &anchor);
        }
    }
}

fn plane_anchor(id: u64, center: Vec3, extent: Vec2) -> Anchor {
    Anchor {
        id: AnchorId(id),
        transform: Transform::from_translation(center),
        kind: AnchorKind::Plane(PlaneAnchor {
            center: Vec3::ZERO,
            extent,
            alignment: PlaneAlignment::Horizontal,
        }),
    }
}

#[test]
fn test_n_places_give_n_attached_dice() {
    let mut scene = MemoryScene::new();
    let mut ctrl = controller(7);

    for i in 0..5 {
        let hit = Mat4::from_translation(Vec3::new(i as f32 * 0.2, 0.0, 0.0));
        ctrl.place_die(&mut scene, hit).expect("placed");
    }

    assert_eq!(ctrl.dice().len(), 5);
    assert!(ctrl.dice().iter().all(|die| scene.is_attached(*die)));
    assert_eq!(scene.attached_dice(), ctrl.dice().to_vec());
}

#[test]
fn test_remove_all_empties_and_detaches() {
    let mut scene = MemoryScene::new();
    let mut ctrl = controller(7);
    let placed: Vec<NodeId> = (0..3)
        .map(|_| ctrl.place_die(&mut scene, Mat4::IDENTITY).expect("placed"))
        .collect();

    assert_eq!(ctrl.remove_all(&mut scene), 3);

    assert!(ctrl.dice().is_empty());
    assert!(scene.attached_dice().is_empty());
    assert!(placed.iter().all(|die| !scene.is_attached(*die)));

    // Rolling after a reset touches nothing
    assert_eq!(ctrl.roll_all(&mut scene), 0);
    assert!(placed
        .iter()
        .all(|die| scene.node(*die).map(|n| n.rolls.len()) == Some(1)));
}

#[test]
fn test_roll_angles_are_multiples_of_900() {
    let mut scene = MemoryScene::new();
    let mut ctrl = controller(42);
    let die = ctrl.place_die(&mut scene, Mat4::IDENTITY).expect("placed");

    for _ in 0..200 {
        let roll = ctrl.roll_die(&mut scene, die);
        for degrees in [roll.degrees_x(), roll.degrees_z()] {
            assert_eq!(degrees % 900, 0);
            assert!((900..=3600).contains(&degrees));
        }
        assert_eq!(roll.duration_secs, 0.5);
    }
}

#[test]
fn test_roll_all_on_empty_collection_is_noop() {
    let mut scene = MemoryScene::new();
    let mut ctrl = controller(1);
    assert_eq!(ctrl.roll_all(&mut scene), 0);
    assert_eq!(ctrl.handle_shake(&mut scene), 0);
    assert!(scene.attached_dice().is_empty());
}

#[test]
fn test_shake_rolls_every_die_once() {
    let mut scene = MemoryScene::new();
    let mut ctrl = controller(3);
    let a = ctrl.place_die(&mut scene, Mat4::IDENTITY).expect("placed");
    let b = ctrl
        .place_die(&mut scene, Mat4::from_translation(Vec3::X))
        .expect("placed");

    assert_eq!(ctrl.handle_shake(&mut scene), 2);

    // One roll from placement plus one from the shake
    for die in [a, b] {
        assert_eq!(scene.node(die).map(|n| n.rolls.len()), Some(2));
    }
}

#[test]
fn test_place_rests_die_on_hit_point() {
    let settings = ArDiceSettings {
        die_model: DieModelSource::Scene {
            path: "models/die.glb#Scene0".to_string(),
            bounding_radius: 0.5,
        },
        ..Default::default()
    };
    let mut scene = MemoryScene::new();
    let mut ctrl = controller_with(&settings, 1);

    let die = ctrl.place_die(&mut scene, Mat4::IDENTITY).expect("placed");
    let node = scene.node(die).expect("node");
    assert_eq!(node.translation, Vec3::new(0.0, 0.5, 0.0));

    let hit =
        Mat4::from_rotation_translation(Quat::from_rotation_y(1.0), Vec3::new(1.0, 2.0, 3.0));
    let die = ctrl.place_die(&mut scene, hit).expect("placed");
    let node = scene.node(die).expect("node");
    assert!((node.translation - Vec3::new(1.0, 2.5, 3.0)).length() < 1e-5);
}

#[test]
fn test_tap_without_hit_never_mutates() {
    let mut scene = MemoryScene::new();
    let mut session = floor_session();
    let mut ctrl = controller(1);

    // Session not running: no query can be built
    let placed = ctrl
        .handle_tap(&mut scene, &session, VIEWPORT / 2.0, VIEWPORT)
        .expect("tap");
    assert_eq!(placed, None);

    // Running but nothing detected yet
    ctrl.start(&mut session);
    let placed = ctrl
        .handle_tap(&mut scene, &session, VIEWPORT / 2.0, VIEWPORT)
        .expect("tap");
    assert_eq!(placed, None);

    // Planes found, but the tap lands beyond the plane
    session.update(0.1);
    let placed = ctrl
        .handle_tap(&mut scene, &session, Vec2::new(640.0, 0.0), VIEWPORT)
        .expect("tap");
    assert_eq!(placed, None);

    assert!(ctrl.dice().is_empty());
    assert!(scene.attached_dice().is_empty());
}

#[test]
fn test_tap_on_plane_places_die() {
    let mut scene = MemoryScene::new();
    let mut session = floor_session();
    let mut ctrl = controller(1);
    detect_planes(&mut ctrl, &mut scene, &mut session);

    let die = ctrl
        .handle_tap(&mut scene, &session, VIEWPORT / 2.0, VIEWPORT)
        .expect("tap")
        .expect("hit");

    assert_eq!(ctrl.dice(), &[die]);
    let node = scene.node(die).expect("node");
    let radius = DieModelSource::default().bounding_radius();
    assert!((node.translation - Vec3::new(0.0, radius, 0.0)).length() < 1e-4);
    assert_eq!(node.rolls.len(), 1);
}

#[test]
fn test_two_planes_get_two_markers_under_own_anchors() {
    let mut scene = MemoryScene::new();
    let mut ctrl = controller(1);

    let first = plane_anchor(1, Vec3::ZERO, Vec2::new(1.0, 1.0));
    let second = plane_anchor(2, Vec3::new(2.0, 0.0, 0.0), Vec2::new(2.0, 3.0));
    let first_node = scene.add_anchor_node(first.id, first.transform.translation);
    let second_node = scene.add_anchor_node(second.id, second.transform.translation);

    let first_marker = ctrl
        .on_node_added(&mut scene, first_node, &first)
        .expect("marker");
    let second_marker = ctrl
        .on_node_added(&mut scene, second_node, &second)
        .expect("marker");

    assert_eq!(scene.children(first_node), vec![first_marker]);
    assert_eq!(scene.children(second_node), vec![second_marker]);

    let NodeKind::PlaneMarker(spec) = scene.node(first_marker).expect("node").kind else {
        panic!("expected a plane marker");
    };
    assert_eq!((spec.width, spec.height), (1.0, 1.0));

    let NodeKind::PlaneMarker(spec) = scene.node(second_marker).expect("node").kind else {
        panic!("expected a plane marker");
    };
    assert_eq!((spec.width, spec.height), (2.0, 3.0));
    assert_eq!(spec.translation, Vec3::ZERO);

    // Markers never join the dice collection
    assert!(ctrl.dice().is_empty());
}

#[test]
fn test_point_anchor_gets_no_marker() {
    let mut scene = MemoryScene::new();
    let mut ctrl = controller(1);
    let anchor = Anchor {
        id: AnchorId(9),
        transform: Transform::IDENTITY,
        kind: AnchorKind::Point,
    };
    let node = scene.add_anchor_node(anchor.id, Vec3::ZERO);

    assert_eq!(ctrl.on_node_added(&mut scene, node, &anchor), None);
    assert!(scene.children(node).is_empty());
}

#[test]
fn test_failed_asset_leaves_scene_untouched() {
    let mut scene = MemoryScene::new();
    let mut session = floor_session();
    let mut ctrl = controller(1);
    detect_planes(&mut ctrl, &mut scene, &mut session);
    scene.fail_asset_loads("file not found");

    let result = ctrl.handle_tap(&mut scene, &session, VIEWPORT / 2.0, VIEWPORT);

    assert!(result.is_err());
    assert!(ctrl.dice().is_empty());
    assert!(scene.attached_dice().is_empty());
}

#[test]
fn test_interruption_keeps_dice_by_default() {
    let mut scene = MemoryScene::new();
    let mut session = floor_session();
    let mut ctrl = controller(1);
    detect_planes(&mut ctrl, &mut scene, &mut session);
    ctrl.handle_tap(&mut scene, &session, VIEWPORT / 2.0, VIEWPORT)
        .expect("tap");

    ctrl.handle_interruption();
    assert!(ctrl.notice().is_some());
    ctrl.on_interruption_ended(&mut scene, &mut session);

    assert_eq!(ctrl.dice().len(), 1);
    assert_eq!(scene.attached_dice().len(), 1);
}

#[test]
fn test_interruption_reset_policy_clears_dice_and_restarts() {
    let settings = ArDiceSettings {
        interruption_policy: InterruptionPolicy::ResetSession,
        ..Default::default()
    };
    let mut scene = MemoryScene::new();
    let mut session = floor_session();
    let mut ctrl = controller_with(&settings, 1);
    detect_planes(&mut ctrl, &mut scene, &mut session);
    ctrl.handle_tap(&mut scene, &session, VIEWPORT / 2.0, VIEWPORT)
        .expect("tap");

    ctrl.on_interruption_ended(&mut scene, &mut session);

    assert!(ctrl.dice().is_empty());
    assert!(scene.attached_dice().is_empty());
    assert!(session.is_running());
    assert_eq!(session.clock(), 0.0);
    assert!(matches!(
        session.update(0.0).first(),
        Some(SessionEvent::AnchorRemoved(AnchorId(1)))
    ));
}

#[test]
fn test_restart_after_failure_clears_notice() {
    let mut scene = MemoryScene::new();
    let mut session = floor_session();
    let mut ctrl = controller(1);
    detect_planes(&mut ctrl, &mut scene, &mut session);

    session.fail(TrackingError::WorldTrackingFailed {
        reason: "sensor lost".to_string(),
    });
    for event in session.update(0.1) {
        if let SessionEvent::Failed(error) = event {
            ctrl.handle_tracking_failure(&error);
        }
    }
    assert!(ctrl.notice().is_some());
    assert!(!session.is_running());

    ctrl.start(&mut session);

    assert!(session.is_running());
    assert!(ctrl.notice().is_none());
}

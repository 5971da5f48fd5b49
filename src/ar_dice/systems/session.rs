//! Tracking session systems
//!
//! The session is the host: it reports anchors and faults, and this module
//! turns those reports into anchor nodes and controller callbacks.

use bevy::prelude::*;
use bevy::window::WindowFocused;

use crate::ar_dice::controller::SceneController;
use crate::ar_dice::scene::{BevyScene, SceneGraph};
use crate::ar_dice::tracking::{ArSession, SessionDelegate, SessionEvent, TrackingSession};
use crate::ar_dice::types::{AnchorNode, ArCommand, MainCamera};

pub fn start_session(mut session: ResMut<ArSession>, mut controller: ResMut<SceneController>) {
    controller.start(&mut session.0);
}

/// Start tracking when the window gains focus, pause it when focus is lost.
pub fn handle_window_focus(
    mut focus_events: MessageReader<WindowFocused>,
    mut ar_commands: MessageWriter<ArCommand>,
) {
    for event in focus_events.read() {
        ar_commands.write(if event.focused {
            ArCommand::StartSession
        } else {
            ArCommand::StopSession
        });
    }
}

/// Advance the session and dispatch what it reported.
pub fn pump_session(
    time: Res<Time>,
    mut session: ResMut<ArSession>,
    mut controller: ResMut<SceneController>,
    mut scene: BevyScene,
    anchor_nodes: Query<(Entity, &AnchorNode)>,
) {
    let events = session.0.update(time.delta_secs());

    for event in events {
        match event {
            SessionEvent::AnchorAdded(anchor) => {
                let node = scene.spawn_anchor_node(&anchor);
                controller.on_node_added(&mut scene, node, &anchor);
            }
            SessionEvent::AnchorRemoved(id) => {
                for (entity, node) in anchor_nodes.iter() {
                    if node.id == id {
                        scene.detach(entity);
                    }
                }
            }
            SessionEvent::Failed(error) => controller.handle_tracking_failure(&error),
            SessionEvent::Interrupted => controller.handle_interruption(),
            SessionEvent::InterruptionEnded => {
                controller.on_interruption_ended(&mut scene, &mut session.0);
            }
        }
    }
}

/// Keep the render camera on the tracked device pose.
pub fn sync_camera_to_device(
    session: Res<ArSession>,
    mut camera_query: Query<&mut Transform, With<MainCamera>>,
) {
    let pose = session.0.camera_transform();
    for mut transform in camera_query.iter_mut() {
        *transform = pose;
    }
}

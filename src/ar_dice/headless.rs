//! Headless run
//!
//! Drives the controller against the simulated session and the in-memory
//! scene without opening a window: warm the session up, tap, shake, and
//! report what happened. A session failure ends the run with
//! [`ArDiceError::Tracking`].

use bevy::prelude::*;

use crate::ar_dice::controller::SceneController;
use crate::ar_dice::scene::{MemoryScene, NodeId, SceneGraph};
use crate::ar_dice::tracking::{SessionDelegate, SessionEvent, SimulatedSession, TrackingSession};
use crate::ar_dice::types::error::{ArDiceError, Result};
use crate::ar_dice::types::{ArDiceSettings, RollAction, TrackingNotice};

#[derive(Debug, Clone)]
pub struct HeadlessScript {
    pub viewport: Vec2,
    pub step_secs: f32,
    /// Session time before the first tap
    pub warmup_secs: f32,
    pub taps: Vec<Vec2>,
    pub shakes: u32,
    pub remove_all: bool,
}

impl Default for HeadlessScript {
    fn default() -> Self {
        Self {
            viewport: Vec2::new(1280.0, 720.0),
            step_secs: 1.0 / 60.0,
            warmup_secs: 3.0,
            taps: vec![Vec2::new(640.0, 360.0)],
            shakes: 1,
            remove_all: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct HeadlessReport {
    pub planes_detected: usize,
    pub dice_placed: usize,
    pub missed_taps: usize,
    /// Every roll scheduled, in order
    pub rolls: Vec<RollAction>,
    pub dice_remaining: usize,
    pub notices: Vec<TrackingNotice>,
}

pub fn run_headless(settings: &ArDiceSettings, script: &HeadlessScript) -> Result<HeadlessReport> {
    let mut session = SimulatedSession::new(settings.session.clone());
    let mut scene = MemoryScene::new();
    let mut controller = SceneController::<NodeId>::from_settings(settings);
    let mut report = HeadlessReport::default();

    controller.start(&mut session);
    let events = session.update(0.0);
    dispatch(&mut controller, &mut scene, &mut session, events, &mut report)?;

    let step = script.step_secs.max(1e-3);
    let mut elapsed = 0.0;
    while elapsed < script.warmup_secs {
        let events = session.update(step);
        dispatch(&mut controller, &mut scene, &mut session, events, &mut report)?;
        elapsed += step;
    }

    for tap in &script.taps {
        match controller.handle_tap(&mut scene, &session, *tap, script.viewport)? {
            Some(_) => report.dice_placed += 1,
            None => report.missed_taps += 1,
        }
    }

    for _ in 0..script.shakes {
        controller.handle_shake(&mut scene);
    }

    for die in controller.dice() {
        if let Some(node) = scene.node(*die) {
            report.rolls.extend(node.rolls.iter().copied());
        }
    }

    if script.remove_all {
        controller.remove_all(&mut scene);
    }
    report.dice_remaining = scene.attached_dice().len();

    controller.stop(&mut session);
    Ok(report)
}

/// Host side of the session: create and drop anchor nodes, forward the rest.
fn dispatch(
    controller: &mut SceneController<NodeId>,
    scene: &mut MemoryScene,
    session: &mut SimulatedSession,
    events: Vec<SessionEvent>,
    report: &mut HeadlessReport,
) -> Result<()> {
    for event in events {
        match event {
            SessionEvent::AnchorAdded(anchor) => {
                let node = scene.add_anchor_node(anchor.id, anchor.transform.translation);
                controller.on_node_added(scene, node, &anchor);
                if anchor.plane().is_some() {
                    report.planes_detected += 1;
                }
            }
            SessionEvent::AnchorRemoved(id) => {
                if let Some(node) = scene.anchor_node(id) {
                    scene.detach(node);
                }
            }
            SessionEvent::Failed(error) => {
                controller.handle_tracking_failure(&error);
                return Err(ArDiceError::Tracking(error));
            }
            SessionEvent::Interrupted => controller.handle_interruption(),
            SessionEvent::InterruptionEnded => {
                controller.on_interruption_ended(scene, session);
            }
        }

        if let Some(notice) = controller.notice() {
            if report.notices.last() != Some(notice) {
                report.notices.push(notice.clone());
            }
        }
    }
    Ok(())
}

//! Applies input commands through the scene controller

use bevy::prelude::*;

use crate::ar_dice::controller::SceneController;
use crate::ar_dice::scene::BevyScene;
use crate::ar_dice::tracking::ArSession;
use crate::ar_dice::types::ArCommand;

pub fn apply_ar_commands(
    mut ar_commands: MessageReader<ArCommand>,
    mut session: ResMut<ArSession>,
    mut controller: ResMut<SceneController>,
    mut scene: BevyScene,
) {
    for command in ar_commands.read() {
        match *command {
            ArCommand::Tap {
                screen_point,
                viewport,
            } => {
                if let Err(err) =
                    controller.handle_tap(&mut scene, &session.0, screen_point, viewport)
                {
                    warn!("Could not place die: {err}");
                }
            }
            ArCommand::Shake => {
                controller.handle_shake(&mut scene);
            }
            ArCommand::RollAgain => {
                controller.roll_all(&mut scene);
            }
            ArCommand::RemoveAll => {
                controller.remove_all(&mut scene);
            }
            ArCommand::StartSession => controller.start(&mut session.0),
            ArCommand::StopSession => controller.stop(&mut session.0),
        }
    }
}

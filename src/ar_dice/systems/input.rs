//! Input handling systems
//!
//! Taps (left click or touch) place dice, `S` stands in for the device shake
//! gesture, `Space` rolls again and `Delete`/`Backspace` removes every die.
//! Arrow keys and `+`/`-` move the simulated device; `I` toggles an
//! interruption and `F` makes the session fail.

use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::ar_dice::tracking::ArSession;
use crate::ar_dice::types::{ArCommand, ToolbarButton, TrackingError};

const ORBIT_DEGREES_PER_SEC: f32 = 60.0;
const ZOOM_UNITS_PER_SEC: f32 = 1.5;

pub fn handle_input(
    keyboard: Res<ButtonInput<KeyCode>>,
    mouse: Res<ButtonInput<MouseButton>>,
    touches: Res<Touches>,
    windows: Query<&Window, With<PrimaryWindow>>,
    buttons: Query<&Interaction, With<Button>>,
    mut ar_commands: MessageWriter<ArCommand>,
) {
    let Ok(window) = windows.single() else {
        return;
    };
    let viewport = window.size();

    // Clicks on the toolbar are not taps on the world
    let over_ui = buttons.iter().any(|i| *i != Interaction::None);

    if !over_ui && mouse.just_pressed(MouseButton::Left) {
        if let Some(screen_point) = window.cursor_position() {
            ar_commands.write(ArCommand::Tap {
                screen_point,
                viewport,
            });
        }
    }

    if !over_ui {
        if let Some(touch) = touches.iter_just_pressed().next() {
            ar_commands.write(ArCommand::Tap {
                screen_point: touch.position(),
                viewport,
            });
        }
    }

    if keyboard.just_pressed(KeyCode::KeyS) {
        ar_commands.write(ArCommand::Shake);
    }
    if keyboard.just_pressed(KeyCode::Space) {
        ar_commands.write(ArCommand::RollAgain);
    }
    if keyboard.just_pressed(KeyCode::Delete) || keyboard.just_pressed(KeyCode::Backspace) {
        ar_commands.write(ArCommand::RemoveAll);
    }
}

pub fn handle_toolbar_clicks(
    buttons: Query<(&Interaction, &ToolbarButton), Changed<Interaction>>,
    mut ar_commands: MessageWriter<ArCommand>,
) {
    for (interaction, button) in buttons.iter() {
        if *interaction != Interaction::Pressed {
            continue;
        }
        ar_commands.write(match button {
            ToolbarButton::RollAgain => ArCommand::RollAgain,
            ToolbarButton::RemoveAll => ArCommand::RemoveAll,
        });
    }
}

/// Move the simulated device and trigger session faults.
pub fn handle_device_controls(
    keyboard: Res<ButtonInput<KeyCode>>,
    time: Res<Time>,
    mut session: ResMut<ArSession>,
) {
    let dt = time.delta_secs();
    let mut yaw = 0.0;
    let mut pitch = 0.0;
    let mut distance = 0.0;

    if keyboard.pressed(KeyCode::ArrowLeft) {
        yaw -= ORBIT_DEGREES_PER_SEC * dt;
    }
    if keyboard.pressed(KeyCode::ArrowRight) {
        yaw += ORBIT_DEGREES_PER_SEC * dt;
    }
    if keyboard.pressed(KeyCode::ArrowUp) {
        pitch += ORBIT_DEGREES_PER_SEC * dt;
    }
    if keyboard.pressed(KeyCode::ArrowDown) {
        pitch -= ORBIT_DEGREES_PER_SEC * dt;
    }
    if keyboard.pressed(KeyCode::Equal) {
        distance -= ZOOM_UNITS_PER_SEC * dt;
    }
    if keyboard.pressed(KeyCode::Minus) {
        distance += ZOOM_UNITS_PER_SEC * dt;
    }

    if yaw != 0.0 || pitch != 0.0 || distance != 0.0 {
        session.0.orbit(yaw, pitch, distance);
    }

    if keyboard.just_pressed(KeyCode::KeyI) {
        session.0.toggle_interruption();
    }
    if keyboard.just_pressed(KeyCode::KeyF) {
        session.0.fail(TrackingError::WorldTrackingFailed {
            reason: "simulated sensor failure".to_string(),
        });
    }
}

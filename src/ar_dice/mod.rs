//! AR dice scene
//!
//! Detect horizontal planes, tap to place dice, and roll them on tap, shake
//! or command. `SceneController` holds the logic; `ArDicePlugin` wires it to
//! Bevy input, the simulated tracking session and the render scene.

pub mod controller;
pub mod headless;
pub mod scene;
pub mod systems;
pub mod tracking;
pub mod types;

pub use controller::*;
pub use headless::*;
pub use scene::*;
pub use systems::*;
pub use tracking::*;
pub use types::*;

use bevy::prelude::*;

pub struct ArDicePlugin {
    pub settings: ArDiceSettings,
}

impl Plugin for ArDicePlugin {
    fn build(&self, app: &mut App) {
        let settings = self.settings.clone();

        app.add_message::<ArCommand>()
            .insert_resource(ArSession(SimulatedSession::new(settings.session.clone())))
            .insert_resource(SceneController::<Entity>::from_settings(&settings))
            .insert_resource(settings)
            .add_systems(
                Startup,
                (load_scene_assets, setup, start_session).chain(),
            )
            .add_systems(
                Update,
                (
                    (
                        handle_input,
                        handle_toolbar_clicks,
                        handle_device_controls,
                        handle_window_focus,
                    ),
                    pump_session,
                    apply_ar_commands,
                    fit_scene_die_radius,
                    animate_rolls,
                    sync_camera_to_device,
                    expire_notices,
                    (
                        update_notice_text,
                        update_status_text,
                        update_toolbar_button_colors,
                    ),
                )
                    .chain(),
            );
    }
}

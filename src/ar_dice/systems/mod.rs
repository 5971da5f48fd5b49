//! Systems module for ar_dice
//!
//! - `setup`: camera, lighting, world root, backdrop and toolbar
//! - `input`: mouse, touch, keyboard and toolbar input mapped to `ArCommand`s
//! - `session`: session start/stop, event pump and camera sync
//! - `commands`: applies `ArCommand`s through the scene controller
//! - `animation`: plays roll animations
//! - `hud`: notice expiry, notice and status text

mod animation;
mod commands;
mod hud;
mod input;
mod session;
mod setup;

pub use animation::animate_rolls;
pub use commands::apply_ar_commands;
pub use hud::{
    expire_notices, update_notice_text, update_status_text, update_toolbar_button_colors,
};
pub use input::{handle_device_controls, handle_input, handle_toolbar_clicks};
pub use session::{handle_window_focus, pump_session, start_session, sync_camera_to_device};
pub use setup::setup;

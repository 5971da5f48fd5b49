//! Marker components and input messages

use bevy::prelude::*;

/// Marker for the camera that follows the tracked device
#[derive(Component)]
pub struct MainCamera;

/// Marker for the world-origin node dice are attached to
#[derive(Component)]
pub struct ArWorldRoot;

/// Toolbar buttons
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarButton {
    RollAgain,
    RemoveAll,
}

impl ToolbarButton {
    pub fn label(&self) -> &'static str {
        match self {
            ToolbarButton::RollAgain => "Roll Again",
            ToolbarButton::RemoveAll => "Remove All",
        }
    }
}

/// Marker for the text showing tracking notices
#[derive(Component)]
pub struct NoticeText;

/// Marker for the status line (session state, dice count)
#[derive(Component)]
pub struct StatusText;

/// Commands produced by input handling and consumed by the controller systems.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub enum ArCommand {
    Tap { screen_point: Vec2, viewport: Vec2 },
    Shake,
    RollAgain,
    RemoveAll,
    StartSession,
    StopSession,
}

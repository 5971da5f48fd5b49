//! Notice and status text

use bevy::prelude::*;

use crate::ar_dice::controller::SceneController;
use crate::ar_dice::tracking::ArSession;
use crate::ar_dice::types::{
    AnchorNode, NoticeSeverity, NoticeText, SessionState, StatusText, ToolbarButton,
};

pub const BUTTON_IDLE: Color = Color::srgba(0.1, 0.1, 0.12, 0.8);
pub const BUTTON_HOVERED: Color = Color::srgba(0.2, 0.2, 0.25, 0.9);
pub const BUTTON_PRESSED: Color = Color::srgba(0.3, 0.45, 0.8, 0.95);

/// Drop info notices once they have been on screen long enough.
pub fn expire_notices(time: Res<Time>, mut controller: ResMut<SceneController>) {
    if controller.notice().is_none() {
        return;
    }
    if controller
        .bypass_change_detection()
        .tick_notice(time.delta_secs())
    {
        controller.set_changed();
    }
}

pub fn update_notice_text(
    controller: Res<SceneController>,
    mut text_query: Query<(&mut Text, &mut TextColor), With<NoticeText>>,
) {
    if !controller.is_changed() {
        return;
    }

    for (mut text, mut color) in text_query.iter_mut() {
        match controller.notice() {
            Some(notice) => {
                text.0 = notice.message.clone();
                color.0 = match notice.severity {
                    NoticeSeverity::Info => Color::srgb(0.7, 0.9, 0.7),
                    NoticeSeverity::Warning => Color::srgb(1.0, 0.8, 0.3),
                    NoticeSeverity::Error => Color::srgb(1.0, 0.4, 0.4),
                };
            }
            None => text.0.clear(),
        }
    }
}

pub fn update_status_text(
    session: Res<ArSession>,
    controller: Res<SceneController>,
    anchors: Query<(), With<AnchorNode>>,
    mut text_query: Query<&mut Text, With<StatusText>>,
) {
    let state = match session.0.state() {
        SessionState::Stopped => "paused",
        SessionState::Running => "tracking",
        SessionState::Interrupted => "interrupted",
    };
    let status = format!(
        "Session: {}  Planes: {}  Dice: {}",
        state,
        anchors.iter().count(),
        controller.dice().len()
    );

    for mut text in text_query.iter_mut() {
        if text.0 != status {
            text.0 = status.clone();
        }
    }
}

pub fn update_toolbar_button_colors(
    mut buttons: Query<
        (&Interaction, &mut BackgroundColor),
        (Changed<Interaction>, With<ToolbarButton>),
    >,
) {
    for (interaction, mut background) in buttons.iter_mut() {
        background.0 = match interaction {
            Interaction::Pressed => BUTTON_PRESSED,
            Interaction::Hovered => BUTTON_HOVERED,
            Interaction::None => BUTTON_IDLE,
        };
    }
}

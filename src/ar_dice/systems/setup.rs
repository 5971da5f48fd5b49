//! Scene setup system
//!
//! Spawns the camera that follows the tracked device, default lighting, the
//! world root dice attach to, a dim backdrop standing in for the camera feed,
//! and the toolbar.

use bevy::prelude::*;

use crate::ar_dice::tracking::{ArSession, TrackingSession};
use crate::ar_dice::types::*;

use super::hud::BUTTON_IDLE;

const BACKDROP_SIZE: f32 = 8.0;

pub fn setup(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    session: Res<ArSession>,
    settings: Res<ArDiceSettings>,
) {
    commands.spawn((
        Camera3d::default(),
        Projection::from(PerspectiveProjection {
            fov: session.0.fov_y(),
            ..default()
        }),
        session.0.camera_transform(),
        AmbientLight {
            color: Color::WHITE,
            brightness: 400.0,
            ..default()
        },
        MainCamera,
    ));

    commands.spawn((
        DirectionalLight {
            illuminance: 8000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(2.0, 5.0, 3.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    commands.spawn((ArWorldRoot, Transform::default(), Visibility::default()));

    spawn_backdrop(&mut commands, &mut meshes, &mut materials, &settings);
    spawn_hud(&mut commands);
}

/// Floor and raised surfaces matching the scripted planes, so there is
/// something to aim at before any plane is detected.
fn spawn_backdrop(
    commands: &mut Commands,
    meshes: &mut ResMut<Assets<Mesh>>,
    materials: &mut ResMut<Assets<StandardMaterial>>,
    settings: &ArDiceSettings,
) {
    let floor_mat = materials.add(StandardMaterial {
        base_color: Color::srgb(0.22, 0.2, 0.18),
        perceptual_roughness: 0.9,
        ..default()
    });
    commands.spawn((
        Mesh3d(meshes.add(Cuboid::new(BACKDROP_SIZE, 0.02, BACKDROP_SIZE))),
        MeshMaterial3d(floor_mat),
        Transform::from_xyz(0.0, -0.012, 0.0),
    ));

    let surface_mat = materials.add(StandardMaterial {
        base_color: Color::srgb(0.45, 0.33, 0.22),
        perceptual_roughness: 0.7,
        ..default()
    });
    for plane in settings.session.planes.iter().filter(|p| p.center[1] > 0.0) {
        let [x, y, z] = plane.center;
        let [width, depth] = plane.extent;
        commands.spawn((
            Mesh3d(meshes.add(Cuboid::new(width, y, depth))),
            MeshMaterial3d(surface_mat.clone()),
            // Top face sits just below the plane so markers stay visible
            Transform::from_xyz(x, y / 2.0 - 0.002, z),
        ));
    }
}

fn spawn_hud(commands: &mut Commands) {
    commands.spawn((
        Text::new(""),
        TextFont {
            font_size: 16.0,
            ..default()
        },
        TextColor(Color::WHITE),
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(10.0),
            left: Val::Px(10.0),
            ..default()
        },
        StatusText,
    ));

    commands.spawn((
        Text::new(""),
        TextFont {
            font_size: 20.0,
            ..default()
        },
        TextColor(Color::WHITE),
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(36.0),
            left: Val::Px(10.0),
            ..default()
        },
        NoticeText,
    ));

    commands.spawn((
        Text::new(concat!(
            "Click a detected plane to place a die\n",
            "Space: roll  S: shake  Del: remove all\n",
            "Arrows/+/-: move device  I: interrupt  F: fail",
        )),
        TextFont {
            font_size: 14.0,
            ..default()
        },
        TextColor(Color::srgba(1.0, 1.0, 1.0, 0.7)),
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(10.0),
            right: Val::Px(10.0),
            ..default()
        },
    ));

    commands
        .spawn(Node {
            position_type: PositionType::Absolute,
            bottom: Val::Px(16.0),
            left: Val::Px(0.0),
            right: Val::Px(0.0),
            justify_content: JustifyContent::Center,
            column_gap: Val::Px(12.0),
            ..default()
        })
        .with_children(|bar| {
            for button in [ToolbarButton::RollAgain, ToolbarButton::RemoveAll] {
                bar.spawn((
                    Button,
                    button,
                    Node {
                        padding: UiRect::axes(Val::Px(16.0), Val::Px(8.0)),
                        ..default()
                    },
                    BackgroundColor(BUTTON_IDLE),
                ))
                .with_children(|label| {
                    label.spawn((
                        Text::new(button.label()),
                        TextFont {
                            font_size: 18.0,
                            ..default()
                        },
                        TextColor(Color::WHITE),
                    ));
                });
            }
        });
}

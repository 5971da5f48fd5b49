//! Bevy-backed scene graph
//!
//! Scene mutations are queued through `Commands`, so nodes created this frame
//! become visible to queries on the next command flush.

use bevy::asset::LoadState;
use bevy::ecs::system::SystemParam;
use bevy::math::Affine3A;
use bevy::mesh::VertexAttributeValues;
use bevy::prelude::*;

use super::SceneGraph;
use crate::ar_dice::types::{
    bounding_radius_of, die_face_uv_rect, face_value_for_normal, Anchor, AnchorNode, ArDiceError,
    ArDiceSettings, ArWorldRoot, Die, DieModelSource, PlaneMarker, PlaneMarkerSpec, RollAction,
    RollAnimation, SpawnedDie,
};

/// Relative difference between configured and measured radius worth a warning
const RADIUS_MISMATCH_TOLERANCE: f32 = 0.1;

/// Die model handles prepared at startup
#[derive(Resource, Clone)]
pub struct DieAssets {
    pub source: DieModelSource,
    pub scene: Option<Handle<Scene>>,
    pub mesh: Option<Handle<Mesh>>,
    pub material: Handle<StandardMaterial>,
}

/// Material shared by every detected-plane marker
#[derive(Resource, Clone)]
pub struct PlaneMarkerAssets {
    pub material: Handle<StandardMaterial>,
}

/// Set on scene dice once their radius has been measured from the model.
#[derive(Component)]
pub struct DieRadiusFitted;

/// Cube mesh whose faces each map to their pip cell of the face atlas.
pub fn build_die_mesh(size: f32) -> Mesh {
    let mut mesh = Mesh::from(Cuboid::from_length(size));

    let Some(VertexAttributeValues::Float32x3(normals)) =
        mesh.attribute(Mesh::ATTRIBUTE_NORMAL).cloned()
    else {
        return mesh;
    };

    if let Some(VertexAttributeValues::Float32x2(uvs)) = mesh.attribute_mut(Mesh::ATTRIBUTE_UV_0) {
        for (uv, normal) in uvs.iter_mut().zip(&normals) {
            let cell = die_face_uv_rect(face_value_for_normal(Vec3::from_array(*normal)));
            *uv = (cell.min + Vec2::from_array(*uv) * cell.size()).to_array();
        }
    }

    mesh
}

fn die_material(face_texture: Option<Handle<Image>>) -> StandardMaterial {
    StandardMaterial {
        // The atlas supplies the colors when present.
        base_color: if face_texture.is_some() {
            Color::WHITE
        } else {
            Color::srgb(0.93, 0.9, 0.84)
        },
        base_color_texture: face_texture,
        perceptual_roughness: 0.4,
        ..default()
    }
}

/// Load the die model and plane marker material named in the settings.
pub fn load_scene_assets(
    mut commands: Commands,
    settings: Res<ArDiceSettings>,
    asset_server: Res<AssetServer>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let (scene, mesh) = match &settings.die_model {
        DieModelSource::Scene { path, .. } => {
            let handle: Handle<Scene> = asset_server.load(path.clone());
            (Some(handle), None)
        }
        DieModelSource::Cube { size } => (None, Some(meshes.add(build_die_mesh(*size)))),
    };

    let face_texture: Option<Handle<Image>> = settings
        .die_face_texture
        .as_ref()
        .map(|path| asset_server.load(path.clone()));

    commands.insert_resource(DieAssets {
        source: settings.die_model.clone(),
        scene,
        mesh,
        material: materials.add(die_material(face_texture)),
    });

    let grid_texture: Option<Handle<Image>> = settings
        .grid_texture
        .as_ref()
        .map(|path| asset_server.load(path.clone()));

    let marker_material = materials.add(StandardMaterial {
        base_color: Color::srgba(0.35, 0.75, 1.0, 0.45),
        base_color_texture: grid_texture,
        alpha_mode: AlphaMode::Blend,
        unlit: true,
        double_sided: true,
        cull_mode: None,
        ..default()
    });
    commands.insert_resource(PlaneMarkerAssets {
        material: marker_material,
    });
}

/// Measure spawned scene dice from their meshes and rest them on the surface
/// with the measured radius instead of the configured one.
pub fn fit_scene_die_radius(
    mut commands: Commands,
    meshes: Res<Assets<Mesh>>,
    mut dice: Query<(Entity, &mut Die), (With<SceneRoot>, Without<DieRadiusFitted>)>,
    children: Query<&Children>,
    mesh_nodes: Query<&Mesh3d>,
    nodes: Query<(&Transform, Option<&ChildOf>)>,
) {
    for (entity, mut die) in dice.iter_mut() {
        let mut points = Vec::new();
        let mut pending = false;

        for descendant in children.iter_descendants(entity) {
            let Ok(mesh3d) = mesh_nodes.get(descendant) else {
                continue;
            };
            let (Some(mesh), Some(affine)) = (
                meshes.get(&mesh3d.0),
                affine_relative_to(entity, descendant, &nodes),
            ) else {
                pending = true;
                break;
            };
            if let Some(VertexAttributeValues::Float32x3(positions)) =
                mesh.attribute(Mesh::ATTRIBUTE_POSITION)
            {
                points.extend(
                    positions
                        .iter()
                        .map(|p| affine.transform_point3(Vec3::from_array(*p))),
                );
            }
        }

        if pending {
            continue;
        }
        let Some(measured) = bounding_radius_of(points) else {
            // Scene not instantiated yet
            continue;
        };

        let configured = die.bounding_radius;
        if (measured - configured).abs() > configured * RADIUS_MISMATCH_TOLERANCE {
            warn!("Die model radius is {measured:.3}, configured {configured:.3}; using the model");
        }

        let lift = measured - configured;
        die.bounding_radius = measured;
        commands
            .entity(entity)
            .insert(DieRadiusFitted)
            .entry::<Transform>()
            .and_modify(move |mut transform| transform.translation.y += lift);
    }
}

/// Transform of `entity` in the space of its ancestor `root`.
fn affine_relative_to(
    root: Entity,
    mut entity: Entity,
    nodes: &Query<(&Transform, Option<&ChildOf>)>,
) -> Option<Affine3A> {
    let mut affine = Affine3A::IDENTITY;
    while entity != root {
        let (transform, parent) = nodes.get(entity).ok()?;
        affine = transform.compute_affine() * affine;
        entity = parent?.parent();
    }
    Some(affine)
}

#[derive(SystemParam)]
pub struct BevyScene<'w, 's> {
    pub commands: Commands<'w, 's>,
    pub asset_server: Res<'w, AssetServer>,
    pub meshes: ResMut<'w, Assets<Mesh>>,
    pub die_assets: Res<'w, DieAssets>,
    pub marker_assets: Res<'w, PlaneMarkerAssets>,
    pub root: Query<'w, 's, Entity, With<ArWorldRoot>>,
}

impl BevyScene<'_, '_> {
    /// Host side: spawn the node that follows `anchor` under the world root.
    pub fn spawn_anchor_node(&mut self, anchor: &Anchor) -> Entity {
        let mut node = self.commands.spawn((
            AnchorNode { id: anchor.id },
            anchor.transform,
            Visibility::default(),
        ));
        if let Ok(root) = self.root.single() {
            node.insert(ChildOf(root));
        }
        node.id()
    }

    fn scene_handle(&self, model: &DieModelSource, path: &str) -> Handle<Scene> {
        match &self.die_assets.scene {
            Some(handle) if self.die_assets.source == *model => handle.clone(),
            _ => self.asset_server.load(path.to_string()),
        }
    }

    fn cube_mesh(&mut self, model: &DieModelSource, size: f32) -> Handle<Mesh> {
        match &self.die_assets.mesh {
            Some(handle) if self.die_assets.source == *model => handle.clone(),
            _ => self.meshes.add(build_die_mesh(size)),
        }
    }
}

impl SceneGraph for BevyScene<'_, '_> {
    type Node = Entity;

    fn instantiate_die(&mut self, model: &DieModelSource) -> crate::ar_dice::types::error::Result<SpawnedDie<Entity>> {
        let die = Die {
            bounding_radius: model.bounding_radius(),
        };

        let node = match model {
            DieModelSource::Scene { path, .. } => {
                let handle = self.scene_handle(model, path);
                if let LoadState::Failed(err) = self.asset_server.load_state(handle.id()) {
                    return Err(ArDiceError::asset_load(path.clone(), err.to_string()));
                }
                self.commands
                    .spawn((
                        die,
                        SceneRoot(handle),
                        Transform::default(),
                        Visibility::default(),
                    ))
                    .id()
            }
            DieModelSource::Cube { size } => {
                let mesh = self.cube_mesh(model, *size);
                self.commands
                    .spawn((
                        die,
                        Mesh3d(mesh),
                        MeshMaterial3d(self.die_assets.material.clone()),
                        Transform::default(),
                        Visibility::default(),
                    ))
                    .id()
            }
        };

        Ok(SpawnedDie {
            node,
            bounding_radius: die.bounding_radius,
        })
    }

    fn set_translation(&mut self, node: Entity, translation: Vec3) {
        self.commands
            .entity(node)
            .entry::<Transform>()
            .and_modify(move |mut transform| transform.translation = translation)
            .or_insert(Transform::from_translation(translation));
    }

    fn attach_to_root(&mut self, node: Entity) {
        let Ok(root) = self.root.single() else {
            warn!("No world root in the scene; die {node:?} left unattached");
            return;
        };
        self.commands.entity(node).insert(ChildOf(root));
    }

    fn spawn_plane_marker(&mut self, marker: &PlaneMarkerSpec) -> Entity {
        let mesh = self.meshes.add(Rectangle::new(marker.width, marker.height));
        self.commands
            .spawn((
                PlaneMarker {
                    width: marker.width,
                    height: marker.height,
                },
                Mesh3d(mesh),
                MeshMaterial3d(self.marker_assets.material.clone()),
                marker.transform(),
                Visibility::default(),
            ))
            .id()
    }

    fn attach_child(&mut self, parent: Entity, child: Entity) {
        self.commands.entity(child).insert(ChildOf(parent));
    }

    fn detach(&mut self, node: Entity) {
        self.commands.entity(node).despawn();
    }

    fn run_roll(&mut self, node: Entity, roll: RollAction) {
        self.commands
            .entity(node)
            .entry::<RollAnimation>()
            .and_modify(move |mut animation| animation.push(roll))
            .or_insert(RollAnimation::new(roll));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::system::RunSystemOnce;

    #[test]
    fn test_die_mesh_faces_use_their_atlas_cell() {
        let mesh = build_die_mesh(0.1);
        let Some(VertexAttributeValues::Float32x3(normals)) = mesh.attribute(Mesh::ATTRIBUTE_NORMAL)
        else {
            panic!("cube has normals");
        };
        let Some(VertexAttributeValues::Float32x2(uvs)) = mesh.attribute(Mesh::ATTRIBUTE_UV_0)
        else {
            panic!("cube has uvs");
        };

        let mut cells_seen = Vec::new();
        for (normal, uv) in normals.iter().zip(uvs) {
            let value = face_value_for_normal(Vec3::from_array(*normal));
            let cell = die_face_uv_rect(value);
            let uv = Vec2::from_array(*uv);
            assert!(uv.x >= cell.min.x - 1e-6 && uv.x <= cell.max.x + 1e-6);
            assert!(uv.y >= cell.min.y - 1e-6 && uv.y <= cell.max.y + 1e-6);
            if !cells_seen.contains(&value) {
                cells_seen.push(value);
            }
        }
        cells_seen.sort_unstable();
        assert_eq!(cells_seen, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_default_die_material_has_face_texture() {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, AssetPlugin::default()))
            .init_asset::<Mesh>()
            .init_asset::<StandardMaterial>()
            .init_asset::<Image>()
            .init_asset::<Scene>()
            .insert_resource(ArDiceSettings::default());

        app.world_mut()
            .run_system_once(load_scene_assets)
            .expect("asset loading system ran");

        let die_assets = app.world().resource::<DieAssets>().clone();
        let materials = app.world().resource::<Assets<StandardMaterial>>();
        let material = materials.get(&die_assets.material).expect("die material");
        assert!(material.base_color_texture.is_some());
        assert!(die_assets.mesh.is_some());
    }

    #[test]
    fn test_affine_relative_to_walks_parents() {
        let mut world = World::new();
        let root = world.spawn(Transform::from_xyz(5.0, 5.0, 5.0)).id();
        let mid = world
            .spawn((Transform::from_xyz(0.0, 1.0, 0.0), ChildOf(root)))
            .id();
        let leaf = world
            .spawn((Transform::from_scale(Vec3::splat(2.0)), ChildOf(mid)))
            .id();

        let affine = world
            .run_system_once(move |nodes: Query<(&Transform, Option<&ChildOf>)>| {
                affine_relative_to(root, leaf, &nodes)
            })
            .expect("system ran")
            .expect("leaf under root");
        let point = affine.transform_point3(Vec3::X);
        assert!((point - Vec3::new(2.0, 1.0, 0.0)).length() < 1e-6);
    }
}

//! Scene graph seam
//!
//! The controller only ever touches the scene through [`SceneGraph`]. The
//! Bevy implementation drives real entities; [`MemoryScene`] keeps a plain
//! node table for headless runs and tests.

mod bevy_scene;
mod memory;

pub use bevy_scene::*;
pub use memory::*;

use bevy::prelude::*;

use crate::ar_dice::types::error::Result;
use crate::ar_dice::types::{DieModelSource, PlaneMarkerSpec, RollAction, SpawnedDie};

pub trait SceneGraph {
    type Node: Copy + Eq + std::fmt::Debug;

    /// Create a die node from `model`, not yet attached to anything.
    fn instantiate_die(&mut self, model: &DieModelSource) -> Result<SpawnedDie<Self::Node>>;

    fn set_translation(&mut self, node: Self::Node, translation: Vec3);

    fn attach_to_root(&mut self, node: Self::Node);

    fn spawn_plane_marker(&mut self, marker: &PlaneMarkerSpec) -> Self::Node;

    fn attach_child(&mut self, parent: Self::Node, child: Self::Node);

    /// Remove `node` (and its children) from the scene.
    fn detach(&mut self, node: Self::Node);

    /// Schedule a rotate-by animation. Returns immediately.
    fn run_roll(&mut self, node: Self::Node, roll: RollAction);
}

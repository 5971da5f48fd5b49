//! In-memory scene graph

use bevy::prelude::*;

use super::SceneGraph;
use crate::ar_dice::types::error::Result;
use crate::ar_dice::types::{
    AnchorId, ArDiceError, DieModelSource, PlaneMarkerSpec, RollAction, SpawnedDie,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeKind {
    Root,
    Anchor(AnchorId),
    Die,
    PlaneMarker(PlaneMarkerSpec),
}

#[derive(Debug, Clone)]
pub struct MemoryNode {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub translation: Vec3,
    pub removed: bool,
    /// Every roll scheduled on this node, oldest first
    pub rolls: Vec<RollAction>,
}

impl MemoryNode {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            translation: Vec3::ZERO,
            removed: false,
            rolls: Vec::new(),
        }
    }
}

pub struct MemoryScene {
    nodes: Vec<MemoryNode>,
    asset_failure: Option<String>,
}

impl Default for MemoryScene {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryScene {
    pub fn new() -> Self {
        Self {
            nodes: vec![MemoryNode::new(NodeKind::Root)],
            asset_failure: None,
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Make every following die instantiation fail with `reason`.
    pub fn fail_asset_loads(&mut self, reason: impl Into<String>) {
        self.asset_failure = Some(reason.into());
    }

    /// Host side: create the node that follows an anchor.
    pub fn add_anchor_node(&mut self, anchor: AnchorId, translation: Vec3) -> NodeId {
        let id = self.push(NodeKind::Anchor(anchor));
        self.nodes[id.0].translation = translation;
        self.nodes[id.0].parent = Some(self.root());
        id
    }

    /// Host side: find the live node following `anchor`.
    pub fn anchor_node(&self, anchor: AnchorId) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|n| !n.removed && n.kind == NodeKind::Anchor(anchor))
            .map(NodeId)
    }

    pub fn node(&self, id: NodeId) -> Option<&MemoryNode> {
        self.nodes.get(id.0)
    }

    /// True if the node is live and its parent chain reaches the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            let Some(node) = self.nodes.get(current.0) else {
                return false;
            };
            if node.removed {
                return false;
            }
            if current == self.root() {
                return true;
            }
            match node.parent {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| !n.removed && n.parent == Some(id))
            .map(|(i, _)| NodeId(i))
            .collect()
    }

    /// Live dice attached under the root
    pub fn attached_dice(&self) -> Vec<NodeId> {
        (0..self.nodes.len())
            .map(NodeId)
            .filter(|id| self.nodes[id.0].kind == NodeKind::Die && self.is_attached(*id))
            .collect()
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(MemoryNode::new(kind));
        NodeId(self.nodes.len() - 1)
    }

    fn remove_subtree(&mut self, id: NodeId) {
        for child in self.children(id) {
            self.remove_subtree(child);
        }
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.removed = true;
            node.parent = None;
        }
    }
}

impl SceneGraph for MemoryScene {
    type Node = NodeId;

    fn instantiate_die(&mut self, model: &DieModelSource) -> Result<SpawnedDie<NodeId>> {
        if let Some(reason) = &self.asset_failure {
            return Err(ArDiceError::asset_load(model.label(), reason.clone()));
        }
        Ok(SpawnedDie {
            node: self.push(NodeKind::Die),
            bounding_radius: model.bounding_radius(),
        })
    }

    fn set_translation(&mut self, node: NodeId, translation: Vec3) {
        if let Some(n) = self.nodes.get_mut(node.0) {
            n.translation = translation;
        }
    }

    fn attach_to_root(&mut self, node: NodeId) {
        let root = self.root();
        self.attach_child(root, node);
    }

    fn spawn_plane_marker(&mut self, marker: &PlaneMarkerSpec) -> NodeId {
        let id = self.push(NodeKind::PlaneMarker(*marker));
        self.nodes[id.0].translation = marker.translation;
        id
    }

    fn attach_child(&mut self, parent: NodeId, child: NodeId) {
        if parent == child {
            return;
        }
        if let Some(n) = self.nodes.get_mut(child.0) {
            if !n.removed {
                n.parent = Some(parent);
            }
        }
    }

    fn detach(&mut self, node: NodeId) {
        if node == self.root() {
            return;
        }
        self.remove_subtree(node);
    }

    fn run_roll(&mut self, node: NodeId, roll: RollAction) {
        if let Some(n) = self.nodes.get_mut(node.0) {
            n.rolls.push(roll);
        }
    }
}

//! Scene graph
//!
//! A tree of nodes stored in a `SlotMap`. Every node except the root has a
//! parent; children keep insertion order, which is also traversal order.
//! Node kinds are a tagged union resolved once per node during traversal.

use std::collections::HashMap;
use std::sync::Arc;

use slotmap::{new_key_type, SlotMap};

use super::environment::GroundProjectedSkybox;
use crate::foundation::math::{Mat4, Transform};
use crate::render::material::{Material, StandardMaterial};
use crate::render::mesh::Mesh;

new_key_type! {
    /// Handle to a node in a [`SceneGraph`]
    pub struct NodeId;
}

/// Scene graph errors
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    /// The handle does not refer to a live node
    #[error("Unknown scene node {0:?}")]
    UnknownNode(NodeId),

    /// The root node lives as long as the graph
    #[error("The scene root cannot be removed")]
    CannotRemoveRoot,
}

/// Renderable mesh: shared geometry plus its own material
#[derive(Debug, Clone)]
pub struct MeshNode {
    /// Geometry, shared between nodes that draw the same primitive
    pub geometry: Arc<Mesh>,
    /// Material owned by this node
    pub material: Material,
}

/// What a node is
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Pure transform node
    Group,
    /// Renderable mesh
    Mesh(MeshNode),
    /// Environment projected onto a ground disc and dome
    Skybox(GroundProjectedSkybox),
}

impl NodeKind {
    /// Standard material of a mesh node, if it has one
    pub fn standard_material_mut(&mut self) -> Option<&mut StandardMaterial> {
        match self {
            Self::Mesh(mesh) => mesh.material.as_standard_mut(),
            Self::Group | Self::Skybox(_) => None,
        }
    }
}

/// Scene node
#[derive(Debug, Clone)]
pub struct Node {
    /// Debug name
    pub name: String,
    /// Transform relative to the parent
    pub transform: Transform,
    /// Hidden nodes hide their whole subtree
    pub visible: bool,
    /// Node payload
    pub kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    /// Create a detached node
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            transform: Transform::identity(),
            visible: true,
            kind,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Create a group node
    pub fn group(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Group)
    }

    /// Create a mesh node
    pub fn mesh(name: impl Into<String>, geometry: Arc<Mesh>, material: Material) -> Self {
        Self::new(name, NodeKind::Mesh(MeshNode { geometry, material }))
    }

    /// Builder: set the local transform
    #[must_use]
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Parent node, `None` for the root
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in insertion order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Tree of scene nodes with a permanent root
#[derive(Debug, Clone)]
pub struct SceneGraph {
    nodes: SlotMap<NodeId, Node>,
    root: NodeId,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new("Scene")
    }
}

impl SceneGraph {
    /// Create a graph holding only a root group
    pub fn new(root_name: impl Into<String>) -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(Node::group(root_name));
        Self { nodes, root }
    }

    /// Root node
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes, root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph holds nothing but its root
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Node by handle
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Mutable node by handle. Structure (parent and children) stays read-only.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    /// Whether `id` refers to a live node
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Add a detached node under `parent`
    pub fn add(&mut self, parent: NodeId, mut node: Node) -> Result<NodeId, SceneError> {
        if !self.nodes.contains_key(parent) {
            return Err(SceneError::UnknownNode(parent));
        }

        node.parent = Some(parent);
        node.children.clear();
        let id = self.nodes.insert(node);
        self.nodes[parent].children.push(id);
        Ok(id)
    }

    /// Add a detached node under the root
    pub fn add_to_root(&mut self, mut node: Node) -> NodeId {
        let root = self.root;
        node.parent = Some(root);
        node.children.clear();
        let id = self.nodes.insert(node);
        self.nodes[root].children.push(id);
        id
    }

    /// Move another graph under `parent`. Its root becomes a child of
    /// `parent`; the returned handle is that node's new id.
    pub fn attach(&mut self, parent: NodeId, mut other: SceneGraph) -> Result<NodeId, SceneError> {
        if !self.nodes.contains_key(parent) {
            return Err(SceneError::UnknownNode(parent));
        }

        let order = other.descendants(other.root);
        let mut remap: HashMap<NodeId, NodeId> = HashMap::with_capacity(order.len());

        // Pre-order guarantees every parent is remapped before its children
        for old_id in order {
            let Some(mut node) = other.nodes.remove(old_id) else {
                continue;
            };
            let new_parent = node
                .parent
                .and_then(|p| remap.get(&p).copied())
                .unwrap_or(parent);

            node.parent = Some(new_parent);
            node.children.clear();
            let new_id = self.nodes.insert(node);
            self.nodes[new_parent].children.push(new_id);
            remap.insert(old_id, new_id);
        }

        remap
            .get(&other.root)
            .copied()
            .ok_or(SceneError::UnknownNode(other.root))
    }

    /// Remove a node and its whole subtree. Returns how many nodes were removed.
    pub fn remove(&mut self, id: NodeId) -> Result<usize, SceneError> {
        if id == self.root {
            return Err(SceneError::CannotRemoveRoot);
        }
        let parent = self
            .nodes
            .get(id)
            .ok_or(SceneError::UnknownNode(id))?
            .parent;

        if let Some(parent) = parent.and_then(|p| self.nodes.get_mut(p)) {
            parent.children.retain(|child| *child != id);
        }

        let subtree = self.descendants(id);
        for node in &subtree {
            self.nodes.remove(*node);
        }
        Ok(subtree.len())
    }

    /// `id` and everything below it, in pre-order
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get(current) {
                order.push(current);
                stack.extend(node.children.iter().rev());
            }
        }
        order
    }

    /// Visit every node in pre-order, starting at the root
    pub fn traverse<F>(&self, mut visit: F)
    where
        F: FnMut(NodeId, &Node),
    {
        for id in self.descendants(self.root) {
            if let Some(node) = self.nodes.get(id) {
                visit(id, node);
            }
        }
    }

    /// Visit every node mutably in pre-order, starting at the root
    pub fn traverse_mut<F>(&mut self, mut visit: F)
    where
        F: FnMut(NodeId, &mut Node),
    {
        for id in self.descendants(self.root) {
            if let Some(node) = self.nodes.get_mut(id) {
                visit(id, node);
            }
        }
    }

    /// Local-to-world matrix: the product of every transform from the root down
    pub fn world_matrix(&self, id: NodeId) -> Result<Mat4, SceneError> {
        let mut node = self.nodes.get(id).ok_or(SceneError::UnknownNode(id))?;
        let mut matrix = node.transform.to_matrix();
        while let Some(parent) = node.parent.and_then(|p| self.nodes.get(p)) {
            matrix = parent.transform.to_matrix() * matrix;
            node = parent;
        }
        Ok(matrix)
    }

    /// Whether the node and all its ancestors are visible
    pub fn is_visible_in_tree(&self, id: NodeId) -> bool {
        let mut current = self.nodes.get(id);
        while let Some(node) = current {
            if !node.visible {
                return false;
            }
            current = node.parent.and_then(|p| self.nodes.get(p));
        }
        true
    }

    /// First node with the given name, in pre-order
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|id| self.nodes.get(*id).is_some_and(|node| node.name == name))
    }
}

use crate::geometry::BufferGeometry;
use crate::light::{HemisphereLight, PointLight};
use crate::material::{Material, PointsMaterial};
use glam::{Mat4, Quat, Vec3};
use lumen_common::{Color, NodeId, Plane, Transform, look_rotation};
use std::collections::BTreeMap;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("node not found: {0:?}")]
    NodeNotFound(NodeId),
    #[error("attaching {child:?} under {parent:?} would create a cycle")]
    Cycle { parent: NodeId, child: NodeId },
    #[error("the root node cannot be moved or removed")]
    RootNode,
    #[error("a {width_segments}x{height_segments} segment grid has more vertices than u32 indices can address")]
    GridTooLarge {
        width_segments: u32,
        height_segments: u32,
    },
}

/// What a node contributes to the rendered image.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Pure transform container.
    Group,
    PointLight(PointLight),
    HemisphereLight(HemisphereLight),
    Points {
        geometry: BufferGeometry,
        material: PointsMaterial,
    },
    LineSegments {
        geometry: BufferGeometry,
        material: Material,
    },
    Mesh {
        geometry: BufferGeometry,
        material: Material,
    },
    /// Debug visual for a plane.
    PlaneHelper { plane: Plane, size: f32, color: Color },
}

impl NodeKind {
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Group => "group",
            NodeKind::PointLight(_) => "point-light",
            NodeKind::HemisphereLight(_) => "hemisphere-light",
            NodeKind::Points { .. } => "points",
            NodeKind::LineSegments { .. } => "line-segments",
            NodeKind::Mesh { .. } => "mesh",
            NodeKind::PlaneHelper { .. } => "plane-helper",
        }
    }

    pub fn is_light(&self) -> bool {
        matches!(self, NodeKind::PointLight(_) | NodeKind::HemisphereLight(_))
    }
}

/// A single object in the graph.
///
/// Parent and child links are owned by the [`SceneGraph`]; only the graph
/// mutates them so the tree stays consistent.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub name: Option<String>,
    pub kind: NodeKind,
    pub transform: Transform,
    pub visible: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            name: None,
            kind,
            transform: Transform::default(),
            visible: true,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn group() -> Self {
        Self::new(NodeKind::Group)
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.transform.position = position;
        self
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.transform.rotation = rotation;
        self
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Tree of renderable nodes under a single root group.
///
/// Nodes may exist detached (no parent) until attached; only nodes reachable
/// from the root are drawn. Children keep insertion order.
#[derive(Debug, Clone)]
pub struct SceneGraph {
    nodes: BTreeMap<NodeId, Node>,
    root: NodeId,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    pub fn new() -> Self {
        let root = NodeId::new();
        let mut nodes = BTreeMap::new();
        nodes.insert(root, Node::group().named("scene"));
        Self { nodes, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Total node count, root and detached nodes included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when nothing hangs off the root.
    pub fn is_empty(&self) -> bool {
        self.nodes
            .get(&self.root)
            .is_none_or(|root| root.children.is_empty())
    }

    /// Insert a detached node. Returns its id.
    pub fn create(&mut self, mut node: Node) -> NodeId {
        let id = NodeId::new();
        node.parent = None;
        node.children.clear();
        self.nodes.insert(id, node);
        id
    }

    /// Insert a node directly under `parent`.
    pub fn add(&mut self, parent: NodeId, node: Node) -> Result<NodeId, GraphError> {
        if !self.nodes.contains_key(&parent) {
            return Err(GraphError::NodeNotFound(parent));
        }
        let id = self.create(node);
        self.attach(parent, id)?;
        Ok(id)
    }

    /// Move `child` (and its subtree) under `parent`, detaching it from any
    /// previous parent first.
    pub fn attach(&mut self, parent: NodeId, child: NodeId) -> Result<(), GraphError> {
        if child == self.root {
            return Err(GraphError::RootNode);
        }
        if !self.nodes.contains_key(&parent) {
            return Err(GraphError::NodeNotFound(parent));
        }
        if !self.nodes.contains_key(&child) {
            return Err(GraphError::NodeNotFound(child));
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(GraphError::Cycle { parent, child });
        }

        self.unlink(child);
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.push(child);
        }
        Ok(())
    }

    /// Cut `id` loose from its parent. The subtree stays in the graph.
    pub fn detach(&mut self, id: NodeId) -> Result<(), GraphError> {
        if id == self.root {
            return Err(GraphError::RootNode);
        }
        if !self.nodes.contains_key(&id) {
            return Err(GraphError::NodeNotFound(id));
        }
        self.unlink(id);
        Ok(())
    }

    /// Delete `id` and every descendant. Returns how many nodes were removed.
    pub fn remove(&mut self, id: NodeId) -> Result<usize, GraphError> {
        if id == self.root {
            return Err(GraphError::RootNode);
        }
        if !self.nodes.contains_key(&id) {
            return Err(GraphError::NodeNotFound(id));
        }
        self.unlink(id);
        let doomed = self.subtree(id);
        for node in &doomed {
            self.nodes.remove(node);
        }
        tracing::trace!(node = %id.short(), removed = doomed.len(), "removed subtree");
        Ok(doomed.len())
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(&id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// `id` followed by all of its descendants, depth-first pre-order.
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            let Some(node) = self.nodes.get(&next) else {
                continue;
            };
            out.push(next);
            stack.extend(node.children.iter().rev());
        }
        out
    }

    /// First node carrying `name`, searching from the root.
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.subtree(self.root)
            .into_iter()
            .find(|id| self.nodes[id].name.as_deref() == Some(name))
    }

    /// Local-to-world matrix, composed from the root down.
    pub fn world_matrix(&self, id: NodeId) -> Mat4 {
        let mut matrix = Mat4::IDENTITY;
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let Some(node) = self.nodes.get(&current) else {
                break;
            };
            matrix = node.transform.matrix() * matrix;
            cursor = node.parent;
        }
        matrix
    }

    pub fn world_position(&self, id: NodeId) -> Vec3 {
        self.world_matrix(id).w_axis.truncate()
    }

    /// Rotate `id` so its +Z axis faces `target` (world space).
    pub fn look_at(&mut self, id: NodeId, target: Vec3) -> Result<(), GraphError> {
        if !self.nodes.contains_key(&id) {
            return Err(GraphError::NodeNotFound(id));
        }
        let position = self.world_position(id);
        let world_rotation = look_rotation(position, target);
        let parent_rotation = match self.parent(id) {
            Some(parent) => {
                let (_, rotation, _) = self.world_matrix(parent).to_scale_rotation_translation();
                rotation
            }
            None => Quat::IDENTITY,
        };
        if let Some(node) = self.nodes.get_mut(&id) {
            node.transform.rotation = (parent_rotation.inverse() * world_rotation).normalize();
        }
        Ok(())
    }

    fn unlink(&mut self, id: NodeId) {
        let Some(parent) = self.nodes.get_mut(&id).and_then(|n| n.parent.take()) else {
            return;
        };
        if let Some(parent) = self.nodes.get_mut(&parent) {
            parent.children.retain(|c| *c != id);
        }
    }

    fn is_ancestor_or_self(&self, ancestor: NodeId, mut id: NodeId) -> bool {
        loop {
            if id == ancestor {
                return true;
            }
            match self.parent(id) {
                Some(parent) => id = parent,
                None => return false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_graph_is_empty() {
        let graph = SceneGraph::new();
        assert!(graph.is_empty());
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.get(graph.root()).unwrap().name.as_deref(), Some("scene"));
    }

    #[test]
    fn add_and_attach() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let group = graph.add(root, Node::group()).unwrap();
        let child = graph.create(Node::group().named("child"));
        assert_eq!(graph.parent(child), None);

        graph.attach(group, child).unwrap();
        assert_eq!(graph.parent(child), Some(group));
        assert_eq!(graph.children(group), &[child]);
        assert_eq!(graph.find_by_name("child"), Some(child));
        assert!(!graph.is_empty());
    }

    #[test]
    fn reattach_moves_between_parents() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let a = graph.add(root, Node::group()).unwrap();
        let b = graph.add(root, Node::group()).unwrap();
        let child = graph.add(a, Node::group()).unwrap();

        graph.attach(b, child).unwrap();
        assert!(graph.children(a).is_empty());
        assert_eq!(graph.children(b), &[child]);
    }

    #[test]
    fn cycles_are_rejected() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let a = graph.add(root, Node::group()).unwrap();
        let b = graph.add(a, Node::group()).unwrap();
        assert_eq!(
            graph.attach(b, a),
            Err(GraphError::Cycle { parent: b, child: a })
        );
        assert_eq!(graph.attach(a, a), Err(GraphError::Cycle { parent: a, child: a }));
        assert_eq!(graph.attach(a, root), Err(GraphError::RootNode));
    }

    #[test]
    fn remove_takes_subtree() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let a = graph.add(root, Node::group()).unwrap();
        let b = graph.add(a, Node::group()).unwrap();
        graph.add(b, Node::group()).unwrap();

        assert_eq!(graph.remove(a).unwrap(), 3);
        assert!(!graph.contains(b));
        assert!(graph.is_empty());
        assert_eq!(graph.remove(root), Err(GraphError::RootNode));
        assert_eq!(graph.remove(a), Err(GraphError::NodeNotFound(a)));
    }

    #[test]
    fn subtree_is_pre_order() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let a = graph.add(root, Node::group()).unwrap();
        let a1 = graph.add(a, Node::group()).unwrap();
        let b = graph.add(root, Node::group()).unwrap();
        assert_eq!(graph.subtree(root), vec![root, a, a1, b]);
    }

    #[test]
    fn world_position_composes_parents() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let parent = graph
            .add(root, Node::group().with_position(Vec3::new(1.0, 0.0, 0.0)))
            .unwrap();
        let child = graph
            .add(parent, Node::group().with_position(Vec3::new(0.0, 2.0, 0.0)))
            .unwrap();
        assert!((graph.world_position(child) - Vec3::new(1.0, 2.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn look_at_points_z_in_world_space() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let parent = graph
            .add(
                root,
                Node::group().with_rotation(Quat::from_rotation_y(std::f32::consts::FRAC_PI_2)),
            )
            .unwrap();
        let child = graph.add(parent, Node::group()).unwrap();

        graph.look_at(child, Vec3::new(0.0, 0.0, 4.0)).unwrap();
        let (_, rotation, _) = graph.world_matrix(child).to_scale_rotation_translation();
        assert!((rotation * Vec3::Z - Vec3::Z).length() < 1e-4);
    }

    #[test]
    fn detach_keeps_subtree() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let a = graph.add(root, Node::group()).unwrap();
        let b = graph.add(a, Node::group()).unwrap();
        graph.detach(a).unwrap();
        assert!(graph.is_empty());
        assert_eq!(graph.parent(b), Some(a));
        assert_eq!(graph.len(), 3);
    }
}

use lumen_behaviour::{Behaviour, InteractiveScene};
use lumen_common::NodeId;
use lumen_graph::{NodeKind, SceneGraph};
use serde::Serialize;

/// Scene inspector for developer tooling.
///
/// Provides read-only queries against a scene for debugging and the CLI.
pub struct SceneInspector;

impl SceneInspector {
    /// Produce a summary of the scene state.
    pub fn summary(scene: &InteractiveScene) -> SceneSummary {
        let graph = scene.handle().graph();
        let reachable = graph.subtree(graph.root());
        let mut vertex_count = 0;
        let mut light_count = 0;
        for node in reachable.iter().filter_map(|id| graph.get(*id)) {
            vertex_count += vertices(&node.kind);
            light_count += usize::from(node.kind.is_light());
        }

        let summary = SceneSummary {
            name: scene.name().to_string(),
            camera: scene.handle().current_camera_key(),
            objects: Self::list_objects(scene),
            node_count: reachable.len(),
            vertex_count,
            light_count,
        };
        tracing::debug!(
            scene = %summary.name,
            nodes = summary.node_count,
            vertices = summary.vertex_count,
            lights = summary.light_count,
            "scene summarized"
        );
        summary
    }

    /// Describe one node of `graph`.
    pub fn inspect_node(graph: &SceneGraph, id: NodeId) -> Option<NodeInfo> {
        graph.get(id).map(|node| {
            let t = node.transform;
            NodeInfo {
                id,
                name: node.name.clone(),
                kind: node.kind.label(),
                position: t.position.to_array(),
                rotation: t.rotation.to_array(),
                scale: t.scale.to_array(),
                visible: node.visible,
                children: graph.children(id).len(),
            }
        })
    }

    /// Started scene objects with their component keys, in declaration order.
    pub fn list_objects(scene: &InteractiveScene) -> Vec<ObjectSummary> {
        scene
            .core()
            .instances()
            .iter()
            .map(|object| ObjectSummary {
                name: object.name().to_string(),
                components: object.component_keys(),
                group: object.export_object_group(),
            })
            .collect()
    }
}

fn vertices(kind: &NodeKind) -> usize {
    match kind {
        NodeKind::Points { geometry, .. }
        | NodeKind::LineSegments { geometry, .. }
        | NodeKind::Mesh { geometry, .. } => geometry.vertex_count(),
        _ => 0,
    }
}

/// Summary of scene state for the inspector.
#[derive(Debug, Clone, Serialize)]
pub struct SceneSummary {
    pub name: String,
    pub camera: Option<String>,
    pub objects: Vec<ObjectSummary>,
    /// Nodes reachable from the root, root included.
    pub node_count: usize,
    pub vertex_count: usize,
    pub light_count: usize,
}

impl SceneSummary {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl std::fmt::Display for SceneSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Scene: {} camera={} nodes={} vertices={} lights={}",
            self.name,
            self.camera.as_deref().unwrap_or("-"),
            self.node_count,
            self.vertex_count,
            self.light_count
        )?;
        for object in &self.objects {
            writeln!(f, "  {object}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ObjectSummary {
    pub name: String,
    pub components: Vec<String>,
    pub group: Option<NodeId>,
}

impl std::fmt::Display for ObjectSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}]", self.name, self.components.join(", "))
    }
}

/// Detailed info about a single node.
#[derive(Debug, Clone, Serialize)]
pub struct NodeInfo {
    pub id: NodeId,
    pub name: Option<String>,
    pub kind: &'static str,
    pub position: [f32; 3],
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
    pub visible: bool,
    pub children: usize,
}

impl std::fmt::Display for NodeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Node [{}] {} \"{}\" pos=({:.2}, {:.2}, {:.2}) scale=({:.2}, {:.2}, {:.2}) children={}",
            self.id.short(),
            self.kind,
            self.name.as_deref().unwrap_or(""),
            self.position[0],
            self.position[1],
            self.position[2],
            self.scale[0],
            self.scale[1],
            self.scale[2],
            self.children,
        )
    }
}

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use lumen_common::NodeId;
use lumen_graph::{BufferGeometry, NodeKind, SceneGraph};

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct ColorVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

impl ColorVertex {
    fn new(position: Vec3, color: [f32; 3]) -> Self {
        Self {
            position: position.to_array(),
            color: [color[0], color[1], color[2], 1.0],
        }
    }
}

/// One frame's worth of drawable vertices in world space.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FrameGeometry {
    pub points: Vec<ColorVertex>,
    /// Line-list pairs.
    pub lines: Vec<ColorVertex>,
}

impl FrameGeometry {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty() && self.lines.is_empty()
    }
}

/// Collect every visible drawable reachable from the root.
///
/// Meshes are drawn as the edges of their triangles. Lights and helpers
/// contribute nothing.
pub fn flatten(graph: &SceneGraph) -> FrameGeometry {
    let mut frame = FrameGeometry::default();
    visit(graph, graph.root(), Mat4::IDENTITY, &mut frame);
    frame
}

fn visit(graph: &SceneGraph, id: NodeId, parent: Mat4, frame: &mut FrameGeometry) {
    let Some(node) = graph.get(id) else {
        return;
    };
    if !node.visible {
        return;
    }
    let world = parent * node.transform.matrix();

    match &node.kind {
        NodeKind::Points { geometry, material } => {
            let fallback = material.color.to_array();
            for (i, p) in geometry.positions.iter().enumerate() {
                let color = match (&geometry.colors, material.vertex_colors) {
                    (Some(colors), true) => colors.get(i).copied().unwrap_or(fallback),
                    _ => fallback,
                };
                frame
                    .points
                    .push(ColorVertex::new(world.transform_point3(Vec3::from(*p)), color));
            }
        }
        NodeKind::LineSegments { geometry, material } => {
            let color = material.display_color().to_array();
            push_lines(geometry, world, color, line_pairs(geometry), &mut frame.lines);
        }
        NodeKind::Mesh { geometry, material } => {
            let color = material.display_color().to_array();
            push_lines(geometry, world, color, triangle_edges(geometry), &mut frame.lines);
        }
        _ => {}
    }

    for child in graph.children(id) {
        visit(graph, *child, world, frame);
    }
}

fn push_lines(
    geometry: &BufferGeometry,
    world: Mat4,
    color: [f32; 3],
    pairs: Vec<(u32, u32)>,
    out: &mut Vec<ColorVertex>,
) {
    let at = |i: u32| {
        geometry
            .positions
            .get(i as usize)
            .map(|p| world.transform_point3(Vec3::from(*p)))
    };
    for (a, b) in pairs {
        if let (Some(a), Some(b)) = (at(a), at(b)) {
            out.push(ColorVertex::new(a, color));
            out.push(ColorVertex::new(b, color));
        }
    }
}

/// Index pairs of a line list; unindexed geometry pairs consecutive vertices.
fn line_pairs(geometry: &BufferGeometry) -> Vec<(u32, u32)> {
    match &geometry.indices {
        Some(indices) => indices.chunks_exact(2).map(|c| (c[0], c[1])).collect(),
        None => (0..geometry.vertex_count() as u32 / 2)
            .map(|i| (2 * i, 2 * i + 1))
            .collect(),
    }
}

fn triangle_edges(geometry: &BufferGeometry) -> Vec<(u32, u32)> {
    let triangles: Vec<[u32; 3]> = match &geometry.indices {
        Some(indices) => indices.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect(),
        None => (0..geometry.vertex_count() as u32 / 3)
            .map(|i| [3 * i, 3 * i + 1, 3 * i + 2])
            .collect(),
    };
    triangles
        .into_iter()
        .flat_map(|[a, b, c]| [(a, b), (b, c), (c, a)])
        .collect()
}

/// Clear color for a frame.
pub(crate) fn clear_color(alpha: bool) -> wgpu::Color {
    if alpha {
        wgpu::Color::TRANSPARENT
    } else {
        wgpu::Color::BLACK
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_common::Color;
    use lumen_graph::{Material, Node, PlaneGeometry, PointsMaterial};

    #[test]
    fn empty_graph_flattens_to_nothing() {
        assert!(flatten(&SceneGraph::new()).is_empty());
    }

    #[test]
    fn points_use_vertex_colors_and_world_transform() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let group = graph
            .add(root, Node::group().with_position(Vec3::new(0.0, 5.0, 0.0)))
            .unwrap();
        let geometry =
            BufferGeometry::new(vec![[1.0, 0.0, 0.0]]).with_colors(vec![[1.0, 0.0, 0.0]]);
        graph
            .add(
                group,
                Node::new(NodeKind::Points {
                    geometry,
                    material: PointsMaterial {
                        vertex_colors: true,
                        ..PointsMaterial::default()
                    },
                }),
            )
            .unwrap();

        let frame = flatten(&graph);
        assert_eq!(frame.points.len(), 1);
        assert_eq!(frame.points[0].position, [1.0, 5.0, 0.0]);
        assert_eq!(frame.points[0].color, [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn line_grid_expands_to_index_pairs() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let plane = PlaneGeometry::new(1.0, 1.0, 1, 1);
        graph
            .add(
                root,
                Node::new(NodeKind::LineSegments {
                    geometry: plane.to_line_grid().unwrap(),
                    material: Material::Basic { color: Color::WHITE },
                }),
            )
            .unwrap();
        let frame = flatten(&graph);
        // [0,1,0,2,1,3,2,3] is four segments.
        assert_eq!(frame.lines.len(), 8);
    }

    #[test]
    fn hidden_subtrees_and_detached_nodes_are_skipped() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let mut hidden = Node::group();
        hidden.visible = false;
        let hidden = graph.add(root, hidden).unwrap();
        let cube = || {
            Node::new(NodeKind::Mesh {
                geometry: BufferGeometry::cuboid(1.0, 1.0, 1.0),
                material: Material::Normal,
            })
        };
        graph.add(hidden, cube()).unwrap();
        graph.create(cube());
        assert!(flatten(&graph).is_empty());

        graph.add(root, cube()).unwrap();
        // 12 triangles, 3 edges each, 2 vertices per edge.
        assert_eq!(flatten(&graph).lines.len(), 72);
    }

    #[test]
    fn alpha_clears_transparent() {
        assert_eq!(clear_color(true).a, 0.0);
        assert_eq!(clear_color(false).a, 1.0);
    }
}

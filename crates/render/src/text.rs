use crate::backend::{RenderBackend, RenderError, RendererOptions};
use crate::camera::PerspectiveCamera;
use lumen_common::{NodeId, Size};
use lumen_graph::{NodeKind, SceneGraph};
use std::cell::RefCell;
use std::fmt::Write;
use std::rc::Rc;

/// Shared frame log a [`TextRenderer`] writes into.
///
/// Clones share the same log, so the host keeps one clone to read frames back.
#[derive(Debug, Clone, Default)]
pub struct TextSurface(Rc<RefCell<Vec<String>>>);

impl TextSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frame_count(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn last_frame(&self) -> Option<String> {
        self.0.borrow().last().cloned()
    }

    pub fn take_frames(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.borrow_mut())
    }

    fn push(&self, frame: String) {
        self.0.borrow_mut().push(frame);
    }
}

/// Headless backend producing a human-readable dump per draw.
#[derive(Debug)]
pub struct TextRenderer {
    surface: TextSurface,
    size: Size,
    antialias: bool,
    alpha: bool,
    disposed: bool,
}

impl TextRenderer {
    pub fn surface(&self) -> &TextSurface {
        &self.surface
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Format one frame without recording it.
    pub fn describe(&self, graph: &SceneGraph, camera: &PerspectiveCamera) -> String {
        let mut out = String::new();
        let p = camera.position;
        let f = camera.forward();
        let _ = writeln!(
            out,
            "=== Frame {} (size={}, aa={}, alpha={}) ===",
            self.surface.frame_count() + 1,
            self.size,
            self.antialias,
            self.alpha
        );
        let _ = writeln!(
            out,
            "Camera: pos=({:.2}, {:.2}, {:.2}) forward=({:.2}, {:.2}, {:.2}) fov={:.0}",
            p.x, p.y, p.z, f.x, f.y, f.z, camera.fov_degrees
        );

        let mut visible = 0;
        let mut vertices = 0;
        write_node(graph, graph.root(), 0, &mut out, &mut visible, &mut vertices);
        let _ = writeln!(out, "Nodes: {visible} visible, {vertices} vertices");
        out
    }
}

fn write_node(
    graph: &SceneGraph,
    id: NodeId,
    depth: usize,
    out: &mut String,
    visible: &mut usize,
    vertices: &mut usize,
) {
    let Some(node) = graph.get(id) else {
        return;
    };
    if !node.visible {
        return;
    }
    *visible += 1;
    let count = match &node.kind {
        NodeKind::Points { geometry, .. }
        | NodeKind::LineSegments { geometry, .. }
        | NodeKind::Mesh { geometry, .. } => geometry.vertex_count(),
        _ => 0,
    };
    *vertices += count;

    let p = graph.world_position(id);
    let _ = write!(
        out,
        "{:indent$}[{}] {}",
        "",
        id.short(),
        node.kind.label(),
        indent = depth * 2
    );
    if let Some(name) = &node.name {
        let _ = write!(out, " \"{name}\"");
    }
    let _ = write!(out, " pos=({:.2}, {:.2}, {:.2})", p.x, p.y, p.z);
    if count > 0 {
        let _ = write!(out, " vertices={count}");
    }
    out.push('\n');

    for child in graph.children(id) {
        write_node(graph, *child, depth + 1, out, visible, vertices);
    }
}

impl RenderBackend for TextRenderer {
    type Surface = TextSurface;

    fn create(mut options: RendererOptions<TextSurface>) -> Result<Self, RenderError> {
        let surface = options.require_surface()?;
        Ok(Self {
            surface,
            size: Size::default(),
            antialias: options.antialias,
            alpha: options.alpha,
            disposed: false,
        })
    }

    fn set_size(&mut self, size: Size) {
        self.size = size;
    }

    fn size(&self) -> Size {
        self.size
    }

    fn render(
        &mut self,
        graph: &SceneGraph,
        camera: &PerspectiveCamera,
    ) -> Result<(), RenderError> {
        if self.disposed {
            return Err(RenderError::Surface("surface was disposed".into()));
        }
        let frame = self.describe(graph, camera);
        tracing::trace!(frame = self.surface.frame_count() + 1, "text frame");
        self.surface.push(frame);
        Ok(())
    }

    fn dispose(&mut self) {
        self.disposed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use lumen_graph::{BufferGeometry, Node, PointsMaterial};

    fn renderer() -> (TextRenderer, TextSurface) {
        let surface = TextSurface::new();
        let renderer = TextRenderer::create(RendererOptions::new(surface.clone())).unwrap();
        (renderer, surface)
    }

    #[test]
    fn missing_surface_fails() {
        let result = TextRenderer::create(RendererOptions::default());
        assert!(matches!(result, Err(RenderError::MissingSurface)));
    }

    #[test]
    fn empty_graph_frame() {
        let (mut renderer, surface) = renderer();
        renderer
            .render(&SceneGraph::new(), &PerspectiveCamera::default())
            .unwrap();
        assert_eq!(surface.frame_count(), 1);
        let frame = surface.last_frame().unwrap();
        assert!(frame.contains("Frame 1"));
        assert!(frame.contains("\"scene\""));
        assert!(frame.contains("Nodes: 1 visible, 0 vertices"));
    }

    #[test]
    fn frame_lists_nested_nodes() {
        let (mut renderer, surface) = renderer();
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let group = graph
            .add(root, Node::group().named("galaxy").with_position(Vec3::new(0.0, 5.0, 10.0)))
            .unwrap();
        let points = Node::new(NodeKind::Points {
            geometry: BufferGeometry::new(vec![[0.0; 3]; 4]),
            material: PointsMaterial::default(),
        });
        graph.add(group, points).unwrap();
        let hidden = graph.add(root, Node::group().named("hidden")).unwrap();
        graph.get_mut(hidden).unwrap().visible = false;

        renderer.set_size(Size::new(640, 480));
        renderer.render(&graph, &PerspectiveCamera::default()).unwrap();
        let frame = surface.last_frame().unwrap();
        assert!(frame.contains("size=640x480"));
        assert!(frame.contains("\"galaxy\" pos=(0.00, 5.00, 10.00)"));
        assert!(frame.contains("    ["));
        assert!(frame.contains("vertices=4"));
        assert!(!frame.contains("hidden"));
    }

    #[test]
    fn disposed_renderer_refuses_to_draw() {
        let (mut renderer, _surface) = renderer();
        renderer.dispose();
        assert!(renderer.is_disposed());
        assert!(
            renderer
                .render(&SceneGraph::new(), &PerspectiveCamera::default())
                .is_err()
        );
    }

    #[test]
    fn draw_through_trait_object_records_a_frame() {
        let (mut renderer, surface) = renderer();
        let target: &mut dyn crate::backend::Draw = &mut renderer;
        target
            .draw(&SceneGraph::new(), &PerspectiveCamera::default())
            .unwrap();
        assert_eq!(surface.frame_count(), 1);
    }
}

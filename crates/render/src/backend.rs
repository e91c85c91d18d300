use crate::camera::PerspectiveCamera;
use lumen_common::Size;
use lumen_graph::SceneGraph;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("no drawable surface was supplied")]
    MissingSurface,
    #[error("surface error: {0}")]
    Surface(String),
    #[error("no compatible graphics adapter")]
    NoAdapter,
    #[error("device request failed: {0}")]
    Device(String),
}

/// Construction parameters for a backend.
#[derive(Debug, Clone)]
pub struct RendererOptions<S> {
    /// The drawable the backend presents to. Required.
    pub surface: Option<S>,
    pub antialias: bool,
    /// Clear to a transparent background instead of opaque black.
    pub alpha: bool,
}

impl<S> RendererOptions<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface: Some(surface),
            antialias: false,
            alpha: false,
        }
    }

    pub fn with_antialias(mut self, antialias: bool) -> Self {
        self.antialias = antialias;
        self
    }

    pub fn with_alpha(mut self, alpha: bool) -> Self {
        self.alpha = alpha;
        self
    }

    /// Take the surface out, failing when none was given.
    pub fn require_surface(&mut self) -> Result<S, RenderError> {
        self.surface.take().ok_or(RenderError::MissingSurface)
    }
}

impl<S> Default for RendererOptions<S> {
    fn default() -> Self {
        Self {
            surface: None,
            antialias: false,
            alpha: false,
        }
    }
}

/// A rendering backend bound to one drawable surface.
///
/// Backends read the scene graph and camera; they never mutate either.
pub trait RenderBackend: Sized {
    type Surface;

    fn create(options: RendererOptions<Self::Surface>) -> Result<Self, RenderError>;

    fn set_size(&mut self, size: Size);

    fn size(&self) -> Size;

    /// Draw every visible node reachable from the graph root.
    fn render(&mut self, graph: &SceneGraph, camera: &PerspectiveCamera)
    -> Result<(), RenderError>;

    /// Release surface resources. Called once when a session is torn down.
    fn dispose(&mut self) {}
}

/// Draw access to a session's backend, handed to scenes that present their
/// own frames.
pub trait Draw {
    fn draw(&mut self, graph: &SceneGraph, camera: &PerspectiveCamera) -> Result<(), RenderError>;
}

impl<B: RenderBackend> Draw for B {
    fn draw(&mut self, graph: &SceneGraph, camera: &PerspectiveCamera) -> Result<(), RenderError> {
        self.render(graph, camera)
    }
}

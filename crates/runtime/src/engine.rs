use crate::driver::ActiveRender;
use lumen_behaviour::{BehaviourError, SceneRegistry};
use lumen_render::{RenderBackend, RenderError, RendererOptions};

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("unknown scene: {0}")]
    UnknownScene(String),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Behaviour(#[from] BehaviourError),
    #[error("config io: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse: {0}")]
    Config(#[from] serde_yaml::Error),
}

/// Everything needed to start one render session.
#[derive(Debug, Clone)]
pub struct InitRequest<S> {
    /// Session label, used in logs.
    pub name: String,
    pub options: RendererOptions<S>,
    pub scene_name: String,
    /// Surface width; `DEFAULT_SIZE.width` when absent.
    pub width: Option<u32>,
    /// Surface height; `DEFAULT_SIZE.height` when absent.
    pub height: Option<u32>,
    /// Draw through the current camera after every update. When false the
    /// driver never draws; the scene's `on_after_render` hook receives the
    /// backend and presents the frame itself.
    pub use_default_rendering: bool,
}

impl<S> InitRequest<S> {
    pub fn new(name: &str, scene_name: &str, options: RendererOptions<S>) -> Self {
        Self {
            name: name.to_string(),
            options,
            scene_name: scene_name.to_string(),
            width: None,
            height: None,
            use_default_rendering: true,
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn with_default_rendering(mut self, enabled: bool) -> Self {
        self.use_default_rendering = enabled;
        self
    }
}

/// Entry point for starting render sessions against a set of scene types.
///
/// Sessions are returned to the caller, who owns them; the engine keeps no
/// record of what it started.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    registry: SceneRegistry,
}

impl Engine {
    pub fn new(registry: SceneRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &SceneRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut SceneRegistry {
        &mut self.registry
    }

    pub fn init_scene<B: RenderBackend>(
        &self,
        request: InitRequest<B::Surface>,
    ) -> Result<ActiveRender<B>, RuntimeError> {
        ActiveRender::new(&self.registry, request)
    }
}

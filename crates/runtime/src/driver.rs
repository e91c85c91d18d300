use crate::engine::{InitRequest, RuntimeError};
use crate::frames::FrameSource;
use lumen_behaviour::{Behaviour, InteractiveScene, RenderTarget, SceneRegistry};
use lumen_common::{DEFAULT_SIZE, Size};
use lumen_input::InputEvent;
use lumen_render::RenderBackend;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Stopped,
}

/// One render session: a backend bound to a surface plus the scene it drives.
///
/// The host calls [`animate`](Self::animate) once per display refresh (or
/// hands a [`FrameSource`] to [`run`](Self::run)). Nothing here blocks.
pub struct ActiveRender<B: RenderBackend> {
    name: String,
    renderer: B,
    scene: InteractiveScene,
    use_default_rendering: bool,
    frames: u64,
    state: LoopState,
    warned_no_camera: bool,
}

impl<B: RenderBackend> std::fmt::Debug for ActiveRender<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveRender")
            .field("name", &self.name)
            .field("scene", &self.scene.name())
            .field("size", &self.renderer.size())
            .field("frames", &self.frames)
            .field("state", &self.state)
            .finish()
    }
}

impl<B: RenderBackend> ActiveRender<B> {
    /// Resolve the scene, create and size the backend, then construct and
    /// start the scene. Any failure leaves nothing running.
    pub fn new(
        registry: &SceneRegistry,
        request: InitRequest<B::Surface>,
    ) -> Result<Self, RuntimeError> {
        let _span = tracing::info_span!(
            "init_scene",
            session = %request.name,
            scene = %request.scene_name
        )
        .entered();

        let factory = registry
            .get(&request.scene_name)
            .ok_or_else(|| RuntimeError::UnknownScene(request.scene_name.clone()))?;

        let antialias = request.options.antialias;
        let alpha = request.options.alpha;
        let mut renderer = B::create(request.options)?;
        let size = Size::new(
            request.width.unwrap_or(DEFAULT_SIZE.width),
            request.height.unwrap_or(DEFAULT_SIZE.height),
        );
        renderer.set_size(size);

        let target = RenderTarget {
            size,
            antialias,
            alpha,
            default_rendering: request.use_default_rendering,
        };
        let started = factory(target).and_then(|mut scene| {
            scene.start()?;
            Ok(scene)
        });
        let scene = match started {
            Ok(scene) => scene,
            Err(err) => {
                renderer.dispose();
                return Err(err.into());
            }
        };

        tracing::info!(%size, default_rendering = request.use_default_rendering, "session started");
        Ok(Self {
            name: request.name,
            renderer,
            scene,
            use_default_rendering: request.use_default_rendering,
            frames: 0,
            state: LoopState::Running,
            warned_no_camera: false,
        })
    }

    /// The per-frame callback: update the scene, draw through its current
    /// camera when default rendering is on, then run `on_after_render` with
    /// the backend so the scene can present the frame itself.
    ///
    /// A failure stops the session and is returned to the caller.
    pub fn animate(&mut self, time: f64) -> Result<LoopState, RuntimeError> {
        if self.state == LoopState::Stopped {
            return Ok(LoopState::Stopped);
        }
        if let Err(err) = self.frame(time) {
            tracing::error!(session = %self.name, frame = self.frames, error = %err, "frame failed");
            self.state = LoopState::Stopped;
            return Err(err);
        }
        Ok(self.state)
    }

    fn frame(&mut self, time: f64) -> Result<(), RuntimeError> {
        let _span = tracing::trace_span!("frame", n = self.frames, time).entered();
        self.scene.update(time)?;

        if self.use_default_rendering {
            match self.scene.current_camera() {
                Some(camera) => {
                    let graph = self.scene.handle().graph();
                    self.renderer.render(&graph, &camera)?;
                }
                None if !self.warned_no_camera => {
                    tracing::warn!(scene = %self.scene.name(), "no active camera; skipping draw");
                    self.warned_no_camera = true;
                }
                None => {}
            }
        }

        self.scene.on_after_render(&mut self.renderer)?;
        self.frames += 1;
        Ok(())
    }

    /// Drive frames from `source` until it runs dry or the session stops.
    /// Returns how many frames ran.
    pub fn run(&mut self, source: &mut impl FrameSource) -> Result<u64, RuntimeError> {
        let _span = tracing::info_span!("run", session = %self.name).entered();
        let before = self.frames;
        while let Some(time) = source.next_frame() {
            if self.animate(time)? == LoopState::Stopped {
                break;
            }
        }
        let ran = self.frames - before;
        tracing::debug!(frames = ran, "run finished");
        Ok(ran)
    }

    /// Cancel the loop. Later `animate` calls do nothing.
    pub fn stop(&mut self) {
        if self.state == LoopState::Running {
            tracing::debug!(session = %self.name, "session stopped");
        }
        self.state = LoopState::Stopped;
    }

    /// Stop, release backend resources and drop the scene.
    pub fn dispose(mut self) {
        self.stop();
        self.renderer.dispose();
        tracing::info!(session = %self.name, frames = self.frames, "session disposed");
    }

    pub fn handle_input(&self, event: &InputEvent) {
        self.scene.dispatch_input(event);
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        let size = Size::new(width, height);
        self.renderer.set_size(size);
        self.scene.resize(size);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    pub fn uses_default_rendering(&self) -> bool {
        self.use_default_rendering
    }

    pub fn scene(&self) -> &InteractiveScene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut InteractiveScene {
        &mut self.scene
    }

    pub fn renderer(&self) -> &B {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut B {
        &mut self.renderer
    }
}

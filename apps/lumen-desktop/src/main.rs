use anyhow::{Context, Result};
use clap::Parser;
use lumen_common::DEFAULT_SIZE;
use lumen_input::InputEvent;
use lumen_render_wgpu::{GpuSurface, WgpuBackend};
use lumen_runtime::{ActiveRender, Engine, LoopState, SessionConfig};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

/// Pixels scrolled per wheel notch.
const LINE_HEIGHT: f32 = 40.0;

#[derive(Parser)]
#[command(name = "lumen-desktop", about = "Lumen desktop application")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Scene to start (overrides the config file)
    #[arg(short, long)]
    scene: Option<String>,

    /// Session config file (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

struct App {
    engine: Engine,
    config: SessionConfig,
    window: Option<Arc<Window>>,
    session: Option<ActiveRender<WgpuBackend>>,
    started: Instant,
    scroll_y: f32,
}

impl App {
    fn new(engine: Engine, config: SessionConfig) -> Self {
        Self {
            engine,
            config,
            window: None,
            session: None,
            started: Instant::now(),
            scroll_y: 0.0,
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let size = PhysicalSize::new(
            self.config.width.unwrap_or(DEFAULT_SIZE.width),
            self.config.height.unwrap_or(DEFAULT_SIZE.height),
        );
        let attrs = Window::default_attributes()
            .with_title(format!("Lumen: {}", self.config.scene))
            .with_transparent(self.config.alpha)
            .with_inner_size(size);
        let window = Arc::new(event_loop.create_window(attrs).context("create window")?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window.clone())
            .context("create surface")?;

        let inner = window.inner_size();
        let gpu = pollster::block_on(GpuSurface::new(
            &instance,
            surface,
            inner.width.max(1),
            inner.height.max(1),
        ))?;

        let mut config = self.config.clone();
        config.width = Some(inner.width.max(1));
        config.height = Some(inner.height.max(1));
        let session = self
            .engine
            .init_scene::<WgpuBackend>(config.into_request(Some(gpu)))?;

        tracing::info!(scene = %self.config.scene, "window ready");
        self.started = Instant::now();
        self.window = Some(window);
        self.session = Some(session);
        Ok(())
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(session) = self.session.take() {
            session.dispose();
        }
        event_loop.exit();
    }

    fn forward(&self, event: InputEvent) {
        if let Some(session) = &self.session {
            session.handle_input(&event);
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(err) = self.start(event_loop) {
            tracing::error!("failed to start session: {err:#}");
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => self.shutdown(event_loop),
            WindowEvent::Resized(size) => {
                if let Some(session) = &mut self.session {
                    session.resize(size.width.max(1), size.height.max(1));
                }
            }
            WindowEvent::CursorMoved { position, .. } => self.forward(InputEvent::PointerMove {
                client_x: position.x as f32,
                client_y: position.y as f32,
            }),
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state,
                ..
            } => self.forward(InputEvent::PointerButton {
                pressed: state == ElementState::Pressed,
            }),
            WindowEvent::MouseWheel { delta, .. } => {
                let dy = match delta {
                    MouseScrollDelta::LineDelta(_, y) => -y * LINE_HEIGHT,
                    MouseScrollDelta::PixelDelta(p) => -p.y as f32,
                };
                self.scroll_y = (self.scroll_y + dy).max(0.0);
                self.forward(InputEvent::Scroll {
                    scroll_y: self.scroll_y,
                });
            }
            WindowEvent::RedrawRequested => {
                let time = self.started.elapsed().as_secs_f64();
                let Some(session) = &mut self.session else {
                    return;
                };
                match session.animate(time) {
                    Ok(LoopState::Running) => {}
                    Ok(LoopState::Stopped) => self.shutdown(event_loop),
                    Err(err) => {
                        tracing::error!("frame failed: {err}");
                        self.shutdown(event_loop);
                    }
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let mut config = match &cli.config {
        Some(path) => {
            SessionConfig::load(path).with_context(|| format!("loading {}", path.display()))?
        }
        None => SessionConfig::default(),
    };
    if let Some(scene) = cli.scene {
        config.scene = scene;
    }

    tracing::info!(
        backend = lumen_render_wgpu::crate_info(),
        "Lumen desktop v{}",
        env!("CARGO_PKG_VERSION")
    );

    let engine = Engine::new(lumen_effects::scene_registry());
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);
    let mut app = App::new(engine, config);
    event_loop.run_app(&mut app)?;
    Ok(())
}

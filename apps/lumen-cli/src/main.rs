use anyhow::Context;
use clap::{Parser, Subcommand};
use lumen_render::{TextRenderer, TextSurface};
use lumen_runtime::{Engine, FixedFrames, SessionConfig};
use lumen_tools::SceneInspector;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lumen-cli", about = "CLI tool for lumen scenes")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct SessionArgs {
    /// Scene to start (overrides the config file)
    #[arg(short, long)]
    scene: Option<String>,
    /// Session config file (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(long)]
    width: Option<u32>,
    #[arg(long)]
    height: Option<u32>,
}

impl SessionArgs {
    fn resolve(self) -> anyhow::Result<SessionConfig> {
        let mut config = match &self.config {
            Some(path) => SessionConfig::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => SessionConfig::default(),
        };
        if let Some(scene) = self.scene {
            config.scene = scene;
        }
        config.width = self.width.or(config.width);
        config.height = self.height.or(config.height);
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print engine version and crate info
    Info,
    /// List registered scenes
    Scenes,
    /// Print the default session config as YAML
    Config,
    /// Run a scene headless for a fixed number of frames
    Run {
        #[command(flatten)]
        session: SessionArgs,
        /// Number of frames to run
        #[arg(short, long, default_value = "3")]
        frames: u64,
        /// Simulated display refresh rate
        #[arg(long, default_value = "60")]
        fps: f64,
        /// Skip the driver's draw call; only scene hooks render
        #[arg(long)]
        no_default_rendering: bool,
        /// Print every frame instead of only the last
        #[arg(long)]
        all_frames: bool,
    },
    /// Start a scene and summarize its objects and graph
    Inspect {
        #[command(flatten)]
        session: SessionArgs,
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let engine = Engine::new(lumen_effects::scene_registry());

    match cli.command {
        Commands::Info => {
            println!("lumen-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", lumen_common::crate_info());
            println!("graph: {}", lumen_graph::crate_info());
            println!("render: {}", lumen_render::crate_info());
            println!("input: {}", lumen_input::crate_info());
            println!("behaviour: {}", lumen_behaviour::crate_info());
            println!("runtime: {}", lumen_runtime::crate_info());
            println!("effects: {}", lumen_effects::crate_info());
            println!("tools: {}", lumen_tools::crate_info());
        }
        Commands::Scenes => {
            for name in engine.registry().names() {
                println!("{name}");
            }
        }
        Commands::Config => {
            print!("{}", SessionConfig::default().to_yaml()?);
        }
        Commands::Run {
            session,
            frames,
            fps,
            no_default_rendering,
            all_frames,
        } => {
            let mut config = session.resolve()?;
            if no_default_rendering {
                config.use_default_rendering = false;
            }
            let surface = TextSurface::new();
            let mut active = engine.init_scene::<TextRenderer>(config.into_request(Some(surface)))?;
            let ran = active.run(&mut FixedFrames::new(frames, fps))?;

            let dumps = active.renderer().surface().take_frames();
            let shown = if all_frames {
                &dumps[..]
            } else {
                &dumps[dumps.len().saturating_sub(1)..]
            };
            for dump in shown {
                print!("{dump}");
            }
            println!(
                "Ran {ran} frames of {} ({} drawn)",
                active.scene().name(),
                dumps.len()
            );
            active.dispose();
        }
        Commands::Inspect { session, json } => {
            let config = session.resolve()?;
            let active =
                engine.init_scene::<TextRenderer>(config.into_request(Some(TextSurface::new())))?;
            let summary = SceneInspector::summary(active.scene());
            if json {
                println!("{}", summary.to_json()?);
            } else {
                print!("{summary}");
            }
            active.dispose();
        }
    }

    Ok(())
}

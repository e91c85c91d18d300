//! Render-loop driver: starts sessions and schedules their frames.
//!
//! # Invariants
//! - One session owns exactly one backend and one scene.
//! - Initialization fails fast on unknown scenes and missing surfaces, and
//!   leaves nothing running on failure.
//! - Every frame ends with `on_after_render`, whether or not the driver drew.
//! - Sessions are owned by the caller; there is no global session table.

mod config;
mod driver;
mod engine;
mod frames;

pub use config::SessionConfig;
pub use driver::{ActiveRender, LoopState};
pub use engine::{Engine, InitRequest, RuntimeError};
pub use frames::{FixedFrames, FrameSource};

pub fn crate_info() -> &'static str {
    "lumen-runtime v0.1.0"
}

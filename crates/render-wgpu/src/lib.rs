//! wgpu render backend for lumen scenes.
//!
//! Flattens the scene graph into world-space colored vertices every frame and
//! draws them as a point list and a line list. Custom shader programs on
//! materials are not compiled; lines take their material's display color.
//!
//! # Invariants
//! - Renderer never mutates the scene graph or the camera.
//! - Only visible nodes reachable from the root are drawn.

mod flatten;
mod gpu;
mod shaders;

pub use flatten::{ColorVertex, FrameGeometry, flatten};
pub use gpu::{GpuSurface, WgpuBackend};

pub fn crate_info() -> &'static str {
    "lumen-render-wgpu v0.1.0"
}

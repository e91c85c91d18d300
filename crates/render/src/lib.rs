//! Rendering adapter: renderer-agnostic backend contract.
//!
//! # Invariants
//! - Backends never mutate the scene graph or the camera.
//! - A backend is bound to exactly one surface for its whole life.
//!
//! [`TextRenderer`] is the headless backend used by the CLI and tests; the GPU
//! backend lives in `lumen-render-wgpu` and implements the same trait.

mod backend;
mod camera;
mod text;

pub use backend::{Draw, RenderBackend, RenderError, RendererOptions};
pub use camera::PerspectiveCamera;
pub use text::{TextRenderer, TextSurface};

pub fn crate_info() -> &'static str {
    "lumen-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}

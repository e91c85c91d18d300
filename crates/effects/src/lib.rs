//! Stock behaviours and the scenes built from them.
//!
//! # Invariants
//! - Every factory here declares components in dependency order; `Light`
//!   precedes `MouseFollower`.
//! - Effects read time only from their `update` argument, in seconds.
//! - Input reaches effects through scene subscriptions; an effect's
//!   listeners are removed when the effect is dropped.

pub mod controls;
pub mod galaxy;
pub mod mouse_light;
mod pointer;
pub mod scenes;
pub mod shaders;
pub mod wave;

pub use controls::OrbitControls;
pub use galaxy::{GalaxyParams, GalaxyParticle, galaxy, galaxy_geometry, galaxy_with};
pub use mouse_light::{Light, MouseFollower, MouseFollowerParams, mouse_light, mouse_light_with};
pub use pointer::{DragTracker, PointerTracker, ScrollTracker};
pub use scenes::{
    DEFAULT_CAMERA, GalaxyScene, MainScene, galaxy_scene_def, main_scene_def, register_scenes,
    scene_registry,
};
pub use wave::{WaveParams, WaveShaderHandler, abstract_wave, abstract_wave_with, wave_material};

pub fn crate_info() -> &'static str {
    "lumen-effects v0.1.0"
}

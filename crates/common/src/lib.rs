//! Shared types and numeric helpers used by every lumen crate.
//!
//! # Invariants
//! - Everything here is plain data or a pure function; no crate state.

pub mod math;
mod types;

pub use math::{
    Plane, Ray, SeededRng, Tween, clamp, degrees_to_radians, ease_out_sine, lerp, look_rotation,
};
pub use types::{Color, DEFAULT_SIZE, NodeId, Size, Transform};

pub fn crate_info() -> &'static str {
    "lumen-common v0.1.0"
}

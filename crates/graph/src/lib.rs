//! Scene graph: the renderable tree every scene owns.
//!
//! # Invariants
//! - The root node always exists and is never reparented or removed.
//! - Every node has at most one parent; attaching never creates a cycle.
//! - Only nodes reachable from the root are drawn.

pub mod geometry;
pub mod graph;
pub mod light;
pub mod material;

pub use geometry::{BufferGeometry, PlaneGeometry, to_grid};
pub use graph::{GraphError, Node, NodeKind, SceneGraph};
pub use light::{HemisphereLight, PointLight};
pub use material::{Material, PointsMaterial, ShaderMaterial, ShaderProgram, Uniform};

pub fn crate_info() -> &'static str {
    "lumen-graph v0.1.0"
}

//! Developer tooling: read-only views of a running scene.
//!
//! # Invariants
//! - Inspection never mutates the scene or its graph.

mod inspector;

pub use inspector::{NodeInfo, ObjectSummary, SceneInspector, SceneSummary};

pub fn crate_info() -> &'static str {
    "lumen-tools v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("tools"));
    }
}

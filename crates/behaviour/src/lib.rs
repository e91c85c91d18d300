//! Behaviour composition: components inside scene objects inside a scene.
//!
//! Every level implements one [`Behaviour`] contract; [`BehaviourKind`] tells
//! them apart. A [`SceneObject`] owns its components and an
//! [`InteractiveScene`] owns its scene objects. Components hold only weak
//! references back to their owner and to the shared [`SceneHandle`].
//!
//! # Invariants
//! - `start` runs once before the first `update` at every level.
//! - Components start and update in declaration order; a component sees only
//!   siblings declared before it while it starts.
//! - A scene object's group holds exactly its components' exports, in order.
//! - After `InteractiveScene::start` a camera is active iff the default
//!   camera key is declared.
//! - Failures propagate and abort the enclosing `start`; nothing is rolled back.

mod behaviour;
mod component;
mod object;
mod registry;
mod scene;

pub use behaviour::{Behaviour, BehaviourError, BehaviourKind};
pub use component::{
    ComponentContext, ComponentFactory, ComponentRef, ComponentTable, MonoBehaviour, factory,
};
pub use object::{SceneObject, SceneObjectDef};
pub use registry::{CameraRegistry, SceneFactory, SceneRegistry};
pub use scene::{
    InteractiveScene, NoHooks, RenderTarget, SceneCore, SceneDef, SceneHandle, SceneHooks,
};

pub fn crate_info() -> &'static str {
    "lumen-behaviour v0.1.0"
}

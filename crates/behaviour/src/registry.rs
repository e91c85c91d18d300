use crate::behaviour::BehaviourError;
use crate::scene::{InteractiveScene, RenderTarget};
use lumen_render::PerspectiveCamera;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Builds a scene bound to a render target.
pub type SceneFactory = Rc<dyn Fn(RenderTarget) -> Result<InteractiveScene, BehaviourError>>;

/// Scene types a driver can instantiate, by name.
#[derive(Clone, Default)]
pub struct SceneRegistry {
    scenes: BTreeMap<String, SceneFactory>,
}

impl std::fmt::Debug for SceneRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.scenes.keys()).finish()
    }
}

impl SceneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `build` under `name`. Returns the factory it replaced, if any.
    pub fn register(
        &mut self,
        name: &str,
        build: impl Fn(RenderTarget) -> Result<InteractiveScene, BehaviourError> + 'static,
    ) -> Option<SceneFactory> {
        tracing::debug!(scene = name, "registered scene");
        self.scenes.insert(name.to_string(), Rc::new(build))
    }

    pub fn get(&self, name: &str) -> Option<SceneFactory> {
        self.scenes.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.scenes.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.scenes.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }
}

/// A scene's cameras, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct CameraRegistry {
    cameras: Vec<(String, PerspectiveCamera)>,
}

impl CameraRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `camera` under `name`, replacing an existing entry in place.
    pub fn insert(&mut self, name: &str, camera: PerspectiveCamera) {
        match self.cameras.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = camera,
            None => self.cameras.push((name.to_string(), camera)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&PerspectiveCamera> {
        self.cameras.iter().find(|(n, _)| n == name).map(|(_, c)| c)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut PerspectiveCamera> {
        self.cameras
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> Vec<&str> {
        self.cameras.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.cameras.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cameras.is_empty()
    }

    /// Apply `aspect` to every camera.
    pub fn set_aspect(&mut self, aspect: f32) {
        for (_, camera) in &mut self.cameras {
            camera.set_aspect(aspect);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{NoHooks, SceneDef};

    #[test]
    fn scene_registry_lookup() {
        let mut registry = SceneRegistry::new();
        assert!(registry.is_empty());
        registry.register("Zeta", |target| {
            InteractiveScene::new(SceneDef::new("Zeta"), Box::new(NoHooks), target)
        });
        registry.register("Alpha", |target| {
            InteractiveScene::new(SceneDef::new("Alpha"), Box::new(NoHooks), target)
        });

        assert_eq!(registry.names(), vec!["Alpha", "Zeta"]);
        assert!(registry.contains("Alpha"));
        assert!(registry.get("Missing").is_none());

        let factory = registry.get("Zeta").unwrap();
        let scene = factory(RenderTarget::default()).unwrap();
        assert_eq!(scene.name(), "Zeta");
    }

    #[test]
    fn camera_registry_keeps_declaration_order() {
        let mut cameras = CameraRegistry::new();
        cameras.insert("Main", PerspectiveCamera::new(75.0, 1.0));
        cameras.insert("Side", PerspectiveCamera::new(50.0, 1.0));
        cameras.insert("Main", PerspectiveCamera::new(60.0, 1.0));

        assert_eq!(cameras.names(), vec!["Main", "Side"]);
        assert_eq!(cameras.get("Main").unwrap().fov_degrees, 60.0);

        cameras.set_aspect(2.0);
        assert!(cameras.names().iter().all(|n| cameras.get(n).unwrap().aspect == 2.0));
    }
}

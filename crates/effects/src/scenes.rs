use crate::controls::OrbitControls;
use crate::galaxy::{GalaxyParams, GalaxyParticle, galaxy, galaxy_with};
use crate::mouse_light::mouse_light;
use crate::wave::abstract_wave;
use glam::Vec3;
use lumen_behaviour::{
    BehaviourError, InteractiveScene, RenderTarget, SceneCore, SceneDef, SceneHooks,
    SceneRegistry,
};
use lumen_common::{Color, DEFAULT_SIZE, NodeId};
use lumen_graph::{HemisphereLight, Node, NodeKind, SceneGraph};
use lumen_render::{Draw, PerspectiveCamera};

pub const DEFAULT_CAMERA: &str = "DefaultCamera";

fn default_camera() -> PerspectiveCamera {
    PerspectiveCamera::new(75.0, DEFAULT_SIZE.aspect())
}

fn hemisphere_light() -> Node {
    Node::new(NodeKind::HemisphereLight(HemisphereLight::new(
        Color::WHITE,
        Color::WHITE,
        1.0,
    )))
    .named("hemisphere-light")
    .with_position(Vec3::new(0.0, 200.0, 0.0))
}

fn galaxy_group(core: &SceneCore) -> Result<NodeId, BehaviourError> {
    core.instance("Galaxy")
        .and_then(|o| o.with_component::<GalaxyParticle, _>("GalaxyParticle", GalaxyParticle::group))
        .flatten()
        .ok_or_else(|| BehaviourError::MissingComponent("GalaxyParticle".into()))
}

/// Stock scenes draw their own frame when the driver is told not to.
fn present_if_driver_idle(core: &SceneCore, renderer: &mut dyn Draw) -> Result<(), BehaviourError> {
    if !core.target().default_rendering {
        core.draw(renderer)?;
    }
    Ok(())
}

/// Mouse light, wave and galaxy under an orbiting camera.
pub fn main_scene_def() -> SceneDef {
    SceneDef::new("MainScene")
        .object(mouse_light())
        .object(abstract_wave())
        .object(galaxy())
        .camera(DEFAULT_CAMERA, default_camera())
        .default_camera(DEFAULT_CAMERA)
}

#[derive(Debug, Default)]
pub struct MainScene {
    controls: Option<OrbitControls>,
}

impl MainScene {
    pub const NAME: &'static str = "MainScene";

    pub fn create(target: RenderTarget) -> Result<InteractiveScene, BehaviourError> {
        InteractiveScene::new(main_scene_def(), Box::new(Self::default()), target)
    }
}

impl SceneHooks for MainScene {
    fn on_scene_awake(&mut self, core: &mut SceneCore) -> Result<(), BehaviourError> {
        let handle = core.handle();
        handle.update_camera(|camera| camera.position = Vec3::new(-0.5, 0.5, 0.5));
        {
            let mut graph = handle.graph_mut();
            let root = graph.root();
            graph.add(root, hemisphere_light())?;
        }

        let mut controls = OrbitControls::new(handle, Vec3::ZERO);
        handle.update_camera(|camera| controls.update(camera));
        self.controls = Some(controls);
        Ok(())
    }

    fn on_scene_start(&mut self, core: &mut SceneCore) -> Result<(), BehaviourError> {
        let group = galaxy_group(core)?;
        if let Some(node) = core.handle().graph_mut().get_mut(group) {
            node.transform.position.y = 5.0;
            node.transform.position.z = 10.0;
        }
        Ok(())
    }

    fn on_after_render(
        &mut self,
        core: &mut SceneCore,
        renderer: &mut dyn Draw,
    ) -> Result<(), BehaviourError> {
        present_if_driver_idle(core, renderer)?;
        if let Some(controls) = self.controls.as_mut() {
            core.handle().update_camera(|camera| controls.update(camera));
        }
        Ok(())
    }
}

/// A lighter scene: one small galaxy seen from the front.
pub fn galaxy_scene_def() -> SceneDef {
    let params = GalaxyParams {
        count: 20_000,
        ..GalaxyParams::default()
    };
    let mut camera = default_camera().with_position(Vec3::new(0.0, 3.0, 10.0));
    camera.look_at(Vec3::ZERO);
    SceneDef::new("GalaxyScene")
        .object(galaxy_with(params))
        .camera(DEFAULT_CAMERA, camera)
        .default_camera(DEFAULT_CAMERA)
}

#[derive(Debug, Default, Clone, Copy)]
pub struct GalaxyScene;

impl GalaxyScene {
    pub const NAME: &'static str = "GalaxyScene";

    pub fn create(target: RenderTarget) -> Result<InteractiveScene, BehaviourError> {
        InteractiveScene::new(galaxy_scene_def(), Box::new(Self), target)
    }
}

impl SceneHooks for GalaxyScene {
    fn modify_scene(&mut self, graph: &mut SceneGraph) -> Result<(), BehaviourError> {
        let root = graph.root();
        graph.add(root, hemisphere_light())?;
        Ok(())
    }

    fn on_after_render(
        &mut self,
        core: &mut SceneCore,
        renderer: &mut dyn Draw,
    ) -> Result<(), BehaviourError> {
        present_if_driver_idle(core, renderer)
    }
}

/// Register every stock scene under its name.
pub fn register_scenes(registry: &mut SceneRegistry) {
    registry.register(MainScene::NAME, MainScene::create);
    registry.register(GalaxyScene::NAME, GalaxyScene::create);
}

pub fn scene_registry() -> SceneRegistry {
    let mut registry = SceneRegistry::new();
    register_scenes(&mut registry);
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_behaviour::Behaviour;
    use lumen_render::{RenderBackend, RendererOptions, TextRenderer, TextSurface};

    fn text_renderer() -> (TextRenderer, TextSurface) {
        let surface = TextSurface::new();
        let renderer = TextRenderer::create(RendererOptions::new(surface.clone())).unwrap();
        (renderer, surface)
    }

    #[test]
    fn registry_lists_stock_scenes() {
        let registry = scene_registry();
        assert_eq!(registry.names(), vec!["GalaxyScene", "MainScene"]);
    }

    #[test]
    fn main_scene_declares_objects_in_order() {
        let scene = MainScene::create(RenderTarget::default()).unwrap();
        assert_eq!(
            scene.declared_objects(),
            vec!["MouseLight", "AbstractWave", "Galaxy"]
        );
    }

    #[test]
    fn main_scene_start_places_camera_light_and_galaxy() {
        let mut scene = MainScene::create(RenderTarget::default()).unwrap();
        scene.start().unwrap();

        let camera = scene.current_camera().unwrap();
        assert!((camera.position - Vec3::new(-0.5, 0.5, 0.5)).length() < 1e-5);
        assert!((camera.forward() - (-camera.position).normalize()).length() < 1e-4);

        let graph = scene.handle().graph();
        assert!(graph.find_by_name("hemisphere-light").is_some());
        let galaxy = graph.find_by_name("galaxy").unwrap();
        let position = graph.get(galaxy).unwrap().transform.position;
        assert_eq!((position.y, position.z), (5.0, 10.0));
    }

    #[test]
    fn galaxy_scene_starts_with_light_and_camera() {
        let mut scene = GalaxyScene::create(RenderTarget::default()).unwrap();
        scene.start().unwrap();
        scene.update(0.5).unwrap();
        let graph = scene.handle().graph();
        assert!(graph.find_by_name("hemisphere-light").is_some());
        assert!(graph.find_by_name("galaxy-points").is_some());
        assert_eq!(scene.current_camera().unwrap().position, Vec3::new(0.0, 3.0, 10.0));
    }

    #[test]
    fn galaxy_scene_presents_itself_when_driver_does_not_draw() {
        let target = RenderTarget {
            default_rendering: false,
            ..RenderTarget::default()
        };
        let mut scene = GalaxyScene::create(target).unwrap();
        let (mut renderer, surface) = text_renderer();
        scene.start().unwrap();
        for frame in 0..3 {
            scene.update(frame as f64 / 60.0).unwrap();
            scene.on_after_render(&mut renderer).unwrap();
        }
        assert_eq!(surface.frame_count(), 3);
    }

    #[test]
    fn main_scene_leaves_drawing_to_the_driver_by_default() {
        let mut scene = MainScene::create(RenderTarget::default()).unwrap();
        let (mut renderer, surface) = text_renderer();
        scene.start().unwrap();
        scene.update(0.0).unwrap();
        scene.on_after_render(&mut renderer).unwrap();
        assert_eq!(surface.frame_count(), 0);
    }
}

use crate::pointer::PointerTracker;
use glam::Vec3;
use lumen_behaviour::{Behaviour, BehaviourError, ComponentContext, SceneObjectDef};
use lumen_common::{Color, NodeId, Plane};
use lumen_graph::{BufferGeometry, Material, Node, NodeKind, PointLight};
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Color of the light that follows the pointer.
pub const LIGHT_COLOR: u32 = 0x60a1c4;

/// A point light wrapped in its own group, so other components can move it.
#[derive(Debug)]
pub struct Light {
    ctx: ComponentContext,
    group: Option<NodeId>,
}

impl Light {
    pub fn new(ctx: ComponentContext) -> Self {
        Self { ctx, group: None }
    }

    /// The group holding the light. `None` before `start`.
    pub fn group(&self) -> Option<NodeId> {
        self.group
    }
}

impl Behaviour for Light {
    fn start(&mut self) -> Result<(), BehaviourError> {
        let scene = self.ctx.scene()?;
        let mut graph = scene.graph_mut();

        let mut light = PointLight::new(Color::from_hex(LIGHT_COLOR), 1.0, 50.0, 2.0);
        light.set_power(6.0 * PI);

        let group = graph.create(Node::group().named("light"));
        graph.add(group, Node::new(NodeKind::PointLight(light)).named("point-light"))?;
        self.group = Some(group);
        Ok(())
    }

    fn export_as_scene_object(&self) -> Option<NodeId> {
        self.group
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MouseFollowerParams {
    pub x_offset: f32,
    pub y_offset: f32,
    pub z_offset: f32,
    /// Show the raycast plane and a marker cube at the hit point.
    pub debug: bool,
}

impl Default for MouseFollowerParams {
    fn default() -> Self {
        Self {
            x_offset: 0.0,
            y_offset: 0.0,
            z_offset: 0.5,
            debug: false,
        }
    }
}

/// Moves the sibling `Light` group to where the pointer ray meets a plane
/// just below the origin.
///
/// Must be declared after `Light` in the same scene object.
#[derive(Debug)]
pub struct MouseFollower {
    ctx: ComponentContext,
    params: MouseFollowerParams,
    raycast_plane: Plane,
    intersect: Vec3,
    group: Option<NodeId>,
    debug_group: Option<NodeId>,
    hooked: Option<NodeId>,
    pointer: Option<PointerTracker>,
}

impl MouseFollower {
    pub fn new(ctx: ComponentContext, params: MouseFollowerParams) -> Self {
        Self {
            ctx,
            params,
            raycast_plane: Plane::new(Vec3::Y, 0.01),
            intersect: Vec3::ZERO,
            group: None,
            debug_group: None,
            hooked: None,
            pointer: None,
        }
    }

    /// Last point where the pointer ray met the plane.
    pub fn intersect(&self) -> Vec3 {
        self.intersect
    }

    /// The group this follower moves.
    pub fn hooked(&self) -> Option<NodeId> {
        self.hooked
    }

    fn target(&self) -> Vec3 {
        self.intersect + Vec3::new(self.params.x_offset, self.params.y_offset, self.params.z_offset)
    }
}

impl Behaviour for MouseFollower {
    fn start(&mut self) -> Result<(), BehaviourError> {
        let hooked = self
            .ctx
            .require_component::<Light, _>("Light", Light::group)?
            .ok_or_else(|| BehaviourError::MissingComponent("Light".into()))?;
        self.hooked = Some(hooked);

        let scene = self.ctx.scene()?;
        {
            let mut graph = scene.graph_mut();
            let group = graph.create(Node::group().named("mouse-follower"));
            let debug_group = graph.add(group, Node::group().named("mouse-follower-debug"))?;
            if self.params.debug {
                graph.add(
                    group,
                    Node::new(NodeKind::PlaneHelper {
                        plane: self.raycast_plane,
                        size: 1.0,
                        color: Color::from_hex(0xffff00),
                    }),
                )?;
                graph.add(
                    debug_group,
                    Node::new(NodeKind::Mesh {
                        geometry: BufferGeometry::cuboid(0.1, 0.1, 0.1),
                        material: Material::Normal,
                    }),
                )?;
            }
            self.group = Some(group);
            self.debug_group = Some(debug_group);
        }
        self.pointer = Some(PointerTracker::subscribe(&scene));
        Ok(())
    }

    fn update(&mut self, _time: f64) -> Result<(), BehaviourError> {
        let scene = self.ctx.scene()?;
        let ndc = self.pointer.as_ref().and_then(PointerTracker::ndc);
        if let (Some(ndc), Some(camera)) = (ndc, scene.camera())
            && let Some(hit) = camera.ray_from_ndc(ndc).intersect_plane(&self.raycast_plane)
        {
            self.intersect = hit;
        }

        let target = self.target();
        let mut graph = scene.graph_mut();
        if let Some(node) = self.hooked.and_then(|id| graph.get_mut(id)) {
            node.transform.position = target;
        }
        if self.params.debug
            && let Some(node) = self.debug_group.and_then(|id| graph.get_mut(id))
        {
            node.transform.position = target;
        }
        Ok(())
    }

    fn export_as_scene_object(&self) -> Option<NodeId> {
        self.group
    }
}

/// The `MouseLight` scene object: a light that tracks the pointer.
pub fn mouse_light() -> SceneObjectDef {
    mouse_light_with(MouseFollowerParams::default())
}

pub fn mouse_light_with(params: MouseFollowerParams) -> SceneObjectDef {
    SceneObjectDef::new("MouseLight")
        .with("Light", |ctx| Ok(Light::new(ctx)))
        .with("MouseFollower", move |ctx| Ok(MouseFollower::new(ctx, params)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_behaviour::{
        BehaviourKind, InteractiveScene, NoHooks, RenderTarget, SceneDef, SceneHandle,
        SceneObject,
    };
    use lumen_input::InputEvent;
    use lumen_render::PerspectiveCamera;
    use std::rc::Rc;

    fn started(object: SceneObjectDef) -> InteractiveScene {
        let mut camera =
            PerspectiveCamera::new(75.0, 1.0).with_position(Vec3::new(0.0, 2.0, 2.0));
        camera.look_at(Vec3::ZERO);
        let def = SceneDef::new("Test")
            .object(object)
            .camera("DefaultCamera", camera)
            .default_camera("DefaultCamera");
        let mut scene = InteractiveScene::new(def, Box::new(NoHooks), RenderTarget::default())
            .unwrap();
        scene.start().unwrap();
        scene
    }

    fn light_position(scene: &InteractiveScene) -> Vec3 {
        let group = scene
            .instance("MouseLight")
            .and_then(|o| o.with_component::<Light, _>("Light", Light::group))
            .flatten()
            .unwrap();
        scene.handle().graph().get(group).unwrap().transform.position
    }

    #[test]
    fn light_exports_group_with_point_light() {
        let handle = Rc::new(SceneHandle::default());
        let mut object = SceneObject::new(
            SceneObjectDef::new("L").with("Light", |ctx| Ok(Light::new(ctx))),
            &handle,
        );
        object.start().unwrap();
        let group = object
            .with_component::<Light, _>("Light", Light::group)
            .flatten()
            .unwrap();
        let graph = handle.graph();
        let child = graph.children(group)[0];
        match &graph.get(child).unwrap().kind {
            NodeKind::PointLight(light) => {
                assert_eq!(light.distance, 50.0);
                assert!((light.power() - 6.0 * PI).abs() < 1e-4);
            }
            other => panic!("expected point light, got {other:?}"),
        }
        assert_eq!(graph.parent(group), object.export_object_group());
    }

    #[test]
    fn follower_holds_offset_position_before_pointer_moves() {
        let mut scene = started(mouse_light());
        scene.update(0.0).unwrap();
        assert_eq!(light_position(&scene), Vec3::new(0.0, 0.0, 0.5));
        assert_eq!(
            scene.instance("MouseLight").unwrap().kind(),
            BehaviourKind::Composite
        );
    }

    #[test]
    fn follower_moves_light_to_pointer_hit() {
        let mut scene = started(mouse_light());
        let viewport = scene.handle().viewport();
        // Centre of the viewport: the camera looks at the origin.
        scene.dispatch_input(&InputEvent::PointerMove {
            client_x: viewport.width as f32 / 2.0,
            client_y: viewport.height as f32 / 2.0,
        });
        scene.update(0.016).unwrap();

        let position = light_position(&scene);
        assert!(position.x.abs() < 1e-3);
        assert!(position.y.abs() < 0.05);
        assert!((position.z - 0.5).abs() < 0.05);
    }

    #[test]
    fn follower_without_light_fails_to_start() {
        let handle = Rc::new(SceneHandle::default());
        let def = SceneObjectDef::new("Backwards")
            .with("MouseFollower", |ctx| {
                Ok(MouseFollower::new(ctx, MouseFollowerParams::default()))
            })
            .with("Light", |ctx| Ok(Light::new(ctx)));
        let mut object = SceneObject::new(def, &handle);
        let err = object.start().unwrap_err();
        assert!(matches!(
            err.root_cause(),
            BehaviourError::MissingComponent(key) if key == "Light"
        ));
    }

    #[test]
    fn debug_adds_plane_helper() {
        let params = MouseFollowerParams {
            debug: true,
            ..MouseFollowerParams::default()
        };
        let scene = started(mouse_light_with(params));
        let graph = scene.handle().graph();
        let helpers = graph
            .subtree(graph.root())
            .into_iter()
            .filter(|id| {
                matches!(
                    graph.get(*id).map(|n| &n.kind),
                    Some(NodeKind::PlaneHelper { .. })
                )
            })
            .count();
        assert_eq!(helpers, 1);
    }
}

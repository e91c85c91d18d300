use crate::pointer::{PointerTracker, ScrollTracker};
use crate::shaders::{WAVE_VERTEX, expand_includes, wave_fragment};
use glam::{Quat, Vec2, Vec3};
use lumen_behaviour::{Behaviour, BehaviourError, ComponentContext, SceneObjectDef};
use lumen_common::{Color, NodeId, Plane, Tween, lerp};
use lumen_graph::{
    BufferGeometry, Material, Node, NodeKind, PlaneGeometry, ShaderMaterial, ShaderProgram,
    Uniform,
};
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Grid resolution of the wave plane.
pub const WAVE_PLANE: (f32, f32, u32, u32) = (15.0, 4.0, 288, 72);

/// Scroll distance, in pixels, over which the wave finishes sinking.
const DIVE_SCROLL: f32 = 500.0;
const SCROLL_SMOOTHING: f32 = 0.08;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveParams {
    /// Tilt at rest, as a fraction of π.
    pub min_dive_depth: f32,
    /// Tilt once fully scrolled, as a fraction of π.
    pub max_dive_depth: f32,
    /// Largest offset the pan target may take on any axis.
    pub pan_limit: f32,
    /// Per-frame lerp factor toward the pan target.
    pub easing_acceleration: f32,
    pub dependent_on_lights: bool,
    /// Scroll offset beyond which updates are skipped.
    pub pause_threshold: f32,
    pub debug: bool,
}

impl Default for WaveParams {
    fn default() -> Self {
        Self {
            min_dive_depth: 0.5,
            max_dive_depth: 0.57,
            pan_limit: 0.0005,
            easing_acceleration: 0.0085,
            dependent_on_lights: true,
            pause_threshold: 1300.0,
            debug: false,
        }
    }
}

/// Build the wave's shader material with its initial uniform table.
pub fn wave_material(params: &WaveParams, camera_position: Vec3) -> ShaderMaterial {
    let program = ShaderProgram {
        vertex: expand_includes(WAVE_VERTEX),
        fragment: wave_fragment(params.dependent_on_lights),
    };
    let mut material = ShaderMaterial::new(program)
        .with_uniform("uTime", Uniform::Float(0.0))
        .with_uniform("uFrequency", Uniform::Vec2(Vec2::new(10.0, 5.0)))
        .with_uniform("uBigWavesElevation", Uniform::Float(0.09))
        .with_uniform("uBigWavesFrequency", Uniform::Vec2(Vec2::new(4.0, 3.0)))
        .with_uniform("uBigWavesSpeed", Uniform::Float(0.5))
        .with_uniform("uSmallWavesElevation", Uniform::Float(0.15))
        .with_uniform("uSmallWavesFrequency", Uniform::Float(3.0))
        .with_uniform("uSmallWavesSpeed", Uniform::Float(0.5))
        .with_uniform("uMaxBigWavesSpeed", Uniform::Float(5.0))
        .with_uniform("uMaxWavesInterval", Uniform::Float(30.0))
        .with_uniform("uDepthColor", Uniform::Color(Color::from_hex(0x0e0ea8)))
        .with_uniform("uSurfaceColor", Uniform::Color(Color::from_hex(0x60a1c4)))
        .with_uniform("uColorOffset", Uniform::Float(0.05))
        .with_uniform("uColorMultiplier", Uniform::Float(5.0))
        .with_uniform("uCalmingAxis", Uniform::Vec3(Vec3::new(0.0, 0.0, 1.75)))
        .with_uniform("uPointSize", Uniform::Float(2.0))
        .with_uniform("uCameraPosition", Uniform::Vec3(camera_position))
        .with_uniform("uMousePosition", Uniform::Vec2(Vec2::ZERO))
        .with_uniform("uMouseBulgeElevation", Uniform::Float(0.75))
        .with_uniform("uMouseBulgeRadius", Uniform::Float(0.25));
    material.double_sided = true;
    material.transparent = true;
    material.lights = true;
    material
}

#[derive(Debug, Clone, Copy)]
struct WaveNodes {
    core: NodeId,
    look_at: NodeId,
    lerping: NodeId,
    group: NodeId,
    mesh: NodeId,
    reference: Option<NodeId>,
}

/// Animates a wireframe wave that sinks as the page scrolls and leans
/// toward the pointer.
#[derive(Debug)]
pub struct WaveShaderHandler {
    ctx: ComponentContext,
    params: WaveParams,
    raycast_plane: Plane,
    intersect: Vec3,
    y_scroll: f32,
    dive: Tween,
    nodes: Option<WaveNodes>,
    pointer: Option<PointerTracker>,
    scroll: Option<ScrollTracker>,
}

impl WaveShaderHandler {
    pub fn new(ctx: ComponentContext, params: WaveParams) -> Self {
        Self {
            ctx,
            params,
            raycast_plane: Plane::new(Vec3::new(0.0, 1.0, 1.5), 0.0),
            intersect: Vec3::ZERO,
            y_scroll: 0.0,
            dive: Tween::new(
                -PI * params.min_dive_depth,
                -PI * params.max_dive_depth,
                DIVE_SCROLL,
            ),
            nodes: None,
            pointer: None,
            scroll: None,
        }
    }

    /// The line-segment node carrying the shader material.
    pub fn mesh(&self) -> Option<NodeId> {
        self.nodes.map(|n| n.mesh)
    }

    /// The node that eases toward the clamped pointer hit.
    pub fn lerping_group(&self) -> Option<NodeId> {
        self.nodes.map(|n| n.lerping)
    }

    /// Smoothed scroll offset driving the dive.
    pub fn smoothed_scroll(&self) -> f32 {
        self.y_scroll
    }

    fn pan_target(&self) -> Vec3 {
        let limit = self.params.pan_limit;
        self.intersect.clamp(Vec3::splat(-limit), Vec3::splat(limit))
    }
}

fn debug_cube() -> Node {
    Node::new(NodeKind::Mesh {
        geometry: BufferGeometry::cuboid(0.1, 0.1, 0.1),
        material: Material::Normal,
    })
}

impl Behaviour for WaveShaderHandler {
    fn start(&mut self) -> Result<(), BehaviourError> {
        let scene = self.ctx.scene()?;
        let camera_position = scene.camera().map(|c| c.position).unwrap_or(Vec3::ZERO);

        let (width, height, columns, rows) = WAVE_PLANE;
        let geometry = PlaneGeometry::new(width, height, columns, rows).to_line_grid()?;
        let material = Material::Shader(wave_material(&self.params, camera_position));

        {
            let mut graph = scene.graph_mut();
            let core = graph.create(Node::group().named("wave"));
            let look_at = graph.add(core, Node::group().named("wave-look-at"))?;
            let lerping = graph.add(core, Node::group().named("wave-lerping"))?;
            let group = graph.add(core, Node::group().named("wave-pivot"))?;
            let mesh = graph.add(
                group,
                Node::new(NodeKind::LineSegments { geometry, material })
                    .named("wave-mesh")
                    .with_rotation(Quat::from_rotation_x(self.dive.from))
                    .with_position(Vec3::new(0.0, 0.0, -0.75)),
            )?;

            let reference = if self.params.debug {
                let reference = graph.add(
                    core,
                    Node::group()
                        .named("wave-reference")
                        .with_position(Vec3::new(0.0, 0.0, -0.5)),
                )?;
                graph.add(reference, debug_cube())?;
                graph.add(look_at, debug_cube())?;
                graph.add(lerping, debug_cube())?;
                graph.add(
                    group,
                    Node::new(NodeKind::PlaneHelper {
                        plane: self.raycast_plane,
                        size: 1.0,
                        color: Color::from_hex(0xffff00),
                    }),
                )?;
                Some(reference)
            } else {
                None
            };

            self.nodes = Some(WaveNodes {
                core,
                look_at,
                lerping,
                group,
                mesh,
                reference,
            });
        }

        self.pointer = Some(PointerTracker::subscribe(&scene));
        self.scroll = Some(ScrollTracker::subscribe(&scene));
        Ok(())
    }

    fn update(&mut self, time: f64) -> Result<(), BehaviourError> {
        let Some(nodes) = self.nodes else {
            return Ok(());
        };
        let scroll_y = self.scroll.as_ref().map_or(0.0, ScrollTracker::scroll_y);
        if scroll_y > self.params.pause_threshold {
            return Ok(());
        }

        let scene = self.ctx.scene()?;
        let camera = scene.camera();
        let pointer = self.pointer.as_ref().and_then(PointerTracker::ndc);
        if let (Some(ndc), Some(camera)) = (pointer, camera)
            && let Some(hit) = camera.ray_from_ndc(ndc).intersect_plane(&self.raycast_plane)
        {
            self.intersect = hit;
        }

        self.y_scroll = lerp(self.y_scroll, scroll_y, SCROLL_SMOOTHING);
        let tilt = self.dive.seek(self.y_scroll);
        let pan_target = self.pan_target();

        let mut graph = scene.graph_mut();
        if let Some(mesh) = graph.get_mut(nodes.mesh) {
            mesh.transform.rotation = Quat::from_rotation_x(tilt);
            if let NodeKind::LineSegments { material, .. } = &mut mesh.kind
                && let Some(shader) = material.as_shader_mut()
            {
                shader.set("uTime", Uniform::Float(time as f32));
                if let Some(camera) = camera {
                    shader.set("uCameraPosition", Uniform::Vec3(camera.position));
                }
                if let Some(ndc) = pointer {
                    shader.set("uMousePosition", Uniform::Vec2(ndc));
                }
            }
        }

        let lerped = match graph.get_mut(nodes.lerping) {
            Some(node) => {
                let position = &mut node.transform.position;
                *position = position.lerp(pan_target, self.params.easing_acceleration);
                *position
            }
            None => Vec3::ZERO,
        };
        graph.look_at(nodes.group, Vec3::new(lerped.x, lerped.y, 4.0))?;

        if let Some(reference) = nodes.reference {
            graph.look_at(reference, lerped)?;
            if let Some(node) = graph.get_mut(nodes.look_at) {
                node.transform.position = self.intersect;
            }
        }
        Ok(())
    }

    fn export_as_scene_object(&self) -> Option<NodeId> {
        self.nodes.map(|n| n.core)
    }
}

/// The `AbstractWave` scene object with default parameters.
pub fn abstract_wave() -> SceneObjectDef {
    abstract_wave_with(WaveParams::default())
}

pub fn abstract_wave_with(params: WaveParams) -> SceneObjectDef {
    SceneObjectDef::new("AbstractWave").with("WaveShaderHandler", move |ctx| {
        Ok(WaveShaderHandler::new(ctx, params))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_behaviour::{SceneHandle, SceneObject};
    use lumen_input::InputEvent;
    use std::rc::Rc;

    fn started(params: WaveParams) -> (Rc<SceneHandle>, SceneObject) {
        let scene = Rc::new(SceneHandle::default());
        let mut object = SceneObject::new(abstract_wave_with(params), &scene);
        object.start().unwrap();
        (scene, object)
    }

    fn mesh_of(object: &SceneObject) -> NodeId {
        object
            .with_component::<WaveShaderHandler, _>("WaveShaderHandler", WaveShaderHandler::mesh)
            .flatten()
            .unwrap()
    }

    fn uniform(scene: &SceneHandle, mesh: NodeId, name: &str) -> Option<Uniform> {
        match &scene.graph().get(mesh)?.kind {
            NodeKind::LineSegments {
                material: Material::Shader(shader),
                ..
            } => shader.get(name),
            _ => None,
        }
    }

    #[test]
    fn material_carries_default_uniforms() {
        let material = wave_material(&WaveParams::default(), Vec3::ONE);
        assert_eq!(material.get("uBigWavesElevation"), Some(Uniform::Float(0.09)));
        assert_eq!(
            material.get("uSurfaceColor"),
            Some(Uniform::Color(Color::from_hex(0x60a1c4)))
        );
        assert_eq!(material.get("uCameraPosition"), Some(Uniform::Vec3(Vec3::ONE)));
        assert!(material.double_sided && material.transparent && material.lights);
        assert!(material.program.fragment.contains("pointLights"));
    }

    #[test]
    fn start_builds_grid_under_core_group() {
        let (scene, object) = started(WaveParams::default());
        let mesh = mesh_of(&object);
        let graph = scene.graph();
        let node = graph.get(mesh).unwrap();
        let (w, h, cols, rows) = WAVE_PLANE;
        match &node.kind {
            NodeKind::LineSegments { geometry, .. } => {
                let plane = PlaneGeometry::new(w, h, cols, rows);
                assert_eq!(geometry.vertex_count(), plane.vertex_count());
                assert!(geometry.indices.is_some());
            }
            other => panic!("expected line segments, got {other:?}"),
        }
        assert_eq!(node.transform.position, Vec3::new(0.0, 0.0, -0.75));
        let core = graph.parent(graph.parent(mesh).unwrap()).unwrap();
        assert_eq!(graph.children(core).len(), 3);
    }

    #[test]
    fn update_sets_time_and_sinks_with_scroll() {
        let (scene, mut object) = started(WaveParams::default());
        let mesh = mesh_of(&object);
        object.update(1.5).unwrap();
        assert_eq!(uniform(&scene, mesh, "uTime"), Some(Uniform::Float(1.5)));

        let rest = scene.graph().get(mesh).unwrap().transform.rotation;
        scene.dispatch_input(&InputEvent::Scroll { scroll_y: 600.0 });
        for frame in 0..200 {
            object.update(1.5 + frame as f64 / 60.0).unwrap();
        }
        let sunk = scene.graph().get(mesh).unwrap().transform.rotation;
        let expected = Quat::from_rotation_x(-PI * 0.57);
        assert!(sunk.angle_between(expected) < 1e-3);
        assert!(rest.angle_between(sunk) > 0.1);
    }

    #[test]
    fn scrolling_past_threshold_pauses_updates() {
        let (scene, mut object) = started(WaveParams::default());
        let mesh = mesh_of(&object);
        scene.dispatch_input(&InputEvent::Scroll { scroll_y: 2000.0 });
        object.update(3.0).unwrap();
        assert_eq!(uniform(&scene, mesh, "uTime"), Some(Uniform::Float(0.0)));
    }

    #[test]
    fn unlit_variant_drops_light_block() {
        let material = wave_material(
            &WaveParams {
                dependent_on_lights: false,
                ..WaveParams::default()
            },
            Vec3::ZERO,
        );
        assert!(!material.program.fragment.contains("pointLights"));
    }

    #[test]
    fn debug_adds_reference_group() {
        let (scene, object) = started(WaveParams {
            debug: true,
            ..WaveParams::default()
        });
        let core = object
            .with_component::<WaveShaderHandler, _>("WaveShaderHandler", |w| {
                w.export_as_scene_object()
            })
            .flatten()
            .unwrap();
        assert_eq!(scene.graph().children(core).len(), 4);
    }
}

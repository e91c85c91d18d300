use glam::{EulerRot, Quat};
use lumen_behaviour::{Behaviour, BehaviourError, ComponentContext, SceneObjectDef};
use lumen_common::{Color, NodeId, SeededRng};
use lumen_graph::{BufferGeometry, Node, NodeKind, PointsMaterial};
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

/// Shape and motion of the spiral point cloud.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GalaxyParams {
    pub count: u32,
    /// Point size in world units.
    pub size: f32,
    pub radius: f32,
    pub branches: u32,
    pub spin: f32,
    /// Turns per second around the local Y axis, in radians.
    pub speed: f32,
    pub breathing_intensity: f32,
    pub breathing_distance: f32,
    /// Exponent applied to the random scatter; higher keeps points tighter.
    pub spread: f32,
    pub inner_color: u32,
    pub outer_color: u32,
    pub seed: u64,
}

impl Default for GalaxyParams {
    fn default() -> Self {
        Self {
            count: 100_000,
            size: 0.02,
            radius: 5.0,
            branches: 3,
            spin: 1.0,
            speed: 0.2,
            breathing_intensity: 0.02,
            breathing_distance: 5.0,
            spread: 5.0,
            inner_color: 0xff3c30,
            outer_color: 0x1b7184,
            seed: 0x6761_6c61_7879,
        }
    }
}

/// Generate the galaxy's positions and per-point colors.
///
/// Deterministic for a given `params.seed`.
pub fn galaxy_geometry(params: &GalaxyParams) -> BufferGeometry {
    let mut rng = SeededRng::new(params.seed);
    let inner = Color::from_hex(params.inner_color);
    let outer = Color::from_hex(params.outer_color);
    let branches = params.branches.max(1);

    let count = params.count as usize;
    let mut positions = Vec::with_capacity(count);
    let mut colors = Vec::with_capacity(count);

    for i in 0..params.count {
        let radius = rng.next_f32() * params.radius;
        let spin_angle = radius * params.spin;
        let branch_angle = (i % branches) as f32 / branches as f32 * TAU;
        let upwards_angle = (i % 10) as f32 / 10.0 * TAU;

        let mut scatter = || rng.next_f32().powf(params.spread) * rng.next_sign();
        let (rx, ry, rz) = (scatter(), scatter(), scatter());

        positions.push([
            (branch_angle + spin_angle).cos() * radius + rx,
            (upwards_angle + spin_angle).tan() * radius + ry,
            (branch_angle + spin_angle).sin() * radius + rz,
        ]);

        let t = if params.radius > 0.0 {
            radius / params.radius
        } else {
            0.0
        };
        colors.push(inner.lerp(outer, t).to_array());
    }

    BufferGeometry::new(positions).with_colors(colors)
}

/// Base tilt of the point cloud before it spins.
const TILT_X: f32 = -1.0;
const TILT_Z: f32 = 2.7;

/// A spinning, breathing spiral of colored points.
#[derive(Debug)]
pub struct GalaxyParticle {
    ctx: ComponentContext,
    params: GalaxyParams,
    group: Option<NodeId>,
    points: Option<NodeId>,
}

impl GalaxyParticle {
    pub fn new(ctx: ComponentContext, params: GalaxyParams) -> Self {
        Self {
            ctx,
            params,
            group: None,
            points: None,
        }
    }

    /// The exported group. Scenes reposition the whole galaxy through it.
    pub fn group(&self) -> Option<NodeId> {
        self.group
    }

    pub fn points(&self) -> Option<NodeId> {
        self.points
    }
}

impl Behaviour for GalaxyParticle {
    fn start(&mut self) -> Result<(), BehaviourError> {
        let _span = tracing::debug_span!("galaxy_start", count = self.params.count).entered();
        let geometry = galaxy_geometry(&self.params);
        let material = PointsMaterial {
            size: self.params.size,
            size_attenuation: true,
            depth_write: false,
            additive_blending: true,
            vertex_colors: true,
            ..PointsMaterial::default()
        };

        let scene = self.ctx.scene()?;
        let mut graph = scene.graph_mut();
        let group = graph.create(Node::group().named("galaxy"));
        let points = graph.add(
            group,
            Node::new(NodeKind::Points { geometry, material })
                .named("galaxy-points")
                .with_rotation(Quat::from_euler(EulerRot::XYZ, TILT_X, 0.0, TILT_Z)),
        )?;
        self.group = Some(group);
        self.points = Some(points);
        Ok(())
    }

    fn update(&mut self, time: f64) -> Result<(), BehaviourError> {
        let Some(points) = self.points else {
            return Ok(());
        };
        let time = time as f32;
        let scene = self.ctx.scene()?;
        let mut graph = scene.graph_mut();
        if let Some(node) = graph.get_mut(points) {
            node.transform.rotation =
                Quat::from_euler(EulerRot::XYZ, TILT_X, time * self.params.speed, TILT_Z);
            node.transform.scale.y = (time + self.params.breathing_distance).sin()
                * self.params.breathing_intensity;
        }
        Ok(())
    }

    fn export_as_scene_object(&self) -> Option<NodeId> {
        self.group
    }
}

/// The `Galaxy` scene object with default parameters.
pub fn galaxy() -> SceneObjectDef {
    galaxy_with(GalaxyParams::default())
}

pub fn galaxy_with(params: GalaxyParams) -> SceneObjectDef {
    SceneObjectDef::new("Galaxy").with("GalaxyParticle", move |ctx| {
        Ok(GalaxyParticle::new(ctx, params))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_behaviour::{SceneHandle, SceneObject};
    use std::rc::Rc;

    fn small() -> GalaxyParams {
        GalaxyParams {
            count: 300,
            ..GalaxyParams::default()
        }
    }

    #[test]
    fn geometry_is_deterministic_per_seed() {
        let a = galaxy_geometry(&small());
        let b = galaxy_geometry(&small());
        assert_eq!(a, b);
        assert_eq!(a.vertex_count(), 300);
        assert_eq!(a.colors.as_ref().map(Vec::len), Some(300));

        let c = galaxy_geometry(&GalaxyParams { seed: 7, ..small() });
        assert_ne!(a.positions, c.positions);
    }

    #[test]
    fn colors_blend_from_inner_to_outer() {
        let params = small();
        let geometry = galaxy_geometry(&params);
        let inner = Color::from_hex(params.inner_color).to_array();
        let outer = Color::from_hex(params.outer_color).to_array();
        for color in geometry.colors.unwrap() {
            for ch in 0..3 {
                let (lo, hi) = if inner[ch] < outer[ch] {
                    (inner[ch], outer[ch])
                } else {
                    (outer[ch], inner[ch])
                };
                assert!(color[ch] >= lo - 1e-5 && color[ch] <= hi + 1e-5);
            }
        }
    }

    #[test]
    fn zero_count_builds_empty_cloud() {
        let geometry = galaxy_geometry(&GalaxyParams { count: 0, ..small() });
        assert_eq!(geometry.vertex_count(), 0);
    }

    #[test]
    fn update_spins_and_breathes() {
        let scene = Rc::new(SceneHandle::default());
        let mut object = SceneObject::new(galaxy_with(small()), &scene);
        object.start().unwrap();
        let points = object
            .with_component::<GalaxyParticle, _>("GalaxyParticle", GalaxyParticle::points)
            .flatten()
            .unwrap();

        object.update(2.0).unwrap();
        let graph = scene.graph();
        let node = graph.get(points).unwrap();
        let expected = Quat::from_euler(EulerRot::XYZ, TILT_X, 0.4, TILT_Z);
        assert!(node.transform.rotation.angle_between(expected) < 1e-4);
        assert!((node.transform.scale.y - 7.0f32.sin() * 0.02).abs() < 1e-6);
        match &node.kind {
            NodeKind::Points { material, .. } => {
                assert!(material.additive_blending);
                assert!(!material.depth_write);
                assert_eq!(material.size, 0.02);
            }
            other => panic!("expected points, got {other:?}"),
        }
    }
}

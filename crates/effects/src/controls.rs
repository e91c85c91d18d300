use crate::pointer::DragTracker;
use glam::{Vec2, Vec3};
use lumen_behaviour::SceneHandle;
use lumen_render::PerspectiveCamera;
use std::f32::consts::PI;

/// Keeps the polar angle off the poles, where look-at degenerates.
const POLAR_EPSILON: f32 = 1e-6;

/// Orbits the camera around a target point in response to pointer drags.
///
/// Rotation carries momentum: each [`update`](Self::update) applies only a
/// `damping` fraction of the pending rotation and decays the rest.
#[derive(Debug)]
pub struct OrbitControls {
    pub target: Vec3,
    pub damping: f32,
    pub rotate_speed: f32,
    /// Pending (azimuth, polar) rotation in radians.
    delta: Vec2,
    drag: DragTracker,
}

impl OrbitControls {
    pub fn new(scene: &SceneHandle, target: Vec3) -> Self {
        Self {
            target,
            damping: 0.05,
            rotate_speed: 1.0,
            delta: Vec2::ZERO,
            drag: DragTracker::subscribe(scene),
        }
    }

    /// Queue a rotation, as a drag would.
    pub fn rotate(&mut self, azimuth: f32, polar: f32) {
        self.delta += Vec2::new(azimuth, polar);
    }

    /// Advance one frame and point `camera` at the target.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) {
        self.delta += self.drag.take() * self.rotate_speed;

        let offset = camera.position - self.target;
        let radius = offset.length();
        if radius > 0.0 {
            let mut azimuth = offset.x.atan2(offset.z);
            let mut polar = (offset.y / radius).clamp(-1.0, 1.0).acos();
            azimuth += self.delta.x * self.damping;
            polar = (polar + self.delta.y * self.damping).clamp(POLAR_EPSILON, PI - POLAR_EPSILON);

            let ring = radius * polar.sin();
            camera.position = self.target
                + Vec3::new(ring * azimuth.sin(), radius * polar.cos(), ring * azimuth.cos());
        }
        camera.look_at(self.target);
        self.delta *= 1.0 - self.damping;
    }
}

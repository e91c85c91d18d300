use glam::{Mat3, Quat, Vec3};
use std::f32::consts::FRAC_PI_2;

/// Linear interpolation between `a` and `b`. `t` is not clamped.
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    (1.0 - t) * a + t * b
}

/// Clamp `value` into `[min, max]`.
///
/// Unlike `f32::clamp` this never panics: with `min > max` the lower bound wins,
/// and NaN passes through unchanged.
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// Convert an angle in degrees to radians.
pub fn degrees_to_radians(degrees: f32) -> f32 {
    degrees * std::f32::consts::PI / 180.0
}

/// Sinusoidal ease-out over `t` in [0, 1].
pub fn ease_out_sine(t: f32) -> f32 {
    (t * FRAC_PI_2).sin()
}

/// Rotation that turns an object's +Z axis from `from` toward `to`, keeping +Y up.
pub fn look_rotation(from: Vec3, to: Vec3) -> Quat {
    let mut z = to - from;
    if z.length_squared() == 0.0 {
        z = Vec3::Z;
    }
    let mut z = z.normalize();
    let mut x = Vec3::Y.cross(z);
    if x.length_squared() == 0.0 {
        // Looking straight up or down: nudge off the pole.
        z.z += 0.0001;
        z = z.normalize();
        x = Vec3::Y.cross(z);
    }
    let x = x.normalize();
    let y = z.cross(x);
    Quat::from_mat3(&Mat3::from_cols(x, y, z))
}

/// A single-property animation that can be seeked to any point in time.
///
/// Times are in milliseconds. Seeking past either end clamps to that end.
#[derive(Debug, Clone, Copy)]
pub struct Tween {
    pub from: f32,
    pub to: f32,
    pub duration_ms: f32,
    pub easing: fn(f32) -> f32,
}

impl Tween {
    pub fn new(from: f32, to: f32, duration_ms: f32) -> Self {
        Self {
            from,
            to,
            duration_ms,
            easing: ease_out_sine,
        }
    }

    /// Value of the animated property at `time_ms`.
    pub fn seek(&self, time_ms: f32) -> f32 {
        let progress = if self.duration_ms <= 0.0 {
            1.0
        } else {
            clamp(time_ms / self.duration_ms, 0.0, 1.0)
        };
        self.from + (self.to - self.from) * (self.easing)(progress)
    }
}

/// A half-line: `origin + t * direction` for `t >= 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Distance along the ray to `plane`, or `None` when the plane is parallel
    /// to the ray or behind its origin.
    pub fn distance_to_plane(&self, plane: &Plane) -> Option<f32> {
        let denominator = plane.normal.dot(self.direction);
        if denominator == 0.0 {
            if plane.distance_to_point(self.origin) == 0.0 {
                return Some(0.0);
            }
            return None;
        }
        let t = -(self.origin.dot(plane.normal) + plane.constant) / denominator;
        (t >= 0.0).then_some(t)
    }

    pub fn intersect_plane(&self, plane: &Plane) -> Option<Vec3> {
        self.distance_to_plane(plane).map(|t| self.at(t))
    }
}

/// The set of points `p` where `normal . p + constant == 0`.
///
/// The normal is stored as given; callers that need true distances should
/// pass a unit normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub constant: f32,
}

impl Plane {
    pub fn new(normal: Vec3, constant: f32) -> Self {
        Self { normal, constant }
    }

    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.constant
    }
}

/// Deterministic pseudo-random source built on splitmix64.
///
/// Given the same seed, the sequence is identical across platforms.
#[derive(Debug, Clone)]
pub struct SeededRng {
    state: u64,
}

impl SeededRng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^ (z >> 31)
    }

    /// Uniform sample in `[0, 1)`.
    pub fn next_f32(&mut self) -> f32 {
        // 24 high bits fill the f32 mantissa exactly.
        (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32
    }

    /// `1.0` or `-1.0` with equal probability.
    pub fn next_sign(&mut self) -> f32 {
        if self.next_f32() < 0.5 { 1.0 } else { -1.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lerp_endpoints_and_midpoint() {
        assert_eq!(lerp(2.0, 4.0, 0.0), 2.0);
        assert_eq!(lerp(2.0, 4.0, 1.0), 4.0);
        assert_eq!(lerp(2.0, 4.0, 0.5), 3.0);
    }

    #[test]
    fn clamp_bounds() {
        assert_eq!(clamp(5.0, -1.0, 1.0), 1.0);
        assert_eq!(clamp(-5.0, -1.0, 1.0), -1.0);
        assert_eq!(clamp(0.25, -1.0, 1.0), 0.25);
        // Inverted bounds do not panic.
        assert_eq!(clamp(0.0, 1.0, -1.0), 1.0);
    }

    #[test]
    fn degrees_to_radians_half_turn() {
        assert!((degrees_to_radians(180.0) - std::f32::consts::PI).abs() < 1e-6);
    }

    #[test]
    fn look_rotation_points_z_at_target() {
        let q = look_rotation(Vec3::ZERO, Vec3::new(3.0, 0.0, 0.0));
        let z = q * Vec3::Z;
        assert!((z - Vec3::X).length() < 1e-5);
        let q = look_rotation(Vec3::ZERO, Vec3::new(0.0, 5.0, 0.0));
        assert!(((q * Vec3::Z).y - 1.0).abs() < 1e-3);
        assert!(look_rotation(Vec3::ONE, Vec3::ONE).is_finite());
    }

    #[test]
    fn tween_clamps_and_eases() {
        let tween = Tween::new(0.0, 10.0, 500.0);
        assert_eq!(tween.seek(-100.0), 0.0);
        assert_eq!(tween.seek(0.0), 0.0);
        assert!((tween.seek(500.0) - 10.0).abs() < 1e-5);
        assert!((tween.seek(10_000.0) - 10.0).abs() < 1e-5);
        // Ease-out runs ahead of linear at the midpoint.
        assert!(tween.seek(250.0) > 5.0);
    }

    #[test]
    fn zero_duration_tween_jumps_to_end() {
        let tween = Tween::new(1.0, 2.0, 0.0);
        assert_eq!(tween.seek(0.0), 2.0);
    }

    #[test]
    fn ray_hits_plane_in_front() {
        let ray = Ray::new(Vec3::new(0.0, 5.0, 0.0), Vec3::NEG_Y);
        let plane = Plane::new(Vec3::Y, 0.0);
        let hit = ray.intersect_plane(&plane).unwrap();
        assert!((hit - Vec3::ZERO).length() < 1e-6);
    }

    #[test]
    fn ray_misses_plane_behind_or_parallel() {
        let plane = Plane::new(Vec3::Y, 0.0);
        let away = Ray::new(Vec3::new(0.0, 5.0, 0.0), Vec3::Y);
        assert!(away.intersect_plane(&plane).is_none());
        let parallel = Ray::new(Vec3::new(0.0, 5.0, 0.0), Vec3::X);
        assert!(parallel.intersect_plane(&plane).is_none());
        let on_plane = Ray::new(Vec3::ZERO, Vec3::X);
        assert_eq!(on_plane.distance_to_plane(&plane), Some(0.0));
    }

    #[test]
    fn plane_constant_offsets_surface() {
        // y + 0.01 = 0 puts the surface just below the origin.
        let plane = Plane::new(Vec3::Y, 0.01);
        let ray = Ray::new(Vec3::new(0.0, 1.0, 0.0), Vec3::NEG_Y);
        let hit = ray.intersect_plane(&plane).unwrap();
        assert!((hit.y + 0.01).abs() < 1e-6);
    }

    #[test]
    fn seeded_rng_is_deterministic() {
        let mut a = SeededRng::new(42);
        let mut b = SeededRng::new(42);
        for _ in 0..100 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
        let mut c = SeededRng::new(43);
        assert_ne!(SeededRng::new(42).next_u64(), c.next_u64());
    }

    #[test]
    fn seeded_rng_unit_range() {
        let mut rng = SeededRng::new(7);
        for _ in 0..1000 {
            let v = rng.next_f32();
            assert!((0.0..1.0).contains(&v));
            assert!(rng.next_sign().abs() == 1.0);
        }
    }
}

use lumen_common::Color;
use std::f32::consts::PI;

/// Omnidirectional light emitted from a single point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub color: Color,
    pub intensity: f32,
    /// Cutoff distance; `0.0` means unbounded.
    pub distance: f32,
    pub decay: f32,
}

impl PointLight {
    pub fn new(color: Color, intensity: f32, distance: f32, decay: f32) -> Self {
        Self {
            color,
            intensity,
            distance,
            decay,
        }
    }

    /// Luminous power in lumens: `intensity * 4π`.
    pub fn power(&self) -> f32 {
        self.intensity * 4.0 * PI
    }

    pub fn set_power(&mut self, power: f32) {
        self.intensity = power / (4.0 * PI);
    }
}

impl Default for PointLight {
    fn default() -> Self {
        Self::new(Color::WHITE, 1.0, 0.0, 2.0)
    }
}

/// Ambient light fading from a sky color above to a ground color below.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HemisphereLight {
    pub sky_color: Color,
    pub ground_color: Color,
    pub intensity: f32,
}

impl HemisphereLight {
    pub fn new(sky_color: Color, ground_color: Color, intensity: f32) -> Self {
        Self {
            sky_color,
            ground_color,
            intensity,
        }
    }
}

use glam::{Vec2, Vec3};
use lumen_common::Color;
use std::collections::BTreeMap;

/// A named shader input value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Uniform {
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Color(Color),
}

impl Uniform {
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Uniform::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_vec3(&self) -> Option<Vec3> {
        match self {
            Uniform::Vec3(v) => Some(*v),
            _ => None,
        }
    }
}

/// Vertex and fragment source text. The graph treats both as opaque.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderProgram {
    pub vertex: String,
    pub fragment: String,
}

/// Custom-shaded surface with a uniform table.
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderMaterial {
    pub program: ShaderProgram,
    pub uniforms: BTreeMap<String, Uniform>,
    pub double_sided: bool,
    pub transparent: bool,
    /// Whether scene lights feed into the shader.
    pub lights: bool,
}

impl ShaderMaterial {
    pub fn new(program: ShaderProgram) -> Self {
        Self {
            program,
            uniforms: BTreeMap::new(),
            double_sided: false,
            transparent: false,
            lights: false,
        }
    }

    pub fn with_uniform(mut self, name: &str, value: Uniform) -> Self {
        self.uniforms.insert(name.to_string(), value);
        self
    }

    /// Overwrite a uniform. Unknown names are inserted.
    pub fn set(&mut self, name: &str, value: Uniform) {
        self.uniforms.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<Uniform> {
        self.uniforms.get(name).copied()
    }
}

/// Material for point clouds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointsMaterial {
    pub size: f32,
    pub size_attenuation: bool,
    pub depth_write: bool,
    pub additive_blending: bool,
    pub vertex_colors: bool,
    pub color: Color,
}

impl Default for PointsMaterial {
    fn default() -> Self {
        Self {
            size: 1.0,
            size_attenuation: true,
            depth_write: true,
            additive_blending: false,
            vertex_colors: false,
            color: Color::WHITE,
        }
    }
}

/// Surface material for meshes and line segments.
#[derive(Debug, Clone, PartialEq)]
pub enum Material {
    Basic { color: Color },
    Normal,
    Shader(ShaderMaterial),
}

impl Material {
    /// Flat color a simple rasterizer can use for this material.
    pub fn display_color(&self) -> Color {
        match self {
            Material::Basic { color } => *color,
            Material::Normal => Color::new(0.5, 0.5, 1.0),
            Material::Shader(shader) => match shader.get("uSurfaceColor") {
                Some(Uniform::Color(c)) => c,
                _ => Color::WHITE,
            },
        }
    }

    pub fn as_shader_mut(&mut self) -> Option<&mut ShaderMaterial> {
        match self {
            Material::Shader(shader) => Some(shader),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn program() -> ShaderProgram {
        ShaderProgram {
            vertex: "void main() {}".into(),
            fragment: "void main() {}".into(),
        }
    }

    #[test]
    fn uniforms_set_and_get() {
        let mut mat = ShaderMaterial::new(program()).with_uniform("uTime", Uniform::Float(0.0));
        mat.set("uTime", Uniform::Float(2.5));
        assert_eq!(mat.get("uTime").and_then(|u| u.as_float()), Some(2.5));
        assert!(mat.get("uMissing").is_none());
    }

    #[test]
    fn shader_display_color_uses_surface_uniform() {
        let surface = Color::from_hex(0x60a1c4);
        let mat = Material::Shader(
            ShaderMaterial::new(program()).with_uniform("uSurfaceColor", Uniform::Color(surface)),
        );
        assert_eq!(mat.display_color(), surface);
        assert_eq!(
            Material::Shader(ShaderMaterial::new(program())).display_color(),
            Color::WHITE
        );
    }
}

/// Vertex stage shared by both pipelines.
pub const VERTEX_ENTRY: &str = "vs_main";
/// Fragment stage for line lists: the vertex color as is.
pub const LINE_FRAGMENT_ENTRY: &str = "fs_line";
/// Fragment stage for point lists: fades points with distance from the eye.
pub const POINT_FRAGMENT_ENTRY: &str = "fs_point";

/// WGSL for flattened scene geometry.
///
/// `frame.eye.xyz` is the camera position; `frame.eye.w` is the distance at
/// which points have faded out completely (0 disables the fade).
pub const COLOR_SHADER: &str = r#"
struct Frame {
    view_proj: mat4x4<f32>,
    eye: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> frame: Frame;

struct WorldVertex {
    @location(0) position: vec3<f32>,
    @location(1) color: vec4<f32>,
};

struct Fragment {
    @builtin(position) clip: vec4<f32>,
    @location(0) color: vec4<f32>,
    @location(1) eye_distance: f32,
};

@vertex
fn vs_main(v: WorldVertex) -> Fragment {
    var out: Fragment;
    out.clip = frame.view_proj * vec4<f32>(v.position, 1.0);
    out.color = v.color;
    out.eye_distance = distance(v.position, frame.eye.xyz);
    return out;
}

@fragment
fn fs_line(f: Fragment) -> @location(0) vec4<f32> {
    return f.color;
}

@fragment
fn fs_point(f: Fragment) -> @location(0) vec4<f32> {
    let reach = frame.eye.w;
    let fade = select(1.0, 1.0 - smoothstep(0.5 * reach, reach, f.eye_distance), reach > 0.0);
    return vec4<f32>(f.color.rgb, f.color.a * fade);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_entry_points_exist() {
        for entry in [VERTEX_ENTRY, LINE_FRAGMENT_ENTRY, POINT_FRAGMENT_ENTRY] {
            assert!(COLOR_SHADER.contains(&format!("fn {entry}(")), "{entry}");
        }
    }
}

use crate::flatten::{ColorVertex, clear_color, flatten};
use crate::shaders;
use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use lumen_common::Size;
use lumen_graph::SceneGraph;
use lumen_render::{PerspectiveCamera, RenderBackend, RenderError, RendererOptions};
use wgpu::util::DeviceExt;

const MSAA_SAMPLES: u32 = 4;
const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
/// Points this far from the camera are fully faded out.
const POINT_FADE_DISTANCE: f32 = 40.0;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
    eye: [f32; 4],
}

impl Uniforms {
    fn for_camera(camera: &PerspectiveCamera) -> Self {
        let p = camera.position;
        Self {
            view_proj: camera.view_projection().to_cols_array_2d(),
            eye: [p.x, p.y, p.z, POINT_FADE_DISTANCE],
        }
    }
}

/// A configured presentation surface and the device that drives it.
pub struct GpuSurface {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub surface: wgpu::Surface<'static>,
    pub config: wgpu::SurfaceConfiguration,
    alpha_modes: Vec<wgpu::CompositeAlphaMode>,
}

impl GpuSurface {
    /// Pick an adapter for `surface`, open a device and configure the surface.
    pub async fn new(
        instance: &wgpu::Instance,
        surface: wgpu::Surface<'static>,
        width: u32,
        height: u32,
    ) -> Result<Self, RenderError> {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("lumen_device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
            .map_err(|e| RenderError::Device(e.to_string()))?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first())
            .copied()
            .ok_or_else(|| RenderError::Surface("surface reports no formats".into()))?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        tracing::info!(
            backend = adapter.get_info().backend.to_str(),
            ?format,
            "GPU initialized"
        );
        Ok(Self {
            device,
            queue,
            surface,
            config,
            alpha_modes: caps.alpha_modes,
        })
    }

    fn configure(&mut self, width: u32, height: u32) {
        self.config.width = width.max(1);
        self.config.height = height.max(1);
        self.surface.configure(&self.device, &self.config);
    }

    /// Switch to a compositing mode that honours framebuffer alpha, if the
    /// surface offers one.
    fn enable_transparency(&mut self) {
        let preferred = [
            wgpu::CompositeAlphaMode::PreMultiplied,
            wgpu::CompositeAlphaMode::PostMultiplied,
            wgpu::CompositeAlphaMode::Inherit,
        ];
        match preferred.into_iter().find(|m| self.alpha_modes.contains(m)) {
            Some(mode) => {
                self.config.alpha_mode = mode;
                self.surface.configure(&self.device, &self.config);
            }
            None => tracing::warn!("surface cannot composite with alpha; clearing transparent anyway"),
        }
    }
}

/// A vertex buffer that grows to fit the largest upload seen so far.
struct VertexBuffer {
    label: &'static str,
    buffer: wgpu::Buffer,
    capacity: u64,
    len: u32,
}

impl VertexBuffer {
    fn new(device: &wgpu::Device, label: &'static str) -> Self {
        let capacity = 1024 * std::mem::size_of::<ColorVertex>() as u64;
        Self {
            label,
            buffer: Self::allocate(device, label, capacity),
            capacity,
            len: 0,
        }
    }

    fn allocate(device: &wgpu::Device, label: &'static str, size: u64) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, vertices: &[ColorVertex]) {
        let bytes: &[u8] = bytemuck::cast_slice(vertices);
        let needed = bytes.len() as u64;
        if needed > self.capacity {
            self.capacity = needed.next_power_of_two();
            self.buffer = Self::allocate(device, self.label, self.capacity);
            tracing::debug!(buffer = self.label, bytes = self.capacity, "grew vertex buffer");
        }
        if !bytes.is_empty() {
            queue.write_buffer(&self.buffer, 0, bytes);
        }
        self.len = vertices.len() as u32;
    }
}

struct Targets {
    depth: wgpu::TextureView,
    msaa: Option<wgpu::TextureView>,
}

impl Targets {
    fn new(device: &wgpu::Device, config: &wgpu::SurfaceConfiguration, samples: u32) -> Self {
        let texture = |label, format, sample_count| {
            device
                .create_texture(&wgpu::TextureDescriptor {
                    label: Some(label),
                    size: wgpu::Extent3d {
                        width: config.width.max(1),
                        height: config.height.max(1),
                        depth_or_array_layers: 1,
                    },
                    mip_level_count: 1,
                    sample_count,
                    dimension: wgpu::TextureDimension::D2,
                    format,
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                    view_formats: &[],
                })
                .create_view(&Default::default())
        };
        Self {
            depth: texture("depth_texture", DEPTH_FORMAT, samples),
            msaa: (samples > 1).then(|| texture("msaa_texture", config.format, samples)),
        }
    }
}

/// Everything the backend allocates on the GPU. Dropped on dispose.
struct GpuState {
    gpu: GpuSurface,
    point_pipeline: wgpu::RenderPipeline,
    line_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    points: VertexBuffer,
    lines: VertexBuffer,
    targets: Targets,
    samples: u32,
}

fn additive_blend() -> wgpu::BlendState {
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::SrcAlpha,
            dst_factor: wgpu::BlendFactor::One,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent::OVER,
    }
}

struct PipelineSpec {
    label: &'static str,
    topology: wgpu::PrimitiveTopology,
    fragment_entry: &'static str,
    blend: wgpu::BlendState,
    depth_write: bool,
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    samples: u32,
    spec: PipelineSpec,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(spec.label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some(shaders::VERTEX_ENTRY),
            compilation_options: Default::default(),
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<ColorVertex>() as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &wgpu::vertex_attr_array![
                    0 => Float32x3,
                    1 => Float32x4,
                ],
            }],
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(spec.fragment_entry),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(spec.blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: spec.topology,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: spec.depth_write,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: Default::default(),
            bias: Default::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: samples,
            ..Default::default()
        },
        multiview: None,
        cache: None,
    })
}

impl GpuState {
    fn new(gpu: GpuSurface, samples: u32) -> Self {
        let device = &gpu.device;
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("uniform_buffer"),
            contents: bytemuck::bytes_of(&Uniforms {
                view_proj: Mat4::IDENTITY.to_cols_array_2d(),
                eye: [0.0; 4],
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uniform_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("uniform_bind_group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("color_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::COLOR_SHADER.into()),
        });

        let format = gpu.config.format;
        let point_pipeline = create_pipeline(
            device,
            &layout,
            &shader,
            format,
            samples,
            PipelineSpec {
                label: "point_pipeline",
                topology: wgpu::PrimitiveTopology::PointList,
                fragment_entry: shaders::POINT_FRAGMENT_ENTRY,
                blend: additive_blend(),
                depth_write: false,
            },
        );
        let line_pipeline = create_pipeline(
            device,
            &layout,
            &shader,
            format,
            samples,
            PipelineSpec {
                label: "line_pipeline",
                topology: wgpu::PrimitiveTopology::LineList,
                fragment_entry: shaders::LINE_FRAGMENT_ENTRY,
                blend: wgpu::BlendState::ALPHA_BLENDING,
                depth_write: true,
            },
        );

        let points = VertexBuffer::new(device, "point_vertex_buffer");
        let lines = VertexBuffer::new(device, "line_vertex_buffer");
        let targets = Targets::new(device, &gpu.config, samples);

        Self {
            gpu,
            point_pipeline,
            line_pipeline,
            uniform_buffer,
            uniform_bind_group,
            points,
            lines,
            targets,
            samples,
        }
    }

    fn resize(&mut self, size: Size) {
        self.gpu.configure(size.width, size.height);
        self.targets = Targets::new(&self.gpu.device, &self.gpu.config, self.samples);
    }

    fn draw(
        &mut self,
        graph: &SceneGraph,
        camera: &PerspectiveCamera,
        alpha: bool,
    ) -> Result<(), RenderError> {
        let output = match self.gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                tracing::debug!("surface lost or outdated; reconfiguring");
                self.gpu.surface.configure(&self.gpu.device, &self.gpu.config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                tracing::warn!("surface timed out; skipping frame");
                return Ok(());
            }
            Err(e) => return Err(RenderError::Surface(e.to_string())),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let frame = flatten(graph);
        let (device, queue) = (&self.gpu.device, &self.gpu.queue);
        queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&Uniforms::for_camera(camera)),
        );
        self.lines.upload(device, queue, &frame.lines);
        self.points.upload(device, queue, &frame.points);

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render_encoder"),
        });

        {
            let (target, resolve_target) = match &self.targets.msaa {
                Some(msaa) => (msaa, Some(&view)),
                None => (&view, None),
            };
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_color(alpha)),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.targets.depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            pass.set_bind_group(0, &self.uniform_bind_group, &[]);

            // Opaque lines first so additive points blend over them.
            if self.lines.len > 0 {
                pass.set_pipeline(&self.line_pipeline);
                pass.set_vertex_buffer(0, self.lines.buffer.slice(..));
                pass.draw(0..self.lines.len, 0..1);
            }
            if self.points.len > 0 {
                pass.set_pipeline(&self.point_pipeline);
                pass.set_vertex_buffer(0, self.points.buffer.slice(..));
                pass.draw(0..self.points.len, 0..1);
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
        output.present();
        tracing::trace!(
            points = frame.points.len(),
            line_vertices = frame.lines.len(),
            "frame presented"
        );
        Ok(())
    }
}

/// GPU backend presenting to a window surface.
pub struct WgpuBackend {
    state: Option<GpuState>,
    size: Size,
    alpha: bool,
}

impl WgpuBackend {
    pub fn is_disposed(&self) -> bool {
        self.state.is_none()
    }

    pub fn surface_format(&self) -> Option<wgpu::TextureFormat> {
        self.state.as_ref().map(|s| s.gpu.config.format)
    }
}

impl RenderBackend for WgpuBackend {
    type Surface = GpuSurface;

    fn create(mut options: RendererOptions<GpuSurface>) -> Result<Self, RenderError> {
        let mut gpu = options.require_surface()?;
        if options.alpha {
            gpu.enable_transparency();
        }
        let size = Size::new(gpu.config.width, gpu.config.height);
        let samples = if options.antialias { MSAA_SAMPLES } else { 1 };
        tracing::debug!(samples, alpha = options.alpha, "creating wgpu backend");
        Ok(Self {
            state: Some(GpuState::new(gpu, samples)),
            size,
            alpha: options.alpha,
        })
    }

    fn set_size(&mut self, size: Size) {
        self.size = size;
        if let Some(state) = self.state.as_mut() {
            state.resize(size);
        }
    }

    fn size(&self) -> Size {
        self.size
    }

    fn render(&mut self, graph: &SceneGraph, camera: &PerspectiveCamera) -> Result<(), RenderError> {
        let state = self
            .state
            .as_mut()
            .ok_or_else(|| RenderError::Surface("surface was disposed".into()))?;
        state.draw(graph, camera, self.alpha)
    }

    fn dispose(&mut self) {
        if self.state.take().is_some() {
            tracing::debug!("wgpu backend disposed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn uniforms_carry_eye_and_fade_distance() {
        let camera = PerspectiveCamera::default().with_position(Vec3::new(1.0, 2.0, 3.0));
        let uniforms = Uniforms::for_camera(&camera);
        assert_eq!(uniforms.eye, [1.0, 2.0, 3.0, POINT_FADE_DISTANCE]);
        assert_eq!(uniforms.view_proj, camera.view_projection().to_cols_array_2d());
        // mat4 plus vec4, matching the WGSL `Frame` layout.
        assert_eq!(std::mem::size_of::<Uniforms>(), 80);
    }
}

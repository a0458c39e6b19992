//! wgpu back-end.
//!
//! Headless: renders into an internal frame target and caller-created render
//! textures; surface presentation is the application's concern.

use crate::gr::{
    BaseTexture, ClassId, Context, ContextObject, GraphicsConfig, GraphicsError, Id, Name,
    Platform, Primitive, RenderTexture, Shader, Statistics, SurfaceFormat, TextureData,
};
use crate::math::{Color, Vector3};
use std::any::Any;
use std::cell::Cell;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, Weak};
use wgpu::util::DeviceExt;

/// Uniform block bound to every fullscreen stage.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct StageUniform {
    /// Free stage parameters (intensity, trail factor, ...).
    params: [f32; 4],
    /// Resolution (width, height, 1/width, 1/height).
    resolution: [f32; 4],
}

/// Vertex for the fullscreen quad (position + uv).
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct QuadVertex {
    position: [f32; 2],
    uv: [f32; 2],
}

impl QuadVertex {
    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x2,
                    offset: 0,
                    shader_location: 0,
                },
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x2,
                    offset: 8,
                    shader_location: 1,
                },
            ],
        }
    }
}

/// Fullscreen quad vertices (two triangles).
const QUAD_VERTICES: [QuadVertex; 6] = [
    QuadVertex { position: [-1.0, -1.0], uv: [0.0, 1.0] },
    QuadVertex { position: [1.0, -1.0], uv: [1.0, 1.0] },
    QuadVertex { position: [1.0, 1.0], uv: [1.0, 0.0] },
    QuadVertex { position: [-1.0, -1.0], uv: [0.0, 1.0] },
    QuadVertex { position: [1.0, 1.0], uv: [1.0, 0.0] },
    QuadVertex { position: [-1.0, 1.0], uv: [0.0, 0.0] },
];

fn surface_to_wgpu(format: SurfaceFormat) -> Result<wgpu::TextureFormat, GraphicsError> {
    match format {
        SurfaceFormat::R8G8B8A8 => Ok(wgpu::TextureFormat::Rgba8Unorm),
        other => Err(GraphicsError::UnsupportedFormat(other.name())),
    }
}

/// A sampled GPU texture.
pub struct GpuTexture {
    id: Id,
    width: u32,
    height: u32,
    format: SurfaceFormat,
    #[allow(dead_code)]
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    valid: Cell<bool>,
}

impl GpuTexture {
    /// The wgpu texture view.
    #[inline]
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }
}

impl ContextObject for GpuTexture {
    fn class_id(&self) -> ClassId {
        ClassId::Texture
    }

    fn id(&self) -> Id {
        self.id
    }

    fn invalidate(&self) {
        self.valid.set(false);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl BaseTexture for GpuTexture {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn format(&self) -> SurfaceFormat {
        self.format
    }
}

/// A render-target-capable GPU texture.
pub struct GpuRenderTexture {
    id: Id,
    width: u32,
    height: u32,
    format: SurfaceFormat,
    #[allow(dead_code)]
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    valid: Cell<bool>,
}

impl GpuRenderTexture {
    fn new(
        device: &wgpu::Device,
        width: u32,
        height: u32,
        format: SurfaceFormat,
        label: &str,
    ) -> Result<Self, GraphicsError> {
        let wgpu_format = surface_to_wgpu(format)?;
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu_format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Ok(Self {
            id: Id::new(),
            width,
            height,
            format,
            texture,
            view,
            valid: Cell::new(true),
        })
    }

    /// The wgpu texture view.
    #[inline]
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }
}

impl ContextObject for GpuRenderTexture {
    fn class_id(&self) -> ClassId {
        ClassId::Texture
    }

    fn id(&self) -> Id {
        self.id
    }

    fn invalidate(&self) {
        self.valid.set(false);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl BaseTexture for GpuRenderTexture {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn format(&self) -> SurfaceFormat {
        self.format
    }
}

impl RenderTexture for GpuRenderTexture {}

/// An indexed triangle-list primitive resident in GPU buffers.
pub struct GpuPrimitive {
    id: Id,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    vertex_count: u32,
    index_count: u32,
}

impl ContextObject for GpuPrimitive {
    fn class_id(&self) -> ClassId {
        ClassId::Primitive
    }

    fn id(&self) -> Id {
        self.id
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Primitive for GpuPrimitive {
    fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    fn triangle_count(&self) -> u32 {
        self.index_count / 3
    }
}

/// State captured from the most recently applied shader.
#[derive(Default)]
struct AppliedShader {
    technique: Option<Name>,
    params: [f32; 4],
    source: Option<Arc<dyn BaseTexture>>,
}

/// wgpu rendering context.
pub struct GpuContext {
    #[allow(dead_code)]
    instance: wgpu::Instance,
    #[allow(dead_code)]
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
    width: u32,
    height: u32,
    clear_color: wgpu::Color,
    frame: Arc<GpuRenderTexture>,
    stats: Statistics,
    in_scene: bool,
    encoder: Option<wgpu::CommandEncoder>,
    current_target: Option<Arc<dyn RenderTexture>>,
    applied: AppliedShader,
    sampler: wgpu::Sampler,
    bind_group_layout: wgpu::BindGroupLayout,
    quad_buffer: wgpu::Buffer,
    fullscreen_pipelines: HashMap<&'static str, wgpu::RenderPipeline>,
    flat_pipeline: wgpu::RenderPipeline,
    live: Vec<Weak<dyn ContextObject>>,
}

impl GpuContext {
    /// Request an adapter and device and build the context.
    pub async fn request(config: &GraphicsConfig) -> Result<Self, GraphicsError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: if config.high_performance {
                    wgpu::PowerPreference::HighPerformance
                } else {
                    wgpu::PowerPreference::LowPower
                },
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GraphicsError::AdapterRequest)?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("hgr device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_webgl2_defaults()
                        .using_resolution(adapter.limits()),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        log::debug!("created wgpu context on {}", adapter.get_info().name);

        let frame = Arc::new(GpuRenderTexture::new(
            &device,
            config.width,
            config.height,
            SurfaceFormat::R8G8B8A8,
            "hgr frame target",
        )?);

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("hgr stage sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("hgr stage bind group layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let quad_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("hgr quad buffer"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let format = wgpu::TextureFormat::Rgba8Unorm;
        let fullscreen_pipelines = Self::build_fullscreen_pipelines(&device, &bind_group_layout, format);
        let flat_pipeline = Self::build_flat_pipeline(&device, format);

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
            width: config.width,
            height: config.height,
            clear_color: wgpu::Color {
                r: config.clear_color.r as f64,
                g: config.clear_color.g as f64,
                b: config.clear_color.b as f64,
                a: 1.0,
            },
            frame,
            stats: Statistics::default(),
            in_scene: false,
            encoder: None,
            current_target: None,
            applied: AppliedShader::default(),
            sampler,
            bind_group_layout,
            quad_buffer,
            fullscreen_pipelines,
            flat_pipeline,
            live: Vec::new(),
        })
    }

    /// Blocking convenience wrapper around [`request`](GpuContext::request).
    pub fn new(config: &GraphicsConfig) -> Result<Self, GraphicsError> {
        pollster::block_on(Self::request(config))
    }

    /// The internal frame target this context renders to when no render
    /// target is bound.
    #[inline]
    pub fn frame_target(&self) -> &Arc<GpuRenderTexture> {
        &self.frame
    }

    fn build_fullscreen_pipelines(
        device: &wgpu::Device,
        bind_group_layout: &wgpu::BindGroupLayout,
        format: wgpu::TextureFormat,
    ) -> HashMap<&'static str, wgpu::RenderPipeline> {
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("hgr stage pipeline layout"),
            bind_group_layouts: &[bind_group_layout],
            push_constant_ranges: &[],
        });

        let additive = wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent::OVER,
        };
        let trail = wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent::OVER,
        };

        let stages: [(&'static str, &str, Option<wgpu::BlendState>); 5] = [
            ("Default", COPY_SHADER, None),
            ("Downsample", DOWNSAMPLE_SHADER, None),
            ("BlurH", BLUR_H_SHADER, None),
            ("BlurV", BLUR_V_SHADER, Some(trail)),
            ("Combine", COMBINE_SHADER, Some(additive)),
        ];

        let mut pipelines = HashMap::new();
        for (name, source, blend) in stages {
            let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(name),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            });
            let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(name),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: &module,
                    entry_point: Some("vs_main"),
                    buffers: &[QuadVertex::layout()],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &module,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState::default(),
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            });
            pipelines.insert(name, pipeline);
        }
        pipelines
    }

    fn build_flat_pipeline(device: &wgpu::Device, format: wgpu::TextureFormat) -> wgpu::RenderPipeline {
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("hgr flat shader"),
            source: wgpu::ShaderSource::Wgsl(FLAT_SHADER.into()),
        });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("hgr flat pipeline layout"),
            bind_group_layouts: &[],
            push_constant_ranges: &[],
        });
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("hgr flat pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &module,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<Vector3>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &[wgpu::VertexAttribute {
                        format: wgpu::VertexFormat::Float32x3,
                        offset: 0,
                        shader_location: 0,
                    }],
                }],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &module,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    }

    fn texture_view(texture: &dyn BaseTexture) -> Option<&wgpu::TextureView> {
        if let Some(texture) = texture.as_any().downcast_ref::<GpuTexture>() {
            return Some(texture.view());
        }
        if let Some(texture) = texture.as_any().downcast_ref::<GpuRenderTexture>() {
            return Some(texture.view());
        }
        None
    }

    fn register(&mut self, object: Weak<dyn ContextObject>) {
        self.live.push(object);
    }
}

impl Context for GpuContext {
    fn platform(&self) -> Platform {
        Platform::Wgpu
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn begin_scene(&mut self) {
        assert!(!self.in_scene, "begin_scene inside an open scene");
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("hgr frame encoder"),
            });
        // Clear the frame target at the top of the frame.
        drop(encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("hgr clear pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: self.frame.view(),
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.clear_color),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        }));
        self.encoder = Some(encoder);
        self.in_scene = true;
    }

    fn end_scene(&mut self) {
        assert!(self.in_scene, "end_scene without begin_scene");
        if let Some(encoder) = self.encoder.take() {
            self.queue.submit(std::iter::once(encoder.finish()));
        }
        self.in_scene = false;
    }

    fn set_render_target(&mut self, target: Option<&Arc<dyn RenderTexture>>) {
        if let Some(target) = target {
            debug_assert!(
                target.as_any().is::<GpuRenderTexture>(),
                "render target was not created by a wgpu context"
            );
        }
        self.current_target = target.cloned();
        self.stats.state_changes += 1;
    }

    fn clear_render_target(&mut self, color: Color) {
        assert!(self.in_scene, "clear outside begin_scene/end_scene");
        self.stats.state_changes += 1;
        let view = match &self.current_target {
            Some(target) => target
                .as_any()
                .downcast_ref::<GpuRenderTexture>()
                .expect("render target was not created by a wgpu context")
                .view(),
            None => self.frame.view(),
        };
        let encoder = self.encoder.as_mut().expect("scene encoder");
        drop(encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("hgr target clear pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: color.r as f64,
                        g: color.g as f64,
                        b: color.b as f64,
                        a: 1.0,
                    }),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        }));
    }

    fn apply_shader(&mut self, shader: &Shader) {
        self.applied = AppliedShader {
            technique: Some(*shader.technique()),
            params: shader
                .vector("params")
                .map(|v| v.to_array())
                .unwrap_or([0.0; 4]),
            source: shader.texture("source").cloned(),
        };
        self.stats.state_changes += 1;
    }

    fn draw_primitive(&mut self, primitive: &dyn Primitive) {
        assert!(self.in_scene, "draw outside begin_scene/end_scene");
        let Some(primitive) = primitive.as_any().downcast_ref::<GpuPrimitive>() else {
            debug_assert!(false, "primitive was not created by a wgpu context");
            return;
        };
        self.stats.draw_calls += 1;
        self.stats.triangles += primitive.triangle_count();

        let view = match &self.current_target {
            Some(target) => target
                .as_any()
                .downcast_ref::<GpuRenderTexture>()
                .expect("render target was not created by a wgpu context")
                .view(),
            None => self.frame.view(),
        };
        let encoder = self.encoder.as_mut().expect("scene encoder");
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("hgr geometry pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(&self.flat_pipeline);
        pass.set_vertex_buffer(0, primitive.vertex_buffer.slice(..));
        pass.set_index_buffer(primitive.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
        pass.draw_indexed(0..primitive.index_count, 0, 0..1);
    }

    fn draw_fullscreen(&mut self, shader: &Shader) {
        assert!(self.in_scene, "draw outside begin_scene/end_scene");
        self.apply_shader(shader);

        let Some(technique) = self.applied.technique else { return };
        let Some(pipeline) = self.fullscreen_pipelines.get(technique.as_str()) else {
            log::warn!("unknown fullscreen technique \"{}\", skipping stage", technique);
            return;
        };
        let Some(source) = self.applied.source.clone() else {
            log::warn!("fullscreen stage \"{}\" has no source texture, skipping", technique);
            return;
        };
        let Some(source_view) = Self::texture_view(source.as_ref()) else {
            debug_assert!(false, "source texture was not created by a wgpu context");
            return;
        };

        let (width, height) = match &self.current_target {
            Some(target) => (target.width(), target.height()),
            None => (self.width, self.height),
        };
        let uniform = StageUniform {
            params: self.applied.params,
            resolution: [
                width as f32,
                height as f32,
                1.0 / width as f32,
                1.0 / height as f32,
            ],
        };
        let uniform_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("hgr stage uniforms"),
                contents: bytemuck::cast_slice(&[uniform]),
                usage: wgpu::BufferUsages::UNIFORM,
            });

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("hgr stage bind group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(source_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: uniform_buffer.as_entire_binding(),
                },
            ],
        });

        let view = match &self.current_target {
            Some(target) => target
                .as_any()
                .downcast_ref::<GpuRenderTexture>()
                .expect("render target was not created by a wgpu context")
                .view(),
            None => self.frame.view(),
        };
        let encoder = self.encoder.as_mut().expect("scene encoder");
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("hgr fullscreen pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.set_vertex_buffer(0, self.quad_buffer.slice(..));
            pass.draw(0..6, 0..1);
        }
        self.stats.draw_calls += 1;
        self.stats.triangles += 2;
    }

    fn create_texture(&mut self, data: &TextureData) -> Result<Arc<dyn BaseTexture>, GraphicsError> {
        let format = surface_to_wgpu(data.format)?;
        if data.pixels.len() != data.expected_len() {
            return Err(GraphicsError::TextureAllocation {
                width: data.width,
                height: data.height,
                reason: format!(
                    "pixel data is {} bytes, expected {}",
                    data.pixels.len(),
                    data.expected_len()
                ),
            });
        }

        let texture = self.device.create_texture_with_data(
            &self.queue,
            &wgpu::TextureDescriptor {
                label: Some("hgr texture"),
                size: wgpu::Extent3d {
                    width: data.width,
                    height: data.height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &data.pixels,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let texture = Arc::new(GpuTexture {
            id: Id::new(),
            width: data.width,
            height: data.height,
            format: data.format,
            texture,
            view,
            valid: Cell::new(true),
        });
        let weak: Weak<dyn ContextObject> =
            Arc::downgrade(&(Arc::clone(&texture) as Arc<dyn ContextObject>));
        self.register(weak);
        Ok(texture)
    }

    fn create_render_texture(
        &mut self,
        width: u32,
        height: u32,
        format: SurfaceFormat,
    ) -> Result<Arc<dyn RenderTexture>, GraphicsError> {
        if width == 0 || height == 0 {
            return Err(GraphicsError::TextureAllocation {
                width,
                height,
                reason: "render target must be non-empty".to_owned(),
            });
        }
        let texture = Arc::new(GpuRenderTexture::new(
            &self.device,
            width,
            height,
            format,
            "hgr render target",
        )?);
        let weak: Weak<dyn ContextObject> =
            Arc::downgrade(&(Arc::clone(&texture) as Arc<dyn ContextObject>));
        self.register(weak);
        Ok(texture)
    }

    fn create_primitive(
        &mut self,
        vertices: &[Vector3],
        indices: &[u16],
    ) -> Result<Arc<dyn Primitive>, GraphicsError> {
        let vertex_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("hgr vertex buffer"),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });

        // Pad to 4-byte alignment for buffer creation.
        let mut padded = indices.to_vec();
        if padded.len() % 2 == 1 {
            padded.push(0);
        }
        let index_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("hgr index buffer"),
                contents: bytemuck::cast_slice(&padded),
                usage: wgpu::BufferUsages::INDEX,
            });

        let primitive = Arc::new(GpuPrimitive {
            id: Id::new(),
            vertex_buffer,
            index_buffer,
            vertex_count: vertices.len() as u32,
            index_count: indices.len() as u32,
        });
        let weak: Weak<dyn ContextObject> =
            Arc::downgrade(&(Arc::clone(&primitive) as Arc<dyn ContextObject>));
        self.register(weak);
        Ok(primitive)
    }

    fn create_shader(&mut self, name: &str) -> Result<Arc<RwLock<Shader>>, GraphicsError> {
        let name = Name::new(name)?;
        Ok(Arc::new(RwLock::new(Shader::new(name))))
    }

    fn statistics(&self) -> &Statistics {
        &self.stats
    }

    fn statistics_mut(&mut self) -> &mut Statistics {
        &mut self.stats
    }

    fn live_objects(&mut self) -> usize {
        self.live.retain(|weak| weak.strong_count() > 0);
        self.live.len()
    }
}

impl Drop for GpuContext {
    fn drop(&mut self) {
        let mut invalidated = 0usize;
        for weak in &self.live {
            if let Some(object) = weak.upgrade() {
                object.invalidate();
                invalidated += 1;
            }
        }
        if invalidated > 0 {
            log::debug!("wgpu context dropped with {} live objects", invalidated);
        }
    }
}

// Fullscreen stage shaders. All share the bind group layout
// (texture, sampler, Params uniform) and the same quad vertex stage.

macro_rules! stage_shader {
    ($fs:expr) => {
        concat!(
            r#"
struct VertexInput {
    @location(0) position: vec2<f32>,
    @location(1) uv: vec2<f32>,
}

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

struct Params {
    settings: vec4<f32>,
    resolution: vec4<f32>,
}

@group(0) @binding(0) var input_texture: texture_2d<f32>;
@group(0) @binding(1) var input_sampler: sampler;
@group(0) @binding(2) var<uniform> params: Params;

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.position = vec4<f32>(in.position, 0.0, 1.0);
    out.uv = in.uv;
    return out;
}
"#,
            $fs
        )
    };
}

const COPY_SHADER: &str = stage_shader!(
    r#"
@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(input_texture, input_sampler, in.uv);
}
"#
);

const DOWNSAMPLE_SHADER: &str = stage_shader!(
    r#"
@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let px = params.resolution.zw;
    var color = textureSample(input_texture, input_sampler, in.uv + vec2<f32>(-0.5, -0.5) * px).rgb;
    color += textureSample(input_texture, input_sampler, in.uv + vec2<f32>(0.5, -0.5) * px).rgb;
    color += textureSample(input_texture, input_sampler, in.uv + vec2<f32>(-0.5, 0.5) * px).rgb;
    color += textureSample(input_texture, input_sampler, in.uv + vec2<f32>(0.5, 0.5) * px).rgb;
    return vec4<f32>(color * 0.25, 1.0);
}
"#
);

const BLUR_H_SHADER: &str = stage_shader!(
    r#"
@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let px = params.resolution.zw;
    var weights = array<f32, 5>(0.227027, 0.1945946, 0.1216216, 0.054054, 0.016216);
    var color = textureSample(input_texture, input_sampler, in.uv).rgb * weights[0];
    for (var i = 1; i < 5; i++) {
        let offset = vec2<f32>(f32(i) * px.x, 0.0);
        color += textureSample(input_texture, input_sampler, in.uv + offset).rgb * weights[i];
        color += textureSample(input_texture, input_sampler, in.uv - offset).rgb * weights[i];
    }
    return vec4<f32>(color, 1.0);
}
"#
);

const BLUR_V_SHADER: &str = stage_shader!(
    r#"
@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let px = params.resolution.zw;
    var weights = array<f32, 5>(0.227027, 0.1945946, 0.1216216, 0.054054, 0.016216);
    var color = textureSample(input_texture, input_sampler, in.uv).rgb * weights[0];
    for (var i = 1; i < 5; i++) {
        let offset = vec2<f32>(0.0, f32(i) * px.y);
        color += textureSample(input_texture, input_sampler, in.uv + offset).rgb * weights[i];
        color += textureSample(input_texture, input_sampler, in.uv - offset).rgb * weights[i];
    }
    // Alpha carries the trail blend factor for exponential accumulation.
    return vec4<f32>(color, params.settings.y);
}
"#
);

const COMBINE_SHADER: &str = stage_shader!(
    r#"
@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let glow = textureSample(input_texture, input_sampler, in.uv).rgb;
    return vec4<f32>(glow * params.settings.x, 1.0);
}
"#
);

const FLAT_SHADER: &str = r#"
@vertex
fn vs_main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return vec4<f32>(position, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(1.0, 1.0, 1.0, 1.0);
}
"#;

//! wgpu implementation of [`GraphicsBackend`] drawing into a winit window.
//! wgpu = 26.x, winit = 0.30.x

use std::num::NonZeroU64;
use std::sync::Arc;

use asset::texture::TextureData;
use bytemuck::Zeroable;
use wgpu::{
    BindGroup, BindGroupLayout, BindGroupLayoutDescriptor, BindGroupLayoutEntry, BindingType,
    BlendState, Buffer, BufferBindingType, BufferUsages, ColorTargetState, ColorWrites,
    CommandEncoderDescriptor, DepthBiasState, DepthStencilState, Device, DeviceDescriptor,
    ErrorFilter, Extent3d, Features, FragmentState, Instance, InstanceDescriptor, Limits, LoadOp,
    Operations, PipelineLayoutDescriptor, PowerPreference, PresentMode, Queue,
    RenderPassColorAttachment, RenderPassDescriptor, RenderPipeline, RenderPipelineDescriptor,
    Sampler, ShaderModule, ShaderModuleDescriptor, ShaderSource, ShaderStages, StoreOp, Surface,
    SurfaceConfiguration, SurfaceError, SurfaceTexture, TextureDescriptor, TextureDimension,
    TextureFormat, TextureUsages, TextureView, TextureViewDescriptor, VertexState,
    util::DeviceExt,
};
use winit::{dpi::PhysicalSize, window::Window};

use crate::{
    backend::{BackendError, BufferHandle, GraphicsBackend, ProgramHandle, TextureHandle},
    shader::{
        FRAGMENT_ENTRY, FRAGMENT_TEXTURED_ENTRY, GpuVertex, MaterialUniforms, MeshUpload,
        SceneUniforms, ShaderSources, VERTEX_ENTRY,
    },
};

const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.05,
    g: 0.05,
    b: 0.08,
    a: 1.0,
};

/// Solid and textured variants of one compiled program.
struct Program {
    solid: RenderPipeline,
    textured: RenderPipeline,
}

struct GpuMesh {
    vertex_buf: Buffer,
    vertex_count: u32,
    material_buf: Buffer,
    material_bg: BindGroup,
}

struct GpuTexture {
    #[allow(dead_code)]
    texture: wgpu::Texture,
    bind_group: BindGroup,
}

#[derive(Clone, Copy)]
struct DrawCommand {
    program: usize,
    mesh: usize,
    texture: Option<usize>,
}

/// State of the frame between `begin_frame` and `end_frame`.
struct Frame {
    surface_texture: SurfaceTexture,
    program: Option<usize>,
    mesh: Option<usize>,
    texture: Option<usize>,
    draws: Vec<DrawCommand>,
}

pub struct WgpuBackend {
    window: Arc<Window>,

    // Surface
    surface: Surface<'static>,
    surface_config: SurfaceConfiguration,

    // Device/queue
    device: Device,
    queue: Queue,

    // Depth
    depth_view: TextureView,

    // Layouts shared by every program
    scene_bgl: BindGroupLayout,
    material_bgl: BindGroupLayout,
    texture_bgl: BindGroupLayout,
    scene_buf: Buffer,
    scene_bg: BindGroup,
    sampler: Sampler,

    programs: Vec<Program>,
    meshes: Vec<GpuMesh>,
    textures: Vec<GpuTexture>,

    frame: Option<Frame>,
}

impl WgpuBackend {
    /// Create a backend bound to `window`. Fails with
    /// [`BackendError::Unavailable`] when no usable adapter or surface exists.
    pub async fn new(window: Arc<Window>, backends: wgpu::Backends) -> Result<Self, BackendError> {
        let PhysicalSize { width, height } = window.inner_size();
        let width = width.max(1);
        let height = height.max(1);

        // Instance & surface
        let instance = Instance::new(&InstanceDescriptor {
            backends,
            ..Default::default()
        });
        let surface: Surface<'static> = instance
            .create_surface(window.clone())
            .map_err(|e| BackendError::Unavailable(format!("create_surface failed: {e}")))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| BackendError::Unavailable(format!("no suitable GPU adapter: {e}")))?;
        log::info!("Using adapter: {:?}", adapter.get_info());

        let (device, queue) = adapter
            .request_device(&DeviceDescriptor {
                label: Some("objview device"),
                required_features: Features::empty(),
                required_limits: Limits::downlevel_webgl2_defaults()
                    .using_resolution(adapter.limits()),
                memory_hints: Default::default(),
                trace: Default::default(),
            })
            .await
            .map_err(|e| BackendError::Unavailable(format!("request_device failed: {e}")))?;

        // Surface format (prefer sRGB)
        let caps = surface.get_capabilities(&adapter);
        let surface_format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| BackendError::Unavailable("surface reports no formats".into()))?;

        let surface_config = SurfaceConfiguration {
            usage: TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: PresentMode::AutoVsync,
            alpha_mode: caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let depth_view = create_depth_view(&device, &surface_config);

        let scene_bgl = uniform_layout::<SceneUniforms>(
            &device,
            "Scene BGL",
            ShaderStages::VERTEX_FRAGMENT,
        );
        let material_bgl =
            uniform_layout::<MaterialUniforms>(&device, "Material BGL", ShaderStages::FRAGMENT);
        let texture_bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("Diffuse map BGL"),
            entries: &[
                BindGroupLayoutEntry {
                    binding: 0,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                BindGroupLayoutEntry {
                    binding: 1,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let scene_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Scene UBO"),
            contents: bytemuck::bytes_of(&SceneUniforms::zeroed()),
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        });
        let scene_bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Scene BG"),
            layout: &scene_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: scene_buf.as_entire_binding(),
            }],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Diffuse sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Ok(Self {
            window,
            surface,
            surface_config,
            device,
            queue,
            depth_view,
            scene_bgl,
            material_bgl,
            texture_bgl,
            scene_buf,
            scene_bg,
            sampler,
            programs: Vec::new(),
            meshes: Vec::new(),
            textures: Vec::new(),
            frame: None,
        })
    }

    /// Reconfigure surface & recreate depth view.
    fn resize(&mut self, width: u32, height: u32) {
        self.surface_config.width = width.max(1);
        self.surface_config.height = height.max(1);
        self.surface.configure(&self.device, &self.surface_config);
        self.depth_view = create_depth_view(&self.device, &self.surface_config);
    }

    fn shader_module(&self, label: &str, source: &'static str) -> ShaderModule {
        self.device.create_shader_module(ShaderModuleDescriptor {
            label: Some(label),
            source: ShaderSource::Wgsl(source.into()),
        })
    }

    fn pipeline(
        &self,
        label: &str,
        vertex: &ShaderModule,
        fragment: &ShaderModule,
        fragment_entry: &str,
        textured: bool,
    ) -> RenderPipeline {
        let mut groups = vec![&self.scene_bgl, &self.material_bgl];
        if textured {
            groups.push(&self.texture_bgl);
        }
        let layout = self.device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some(label),
            bind_group_layouts: &groups,
            push_constant_ranges: &[],
        });
        self.device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(&layout),
            vertex: VertexState {
                module: vertex,
                entry_point: Some(VERTEX_ENTRY),
                buffers: &[GpuVertex::LAYOUT],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(FragmentState {
                module: fragment,
                entry_point: Some(fragment_entry),
                targets: &[Some(ColorTargetState {
                    format: self.surface_config.format,
                    blend: Some(BlendState::REPLACE),
                    write_mask: ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    }

    fn encode_frame(&self, frame: &Frame) -> wgpu::CommandBuffer {
        let view = frame
            .surface_texture
            .texture
            .create_view(&TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("MainEncoder"),
            });

        {
            let mut rpass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("MainPass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(CLEAR_COLOR),
                        store: StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(Operations {
                        load: LoadOp::Clear(1.0),
                        store: StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            rpass.set_bind_group(0, &self.scene_bg, &[]);
            for draw in &frame.draws {
                let program = &self.programs[draw.program];
                let mesh = &self.meshes[draw.mesh];
                match draw.texture {
                    Some(texture) => {
                        rpass.set_pipeline(&program.textured);
                        rpass.set_bind_group(2, &self.textures[texture].bind_group, &[]);
                    }
                    None => rpass.set_pipeline(&program.solid),
                }
                rpass.set_bind_group(1, &mesh.material_bg, &[]);
                rpass.set_vertex_buffer(0, mesh.vertex_buf.slice(..));
                rpass.draw(0..mesh.vertex_count, 0..1);
            }
        }

        encoder.finish()
    }
}

impl GraphicsBackend for WgpuBackend {
    fn create_program(&mut self, sources: &ShaderSources) -> Result<ProgramHandle, BackendError> {
        self.device.push_error_scope(ErrorFilter::Validation);
        let vertex = self.shader_module("Phong vertex", sources.vertex);
        let fragment = self.shader_module("Phong fragment", sources.fragment);
        let program = Program {
            solid: self.pipeline("Solid pipeline", &vertex, &fragment, FRAGMENT_ENTRY, false),
            textured: self.pipeline(
                "Textured pipeline",
                &vertex,
                &fragment,
                FRAGMENT_TEXTURED_ENTRY,
                true,
            ),
        };
        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(BackendError::Shader(err.to_string()));
        }

        self.programs.push(program);
        Ok(ProgramHandle(self.programs.len() as u32 - 1))
    }

    fn upload_mesh(&mut self, mesh: &MeshUpload<'_>) -> Result<BufferHandle, BackendError> {
        let vertices = mesh.interleave();
        let vertex_buf = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Part VB"),
                contents: bytemuck::cast_slice(&vertices),
                usage: BufferUsages::VERTEX,
            });
        let material_buf = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Material UBO"),
                contents: bytemuck::bytes_of(&MaterialUniforms::default()),
                usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
            });
        let material_bg = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Material BG"),
            layout: &self.material_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: material_buf.as_entire_binding(),
            }],
        });

        self.meshes.push(GpuMesh {
            vertex_buf,
            vertex_count: vertices.len() as u32,
            material_buf,
            material_bg,
        });
        Ok(BufferHandle(self.meshes.len() as u32 - 1))
    }

    fn upload_texture(&mut self, texture: &TextureData) -> Result<TextureHandle, BackendError> {
        let max = self.device.limits().max_texture_dimension_2d;
        if texture.width > max || texture.height > max {
            return Err(BackendError::TextureTooLarge {
                width: texture.width,
                height: texture.height,
                max,
            });
        }

        self.device.push_error_scope(ErrorFilter::Validation);
        let size = Extent3d {
            width: texture.width,
            height: texture.height,
            depth_or_array_layers: 1,
        };
        let gpu_texture = self.device.create_texture(&TextureDescriptor {
            label: Some("Diffuse map"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: TextureDimension::D2,
            format: TextureFormat::Rgba8UnormSrgb,
            usage: TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST,
            view_formats: &[],
        });
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &gpu_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &texture.data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(texture.row_pitch()),
                rows_per_image: Some(texture.height),
            },
            size,
        );
        let view = gpu_texture.create_view(&TextureViewDescriptor::default());
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Diffuse map BG"),
            layout: &self.texture_bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(BackendError::Texture(err.to_string()));
        }

        self.textures.push(GpuTexture {
            texture: gpu_texture,
            bind_group,
        });
        Ok(TextureHandle(self.textures.len() as u32 - 1))
    }

    fn resize_to_display(&mut self) -> bool {
        let PhysicalSize { width, height } = self.window.inner_size();
        let (width, height) = (width.max(1), height.max(1));
        if (width, height) == self.surface_size() {
            return false;
        }
        self.resize(width, height);
        true
    }

    fn surface_size(&self) -> (u32, u32) {
        (self.surface_config.width, self.surface_config.height)
    }

    fn begin_frame(&mut self) -> Result<bool, BackendError> {
        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(SurfaceError::Lost | SurfaceError::Outdated) => {
                log::warn!("Surface lost, reconfiguring");
                let (width, height) = self.surface_size();
                self.resize(width, height);
                return Ok(false);
            }
            Err(SurfaceError::Timeout) => return Ok(false),
            Err(e) => return Err(BackendError::Surface(e.to_string())),
        };
        self.frame = Some(Frame {
            surface_texture,
            program: None,
            mesh: None,
            texture: None,
            draws: Vec::new(),
        });
        Ok(true)
    }

    fn use_program(&mut self, program: ProgramHandle) {
        if let Some(frame) = self.frame.as_mut() {
            frame.program = Some(program.0 as usize);
        }
    }

    fn set_scene_uniforms(&mut self, uniforms: &SceneUniforms) {
        self.queue
            .write_buffer(&self.scene_buf, 0, bytemuck::bytes_of(uniforms));
    }

    fn bind_buffer(&mut self, buffer: BufferHandle) {
        if let Some(frame) = self.frame.as_mut() {
            frame.mesh = Some(buffer.0 as usize);
            frame.texture = None;
        }
    }

    fn set_material_uniforms(&mut self, uniforms: &MaterialUniforms) {
        // Each part owns its material buffer, so writes for different parts
        // within one frame do not overwrite each other.
        let bound = self.frame.as_ref().and_then(|f| f.mesh);
        if let Some(mesh) = bound.and_then(|i| self.meshes.get(i)) {
            self.queue
                .write_buffer(&mesh.material_buf, 0, bytemuck::bytes_of(uniforms));
        }
    }

    fn bind_texture(&mut self, texture: TextureHandle) {
        if let Some(frame) = self.frame.as_mut() {
            frame.texture = Some(texture.0 as usize);
        }
    }

    fn draw(&mut self) -> Result<(), BackendError> {
        let Some(frame) = self.frame.as_mut() else {
            return Ok(());
        };
        let (Some(program), Some(mesh)) = (frame.program, frame.mesh) else {
            return Err(BackendError::NothingBound);
        };
        if program >= self.programs.len() {
            return Err(BackendError::InvalidHandle {
                kind: "program",
                index: program as u32,
            });
        }
        if mesh >= self.meshes.len() {
            return Err(BackendError::InvalidHandle {
                kind: "buffer",
                index: mesh as u32,
            });
        }
        if let Some(texture) = frame.texture.filter(|&t| t >= self.textures.len()) {
            return Err(BackendError::InvalidHandle {
                kind: "texture",
                index: texture as u32,
            });
        }
        frame.draws.push(DrawCommand {
            program,
            mesh,
            texture: frame.texture,
        });
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), BackendError> {
        let Some(frame) = self.frame.take() else {
            return Ok(());
        };
        let commands = self.encode_frame(&frame);
        self.queue.submit(Some(commands));
        self.window.pre_present_notify();
        frame.surface_texture.present();
        Ok(())
    }
}

fn uniform_layout<T>(device: &Device, label: &str, visibility: ShaderStages) -> BindGroupLayout {
    device.create_bind_group_layout(&BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[BindGroupLayoutEntry {
            binding: 0,
            visibility,
            ty: BindingType::Buffer {
                ty: BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: NonZeroU64::new(std::mem::size_of::<T>() as u64),
            },
            count: None,
        }],
    })
}

/// Create a depth texture view matching the surface config.
fn create_depth_view(device: &Device, sc: &SurfaceConfiguration) -> TextureView {
    let tex = device.create_texture(&TextureDescriptor {
        label: Some("DepthTex"),
        size: Extent3d {
            width: sc.width.max(1),
            height: sc.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    tex.create_view(&TextureViewDescriptor::default())
}

use crate::shaders;
use crate::state::{
    DrawTextures, FrameState, MATERIAL_SLOTS, PipelineKey, UNIFORM_STRIDE, Uniforms,
};
use glam::{Mat4, Vec3};
use lumen_render::{Blend, DepthCompare, Program, RenderBackend};
use lumen_scene::{CubemapHandle, GpuResources, ImageData, MeshHandle, TextureHandle, Vertex};
use std::collections::HashMap;
use std::num::NonZeroU64;
use wgpu::util::DeviceExt;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
}

#[derive(Clone, Copy)]
struct DrawCall {
    key: PipelineKey,
    uniform_offset: u32,
    textures: DrawTextures,
    mesh: MeshHandle,
    index_count: u32,
}

struct Layouts {
    uniforms: wgpu::BindGroupLayout,
    material: wgpu::BindGroupLayout,
    cubemap: wgpu::BindGroupLayout,
    lighting: wgpu::PipelineLayout,
    skybox: wgpu::PipelineLayout,
}

impl Layouts {
    fn new(device: &wgpu::Device) -> Self {
        let uniforms = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uniforms_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: NonZeroU64::new(std::mem::size_of::<Uniforms>() as u64),
                },
                count: None,
            }],
        });

        let texture_entry = |binding, view_dimension| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension,
                multisampled: false,
            },
            count: None,
        };
        let sampler_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        };

        let mut material_entries: Vec<_> = (0..MATERIAL_SLOTS as u32)
            .map(|b| texture_entry(b, wgpu::TextureViewDimension::D2))
            .collect();
        material_entries.push(sampler_entry(MATERIAL_SLOTS as u32));
        let material = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("material_layout"),
            entries: &material_entries,
        });

        let cubemap = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("cubemap_layout"),
            entries: &[
                texture_entry(0, wgpu::TextureViewDimension::Cube),
                sampler_entry(1),
            ],
        });

        let lighting = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("lighting_pipeline_layout"),
            bind_group_layouts: &[&uniforms, &material],
            push_constant_ranges: &[],
        });
        let skybox = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("skybox_pipeline_layout"),
            bind_group_layouts: &[&uniforms, &cubemap],
            push_constant_ranges: &[],
        });

        Self {
            uniforms,
            material,
            cubemap,
            lighting,
            skybox,
        }
    }
}

/// wgpu implementation of the render and resource traits.
///
/// Calls made during a frame are recorded; `submit` replays them in one
/// render pass. Pipelines and material bind groups are created on first use
/// and cached.
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_format: wgpu::TextureFormat,
    supports_wireframe: bool,

    layouts: Layouts,
    lighting_shader: wgpu::ShaderModule,
    skybox_shader: wgpu::ShaderModule,
    sampler: wgpu::Sampler,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,

    meshes: Vec<Option<GpuMesh>>,
    textures: Vec<wgpu::TextureView>,
    cubemaps: Vec<wgpu::BindGroup>,
    material_groups: HashMap<[TextureHandle; MATERIAL_SLOTS], wgpu::BindGroup>,
    missing: TextureHandle,

    uniform_buffer: wgpu::Buffer,
    uniform_group: wgpu::BindGroup,
    uniform_capacity: u64,
    depth_view: wgpu::TextureView,

    state: FrameState,
    staged: Vec<u8>,
    draws: Vec<DrawCall>,
}

impl WgpuBackend {
    /// `supports_wireframe` reports whether the device was created with
    /// `POLYGON_MODE_LINE`.
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        supports_wireframe: bool,
    ) -> Self {
        let layouts = Layouts::new(&device);

        let lighting_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("lighting_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::LIGHTING_SHADER.into()),
        });
        let skybox_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("skybox_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::SKYBOX_SHADER.into()),
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("material_sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let uniform_capacity = UNIFORM_STRIDE * 64;
        let (uniform_buffer, uniform_group) =
            Self::create_uniforms(&device, &layouts.uniforms, uniform_capacity);
        let depth_view = Self::create_depth_texture(&device, width, height);

        let mut backend = Self {
            device,
            queue,
            surface_format,
            supports_wireframe,
            layouts,
            lighting_shader,
            skybox_shader,
            sampler,
            pipelines: HashMap::new(),
            meshes: Vec::new(),
            textures: Vec::new(),
            cubemaps: Vec::new(),
            material_groups: HashMap::new(),
            missing: TextureHandle(0),
            uniform_buffer,
            uniform_group,
            uniform_capacity,
            depth_view,
            state: FrameState::default(),
            staged: Vec::new(),
            draws: Vec::new(),
        };
        // Placeholder until the configured fallback is uploaded.
        backend.missing = backend.upload_texture(&ImageData::white());
        backend
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    pub fn set_missing_texture(&mut self, texture: TextureHandle) {
        self.missing = texture;
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.depth_view = Self::create_depth_texture(&self.device, width, height);
    }

    /// Drop anything recorded but not submitted.
    pub fn begin_frame(&mut self) {
        self.staged.clear();
        self.draws.clear();
    }

    /// Replay the recorded draws into `target`.
    pub fn submit(&mut self, target: &wgpu::TextureView) {
        let draws = std::mem::take(&mut self.draws);
        self.prepare(&draws);
        if !self.staged.is_empty() {
            self.queue.write_buffer(&self.uniform_buffer, 0, &self.staged);
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame_encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            for draw in &draws {
                let (Some(pipeline), Some(Some(mesh))) = (
                    self.pipelines.get(&draw.key),
                    self.meshes.get(draw.mesh.0 as usize),
                ) else {
                    continue;
                };
                let group = match draw.textures {
                    DrawTextures::Material(slots) => self.material_groups.get(&slots),
                    DrawTextures::Cubemap(handle) => self.cubemaps.get(handle.0 as usize),
                };
                let Some(group) = group else {
                    continue;
                };
                pass.set_pipeline(pipeline);
                pass.set_bind_group(0, &self.uniform_group, &[draw.uniform_offset]);
                pass.set_bind_group(1, group, &[]);
                pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..draw.index_count, 0, 0..1);
            }
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        self.staged.clear();
    }

    /// Grow the uniform buffer and create missing pipelines and bind groups.
    fn prepare(&mut self, draws: &[DrawCall]) {
        let needed = self.staged.len() as u64;
        if needed > self.uniform_capacity {
            let capacity = needed.next_power_of_two();
            let (buffer, group) =
                Self::create_uniforms(&self.device, &self.layouts.uniforms, capacity);
            self.uniform_buffer = buffer;
            self.uniform_group = group;
            self.uniform_capacity = capacity;
            tracing::debug!(capacity, "uniform buffer grown");
        }
        for draw in draws {
            if !self.pipelines.contains_key(&draw.key) {
                let pipeline = self.create_pipeline(draw.key);
                self.pipelines.insert(draw.key, pipeline);
            }
            if let DrawTextures::Material(slots) = draw.textures {
                if !self.material_groups.contains_key(&slots) {
                    let group = self.create_material_group(&slots);
                    self.material_groups.insert(slots, group);
                }
            }
        }
    }

    fn create_pipeline(&self, key: PipelineKey) -> wgpu::RenderPipeline {
        tracing::debug!(?key, "creating pipeline");
        let (label, layout, module) = match key.program {
            Program::Lighting => ("lighting_pipeline", &self.layouts.lighting, &self.lighting_shader),
            Program::Skybox => ("skybox_pipeline", &self.layouts.skybox, &self.skybox_shader),
        };
        let blend = match key.blend {
            Blend::Disabled => wgpu::BlendState::REPLACE,
            Blend::AlphaOver => wgpu::BlendState::ALPHA_BLENDING,
        };
        let depth_compare = match key.depth {
            DepthCompare::Less => wgpu::CompareFunction::Less,
            DepthCompare::LessEqual => wgpu::CompareFunction::LessEqual,
        };
        let polygon_mode = if key.wireframe && self.supports_wireframe {
            wgpu::PolygonMode::Line
        } else {
            wgpu::PolygonMode::Fill
        };

        self.device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(layout),
                vertex: wgpu::VertexState {
                    module,
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<Vertex>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![
                            0 => Float32x3,
                            1 => Float32x3,
                            2 => Float32x2,
                        ],
                    }],
                },
                fragment: Some(wgpu::FragmentState {
                    module,
                    entry_point: Some("fs_main"),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.surface_format,
                        blend: Some(blend),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode: None,
                    polygon_mode,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: key.depth_writes(),
                    depth_compare,
                    stencil: Default::default(),
                    bias: Default::default(),
                }),
                multisample: Default::default(),
                multiview: None,
                cache: None,
            })
    }

    fn create_material_group(&self, slots: &[TextureHandle; MATERIAL_SLOTS]) -> wgpu::BindGroup {
        let view = |h: TextureHandle| {
            self.textures
                .get(h.0 as usize)
                .or_else(|| self.textures.get(self.missing.0 as usize))
                .or_else(|| self.textures.first())
        };
        let mut entries: Vec<wgpu::BindGroupEntry> = Vec::with_capacity(MATERIAL_SLOTS + 1);
        for (binding, handle) in slots.iter().enumerate() {
            // The placeholder texture is uploaded in `new`, so a view always exists.
            if let Some(v) = view(*handle) {
                entries.push(wgpu::BindGroupEntry {
                    binding: binding as u32,
                    resource: wgpu::BindingResource::TextureView(v),
                });
            }
        }
        entries.push(wgpu::BindGroupEntry {
            binding: MATERIAL_SLOTS as u32,
            resource: wgpu::BindingResource::Sampler(&self.sampler),
        });
        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("material_group"),
            layout: &self.layouts.material,
            entries: &entries,
        })
    }

    fn create_uniforms(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        capacity: u64,
    ) -> (wgpu::Buffer, wgpu::BindGroup) {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("uniform_buffer"),
            size: capacity,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("uniform_group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: NonZeroU64::new(std::mem::size_of::<Uniforms>() as u64),
                }),
            }],
        });
        (buffer, group)
    }

    fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }

    fn create_rgba_texture(&self, label: &str, width: u32, height: u32, layers: u32) -> wgpu::Texture {
        self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: layers,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TEXTURE_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        })
    }

    fn write_layer(&self, texture: &wgpu::Texture, layer: u32, image: &ImageData) {
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d {
                    x: 0,
                    y: 0,
                    z: layer,
                },
                aspect: wgpu::TextureAspect::All,
            },
            &image.rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * image.width),
                rows_per_image: Some(image.height),
            },
            wgpu::Extent3d {
                width: image.width,
                height: image.height,
                depth_or_array_layers: 1,
            },
        );
    }
}

impl GpuResources for WgpuBackend {
    fn upload_mesh(&mut self, vertices: &[Vertex], indices: &[u32]) -> MeshHandle {
        let vertex_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("mesh_vertices"),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let index_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("mesh_indices"),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            });
        let mesh = GpuMesh {
            vertex_buffer,
            index_buffer,
        };
        let slot = match self.meshes.iter().position(Option::is_none) {
            Some(free) => {
                self.meshes[free] = Some(mesh);
                free
            }
            None => {
                self.meshes.push(Some(mesh));
                self.meshes.len() - 1
            }
        };
        MeshHandle(slot as u32)
    }

    fn release_mesh(&mut self, mesh: MeshHandle) {
        if let Some(slot) = self.meshes.get_mut(mesh.0 as usize) {
            if let Some(buffers) = slot.take() {
                buffers.vertex_buffer.destroy();
                buffers.index_buffer.destroy();
            }
        }
    }

    fn upload_texture(&mut self, image: &ImageData) -> TextureHandle {
        let texture = self.create_rgba_texture("material_texture", image.width, image.height, 1);
        self.write_layer(&texture, 0, image);
        self.textures.push(texture.create_view(&Default::default()));
        TextureHandle(self.textures.len() as u32 - 1)
    }

    fn upload_cubemap(&mut self, faces: &[ImageData; 6]) -> CubemapHandle {
        let size = faces[0].width;
        let texture = self.create_rgba_texture("skybox_cubemap", size, size, 6);
        for (layer, face) in faces.iter().enumerate() {
            self.write_layer(&texture, layer as u32, face);
        }
        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("skybox_view"),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });
        let group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("cubemap_group"),
            layout: &self.layouts.cubemap,
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
        self.cubemaps.push(group);
        CubemapHandle(self.cubemaps.len() as u32 - 1)
    }
}

impl RenderBackend for WgpuBackend {
    fn use_program(&mut self, program: Program) {
        self.state.program = Some(program);
    }

    fn set_bool(&mut self, name: &str, value: bool) {
        self.state.set_bool(name, value);
    }

    fn set_int(&mut self, name: &str, value: i32) {
        self.state.set_int(name, value);
    }

    fn set_float(&mut self, name: &str, value: f32) {
        self.state.set_float(name, value);
    }

    fn set_vec3(&mut self, name: &str, value: Vec3) {
        self.state.set_vec3(name, value);
    }

    fn set_mat4(&mut self, name: &str, value: Mat4) {
        self.state.set_mat4(name, value);
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureHandle) {
        self.state.bind_texture(unit, texture);
    }

    fn bind_cubemap(&mut self, _unit: u32, cubemap: CubemapHandle) {
        self.state.bind_cubemap(cubemap);
    }

    fn set_blend(&mut self, blend: Blend) {
        self.state.blend = blend;
    }

    fn set_depth_compare(&mut self, compare: DepthCompare) {
        self.state.depth = compare;
    }

    fn set_wireframe(&mut self, enabled: bool) {
        self.state.wireframe = enabled;
    }

    fn missing_texture(&self) -> TextureHandle {
        self.missing
    }

    fn draw_indexed(&mut self, mesh: MeshHandle, index_count: u32) {
        let key = self.state.pipeline_key();
        let Some((uniforms, textures)) = self.state.take_draw(self.missing) else {
            tracing::warn!(mesh = mesh.0, "draw skipped: no cubemap bound");
            return;
        };
        let offset = self.draws.len() as u64 * UNIFORM_STRIDE;
        self.staged.resize(offset as usize, 0);
        self.staged.extend_from_slice(bytemuck::bytes_of(&uniforms));
        self.draws.push(DrawCall {
            key,
            uniform_offset: offset as u32,
            textures,
            mesh,
            index_count,
        });
    }
}

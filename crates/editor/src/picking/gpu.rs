use anyhow::Context as _;
use encase::{DynamicUniformBuffer, ShaderType, UniformBuffer};
use idpick_engine::Result;
use idpick_engine::prelude::{
    GpuDevice, GpuMesh, GpuQueue, GraphicsGeneration, Vertex, World, index_format,
};
use nalgebra::Matrix4;

use super::codec::PickColor;
use super::readback::PixelSource;
use super::renderer::{PickCamera, PickDraw, PickRenderer};

pub const PICK_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Uint;
pub const PICK_DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Staging rows must be aligned to this many bytes, even for a single texel
const READBACK_BYTES: u64 = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT as u64;

/// Draw slots allocated up front in the shared draw buffer
const INITIAL_DRAW_SLOTS: u64 = 64;

#[derive(ShaderType)]
struct PickCameraUniform {
    view_projection: Matrix4<f32>,
}

#[derive(ShaderType)]
struct PickDrawUniform {
    model: Matrix4<f32>,
    color: u32,
}

/// Device handles a [`GpuPickRenderer`] is created from
#[derive(Clone)]
pub struct GpuPickContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub generation: u64,
}

impl GpuPickContext {
    /// Pull the device published by the device layer, if there is one yet
    pub fn from_world(world: &World) -> Option<Self> {
        let device = world.get_resource::<GpuDevice>()?.0.clone();
        let queue = world.get_resource::<GpuQueue>()?.0.clone();
        let generation = world
            .get_resource::<GraphicsGeneration>()
            .copied()
            .unwrap_or_default()
            .0;

        Some(Self {
            device,
            queue,
            generation,
        })
    }
}

struct GpuPickTarget {
    color: wgpu::Texture,
    color_view: wgpu::TextureView,
    depth_view: wgpu::TextureView,
    staging: wgpu::Buffer,
}

impl GpuPickTarget {
    fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let color = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Pick Color Texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: PICK_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let color_view = color.create_view(&wgpu::TextureViewDescriptor::default());

        let depth = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Pick Depth Texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: PICK_DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let depth_view = depth.create_view(&wgpu::TextureViewDescriptor::default());

        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Pick Staging Buffer"),
            size: READBACK_BYTES,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        Self {
            color,
            color_view,
            depth_view,
            staging,
        }
    }
}

/// wgpu pick backend.
///
/// Every entity is drawn with one unlit pipeline. Per-draw model matrix and
/// color live in a single uniform buffer addressed with dynamic offsets, so a
/// pick never allocates anything per entity.
pub struct GpuPickRenderer {
    device: wgpu::Device,
    queue: wgpu::Queue,
    generation: u64,

    pipeline: wgpu::RenderPipeline,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,

    draw_layout: wgpu::BindGroupLayout,
    draw_buffer: wgpu::Buffer,
    draw_bind_group: wgpu::BindGroup,
    draw_capacity: u64,
    draw_alignment: u64,

    target: Option<GpuPickTarget>,
}

impl GpuPickRenderer {
    fn create_draw_buffer(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        capacity: u64,
    ) -> (wgpu::Buffer, wgpu::BindGroup) {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Pick Draw Buffer"),
            size: capacity,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: Some(PickDrawUniform::min_size()),
                }),
            }],
            label: Some("pick_draw_bind_group"),
        });

        (buffer, bind_group)
    }

    fn reserve_draw_bytes(&mut self, required: u64) {
        if required <= self.draw_capacity {
            return;
        }

        let capacity = required.next_power_of_two().max(self.draw_capacity * 2);
        let (buffer, bind_group) =
            Self::create_draw_buffer(&self.device, &self.draw_layout, capacity);
        self.draw_buffer = buffer;
        self.draw_bind_group = bind_group;
        self.draw_capacity = capacity;
        log::debug!("Grew pick draw buffer to {} bytes", capacity);
    }
}

impl PickRenderer for GpuPickRenderer {
    type Mesh = GpuMesh;
    type Context = GpuPickContext;

    fn create(context: &Self::Context) -> Result<Self> {
        let device = context.device.clone();
        let queue = context.queue.clone();

        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let shader = device.create_shader_module(wgpu::include_wgsl!("pick.wgsl"));

        let camera_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: Some(PickCameraUniform::min_size()),
                },
                count: None,
            }],
            label: Some("pick_camera_bind_group_layout"),
        });

        let draw_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: Some(PickDrawUniform::min_size()),
                },
                count: None,
            }],
            label: Some("pick_draw_bind_group_layout"),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Pick Pipeline Layout"),
            bind_group_layouts: &[&camera_layout, &draw_layout],
            push_constant_ranges: &[],
        });

        // only the position attribute, read at the full engine vertex stride
        let position_only = [wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x3,
            offset: 0,
            shader_location: 0,
        }];

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Pick Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vertex"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &position_only,
                }],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fragment"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: PICK_FORMAT,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                // matches the render layer's culling
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: PICK_DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Pick Camera Buffer"),
            size: PickCameraUniform::min_size().get(),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
            label: Some("pick_camera_bind_group"),
        });

        let draw_alignment = u64::from(device.limits().min_uniform_buffer_offset_alignment);
        let draw_capacity = draw_alignment * INITIAL_DRAW_SLOTS;
        let (draw_buffer, draw_bind_group) =
            Self::create_draw_buffer(&device, &draw_layout, draw_capacity);

        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            anyhow::bail!("failed to create pick pipeline: {}", error);
        }

        log::info!(
            "Created GPU pick renderer (generation {})",
            context.generation
        );

        Ok(Self {
            device,
            queue,
            generation: context.generation,
            pipeline,
            camera_buffer,
            camera_bind_group,
            draw_layout,
            draw_buffer,
            draw_bind_group,
            draw_capacity,
            draw_alignment,
            target: None,
        })
    }

    fn is_stale(&self, context: &Self::Context) -> bool {
        self.generation != context.generation
    }

    fn ensure_target(&mut self, width: u32, height: u32) -> Result<()> {
        if self.target_size() == Some((width, height)) {
            return Ok(());
        }

        self.target = Some(GpuPickTarget::new(&self.device, width, height));
        log::info!("Allocated pick target {}x{}", width, height);
        Ok(())
    }

    fn target_size(&self) -> Option<(u32, u32)> {
        self.target.as_ref().map(|target| {
            let size = target.color.size();
            (size.width, size.height)
        })
    }

    fn render(&mut self, camera: &PickCamera, draws: &[PickDraw<'_, GpuMesh>]) -> Result<()> {
        let mut camera_data = UniformBuffer::new(Vec::new());
        camera_data
            .write(&PickCameraUniform {
                view_projection: camera.view_projection(),
            })
            .context("failed to encode pick camera")?;

        let mut draw_data = DynamicUniformBuffer::new_with_alignment(Vec::new(), self.draw_alignment);
        let mut offsets = Vec::with_capacity(draws.len());
        for draw in draws {
            let offset = draw_data
                .write(&PickDrawUniform {
                    model: draw.model,
                    color: draw.color.to_packed(),
                })
                .context("failed to encode pick draw")?;
            offsets.push(u32::try_from(offset).context("pick draw offset overflow")?);
        }
        let draw_bytes = draw_data.into_inner();
        self.reserve_draw_bytes(draw_bytes.len() as u64);

        let target = self
            .target
            .as_ref()
            .context("pick target was not allocated")?;

        self.queue
            .write_buffer(&self.camera_buffer, 0, &camera_data.into_inner());
        if !draw_bytes.is_empty() {
            self.queue.write_buffer(&self.draw_buffer, 0, &draw_bytes);
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Pick Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Pick Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &target.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(0, &self.camera_bind_group, &[]);

            for (draw, offset) in draws.iter().zip(offsets) {
                render_pass.set_bind_group(1, &self.draw_bind_group, &[offset]);
                render_pass.set_vertex_buffer(0, draw.mesh.vertex_buffer.slice(..));
                render_pass.set_index_buffer(draw.mesh.index_buffer.slice(..), index_format());
                render_pass.draw_indexed(0..draw.mesh.index_count, 0, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }
}

impl PixelSource for GpuPickRenderer {
    fn dimensions(&self) -> (u32, u32) {
        self.target_size().unwrap_or((0, 0))
    }

    fn read_pixel(&mut self, x: u32, y: u32) -> Result<PickColor> {
        let target = self
            .target
            .as_ref()
            .context("pick target was not allocated")?;

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Pick Readback Encoder"),
            });

        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &target.color,
                mip_level: 0,
                origin: wgpu::Origin3d { x, y, z: 0 },
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &target.staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(READBACK_BYTES as u32),
                    rows_per_image: Some(1),
                },
            },
            wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
        );

        self.queue.submit(std::iter::once(encoder.finish()));

        let slice = target.staging.slice(..4);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });

        self.device
            .poll(wgpu::PollType::Wait {
                submission_index: None,
                timeout: None,
            })
            .context("device lost while waiting for pick readback")?;
        rx.recv()
            .context("pick readback callback was dropped")?
            .context("failed to map pick staging buffer")?;

        let color = {
            let data = slice.get_mapped_range();
            bytemuck::pod_read_unaligned::<PickColor>(&data[..4])
        };
        target.staging.unmap();

        Ok(color)
    }
}

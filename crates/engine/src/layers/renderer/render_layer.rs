use crate::layers::renderer::systems::{
    initialize_render_targets, update_camera_buffers, update_render_targets,
};
use crate::prelude::*;

pub const SURFACE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Bgra8UnormSrgb;
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

pub struct RenderLayer {
    device: wgpu::Device,
    queue: wgpu::Queue,
    render_pipeline: wgpu::RenderPipeline,
    schedule: Schedule,
}

impl RenderLayer {
    pub fn new(context: &LayerContext) -> Self {
        // Retrieve device and queue from world resources (set by DeviceLayer)
        let (device, queue) = {
            let world = context.world.lock().unwrap();
            let device = world
                .get_resource::<GpuDevice>()
                .expect("DeviceLayer must be added before RenderLayer");
            let queue = world
                .get_resource::<GpuQueue>()
                .expect("DeviceLayer must be added before RenderLayer");
            (device.0.clone(), queue.0.clone())
        };

        let layouts = SceneLayouts {
            camera: uniform_layout(&device, "camera_bind_group_layout"),
            transform: uniform_layout(&device, "transform_bind_group_layout"),
        };
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Render Pipeline Layout"),
            bind_group_layouts: &[&layouts.camera, &layouts.transform],
            push_constant_ranges: &[],
        });

        {
            let mut world = context.world.lock().unwrap();
            release_gpu_components(&mut world);
            world.insert_resource(layouts);
        }

        let shader = device.create_shader_module(wgpu::include_wgsl!("shader.wgsl"));
        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Render Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vertex"),
                buffers: &[Vertex::desc()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fragment"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: SURFACE_FORMAT,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
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

        // ecs
        let mut schedule = Schedule::default();
        schedule.add_systems((
            upload_system::<Mesh>,
            refresh_system::<Mesh>,
            upload_system::<Transform>,
            refresh_system::<Transform>,
            upload_system::<Camera>,
            initialize_render_targets,
            update_render_targets,
            update_camera_buffers,
        ));

        Self {
            device,
            queue,
            render_pipeline,
            schedule,
        }
    }
}

fn uniform_layout(device: &wgpu::Device, label: &str) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some(label),
    })
}

/// Drop everything created on a previous device so the schedule rebuilds it
fn release_gpu_components(world: &mut World) {
    let released = release_gpu::<Mesh>(world)
        + release_gpu::<Transform>(world)
        + release_gpu::<Camera>(world);

    let targets: Vec<Entity> = world
        .query_filtered::<Entity, With<GpuRenderTarget>>()
        .iter(world)
        .collect();
    for &entity in &targets {
        world.entity_mut(entity).remove::<GpuRenderTarget>();
    }

    if released + targets.len() > 0 {
        log::info!(
            "Released {} GPU components from a previous device",
            released + targets.len()
        );
    }
}

impl Layer for RenderLayer {
    fn frame(&mut self, context: &LayerContext) -> std::result::Result<(), wgpu::SurfaceError> {
        let mut world = context.world.lock().unwrap();

        // Run the schedule first before any queries
        self.schedule.run(&mut world);

        let mut camera_query = world.query::<(&GpuCamera, &GpuRenderTarget)>();
        let mut mesh_query = world.query::<(&GpuMesh, &GpuTransform)>();

        for (camera, target) in camera_query.iter(&world) {
            let view = target
                .texture
                .create_view(&wgpu::TextureViewDescriptor::default());

            let mut encoder = self
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Render Encoder"),
                });

            {
                let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Render Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(wgpu::Color {
                                r: 0.02,
                                g: 0.02,
                                b: 0.03,
                                a: 1.0,
                            }),
                            store: wgpu::StoreOp::Store,
                        },
                        depth_slice: None,
                    })],
                    depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                        view: &target.depth_view,
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Clear(1.0),
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }),
                    occlusion_query_set: None,
                    timestamp_writes: None,
                });

                render_pass.set_pipeline(&self.render_pipeline);
                render_pass.set_bind_group(0, &camera.bind_group, &[]);

                for (mesh, transform) in mesh_query.iter(&world) {
                    render_pass.set_bind_group(1, &transform.bind_group, &[]);
                    render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                    render_pass.set_index_buffer(mesh.index_buffer.slice(..), index_format());
                    render_pass.draw_indexed(0..mesh.index_count, 0, 0..1);
                }
            };

            self.queue.submit(std::iter::once(encoder.finish()));
        }

        Ok(())
    }

    fn detach(&mut self, _context: &LayerContext) {}
}

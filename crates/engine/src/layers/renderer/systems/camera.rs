use crate::layers::renderer::{DEPTH_FORMAT, SURFACE_FORMAT};
use crate::prelude::*;

fn create_render_target(device: &wgpu::Device, size: &WindowSize) -> GpuRenderTarget {
    let extent = wgpu::Extent3d {
        width: size.width.max(1),
        height: size.height.max(1),
        depth_or_array_layers: 1,
    };

    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Camera Render Target"),
        size: extent,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: SURFACE_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT
            | wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });

    let depth = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Camera Depth Texture"),
        size: extent,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let depth_view = depth.create_view(&wgpu::TextureViewDescriptor::default());

    GpuRenderTarget {
        texture,
        depth_view,
    }
}

pub fn initialize_render_targets(
    mut commands: Commands,
    device: Res<GpuDevice>,
    window_size: Res<WindowSize>,
    query: Query<Entity, (With<RenderTarget>, Without<GpuRenderTarget>)>,
) {
    for entity in query.iter() {
        let target = create_render_target(&device.0, &window_size);
        commands.entity(entity).insert(target);
        log::info!(
            "Created render target {}x{} for Entity {:?}",
            window_size.width,
            window_size.height,
            entity
        );
    }
}

/// Keeps render targets and camera aspect ratios in sync with the window
pub fn update_render_targets(
    mut commands: Commands,
    device: Res<GpuDevice>,
    window_size: Res<WindowSize>,
    mut query: Query<(Entity, &mut GpuCamera, Option<&GpuRenderTarget>), With<RenderTarget>>,
) {
    let aspect = window_size.width.max(1) as f32 / window_size.height.max(1) as f32;

    for (entity, mut camera, gpu_target) in query.iter_mut() {
        // only write through the Mut when it changes, otherwise change detection fires every frame
        if (camera.aspect - aspect).abs() > f32::EPSILON {
            camera.aspect = aspect;
        }

        let Some(target) = gpu_target else {
            continue;
        };

        let size = target.texture.size();
        if size.width != window_size.width.max(1) || size.height != window_size.height.max(1) {
            commands
                .entity(entity)
                .insert(create_render_target(&device.0, &window_size));
            log::info!(
                "Resized render target to {}x{} for Entity {:?}",
                window_size.width,
                window_size.height,
                entity
            );
        }
    }
}

pub fn update_camera_buffers(
    queue: Res<GpuQueue>,
    query: Query<
        (&Camera, &Transform, &GpuCamera),
        Or<(Changed<Camera>, Changed<Transform>, Changed<GpuCamera>)>,
    >,
) {
    for (camera, transform, gpu_camera) in query.iter() {
        let matrix = camera.view_projection(transform, gpu_camera.aspect);
        queue
            .0
            .write_buffer(&gpu_camera.buffer, 0, bytemuck::cast_slice(&[matrix]));
    }
}

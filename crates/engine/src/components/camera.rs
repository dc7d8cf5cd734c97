use crate::prelude::*;

#[derive(Component, Clone, Debug, PartialEq)]
pub struct Camera {
    pub is_main: bool,
    pub target: Point3<f32>,
    pub fovy: f32,
    pub znear: f32,
    pub zfar: f32,
}

#[rustfmt::skip]
pub const OPENGL_TO_WGPU: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

impl Camera {
    /// World to view matrix looking from the transform's position at `target`
    pub fn view_matrix(&self, transform: &Transform) -> Matrix4<f32> {
        // compute the up vector from the rotation quaternion
        let up = transform.rotation * Vector3::y_axis();
        Isometry3::look_at_rh(&transform.position, &self.target, &up).to_homogeneous()
    }

    /// Perspective projection with wgpu's 0..1 clip depth
    pub fn projection_matrix(&self, aspect: f32) -> Matrix4<f32> {
        let aspect = if aspect.is_finite() && aspect > 0.0 {
            aspect
        } else {
            1.0
        };
        OPENGL_TO_WGPU * Perspective3::new(aspect, self.fovy, self.znear, self.zfar).to_homogeneous()
    }

    pub fn view_projection(&self, transform: &Transform, aspect: f32) -> Matrix4<f32> {
        self.projection_matrix(aspect) * self.view_matrix(transform)
    }
}

#[derive(Component)]
pub struct GpuCamera {
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub aspect: f32,
}

/// Only reserves the buffer; `update_camera_buffers` writes the matrix once the
/// aspect is known. No refresh system is scheduled for cameras.
impl GpuComponent for Camera {
    type Gpu = GpuCamera;

    fn upload(&self, device: &wgpu::Device, layouts: &SceneLayouts) -> GpuCamera {
        use wgpu::util::DeviceExt;

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[Matrix4::<f32>::identity()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &layouts.camera,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        GpuCamera {
            buffer,
            bind_group,
            aspect: 1.0,
        }
    }
}

/// Marks a camera that renders into its own off-screen texture
#[derive(Component)]
pub struct RenderTarget {}

#[derive(Component)]
pub struct GpuRenderTarget {
    pub texture: wgpu::Texture,
    pub depth_view: wgpu::TextureView,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> Camera {
        Camera {
            is_main: true,
            target: Point3::origin(),
            fovy: 1.0,
            znear: 0.1,
            zfar: 100.0,
        }
    }

    #[test]
    fn test_target_projects_to_screen_center() {
        let transform = Transform::from_position(Point3::new(0.0, 0.0, 10.0));
        let clip = camera().view_projection(&transform, 1.5) * Vector4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip.xyz() / clip.w;

        assert!(ndc.x.abs() < 1e-5);
        assert!(ndc.y.abs() < 1e-5);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn test_nearer_points_have_smaller_depth() {
        let transform = Transform::from_position(Point3::new(0.0, 0.0, 10.0));
        let view_projection = camera().view_projection(&transform, 1.0);

        let depth = |z: f32| {
            let clip = view_projection * Vector4::new(0.0, 0.0, z, 1.0);
            clip.z / clip.w
        };
        assert!(depth(5.0) < depth(0.0));
    }

    #[test]
    fn test_degenerate_aspect_falls_back() {
        let fallback = camera().projection_matrix(1.0);
        assert_eq!(camera().projection_matrix(0.0), fallback);
        assert_eq!(camera().projection_matrix(f32::NAN), fallback);
    }
}

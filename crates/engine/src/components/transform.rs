use crate::prelude::*;

#[derive(Component, Clone, Debug, PartialEq)]
pub struct Transform {
    pub position: Point3<f32>,
    pub rotation: UnitQuaternion<f32>,
    pub scale: Vector3<f32>,
}

impl Transform {
    pub fn from_position(position: Point3<f32>) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn with_scale(mut self, scale: Vector3<f32>) -> Self {
        self.scale = scale;
        self
    }

    /// Local to world matrix (translation * rotation * scale)
    pub fn to_matrix(&self) -> Matrix4<f32> {
        let translation = Matrix4::new_translation(&self.position.coords);
        let rotation = self.rotation.to_homogeneous();
        let scale = Matrix4::new_nonuniform_scaling(&self.scale);
        translation * rotation * scale
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Point3::origin(),
            rotation: UnitQuaternion::identity(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

#[derive(Component)]
pub struct GpuTransform {
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl GpuComponent for Transform {
    type Gpu = GpuTransform;

    fn upload(&self, device: &wgpu::Device, layouts: &SceneLayouts) -> GpuTransform {
        use wgpu::util::DeviceExt;

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Transform Buffer"),
            contents: bytemuck::cast_slice(&[self.to_matrix()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &layouts.transform,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("transform_bind_group"),
        });

        GpuTransform { buffer, bind_group }
    }

    fn refresh(
        &self,
        gpu: &mut GpuTransform,
        _device: &wgpu::Device,
        queue: &wgpu::Queue,
        _layouts: &SceneLayouts,
    ) {
        queue.write_buffer(&gpu.buffer, 0, bytemuck::cast_slice(&[self.to_matrix()]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_transform_matrix() {
        assert_eq!(Transform::default().to_matrix(), Matrix4::identity());
    }

    #[test]
    fn test_matrix_applies_scale_before_translation() {
        let transform = Transform::from_position(Point3::new(1.0, 2.0, 3.0))
            .with_scale(Vector3::new(2.0, 2.0, 2.0));

        let point = transform
            .to_matrix()
            .transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert!((point - Point3::new(3.0, 2.0, 3.0)).norm() < 1e-6);
    }
}

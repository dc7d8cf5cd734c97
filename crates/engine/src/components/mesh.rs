use crate::prelude::*;

#[derive(Component, Clone, Debug, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<Index>,
}

#[derive(Component)]
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
    pub normal: [f32; 3],
}

impl Vertex {
    const ATTRIBS: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2, 2 => Float32x3];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;

        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

pub type Index = u16;

pub fn index_format() -> wgpu::IndexFormat {
    wgpu::IndexFormat::Uint16
}

impl Mesh {
    /// Axis aligned box centered on the origin, wound counter-clockwise when seen from outside
    pub fn cuboid(size: Vector3<f32>) -> Self {
        let half = size / 2.0;

        // (normal, u, v) with u x v == normal
        let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
            ([1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]),
            ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
            ([0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]),
            ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
            ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([0.0, 0.0, -1.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0]),
        ];
        let corners = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);

        for (normal, u, v) in faces {
            let base = vertices.len() as Index;
            for (su, sv) in corners {
                let position = [
                    (normal[0] + su * u[0] + sv * v[0]) * half.x,
                    (normal[1] + su * u[1] + sv * v[1]) * half.y,
                    (normal[2] + su * u[2] + sv * v[2]) * half.z,
                ];
                vertices.push(Vertex {
                    position,
                    uv: [(su + 1.0) / 2.0, (1.0 - sv) / 2.0],
                    normal,
                });
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        Self { vertices, indices }
    }

    /// Flat rectangle in the XY plane facing +Z
    pub fn quad(width: f32, height: f32) -> Self {
        let (hw, hh) = (width / 2.0, height / 2.0);
        let normal = [0.0, 0.0, 1.0];

        Self {
            vertices: vec![
                Vertex {
                    position: [-hw, -hh, 0.0],
                    uv: [0.0, 1.0],
                    normal,
                },
                Vertex {
                    position: [hw, -hh, 0.0],
                    uv: [1.0, 1.0],
                    normal,
                },
                Vertex {
                    position: [hw, hh, 0.0],
                    uv: [1.0, 0.0],
                    normal,
                },
                Vertex {
                    position: [-hw, hh, 0.0],
                    uv: [0.0, 0.0],
                    normal,
                },
            ],
            indices: vec![0, 1, 2, 0, 2, 3],
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Upload a mesh into fresh vertex and index buffers
pub fn create_mesh_buffers(device: &wgpu::Device, mesh: &Mesh) -> GpuMesh {
    use wgpu::util::DeviceExt;

    let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Vertex Buffer"),
        contents: bytemuck::cast_slice(&mesh.vertices),
        usage: wgpu::BufferUsages::VERTEX,
    });

    let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Index Buffer"),
        contents: bytemuck::cast_slice(&mesh.indices),
        usage: wgpu::BufferUsages::INDEX,
    });

    GpuMesh {
        vertex_buffer,
        index_buffer,
        index_count: mesh.indices.len() as u32,
    }
}

impl GpuComponent for Mesh {
    type Gpu = GpuMesh;

    // vertex count may change, so the default refresh rebuilds the buffers
    fn upload(&self, device: &wgpu::Device, _layouts: &SceneLayouts) -> GpuMesh {
        create_mesh_buffers(device, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cuboid_counts() {
        let mesh = Mesh::cuboid(Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.indices.len(), 36);
        assert_eq!(mesh.triangle_count(), 12);
    }

    #[test]
    fn test_cuboid_extents() {
        let mesh = Mesh::cuboid(Vector3::new(2.0, 4.0, 6.0));
        for vertex in &mesh.vertices {
            assert!((vertex.position[0].abs() - 1.0).abs() < 1e-6);
            assert!((vertex.position[1].abs() - 2.0).abs() < 1e-6);
            assert!((vertex.position[2].abs() - 3.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_cuboid_faces_wind_outward() {
        let mesh = Mesh::cuboid(Vector3::new(1.0, 1.0, 1.0));
        for triangle in mesh.indices.chunks(3) {
            let [a, b, c] = [0, 1, 2].map(|i| {
                let p = mesh.vertices[triangle[i] as usize].position;
                Vector3::new(p[0], p[1], p[2])
            });
            let face_normal = (b - a).cross(&(c - a));
            let n = mesh.vertices[triangle[0] as usize].normal;
            let expected = Vector3::new(n[0], n[1], n[2]);
            assert!(face_normal.dot(&expected) > 0.0);
        }
    }
}

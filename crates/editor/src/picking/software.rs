//! CPU pick backend: a small depth-tested triangle rasterizer.
//!
//! Used where no GPU device exists (headless tooling and tests). Matches the
//! visible render: samples at pixel centers, culls back faces (front faces are
//! counter-clockwise in NDC) and clips triangles against the near plane.

use anyhow::Context as _;
use idpick_engine::Result;
use idpick_engine::prelude::{Mesh, Point3, Vector4};
use super::codec::PickColor;
use super::readback::{PixelGrid, PixelSource};
use super::renderer::{PickCamera, PickDraw, PickRenderer};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SoftwarePickContext {
    pub generation: u64,
}

struct SoftwareTarget {
    color: PixelGrid,
    depth: Vec<f32>,
}

impl SoftwareTarget {
    fn new(width: u32, height: u32) -> Self {
        Self {
            color: PixelGrid::new(width, height),
            depth: vec![1.0; width as usize * height as usize],
        }
    }

    fn clear(&mut self) {
        self.color.fill(PickColor::SENTINEL);
        self.depth.fill(1.0);
    }

    fn rasterize(&mut self, a: Point3<f32>, b: Point3<f32>, c: Point3<f32>, color: PickColor) {
        // y points down in pixel space, so front faces have a negative area here
        let area = edge(&a, &b, &c);
        if !area.is_finite() || area >= -f32::EPSILON {
            return;
        }

        let width = self.color.width();
        let height = self.color.height();

        let min_x = a.x.min(b.x).min(c.x).floor().max(0.0) as u32;
        let min_y = a.y.min(b.y).min(c.y).floor().max(0.0) as u32;
        let max_x = a.x.max(b.x).max(c.x).ceil().min(width as f32) as u32;
        let max_y = a.y.max(b.y).max(c.y).ceil().min(height as f32) as u32;

        for py in min_y..max_y {
            for px in min_x..max_x {
                let p = Point3::new(px as f32 + 0.5, py as f32 + 0.5, 0.0);
                let wa = edge(&b, &c, &p) / area;
                let wb = edge(&c, &a, &p) / area;
                let wc = edge(&a, &b, &p) / area;
                if wa < 0.0 || wb < 0.0 || wc < 0.0 {
                    continue;
                }

                let z = wa * a.z + wb * b.z + wc * c.z;
                if !(0.0..=1.0).contains(&z) {
                    continue;
                }

                let offset = py as usize * width as usize + px as usize;
                if z < self.depth[offset] {
                    self.depth[offset] = z;
                    self.color.set(px, py, color);
                }
            }
        }
    }
}

/// Twice the signed area of `(a, b, p)` in screen space
fn edge(a: &Point3<f32>, b: &Point3<f32>, p: &Point3<f32>) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

/// Part of a clip-space triangle in front of the near plane (`z >= 0` in wgpu clip space).
///
/// Returns a convex polygon of 0, 3 or 4 vertices with the input winding.
fn clip_near(triangle: [Vector4<f32>; 3]) -> Vec<Vector4<f32>> {
    let mut polygon = Vec::with_capacity(4);

    for i in 0..3 {
        let current = triangle[i];
        let next = triangle[(i + 1) % 3];

        if current.z >= 0.0 {
            polygon.push(current);
        }
        if (current.z >= 0.0) != (next.z >= 0.0) {
            let t = current.z / (current.z - next.z);
            polygon.push(current + (next - current) * t);
        }
    }

    polygon
}

/// Clip space to pixel space (origin top-left) with NDC depth in `z`
fn to_screen(clip: &Vector4<f32>, width: u32, height: u32) -> Option<Point3<f32>> {
    if clip.w <= f32::EPSILON {
        return None;
    }

    let ndc = clip.xyz() / clip.w;
    Some(Point3::new(
        (ndc.x + 1.0) * 0.5 * width as f32,
        (1.0 - ndc.y) * 0.5 * height as f32,
        ndc.z,
    ))
}

pub struct SoftwarePickRenderer {
    generation: u64,
    target: Option<SoftwareTarget>,
}

impl PickRenderer for SoftwarePickRenderer {
    type Mesh = Mesh;
    type Context = SoftwarePickContext;

    fn create(context: &Self::Context) -> Result<Self> {
        log::info!(
            "Created software pick renderer (generation {})",
            context.generation
        );
        Ok(Self {
            generation: context.generation,
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

        self.target = Some(SoftwareTarget::new(width, height));
        log::info!("Allocated software pick target {}x{}", width, height);
        Ok(())
    }

    fn target_size(&self) -> Option<(u32, u32)> {
        self.target
            .as_ref()
            .map(|target| (target.color.width(), target.color.height()))
    }

    fn render(&mut self, camera: &PickCamera, draws: &[PickDraw<'_, Mesh>]) -> Result<()> {
        let target = self
            .target
            .as_mut()
            .context("software pick target was not allocated")?;
        target.clear();

        let (width, height) = (target.color.width(), target.color.height());
        let view_projection = camera.view_projection();

        for draw in draws {
            let mvp = view_projection * draw.model;
            let clip: Vec<Vector4<f32>> = draw
                .mesh
                .vertices
                .iter()
                .map(|vertex| {
                    let [x, y, z] = vertex.position;
                    mvp * Vector4::new(x, y, z, 1.0)
                })
                .collect();

            for triangle in draw.mesh.indices.chunks_exact(3) {
                let corner = |i: usize| clip.get(triangle[i] as usize).copied();
                let (Some(a), Some(b), Some(c)) = (corner(0), corner(1), corner(2)) else {
                    continue;
                };

                let screen: Option<Vec<Point3<f32>>> = clip_near([a, b, c])
                    .iter()
                    .map(|vertex| to_screen(vertex, width, height))
                    .collect();
                let Some(screen) = screen else {
                    continue;
                };

                for k in 2..screen.len() {
                    target.rasterize(screen[0], screen[k - 1], screen[k], draw.color);
                }
            }
        }

        Ok(())
    }
}

impl PixelSource for SoftwarePickRenderer {
    fn dimensions(&self) -> (u32, u32) {
        self.target_size().unwrap_or((0, 0))
    }

    fn read_pixel(&mut self, x: u32, y: u32) -> Result<PickColor> {
        self.target
            .as_mut()
            .context("software pick target was not allocated")?
            .color
            .read_pixel(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::picking::codec::encode;
    use crate::picking::readback::sample_at;
    use idpick_engine::prelude::{Camera, Transform, UnitQuaternion, Vector3};
    use nalgebra::Matrix4;
    use std::f32::consts::{FRAC_PI_2, PI};

    fn camera(aspect: f32) -> PickCamera {
        let camera = Camera {
            is_main: true,
            target: Point3::origin(),
            fovy: 1.0,
            znear: 0.1,
            zfar: 100.0,
        };
        let transform = Transform::from_position(Point3::new(0.0, 0.0, 10.0));
        PickCamera {
            view: camera.view_matrix(&transform),
            projection: camera.projection_matrix(aspect),
        }
    }

    fn renderer(width: u32, height: u32) -> SoftwarePickRenderer {
        let mut renderer = SoftwarePickRenderer::create(&SoftwarePickContext::default()).unwrap();
        renderer.ensure_target(width, height).unwrap();
        renderer
    }

    fn at(z: f32) -> Matrix4<f32> {
        Transform::from_position(Point3::new(0.0, 0.0, z)).to_matrix()
    }

    #[test]
    fn test_nearest_entity_wins() {
        let quad = Mesh::quad(2.0, 2.0);
        let mut renderer = renderer(100, 100);

        // far one drawn last so only the depth test can keep the near one
        let draws = [
            PickDraw {
                mesh: &quad,
                model: at(2.0),
                color: encode(2),
            },
            PickDraw {
                mesh: &quad,
                model: at(0.0),
                color: encode(1),
            },
        ];
        renderer.render(&camera(1.0), &draws).unwrap();

        assert_eq!(sample_at(&mut renderer, 50.0, 50.0).unwrap(), encode(2));
    }

    #[test]
    fn test_background_stays_sentinel() {
        let cube = Mesh::cuboid(Vector3::new(1.0, 1.0, 1.0));
        let mut renderer = renderer(100, 100);

        let draws = [PickDraw {
            mesh: &cube,
            model: at(0.0),
            color: encode(3),
        }];
        renderer.render(&camera(1.0), &draws).unwrap();

        assert_eq!(sample_at(&mut renderer, 50.0, 50.0).unwrap(), encode(3));
        assert!(sample_at(&mut renderer, 2.0, 2.0).unwrap().is_sentinel());
    }

    #[test]
    fn test_render_clears_previous_frame() {
        let quad = Mesh::quad(2.0, 2.0);
        let mut renderer = renderer(64, 64);

        let draws = [PickDraw {
            mesh: &quad,
            model: at(0.0),
            color: encode(5),
        }];
        renderer.render(&camera(1.0), &draws).unwrap();
        renderer.render(&camera(1.0), &[]).unwrap();

        assert!(sample_at(&mut renderer, 32.0, 32.0).unwrap().is_sentinel());
    }

    #[test]
    fn test_geometry_behind_camera_is_ignored() {
        let quad = Mesh::quad(2.0, 2.0);
        let mut renderer = renderer(64, 64);

        let draws = [PickDraw {
            mesh: &quad,
            model: at(20.0),
            color: encode(5),
        }];
        renderer.render(&camera(1.0), &draws).unwrap();

        assert!(sample_at(&mut renderer, 32.0, 32.0).unwrap().is_sentinel());
    }

    #[test]
    fn test_turned_away_quad_does_not_hide_cube() {
        let cube = Mesh::cuboid(Vector3::new(1.0, 1.0, 1.0));
        let quad = Mesh::quad(4.0, 4.0);
        let mut renderer = renderer(100, 100);

        let turned_away = Transform {
            position: Point3::new(0.0, 0.0, 3.0),
            rotation: UnitQuaternion::from_euler_angles(0.0, PI, 0.0),
            ..Default::default()
        };
        let draws = [
            PickDraw {
                mesh: &cube,
                model: at(0.0),
                color: encode(1),
            },
            PickDraw {
                mesh: &quad,
                model: turned_away.to_matrix(),
                color: encode(2),
            },
        ];
        renderer.render(&camera(1.0), &draws).unwrap();

        assert_eq!(sample_at(&mut renderer, 50.0, 50.0).unwrap(), encode(1));
        // outside the cube only the back of the quad is there
        assert!(sample_at(&mut renderer, 35.0, 50.0).unwrap().is_sentinel());
    }

    #[test]
    fn test_floor_reaching_behind_camera_is_clipped() {
        let floor = Mesh::quad(100.0, 100.0);
        let mut renderer = renderer(100, 100);

        let transform = Transform {
            position: Point3::new(0.0, -1.0, 0.0),
            rotation: UnitQuaternion::from_euler_angles(-FRAC_PI_2, 0.0, 0.0),
            ..Default::default()
        };
        let draws = [PickDraw {
            mesh: &floor,
            model: transform.to_matrix(),
            color: encode(4),
        }];
        renderer.render(&camera(1.0), &draws).unwrap();

        assert_eq!(sample_at(&mut renderer, 50.0, 90.0).unwrap(), encode(4));
        assert!(sample_at(&mut renderer, 50.0, 10.0).unwrap().is_sentinel());
    }

    #[test]
    fn test_clip_near_splits_crossing_triangle() {
        let inside = Vector4::new(0.0, 0.0, 0.5, 1.0);
        let behind = Vector4::new(1.0, 0.0, -0.5, 1.0);

        assert_eq!(clip_near([inside, inside, inside]).len(), 3);
        assert!(clip_near([behind, behind, behind]).is_empty());

        let polygon = clip_near([inside, behind, inside]);
        assert_eq!(polygon.len(), 4);
        assert!(polygon.iter().all(|vertex| vertex.z >= 0.0));
        assert!((polygon[1].x - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_target_is_reused_or_recreated() {
        let mut renderer = renderer(640, 480);
        assert_eq!(renderer.target_size(), Some((640, 480)));

        renderer.ensure_target(640, 480).unwrap();
        assert_eq!(renderer.target_size(), Some((640, 480)));

        renderer.ensure_target(200, 150).unwrap();
        assert_eq!(renderer.target_size(), Some((200, 150)));
        assert_eq!(renderer.dimensions(), (200, 150));
    }

    #[test]
    fn test_render_without_target_fails() {
        let mut renderer = SoftwarePickRenderer::create(&SoftwarePickContext::default()).unwrap();
        assert!(renderer.render(&camera(1.0), &[]).is_err());
        assert_eq!(renderer.dimensions(), (0, 0));
    }

    #[test]
    fn test_generation_change_is_stale() {
        let renderer = SoftwarePickRenderer::create(&SoftwarePickContext { generation: 1 }).unwrap();
        assert!(!renderer.is_stale(&SoftwarePickContext { generation: 1 }));
        assert!(renderer.is_stale(&SoftwarePickContext { generation: 2 }));
    }
}

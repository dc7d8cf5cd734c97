use idpick_engine::Result;
use nalgebra::{Matrix4, Point2};

use super::codec::PickColor;
use super::handle::Handle;
use super::readback::PixelSource;

/// Size of the area a pick renders into, in pixels
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ViewportSize {
    pub width: u32,
    pub height: u32,
}

impl ViewportSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn aspect(&self) -> f32 {
        self.width.max(1) as f32 / self.height.max(1) as f32
    }

    /// Prefer the drawable rect the host reports, otherwise fall back to the full viewport
    pub fn resolve(drawable: Option<ViewportSize>, full: ViewportSize) -> ViewportSize {
        match drawable {
            Some(size) => size,
            None => {
                log::warn!(
                    "No drawable rect for pick, using full viewport {}x{}",
                    full.width,
                    full.height
                );
                full
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PickCamera {
    pub view: Matrix4<f32>,
    pub projection: Matrix4<f32>,
}

impl PickCamera {
    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection * self.view
    }
}

/// An entity as the pick pass sees it. `mesh` is `None` while geometry is still loading.
pub struct PickEntity<'a, M> {
    pub handle: Handle,
    pub world_transform: Matrix4<f32>,
    pub mesh: Option<&'a M>,
}

pub struct PickDraw<'a, M> {
    pub mesh: &'a M,
    pub model: Matrix4<f32>,
    pub color: PickColor,
}

/// One click or key press, in viewport-local pixels with the origin top-left
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PickTrigger {
    pub mouse: Point2<f32>,
    pub viewport: ViewportSize,
}

/// Backend that draws pick colors into an off-screen target and reads them back.
pub trait PickRenderer: PixelSource + Sized {
    type Mesh;
    /// Whatever the backend needs from the host to create itself
    type Context;

    fn create(context: &Self::Context) -> Result<Self>;

    /// True once the graphics context this renderer was created from is gone
    fn is_stale(&self, context: &Self::Context) -> bool;

    /// Allocate the target at exactly this size, reusing it if it already matches
    fn ensure_target(&mut self, width: u32, height: u32) -> Result<()>;

    fn target_size(&self) -> Option<(u32, u32)>;

    /// Clear to the sentinel and far depth, then draw every entry with depth testing
    fn render(&mut self, camera: &PickCamera, draws: &[PickDraw<'_, Self::Mesh>]) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_prefers_drawable() {
        let size = ViewportSize::resolve(
            Some(ViewportSize::new(320, 200)),
            ViewportSize::new(640, 480),
        );
        assert_eq!(size, ViewportSize::new(320, 200));
    }

    #[test]
    fn test_resolve_falls_back_to_full() {
        let size = ViewportSize::resolve(None, ViewportSize::new(640, 480));
        assert_eq!(size, ViewportSize::new(640, 480));
    }

    #[test]
    fn test_empty_viewport() {
        assert!(ViewportSize::new(0, 10).is_empty());
        assert!(!ViewportSize::new(1, 1).is_empty());
        assert_eq!(ViewportSize::new(0, 0).aspect(), 1.0);
    }
}

use idpick_engine::Result;

use super::codec::{PickColor, decode};
use super::handle::Handle;
use super::registry::IdentifierRegistry;

/// Anything a single pick texel can be read back from
pub trait PixelSource {
    /// Current `(width, height)`, `(0, 0)` when nothing has been allocated
    fn dimensions(&self) -> (u32, u32);

    /// Read one texel. Callers guarantee `x < width` and `y < height`.
    fn read_pixel(&mut self, x: u32, y: u32) -> Result<PickColor>;
}

/// Row-major CPU grid of pick colors
#[derive(Clone, Debug, PartialEq)]
pub struct PixelGrid {
    width: u32,
    height: u32,
    pixels: Vec<PickColor>,
}

impl PixelGrid {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![PickColor::SENTINEL; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn fill(&mut self, color: PickColor) {
        self.pixels.fill(color);
    }

    pub fn get(&self, x: u32, y: u32) -> Option<PickColor> {
        self.offset(x, y).map(|offset| self.pixels[offset])
    }

    pub fn set(&mut self, x: u32, y: u32, color: PickColor) {
        if let Some(offset) = self.offset(x, y) {
            self.pixels[offset] = color;
        }
    }

    fn offset(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y as usize * self.width as usize + x as usize)
    }
}

impl PixelSource for PixelGrid {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn read_pixel(&mut self, x: u32, y: u32) -> Result<PickColor> {
        self.get(x, y).ok_or_else(|| {
            anyhow::anyhow!(
                "pixel ({}, {}) outside {}x{} grid",
                x,
                y,
                self.width,
                self.height
            )
        })
    }
}

/// Read the pick color under a viewport-local cursor position.
///
/// Coordinates left of / above the target or at or past its far edge miss
/// everything and yield the sentinel without touching the source. Anything
/// inside is floored to a texel and clamped to the last row/column.
pub fn sample_at<S>(source: &mut S, x: f32, y: f32) -> Result<PickColor>
where
    S: PixelSource + ?Sized,
{
    let (width, height) = source.dimensions();

    if !x.is_finite() || !y.is_finite() || x < 0.0 || y < 0.0 {
        return Ok(PickColor::SENTINEL);
    }
    if x >= width as f32 || y >= height as f32 {
        return Ok(PickColor::SENTINEL);
    }

    let px = (x.floor() as u32).min(width - 1);
    let py = (y.floor() as u32).min(height - 1);

    source.read_pixel(px, py)
}

/// Turn a sampled color back into the handle drawn there during the last pass
pub fn resolve(sample: PickColor, registry: &IdentifierRegistry) -> Option<Handle> {
    let index = decode(sample);
    registry
        .lookup(index)
        .map(|version| Handle::new(index, version))
}

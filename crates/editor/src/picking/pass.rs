use idpick_engine::Result;

use super::codec::{PickColor, RESERVED_INDEX, encode};
use super::readback::sample_at;
use super::registry::IdentifierRegistry;
use super::renderer::{PickCamera, PickDraw, PickEntity, PickRenderer};

/// Off-screen color-ID pass over a single backend.
///
/// Owns the pick target through its renderer; the target lives as long as the pass.
pub struct PickingRenderPass<R: PickRenderer> {
    renderer: R,
}

impl<R: PickRenderer> PickingRenderPass<R> {
    pub fn new(renderer: R) -> Self {
        Self { renderer }
    }

    pub fn create(context: &R::Context) -> Result<Self> {
        Ok(Self::new(R::create(context)?))
    }

    pub fn is_stale(&self, context: &R::Context) -> bool {
        self.renderer.is_stale(context)
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn target_size(&self) -> Option<(u32, u32)> {
        self.renderer.target_size()
    }

    pub fn ensure_target(&mut self, width: u32, height: u32) -> Result<()> {
        self.renderer.ensure_target(width.max(1), height.max(1))
    }

    /// Draw every entity with a loaded mesh in its pick color and record what was drawn.
    ///
    /// Returns the number of entities drawn.
    pub fn render<'a, I>(
        &mut self,
        camera: &PickCamera,
        entities: I,
        registry: &mut IdentifierRegistry,
    ) -> Result<usize>
    where
        I: IntoIterator<Item = PickEntity<'a, R::Mesh>>,
        R::Mesh: 'a,
    {
        let mut draws = Vec::new();

        for entity in entities {
            let Some(mesh) = entity.mesh else {
                log::debug!("Skipping {} in pick pass, mesh not loaded", entity.handle);
                continue;
            };
            if entity.handle.index == RESERVED_INDEX {
                log::warn!("Skipping {} in pick pass, index is reserved", entity.handle);
                continue;
            }

            registry.record(entity.handle.index, entity.handle.version);
            draws.push(PickDraw {
                mesh,
                model: entity.world_transform,
                color: encode(entity.handle.index),
            });
        }

        self.renderer.render(camera, &draws)?;
        Ok(draws.len())
    }

    pub fn sample(&mut self, x: f32, y: f32) -> Result<PickColor> {
        sample_at(&mut self.renderer, x, y)
    }
}

use idpick_engine::Result;

use super::handle::Handle;
use super::pass::PickingRenderPass;
use super::readback::resolve;
use super::registry::IdentifierRegistry;
use super::renderer::{PickCamera, PickEntity, PickRenderer, PickTrigger};

/// Whatever owns "the selected object" in the host editor
pub trait SelectionHost {
    fn select(&mut self, handle: Handle);
    fn clear_selection(&mut self);
    fn current_selection(&self) -> Option<Handle>;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PickState {
    #[default]
    Idle,
    /// Only observable from inside a single `on_trigger_event` call
    Picking,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PickOutcome {
    /// Nothing was rendered (no camera or an empty viewport), selection untouched
    Skipped,
    Selected(Handle),
    /// Clicked on empty space, selection cleared
    Cleared,
    /// The backend failed mid-pick, selection untouched
    Failed,
}

/// Turns one click into one selection, synchronously.
///
/// Owns the picking render pass (and with it the off-screen target), the
/// identifier registry and the last handle it handed to the host. Nothing is
/// shared between controllers, so each viewport gets its own.
pub struct PickController<R: PickRenderer> {
    state: PickState,
    pass: Option<PickingRenderPass<R>>,
    registry: IdentifierRegistry,
    emitted: Option<Handle>,
}

impl<R: PickRenderer> Default for PickController<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: PickRenderer> PickController<R> {
    pub fn new() -> Self {
        Self {
            state: PickState::Idle,
            pass: None,
            registry: IdentifierRegistry::new(),
            emitted: None,
        }
    }

    pub fn on_trigger_event<'a, I, H>(
        &mut self,
        context: &R::Context,
        trigger: PickTrigger,
        camera: Option<&PickCamera>,
        entities: I,
        host: &mut H,
    ) -> PickOutcome
    where
        I: IntoIterator<Item = PickEntity<'a, R::Mesh>>,
        R::Mesh: 'a,
        H: SelectionHost + ?Sized,
    {
        let Some(camera) = camera else {
            log::debug!("Pick skipped, no camera");
            return PickOutcome::Skipped;
        };
        if trigger.viewport.is_empty() {
            log::debug!(
                "Pick skipped, viewport is {}x{}",
                trigger.viewport.width,
                trigger.viewport.height
            );
            return PickOutcome::Skipped;
        }

        self.state = PickState::Picking;
        let picked = self.pick(context, trigger, camera, entities);
        self.state = PickState::Idle;

        match picked {
            Ok(Some(handle)) => {
                log::debug!("Picked {}", handle);
                host.select(handle);
                self.emitted = Some(handle);
                PickOutcome::Selected(handle)
            }
            Ok(None) => {
                log::debug!("Picked nothing, clearing selection");
                host.clear_selection();
                self.emitted = None;
                PickOutcome::Cleared
            }
            Err(error) => {
                log::error!("Pick failed: {:#}", error);
                PickOutcome::Failed
            }
        }
    }

    fn pick<'a, I>(
        &mut self,
        context: &R::Context,
        trigger: PickTrigger,
        camera: &PickCamera,
        entities: I,
    ) -> Result<Option<Handle>>
    where
        I: IntoIterator<Item = PickEntity<'a, R::Mesh>>,
        R::Mesh: 'a,
    {
        if self.pass.as_ref().is_some_and(|pass| pass.is_stale(context)) {
            log::info!("Graphics context was reset, recreating pick renderer");
            self.pass = None;
        }
        let pass = match self.pass.take() {
            Some(pass) => pass,
            None => PickingRenderPass::create(context)?,
        };
        let pass = self.pass.insert(pass);

        pass.ensure_target(trigger.viewport.width, trigger.viewport.height)?;

        self.registry.reset();
        let drawn = pass.render(camera, entities, &mut self.registry)?;

        let sample = pass.sample(trigger.mouse.x, trigger.mouse.y)?;
        let hit = resolve(sample, &self.registry);
        log::debug!(
            "Pick at ({}, {}) drew {} entities, sampled {:?}",
            trigger.mouse.x,
            trigger.mouse.y,
            drawn,
            sample.0
        );

        Ok(hit)
    }

    /// The handle this controller last handed to the host
    pub fn current_selection(&self) -> Option<Handle> {
        self.emitted
    }

    pub fn state(&self) -> PickState {
        self.state
    }

    pub fn target_size(&self) -> Option<(u32, u32)> {
        self.pass.as_ref().and_then(|pass| pass.target_size())
    }

    pub fn registry(&self) -> &IdentifierRegistry {
        &self.registry
    }

    pub fn renderer(&self) -> Option<&R> {
        self.pass.as_ref().map(|pass| pass.renderer())
    }

    /// Drop the pick target and, if the host still shows our pick, clear it
    pub fn teardown<H: SelectionHost + ?Sized>(&mut self, host: &mut H) {
        if let Some(handle) = self.emitted.take() {
            if host.current_selection() == Some(handle) {
                host.clear_selection();
            }
        }

        self.pass = None;
        self.registry.reset();
        self.state = PickState::Idle;
        log::info!("Pick controller torn down");
    }
}

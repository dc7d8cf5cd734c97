use crate::inspector::{ComponentInspector, create_component_inspector};
use crate::picking::{PickOutcome, PickTrigger, PickingConfig, find_entity};
use crate::prelude::*;

#[derive(Default)]
pub struct EditorState {
    pub selected_entity: Option<(Entity, Tag)>,
    pub component_inspector: ComponentInspector,
    pub picking: PickingConfig,
    /// Raised by the viewport this frame, consumed by the editor layer after the UI pass
    pub pick_request: Option<PickTrigger>,
    pub last_pick: Option<PickOutcome>,
}

impl EditorState {
    pub fn new() -> Self {
        Self::with_config(PickingConfig::default())
    }

    pub fn with_config(picking: PickingConfig) -> Self {
        Self {
            selected_entity: None,
            component_inspector: create_component_inspector(),
            picking,
            pick_request: None,
            last_pick: None,
        }
    }

    pub fn select_entity(&mut self, entity: Entity, tag: Tag) {
        self.selected_entity = Some((entity, tag));
    }

    pub fn deselect_entity(&mut self) {
        self.selected_entity = None;
    }

    pub fn is_entity_selected(&self, entity: Entity) -> bool {
        self.selected_entity
            .as_ref()
            .is_some_and(|(e, _)| entity == *e)
    }

    pub fn request_pick(&mut self, trigger: PickTrigger) {
        self.pick_request = Some(trigger);
    }
}

/// Editor selection seen through pick handles
pub struct WorldSelection<'w> {
    state: &'w mut EditorState,
    world: &'w World,
}

impl<'w> WorldSelection<'w> {
    pub fn new(state: &'w mut EditorState, world: &'w World) -> Self {
        Self { state, world }
    }
}

impl SelectionHost for WorldSelection<'_> {
    fn select(&mut self, handle: Handle) {
        let Some(entity) = find_entity(self.world, handle) else {
            log::warn!("Picked {} but it no longer exists", handle);
            self.state.deselect_entity();
            return;
        };

        let tag = self
            .world
            .get::<Tag>(entity)
            .cloned()
            .unwrap_or_else(|| Tag {
                label: format!("Entity {}", handle),
            });
        self.state.select_entity(entity, tag);
    }

    fn clear_selection(&mut self) {
        self.state.deselect_entity();
    }

    fn current_selection(&self) -> Option<Handle> {
        self.state
            .selected_entity
            .as_ref()
            .map(|(entity, _)| Handle::from(*entity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_uses_tag() {
        let mut world = World::new();
        let entity = world
            .spawn((
                Tag {
                    label: "Cube".to_string(),
                },
                Transform::default(),
            ))
            .id();
        let mut state = EditorState::with_config(PickingConfig::click_only());

        let mut selection = WorldSelection::new(&mut state, &world);
        selection.select(Handle::from(entity));
        assert_eq!(selection.current_selection(), Some(Handle::from(entity)));

        let (selected, tag) = state.selected_entity.clone().unwrap();
        assert_eq!(selected, entity);
        assert_eq!(tag.label, "Cube");
    }

    #[test]
    fn test_select_untagged_entity() {
        let mut world = World::new();
        let entity = world.spawn(Transform::default()).id();
        let mut state = EditorState::default();

        WorldSelection::new(&mut state, &world).select(Handle::from(entity));
        assert!(state.is_entity_selected(entity));
    }

    #[test]
    fn test_stale_handle_deselects() {
        let mut world = World::new();
        let entity = world.spawn(Transform::default()).id();
        let stale = Handle::from(entity);
        world.despawn(entity);

        let mut state = EditorState::default();
        state.select_entity(
            entity,
            Tag {
                label: "Gone".to_string(),
            },
        );

        WorldSelection::new(&mut state, &world).select(stale);
        assert!(state.selected_entity.is_none());
    }

    #[test]
    fn test_clear_selection() {
        let world = World::new();
        let mut state = EditorState::default();
        state.select_entity(
            Entity::PLACEHOLDER,
            Tag {
                label: "x".to_string(),
            },
        );

        let mut selection = WorldSelection::new(&mut state, &world);
        selection.clear_selection();
        assert_eq!(selection.current_selection(), None);
    }
}

use bevy_ecs::entity::Entity;

/// Identity of a scene object at the moment it was drawn.
///
/// `index` names a slot in the entity store and `version` the generation that
/// occupied it. Two handles are the same object only if both fields match, so a
/// handle captured before a despawn never aliases whatever reuses the slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Handle {
    pub index: u32,
    pub version: u32,
}

impl Handle {
    pub const fn new(index: u32, version: u32) -> Self {
        Self { index, version }
    }

    pub fn refers_to(&self, entity: Entity) -> bool {
        *self == Handle::from(entity)
    }
}

impl From<Entity> for Handle {
    fn from(entity: Entity) -> Self {
        Self {
            index: entity.index(),
            version: entity.generation().to_bits(),
        }
    }
}

impl std::fmt::Display for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}v{}", self.index, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_ecs::world::World;

    #[test]
    fn test_handle_from_entity() {
        let mut world = World::new();
        let entity = world.spawn_empty().id();
        let handle = Handle::from(entity);

        assert_eq!(handle.index, entity.index());
        assert!(handle.refers_to(entity));
    }

    #[test]
    fn test_reused_slot_is_a_different_handle() {
        let mut world = World::new();
        let first = world.spawn_empty().id();
        let old = Handle::from(first);
        world.despawn(first);

        let second = world.spawn_empty().id();
        assert_eq!(second.index(), first.index());
        assert!(!old.refers_to(second));
        assert_ne!(old, Handle::from(second));
    }
}

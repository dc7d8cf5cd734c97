use bevy_ecs::component::Component;
use bevy_ecs::entity::Entity;
use bevy_ecs::query::With;
use bevy_ecs::world::World;
use idpick_engine::prelude::{Camera, Mesh, Transform};

use super::handle::Handle;
use super::renderer::{PickCamera, PickEntity};

/// Every entity with a `Mesh` and a `Transform`, paired with its mesh of type `M` if present.
///
/// For the GPU path `M` is `GpuMesh`, which only shows up once the render layer
/// has uploaded the geometry.
pub fn pickable_entities<M: Component>(world: &World) -> Vec<PickEntity<'_, M>> {
    // `M` is looked up per entity, a query over it would need it registered first
    let Some(mut query) = world.try_query_filtered::<(Entity, &Transform), With<Mesh>>() else {
        return Vec::new();
    };

    query
        .iter(world)
        .map(|(entity, transform)| PickEntity {
            handle: Handle::from(entity),
            world_transform: transform.to_matrix(),
            mesh: world.get::<M>(entity),
        })
        .collect()
}

/// View and projection of the main camera for a viewport with the given aspect ratio
pub fn main_camera(world: &World, aspect: f32) -> Option<PickCamera> {
    let mut query = world.try_query::<(&Camera, &Transform)>()?;

    query
        .iter(world)
        .find(|(camera, _)| camera.is_main)
        .map(|(camera, transform)| PickCamera {
            view: camera.view_matrix(transform),
            projection: camera.projection_matrix(aspect),
        })
}

/// The live entity a handle refers to, `None` if it was despawned or its slot reused
pub fn find_entity(world: &World, handle: Handle) -> Option<Entity> {
    let mut query = world.try_query::<Entity>()?;
    query
        .iter(world)
        .find(|entity| handle.refers_to(*entity))
}

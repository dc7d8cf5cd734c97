use bevy_ecs::component::Mutable;

use crate::prelude::*;

/// Bind group layouts shared by every scene component that lives on the GPU
#[derive(Resource)]
pub struct SceneLayouts {
    pub camera: wgpu::BindGroupLayout,
    pub transform: wgpu::BindGroupLayout,
}

/// A scene component with a device-side copy kept in sync by the render layer.
///
/// `upload` builds the copy the first time the component is seen. `refresh`
/// runs on every later change and rebuilds the copy unless the component
/// overrides it with an in-place write.
pub trait GpuComponent: Component + Sized {
    type Gpu: Component<Mutability = Mutable>;

    fn upload(&self, device: &wgpu::Device, layouts: &SceneLayouts) -> Self::Gpu;

    fn refresh(
        &self,
        gpu: &mut Self::Gpu,
        device: &wgpu::Device,
        _queue: &wgpu::Queue,
        layouts: &SceneLayouts,
    ) {
        *gpu = self.upload(device, layouts);
    }
}

/// Uploads components that have no GPU copy yet
pub fn upload_system<T: GpuComponent>(
    mut commands: Commands,
    device: Res<GpuDevice>,
    layouts: Res<SceneLayouts>,
    query: Query<(Entity, &T), Without<T::Gpu>>,
) {
    for (entity, component) in query.iter() {
        commands.entity(entity).insert(component.upload(&device.0, &layouts));
        log::debug!(
            "Uploaded {} for {:?}",
            std::any::type_name::<T>(),
            entity
        );
    }
}

/// Pushes changes of already uploaded components
pub fn refresh_system<T: GpuComponent>(
    device: Res<GpuDevice>,
    queue: Res<GpuQueue>,
    layouts: Res<SceneLayouts>,
    mut query: Query<(&T, &mut T::Gpu), Changed<T>>,
) {
    for (component, mut gpu) in query.iter_mut() {
        component.refresh(&mut gpu, &device.0, &queue.0, &layouts);
    }
}

/// Removes every `T::Gpu`, returning how many entities lost one.
///
/// Used when the device is recreated, the upload systems then rebuild them.
pub fn release_gpu<T: GpuComponent>(world: &mut World) -> usize {
    let entities: Vec<Entity> = world
        .query_filtered::<Entity, With<T::Gpu>>()
        .iter(world)
        .collect();

    for &entity in &entities {
        world.entity_mut(entity).remove::<T::Gpu>();
    }
    entities.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Component)]
    struct Counter(u32);

    #[derive(Component)]
    struct GpuCounter;

    // Layouts and devices are never touched by `release_gpu`
    impl GpuComponent for Counter {
        type Gpu = GpuCounter;

        fn upload(&self, _device: &wgpu::Device, _layouts: &SceneLayouts) -> GpuCounter {
            GpuCounter
        }
    }

    #[test]
    fn test_release_removes_only_gpu_copies() {
        let mut world = World::new();
        let uploaded = world.spawn((Counter(1), GpuCounter)).id();
        let pending = world.spawn(Counter(2)).id();

        assert_eq!(release_gpu::<Counter>(&mut world), 1);
        assert!(world.get::<GpuCounter>(uploaded).is_none());
        assert_eq!(world.get::<Counter>(uploaded).map(|c| c.0), Some(1));
        assert!(world.get::<Counter>(pending).is_some());
        assert_eq!(release_gpu::<Counter>(&mut world), 0);
    }
}

//! Component panels for the selected entity.
//!
//! Components opt in with [`register_inspectable!`](crate::register_inspectable) or
//! [`register_inspectable_readonly!`](crate::register_inspectable_readonly); the
//! registrations are gathered at link time through `inventory`.

mod camera;
mod mesh;
mod transform;

use crate::prelude::*;
use bevy_ecs::component::Mutable;

pub trait Inspectable {
    fn inspect(&mut self, ui: &mut egui::Ui);
}

/// For components shown but never edited, no Clone/PartialEq needed
pub trait InspectableReadOnly {
    fn inspect_readonly(&self, ui: &mut egui::Ui);
}

pub struct InspectableRegistration {
    pub name: &'static str,
    pub register_fn: fn(&mut ComponentInspector),
}

inventory::collect!(InspectableRegistration);

#[macro_export]
macro_rules! register_inspectable {
    ($type:ty, $name:expr) => {
        inventory::submit! {
            $crate::inspector::InspectableRegistration {
                name: $name,
                register_fn: |inspector| {
                    inspector.register::<$type>($name);
                },
            }
        }
    };
}

#[macro_export]
macro_rules! register_inspectable_readonly {
    ($type:ty, $name:expr) => {
        inventory::submit! {
            $crate::inspector::InspectableRegistration {
                name: $name,
                register_fn: |inspector| {
                    inspector.register_readonly::<$type>($name);
                },
            }
        }
    };
}

/// Inspector with every component registered through the macros above
pub fn create_component_inspector() -> ComponentInspector {
    let mut inspector = ComponentInspector::new();

    for registration in inventory::iter::<InspectableRegistration> {
        log::debug!("Registering inspector for {}", registration.name);
        (registration.register_fn)(&mut inspector);
    }
    log::info!("{} inspectable components registered", inspector.len());

    inspector
}

type InspectFn = Box<dyn Fn(&mut World, Entity, &mut egui::Ui) + Send + Sync>;

#[derive(Default)]
pub struct ComponentInspector {
    inspectors: Vec<(&'static str, InspectFn)>,
}

impl ComponentInspector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Editable panel. The component is only marked changed when the edit actually differs,
    /// so GPU mirrors and pick state are not rebuilt every frame the panel is open.
    pub fn register<T>(&mut self, name: &'static str)
    where
        T: Component<Mutability = Mutable> + Inspectable + Clone + PartialEq,
    {
        let inspect_fn: InspectFn = Box::new(move |world, entity, ui| {
            let Ok(mut entity_mut) = world.get_entity_mut(entity) else {
                return;
            };
            let Some(mut component) = entity_mut.get_mut::<T>() else {
                return;
            };

            let mut edited = None;
            ui.collapsing(name, |ui| {
                let mut draft = component.bypass_change_detection().clone();
                draft.inspect(ui);
                edited = Some(draft);
            });

            if let Some(draft) = edited {
                component.set_if_neq(draft);
            }
        });
        self.inspectors.push((name, inspect_fn));
    }

    pub fn register_readonly<T>(&mut self, name: &'static str)
    where
        T: Component + InspectableReadOnly,
    {
        let inspect_fn: InspectFn = Box::new(move |world, entity, ui| {
            if let Some(component) = world.get::<T>(entity) {
                ui.collapsing(name, |ui| {
                    component.inspect_readonly(ui);
                });
            }
        });
        self.inspectors.push((name, inspect_fn));
    }

    pub fn inspect_entity(&self, world: &mut World, entity: Entity, ui: &mut egui::Ui) {
        for (_name, inspect_fn) in &self.inspectors {
            inspect_fn(world, entity, ui);
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.inspectors.iter().map(|(name, _)| *name)
    }

    pub fn len(&self) -> usize {
        self.inspectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inspectors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_components_are_registered() {
        let inspector = create_component_inspector();
        let names: Vec<_> = inspector.names().collect();

        assert!(names.contains(&"Transform"));
        assert!(names.contains(&"Camera"));
        assert!(names.contains(&"Mesh"));
    }

    #[test]
    fn test_manual_registration() {
        let mut inspector = ComponentInspector::new();
        assert!(inspector.is_empty());

        inspector.register::<Transform>("Transform");
        inspector.register_readonly::<Mesh>("Mesh");
        assert_eq!(inspector.len(), 2);
    }
}

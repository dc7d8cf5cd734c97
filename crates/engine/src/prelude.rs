pub use crate::components::*;
pub use crate::gpu_component::*;
pub use crate::input::InputState;
pub use crate::{Layer, LayerContext, LayerEvent, Result, World};

pub use bevy_ecs::prelude::*;
pub use encase::ShaderType;
pub use nalgebra::{
    Isometry3, Matrix4, Perspective3, Point2, Point3, UnitQuaternion, Vector2, Vector3, Vector4,
};

pub use crate::inspector::{Inspectable, InspectableReadOnly};
pub use crate::picking::{
    Handle, IdentifierRegistry, PickCamera, PickColor, PickController, PickEntity, PickOutcome,
    PickTrigger, PickingConfig, SelectionHost, ViewportSize,
};
pub use idpick_engine::prelude::*;

//! Click-to-select through an off-screen color-ID pass.
//!
//! Every pickable entity is drawn into a private target in a color that
//! encodes its index, the texel under the cursor is read back and decoded,
//! and the result is checked against the registry of what was actually drawn.

pub mod codec;
pub mod config;
pub mod controller;
pub mod ecs;
pub mod gpu;
pub mod handle;
pub mod pass;
pub mod readback;
pub mod registry;
pub mod renderer;
pub mod software;

pub use codec::{PickColor, RESERVED_INDEX, decode, encode};
pub use config::PickingConfig;
pub use controller::{PickController, PickOutcome, PickState, SelectionHost};
pub use ecs::{find_entity, main_camera, pickable_entities};
pub use gpu::{GpuPickContext, GpuPickRenderer};
pub use handle::Handle;
pub use pass::PickingRenderPass;
pub use readback::{PixelGrid, PixelSource, resolve, sample_at};
pub use registry::IdentifierRegistry;
pub use renderer::{PickCamera, PickDraw, PickEntity, PickRenderer, PickTrigger, ViewportSize};
pub use software::{SoftwarePickContext, SoftwarePickRenderer};

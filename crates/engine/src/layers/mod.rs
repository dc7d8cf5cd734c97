pub mod device;
pub mod renderer;

pub use device::DeviceLayer;
pub use renderer::RenderLayer;

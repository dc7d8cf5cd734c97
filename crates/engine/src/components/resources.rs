use crate::prelude::*;

#[derive(Resource)]
pub struct GpuDevice(pub wgpu::Device);

#[derive(Resource)]
pub struct GpuQueue(pub wgpu::Queue);

/// Counts how many times a GPU device has been created for this world.
///
/// Anything holding device-owned resources across frames compares against
/// this to notice that the graphics context was torn down and rebuilt.
#[derive(Resource, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GraphicsGeneration(pub u64);

#[derive(Resource, Clone, Copy, PartialEq, Eq, Debug)]
pub struct WindowSize {
    pub width: u32,
    pub height: u32,
}

#[derive(Resource)]
pub struct GpuSurface(pub Option<wgpu::Surface<'static>>);

#[derive(Resource)]
pub struct GpuAdapter(pub Option<wgpu::Adapter>);

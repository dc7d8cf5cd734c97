use idpick_engine::prelude::*;

use crate::orbit::{Time, update_orbit_camera};

pub struct SandboxLayer {
    schedule: Schedule,
}

impl SandboxLayer {
    pub fn new(_context: &LayerContext) -> Self {
        let mut schedule = Schedule::default();
        schedule.add_systems(update_orbit_camera);
        Self { schedule }
    }
}

impl Layer for SandboxLayer {
    fn frame(&mut self, context: &LayerContext) -> std::result::Result<(), wgpu::SurfaceError> {
        let mut world = context.world.lock().unwrap();
        world.insert_resource(Time(context.delta_time));

        self.schedule.run(&mut world);

        Ok(())
    }

    fn detach(&mut self, _context: &LayerContext) {}
}

//! GPU pick pass against a real (or software fallback) adapter.
//!
//! Skips with a message when no adapter is available, as on most CI machines.

use idpick_editor::picking::{
    GpuPickContext, GpuPickRenderer, Handle, PickCamera, PickController, PickEntity, PickOutcome,
    PickTrigger, SelectionHost, ViewportSize,
};
use idpick_engine::prelude::*;

#[derive(Default)]
struct Selection(Option<Handle>);

impl SelectionHost for Selection {
    fn select(&mut self, handle: Handle) {
        self.0 = Some(handle);
    }

    fn clear_selection(&mut self) {
        self.0 = None;
    }

    fn current_selection(&self) -> Option<Handle> {
        self.0
    }
}

fn headless_device() -> Option<(wgpu::Device, wgpu::Queue)> {
    let instance = wgpu::Instance::default();

    let adapter = match pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::default(),
        compatible_surface: None,
        force_fallback_adapter: false,
    })) {
        Ok(adapter) => adapter,
        Err(e) => {
            eprintln!("Skipping GPU pick test: no adapter available ({e})");
            return None;
        }
    };

    match pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
        label: Some("pick test device"),
        required_features: wgpu::Features::empty(),
        experimental_features: wgpu::ExperimentalFeatures::disabled(),
        required_limits: wgpu::Limits::downlevel_defaults(),
        memory_hints: Default::default(),
        trace: wgpu::Trace::Off,
    })) {
        Ok(device) => Some(device),
        Err(e) => {
            eprintln!("Skipping GPU pick test: device request failed ({e})");
            None
        }
    }
}

fn camera(aspect: f32) -> PickCamera {
    let camera = Camera {
        is_main: true,
        target: Point3::origin(),
        fovy: 1.0,
        znear: 0.1,
        zfar: 100.0,
    };
    let transform = Transform::from_position(Point3::new(0.0, 0.0, 10.0));
    PickCamera {
        view: camera.view_matrix(&transform),
        projection: camera.projection_matrix(aspect),
    }
}

fn trigger(x: f32, y: f32, width: u32, height: u32) -> PickTrigger {
    PickTrigger {
        mouse: Point2::new(x, y),
        viewport: ViewportSize::new(width, height),
    }
}

#[test]
fn test_gpu_pick_selects_nearest_entity() {
    let Some((device, queue)) = headless_device() else {
        return;
    };
    let context = GpuPickContext {
        device: device.clone(),
        queue,
        generation: 0,
    };

    let near_mesh = create_mesh_buffers(&device, &Mesh::quad(2.0, 2.0));
    let far_mesh = create_mesh_buffers(&device, &Mesh::cuboid(Vector3::new(3.0, 3.0, 3.0)));
    let near = Handle::new(1, 0);
    let far = Handle::new(0, 5);

    let entities = || {
        vec![
            PickEntity {
                handle: far,
                world_transform: Transform::default().to_matrix(),
                mesh: Some(&far_mesh),
            },
            PickEntity {
                handle: near,
                world_transform: Transform::from_position(Point3::new(0.0, 0.0, 3.0)).to_matrix(),
                mesh: Some(&near_mesh),
            },
        ]
    };

    let mut controller = PickController::<GpuPickRenderer>::new();
    let mut selection = Selection::default();

    let outcome = controller.on_trigger_event(
        &context,
        trigger(64.0, 64.0, 128, 128),
        Some(&camera(1.0)),
        entities(),
        &mut selection,
    );
    assert_eq!(outcome, PickOutcome::Selected(near));
    assert_eq!(selection.0, Some(near));

    let outcome = controller.on_trigger_event(
        &context,
        trigger(2.0, 2.0, 128, 128),
        Some(&camera(1.0)),
        entities(),
        &mut selection,
    );
    assert_eq!(outcome, PickOutcome::Cleared);
    assert_eq!(selection.0, None);

    let outcome = controller.on_trigger_event(
        &context,
        trigger(32.0, 24.0, 64, 48),
        Some(&camera(64.0 / 48.0)),
        entities(),
        &mut selection,
    );
    assert_eq!(outcome, PickOutcome::Selected(near));
    assert_eq!(controller.target_size(), Some((64, 48)));
}

#[test]
fn test_gpu_pick_ignores_back_faces() {
    let Some((device, queue)) = headless_device() else {
        return;
    };
    let context = GpuPickContext {
        device: device.clone(),
        queue,
        generation: 0,
    };

    let cube_mesh = create_mesh_buffers(&device, &Mesh::cuboid(Vector3::new(1.0, 1.0, 1.0)));
    let quad_mesh = create_mesh_buffers(&device, &Mesh::quad(4.0, 4.0));
    let cube = Handle::new(1, 0);
    let quad = Handle::new(2, 0);

    let turned_away = Transform {
        position: Point3::new(0.0, 0.0, 3.0),
        rotation: UnitQuaternion::from_euler_angles(0.0, std::f32::consts::PI, 0.0),
        ..Default::default()
    };
    let entities = vec![
        PickEntity {
            handle: cube,
            world_transform: Transform::default().to_matrix(),
            mesh: Some(&cube_mesh),
        },
        PickEntity {
            handle: quad,
            world_transform: turned_away.to_matrix(),
            mesh: Some(&quad_mesh),
        },
    ];

    let mut controller = PickController::<GpuPickRenderer>::new();
    let mut selection = Selection::default();

    let outcome = controller.on_trigger_event(
        &context,
        trigger(50.0, 50.0, 100, 100),
        Some(&camera(1.0)),
        entities,
        &mut selection,
    );
    assert_eq!(outcome, PickOutcome::Selected(cube));
}

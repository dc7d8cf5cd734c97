use idpick_editor::{EditorLayer, picking::PickingConfig};
use idpick_engine::{
    ApplicationBuilder, Result,
    layers::{DeviceLayer, RenderLayer},
    prelude::*,
};
use winit::event_loop::EventLoop;

mod orbit;
mod sandbox_layer;

use orbit::OrbitCamera;

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_module("idpick", log::LevelFilter::Debug)
        .filter_module("idpick_engine", log::LevelFilter::Info)
        .filter_module("idpick_editor", log::LevelFilter::Debug)
        .filter_module("wgpu_core", log::LevelFilter::Warn)
        .init();

    let event_loop = EventLoop::with_user_event().build()?;

    let mut app = ApplicationBuilder::new()
        .add_layer(|context| Box::new(DeviceLayer::new(context)))
        .add_layer(|context| Box::new(RenderLayer::new(context)))
        .add_layer(|context| Box::new(sandbox_layer::SandboxLayer::new(context)))
        .add_layer(|context| Box::new(EditorLayer::with_config(context, PickingConfig::default())))
        .build();

    // Note: aspect ratio will be automatically set to match the viewport
    let orbit = OrbitCamera::new(12.0);
    app.spawn(
        "Camera",
        (
            Transform::from_position(orbit.eye(&Point3::origin())),
            Camera {
                is_main: true,
                fovy: 1.0,
                target: Point3::origin(),
                zfar: 100.0,
                znear: 0.1,
            },
            orbit,
            RenderTarget {},
        ),
    );

    app.spawn(
        "Ground",
        (
            Transform::from_position(Point3::new(0.0, -1.0, 0.0)),
            Mesh::cuboid(Vector3::new(12.0, 0.2, 12.0)),
        ),
    );

    // a row receding from the camera so nearer boxes occlude farther ones
    for i in 0..5 {
        let z = 2.0 - i as f32 * 2.5;
        let x = (i as f32 - 2.0) * 0.8;
        app.spawn(
            format!("Box {}", i),
            (
                Transform::from_position(Point3::new(x, 0.0, z)),
                Mesh::cuboid(Vector3::new(1.2, 1.6, 1.2)),
            ),
        );
    }

    app.spawn(
        "Panel",
        (
            Transform {
                position: Point3::new(3.5, 1.0, -1.0),
                rotation: UnitQuaternion::from_euler_angles(0.0, -0.6, 0.0),
                scale: Vector3::new(1.0, 1.0, 1.0),
            },
            Mesh::quad(2.0, 3.0),
        ),
    );

    event_loop.run_app(&mut app)?;

    Ok(())
}

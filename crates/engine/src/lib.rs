pub use bevy_ecs::world::World;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use winit::{application::ApplicationHandler, event::WindowEvent, window::Window};

use crate::input::InputState;
pub type Result<T> = anyhow::Result<T>;

pub mod components;
pub mod gpu_component;
pub mod input;
pub mod layers;
pub mod prelude;

pub trait Layer: 'static {
    fn frame(&mut self, context: &LayerContext) -> std::result::Result<(), wgpu::SurfaceError>;
    fn detach(&mut self, context: &LayerContext);
    fn event(&mut self, _context: &LayerContext, _event: LayerEvent) {}
}

pub trait LayerFactory: 'static {
    fn create(&self, context: &LayerContext) -> Box<dyn Layer>;
}

pub struct LayerContext {
    pub window: Arc<Window>,
    pub world: Arc<Mutex<World>>,
    pub delta_time: Duration,
}

pub enum LayerEvent {
    WindowEvent(Arc<WindowEvent>),
}

pub struct ApplicationBuilder {
    layer_factories: Vec<Box<dyn LayerFactory>>,
}

impl ApplicationBuilder {
    pub fn new() -> Self {
        Self {
            layer_factories: Vec::new(),
        }
    }

    pub fn add_layer_factory(mut self, factory: impl LayerFactory) -> Self {
        self.layer_factories.push(Box::new(factory));
        self
    }

    pub fn add_layer<F>(mut self, factory_fn: F) -> Self
    where
        F: Fn(&LayerContext) -> Box<dyn Layer> + 'static,
    {
        self.layer_factories
            .push(Box::new(ClosureLayerFactory::new(factory_fn)));
        self
    }

    pub fn build(self) -> Application {
        let mut world = World::new();
        world.insert_resource(InputState::new());

        Application {
            layer_factories: self.layer_factories,
            state: None,
            world: Arc::new(Mutex::new(world)),
        }
    }
}

impl Default for ApplicationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

struct ClosureLayerFactory<F> {
    factory_fn: F,
}

impl<F> ClosureLayerFactory<F> {
    fn new(factory_fn: F) -> Self {
        Self { factory_fn }
    }
}

impl<F> LayerFactory for ClosureLayerFactory<F>
where
    F: Fn(&LayerContext) -> Box<dyn Layer> + 'static,
{
    fn create(&self, context: &LayerContext) -> Box<dyn Layer> {
        (self.factory_fn)(context)
    }
}

pub struct Application {
    layer_factories: Vec<Box<dyn LayerFactory>>,
    state: Option<ApplicationState>,
    world: Arc<Mutex<World>>,
}

pub struct ApplicationState {
    window: Arc<Window>,
    layers: Vec<Box<dyn Layer>>,
    last_frame_time: Instant,
}

impl ApplicationState {
    fn context(&self, world: &Arc<Mutex<World>>, delta_time: Duration) -> LayerContext {
        LayerContext {
            window: self.window.clone(),
            world: world.clone(),
            delta_time,
        }
    }

    /// Detach layers in reverse order of creation
    fn detach_all(&mut self, world: &Arc<Mutex<World>>) {
        let context = self.context(world, Duration::ZERO);
        for layer in self.layers.iter_mut().rev() {
            layer.detach(&context);
        }
    }
}

impl Application {
    fn redraw(&mut self) -> std::result::Result<(), wgpu::SurfaceError> {
        let state = match &mut self.state {
            Some(state) => state,
            None => return Ok(()),
        };

        let now = Instant::now();
        let delta_time = now.duration_since(state.last_frame_time);
        state.last_frame_time = now;

        let context = state.context(&self.world, delta_time);

        for layer in &mut state.layers {
            layer.frame(&context)?;
        }

        {
            let mut world = self.world.lock().unwrap();
            if let Some(mut input_state) = world.get_resource_mut::<InputState>() {
                input_state.reset_frame();
            }
            world.clear_trackers();
        }

        Ok(())
    }

    /// Spawn an entity with a [`Tag`](crate::components::Tag) so it shows up in the editor
    pub fn spawn<B: bevy_ecs::bundle::Bundle>(&mut self, label: impl Into<String>, bundle: B) {
        use crate::prelude::*;
        let bundle = (
            Tag {
                label: label.into(),
            },
            bundle,
        );
        self.world.lock().unwrap().spawn(bundle);
    }

    /// Shared handle to the scene world
    pub fn world(&self) -> Arc<Mutex<World>> {
        self.world.clone()
    }
}

impl ApplicationHandler for Application {
    fn resumed(&mut self, event_loop: &winit::event_loop::ActiveEventLoop) {
        let window_attributes = Window::default_attributes().with_title("idpick");
        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Unable to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let context = LayerContext {
            window: window.clone(),
            world: self.world.clone(),
            delta_time: Duration::ZERO,
        };

        let layers: Vec<Box<dyn Layer>> = self
            .layer_factories
            .iter()
            .map(|factory| factory.create(&context))
            .collect();

        self.state = Some(ApplicationState {
            window,
            layers,
            last_frame_time: Instant::now(),
        });
    }

    fn suspended(&mut self, _event_loop: &winit::event_loop::ActiveEventLoop) {
        if let Some(mut state) = self.state.take() {
            state.detach_all(&self.world);
        }
    }

    fn exiting(&mut self, _event_loop: &winit::event_loop::ActiveEventLoop) {
        if let Some(mut state) = self.state.take() {
            log::info!("Shutting down {} layers", state.layers.len());
            state.detach_all(&self.world);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &winit::event_loop::ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: winit::event::WindowEvent,
    ) {
        {
            use winit::event::ElementState;
            use winit::keyboard::PhysicalKey;

            let mut world = self.world.lock().unwrap();
            if let Some(mut input_state) = world.get_resource_mut::<InputState>() {
                match &event {
                    WindowEvent::KeyboardInput {
                        event: key_event, ..
                    } => {
                        if let PhysicalKey::Code(keycode) = key_event.physical_key {
                            match key_event.state {
                                ElementState::Pressed => input_state.press_key(keycode),
                                ElementState::Released => input_state.release_key(keycode),
                            }
                        }
                    }
                    WindowEvent::CursorMoved { position, .. } => {
                        input_state.set_mouse_position(position.x as f32, position.y as f32);
                    }
                    _ => {}
                }
            }
        }

        let event = Arc::new(event);

        match *event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::RedrawRequested => match self.redraw() {
                Ok(_) => {}
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {}
                Err(e) => {
                    log::error!("Unable to render {}", e);
                }
            },
            _ => {}
        }

        if let Some(state) = &mut self.state {
            let context = state.context(&self.world, Duration::ZERO);
            for layer in &mut state.layers {
                layer.event(&context, LayerEvent::WindowEvent(event.clone()));
            }
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &winit::event_loop::ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: winit::event::DeviceEvent,
    ) {
        use winit::event::DeviceEvent;

        let mut world = self.world.lock().unwrap();
        if let Some(mut input_state) = world.get_resource_mut::<InputState>() {
            if let DeviceEvent::MouseMotion { delta } = event {
                input_state.add_mouse_delta(delta.0 as f32, delta.1 as f32);
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &winit::event_loop::ActiveEventLoop) {
        if let Some(state) = &self.state {
            state.window.request_redraw();
        }
    }
}

use crate::picking::{
    GpuPickContext, GpuPickRenderer, PickController, PickTrigger, PickingConfig, main_camera,
    pickable_entities,
};
use crate::prelude::*;

use super::{
    editor_state::{EditorState, WorldSelection},
    editor_ui,
};

pub struct EditorLayer {
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    device: wgpu::Device,
    queue: wgpu::Queue,
    is_surface_configured: bool,
    viewport_texture_id: Option<egui::TextureId>,

    // egui state
    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
    egui_renderer: Option<egui_wgpu::Renderer>,

    // editor state
    editor_state: EditorState,
    picker: PickController<GpuPickRenderer>,
}

impl EditorLayer {
    pub fn new(context: &LayerContext) -> Self {
        Self::with_config(context, PickingConfig::default())
    }

    pub fn with_config(context: &LayerContext, picking: PickingConfig) -> Self {
        let size = context.window.inner_size();

        // Retrieve everything from world resources (set by DeviceLayer)
        let (device, queue, adapter, surface) = {
            let mut world = context.world.lock().unwrap();
            let device = world
                .get_resource::<GpuDevice>()
                .expect("DeviceLayer must be added before EditorLayer")
                .0
                .clone();
            let queue = world
                .get_resource::<GpuQueue>()
                .expect("DeviceLayer must be added before EditorLayer")
                .0
                .clone();

            let adapter = world
                .get_resource_mut::<GpuAdapter>()
                .and_then(|mut adapter| adapter.0.take())
                .expect("Adapter already taken");
            let surface = world
                .get_resource_mut::<GpuSurface>()
                .and_then(|mut surface| surface.0.take())
                .expect("Surface already taken");

            // Set initial viewport size (will be updated by egui layout)
            world.insert_resource(WindowSize {
                width: (size.width.saturating_sub(400)).max(1), // Subtract both side panels
                height: size.height.max(1),
            });

            (device, queue, adapter, surface)
        };

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &context.window,
            None,
            None,
            None,
        );

        let egui_renderer = egui_wgpu::Renderer::new(
            &device,
            surface_format,
            egui_wgpu::RendererOptions::default(),
        );

        Self {
            surface,
            config,
            device,
            queue,
            is_surface_configured: false,
            viewport_texture_id: None,
            egui_ctx,
            egui_state,
            egui_renderer: Some(egui_renderer),
            editor_state: EditorState::with_config(picking),
            picker: PickController::new(),
        }
    }

    fn resize(&mut self, _context: &LayerContext, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
            self.is_surface_configured = true;
        }
    }

    /// Render the pick pass for one viewport click and hand the result to the editor selection
    fn pick(&mut self, context: &LayerContext, trigger: PickTrigger) {
        let world = context.world.lock().unwrap();

        let Some(pick_context) = GpuPickContext::from_world(&world) else {
            log::warn!("Pick ignored, no GPU device yet");
            return;
        };

        let camera = main_camera(&world, trigger.viewport.aspect());
        let entities = pickable_entities::<GpuMesh>(&world);
        let mut selection = WorldSelection::new(&mut self.editor_state, &world);

        let outcome = self.picker.on_trigger_event(
            &pick_context,
            trigger,
            camera.as_ref(),
            entities,
            &mut selection,
        );
        self.editor_state.last_pick = Some(outcome);
    }

    /// Point egui at the main camera's render target, which is recreated on resize
    fn update_viewport_texture(&mut self, context: &LayerContext) {
        let mut world = context.world.lock().unwrap();

        let Some(view) = world
            .query::<(&Camera, &GpuRenderTarget)>()
            .iter(&world)
            .find(|(camera, _)| camera.is_main)
            .map(|(_, target)| {
                target
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default())
            })
        else {
            return;
        };

        let Some(renderer) = &mut self.egui_renderer else {
            return;
        };

        match self.viewport_texture_id {
            Some(texture_id) => renderer.update_egui_texture_from_wgpu_texture(
                &self.device,
                &view,
                wgpu::FilterMode::Nearest,
                texture_id,
            ),
            None => {
                let texture_id =
                    renderer.register_native_texture(&self.device, &view, wgpu::FilterMode::Nearest);
                self.viewport_texture_id = Some(texture_id);
            }
        }
    }
}

impl Layer for EditorLayer {
    fn frame(&mut self, context: &LayerContext) -> std::result::Result<(), wgpu::SurfaceError> {
        if !self.is_surface_configured {
            return Ok(());
        }

        let surface_texture = self.surface.get_current_texture()?;
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.update_viewport_texture(context);

        // Start egui frame
        let raw_input = self.egui_state.take_egui_input(&context.window);

        let viewport_texture_id = self.viewport_texture_id;
        let world = context.world.clone();

        let egui_output = self.egui_ctx.run(raw_input, |ctx| {
            editor_ui::draw_ui(
                context,
                ctx,
                &world,
                viewport_texture_id,
                &mut self.editor_state,
            );
        });

        self.egui_state
            .handle_platform_output(&context.window, egui_output.platform_output);

        // Picks run after the UI so they see this frame's viewport size and selection
        if let Some(trigger) = self.editor_state.pick_request.take() {
            self.pick(context, trigger);
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Editor Encoder"),
            });

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: self.egui_ctx.pixels_per_point(),
        };

        let primitives = self
            .egui_ctx
            .tessellate(egui_output.shapes, egui_output.pixels_per_point);

        // Take the renderer out temporarily to avoid borrow checker issues
        let Some(mut renderer) = self.egui_renderer.take() else {
            return Ok(());
        };

        for (id, image_delta) in &egui_output.textures_delta.set {
            renderer.update_texture(&self.device, &self.queue, *id, image_delta);
        }

        renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &primitives[..],
            &screen_descriptor,
        );

        {
            let render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("egui render pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.1,
                            g: 0.1,
                            b: 0.1,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            // egui requires a 'static lifetime for the render pass
            let mut render_pass_static = render_pass.forget_lifetime();
            renderer.render(&mut render_pass_static, &primitives, &screen_descriptor);
        }

        for id in &egui_output.textures_delta.free {
            renderer.free_texture(id);
        }

        self.egui_renderer = Some(renderer);

        self.queue.submit(std::iter::once(encoder.finish()));

        surface_texture.present();

        Ok(())
    }

    fn detach(&mut self, context: &LayerContext) {
        let world = context.world.lock().unwrap();
        let mut selection = WorldSelection::new(&mut self.editor_state, &world);
        self.picker.teardown(&mut selection);
    }

    fn event(&mut self, context: &LayerContext, event: LayerEvent) {
        let LayerEvent::WindowEvent(window_event) = event;

        // Let egui handle the event first
        let response = self
            .egui_state
            .on_window_event(&context.window, &window_event);

        if let winit::event::WindowEvent::Resized(physical_size) = *window_event {
            self.resize(context, physical_size.width, physical_size.height);
        }

        if response.consumed {
            context.window.request_redraw();
        }
    }
}

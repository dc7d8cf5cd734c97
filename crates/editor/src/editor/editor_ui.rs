use std::sync::{Arc, Mutex};

use crate::picking::{PickTrigger, PickingConfig, ViewportSize};
use crate::prelude::*;

use super::editor_state::EditorState;

pub fn draw_ui(
    context: &LayerContext,
    ctx: &egui::Context,
    world: &Arc<Mutex<World>>,
    viewport_texture_id: Option<egui::TextureId>,
    editor_state: &mut EditorState,
) {
    let mut world = world.lock().unwrap();

    // Scene
    egui::SidePanel::left("scene")
        .default_width(200.0)
        .resizable(true)
        .show(ctx, |ui| {
            ui.heading("Scene");
            ui.separator();
            world
                .query::<(Entity, &Tag)>()
                .iter(&world)
                .for_each(|(entity, tag)| {
                    let selected = editor_state.is_entity_selected(entity);
                    if ui.selectable_label(selected, &tag.label).clicked() {
                        editor_state.select_entity(entity, tag.clone());
                    }
                });
        });

    let drawable = world
        .get_resource::<WindowSize>()
        .map(|size| ViewportSize::new(size.width, size.height));

    // Entity Inspector
    egui::SidePanel::right("Entity")
        .default_width(200.0)
        .resizable(true)
        .show(ctx, |ui| {
            ui.heading("Inspector");
            ui.separator();
            if let Some((entity, tag)) = &editor_state.selected_entity {
                ui.label(&tag.label);
                ui.label(format!("Handle {}", Handle::from(*entity)));
                ui.separator();

                editor_state
                    .component_inspector
                    .inspect_entity(&mut world, *entity, ui);
            } else {
                ui.label("No entity selected");
            }
        });

    // Viewport
    egui::CentralPanel::default()
        .frame(egui::Frame::NONE)
        .show(ctx, |ui| {
            let viewport_rect = ui.available_rect_before_wrap();

            let new_width = viewport_rect.width() as u32;
            let new_height = viewport_rect.height() as u32;

            if new_width > 0 && new_height > 0 {
                if let Some(mut window_size) = world.get_resource_mut::<WindowSize>() {
                    if window_size.width != new_width || window_size.height != new_height {
                        window_size.width = new_width;
                        window_size.height = new_height;
                    }
                }
            }

            match viewport_texture_id {
                Some(texture_id) => {
                    // texture pixels map 1:1 to points, so the pointer offset is a pixel position
                    let shown = drawable
                        .unwrap_or(ViewportSize::new(new_width.max(1), new_height.max(1)));
                    let size = egui::vec2(shown.width as f32, shown.height as f32);
                    let response = ui.add(
                        egui::Image::new(egui::load::SizedTexture::new(texture_id, size))
                            .fit_to_exact_size(size)
                            .sense(egui::Sense::click()),
                    );

                    if let Some(trigger) =
                        pick_trigger(ctx, &response, &editor_state.picking, drawable)
                    {
                        editor_state.request_pick(trigger);
                    }
                }
                None => {
                    ui.painter()
                        .rect_filled(viewport_rect, 0.0, egui::Color32::from_rgb(0, 0, 0));
                }
            }
        });

    // floating panel for stats
    egui::Window::new("Stats")
        .default_pos(egui::pos2(220.0, 20.0))
        .resizable(true)
        .show(ctx, |ui| {
            ui.label("Rendering Stats:");
            ui.separator();
            let dt = context.delta_time.as_millis();
            ui.label(format!("Frame Time: {} ms", dt));

            let last_pick = match editor_state.last_pick {
                Some(PickOutcome::Selected(handle)) => format!("selected {}", handle),
                Some(PickOutcome::Cleared) => "nothing".to_string(),
                Some(PickOutcome::Skipped) => "skipped".to_string(),
                Some(PickOutcome::Failed) => "failed".to_string(),
                None => "-".to_string(),
            };
            ui.label(format!("Last Pick: {}", last_pick));
        });
}

/// A pick request if the viewport was clicked or the pick key pressed this frame
fn pick_trigger(
    ctx: &egui::Context,
    response: &egui::Response,
    config: &PickingConfig,
    drawable: Option<ViewportSize>,
) -> Option<PickTrigger> {
    let clicked = config.pick_on_click && response.clicked();
    let key_pressed = config
        .pick_key
        .is_some_and(|key| !ctx.wants_keyboard_input() && ctx.input(|i| i.key_pressed(key)));

    if !clicked && !key_pressed {
        return None;
    }

    let pointer = if clicked {
        response.interact_pointer_pos()
    } else {
        ctx.input(|i| i.pointer.latest_pos())
    }?;
    let local = pointer - response.rect.min;

    let full = ViewportSize::new(response.rect.width() as u32, response.rect.height() as u32);
    Some(PickTrigger {
        mouse: Point2::new(local.x, local.y),
        viewport: ViewportSize::resolve(drawable, full),
    })
}

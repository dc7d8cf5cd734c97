use crate::prelude::*;

crate::register_inspectable!(Camera, "Camera");

impl Inspectable for Camera {
    fn inspect(&mut self, ui: &mut egui::Ui) {
        ui.checkbox(&mut self.is_main, "Is Main Camera");

        super::transform::vector_row(ui, "Target:", self.target.coords.as_mut_slice(), 0.1);

        ui.horizontal(|ui| {
            ui.label("FOV Y:");
            ui.add(
                egui::DragValue::new(&mut self.fovy)
                    .speed(0.01)
                    .range(0.05..=3.0),
            );
        });

        ui.horizontal(|ui| {
            ui.label("Near:");
            ui.add(
                egui::DragValue::new(&mut self.znear)
                    .speed(0.01)
                    .range(0.001..=f32::MAX),
            );
            ui.label("Far:");
            ui.add(egui::DragValue::new(&mut self.zfar).speed(0.1));
        });

        if self.zfar <= self.znear {
            self.zfar = self.znear + 0.01;
        }
    }
}

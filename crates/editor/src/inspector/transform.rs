use crate::prelude::*;

crate::register_inspectable!(Transform, "Transform");

/// Drag values for a vector on one row, labelled x/y/z
pub(crate) fn vector_row(ui: &mut egui::Ui, label: &str, values: &mut [f32], speed: f64) {
    ui.horizontal(|ui| {
        ui.label(label);
        for (value, prefix) in values.iter_mut().zip(["x: ", "y: ", "z: "]) {
            ui.add(egui::DragValue::new(value).prefix(prefix).speed(speed));
        }
    });
}

impl Inspectable for Transform {
    fn inspect(&mut self, ui: &mut egui::Ui) {
        vector_row(ui, "Position:", self.position.coords.as_mut_slice(), 0.1);
        vector_row(ui, "Scale:", self.scale.as_mut_slice(), 0.01);

        let (roll, pitch, yaw) = self.rotation.euler_angles();
        let mut degrees = [roll.to_degrees(), pitch.to_degrees(), yaw.to_degrees()];
        let before = degrees;

        ui.horizontal(|ui| {
            ui.label("Rotation:");
            for (value, prefix) in degrees.iter_mut().zip(["roll: ", "pitch: ", "yaw: "]) {
                ui.add(
                    egui::DragValue::new(value)
                        .prefix(prefix)
                        .speed(1.0)
                        .suffix("°"),
                );
            }
        });

        // rebuilding from euler angles drifts, so only touch the quaternion on edits
        if degrees != before {
            self.rotation = UnitQuaternion::from_euler_angles(
                degrees[0].to_radians(),
                degrees[1].to_radians(),
                degrees[2].to_radians(),
            );
        }
    }
}

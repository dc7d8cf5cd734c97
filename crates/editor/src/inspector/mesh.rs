use crate::prelude::*;

crate::register_inspectable_readonly!(Mesh, "Mesh");

impl InspectableReadOnly for Mesh {
    fn inspect_readonly(&self, ui: &mut egui::Ui) {
        ui.label(format!("Vertices: {}", group_thousands(self.vertices.len())));
        ui.label(format!("Triangles: {}", group_thousands(self.triangle_count())));

        if let Some((min, max)) = bounds(self) {
            ui.label(format!(
                "Bounds: [{:.2}, {:.2}, {:.2}] .. [{:.2}, {:.2}, {:.2}]",
                min[0], min[1], min[2], max[0], max[1], max[2]
            ));
        }

        let bytes = self.vertices.len() * std::mem::size_of::<Vertex>()
            + self.indices.len() * std::mem::size_of::<Index>();
        ui.label(format!("Memory: {}", format_bytes(bytes)));
    }
}

/// Local-space axis aligned bounds, `None` for an empty mesh
fn bounds(mesh: &Mesh) -> Option<([f32; 3], [f32; 3])> {
    let first = mesh.vertices.first()?.position;
    Some(
        mesh.vertices
            .iter()
            .fold((first, first), |(mut min, mut max), vertex| {
                for axis in 0..3 {
                    min[axis] = min[axis].min(vertex.position[axis]);
                    max[axis] = max[axis].max(vertex.position[axis]);
                }
                (min, max)
            }),
    )
}

fn format_bytes(bytes: usize) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

    let mut size = bytes as f32;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    format!("{:.2} {}", size, UNITS[unit])
}

fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1234567), "1,234,567");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512.00 B");
        assert_eq!(format_bytes(2048), "2.00 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.00 MB");
    }

    #[test]
    fn test_bounds() {
        let mesh = Mesh::cuboid(Vector3::new(2.0, 4.0, 6.0));
        assert_eq!(bounds(&mesh), Some(([-1.0, -2.0, -3.0], [1.0, 2.0, 3.0])));

        let empty = Mesh {
            vertices: Vec::new(),
            indices: Vec::new(),
        };
        assert_eq!(bounds(&empty), None);
    }
}

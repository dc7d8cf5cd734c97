use idpick_engine::prelude::*;
use winit::keyboard::KeyCode;

/// Orbits the camera around its target with the arrow keys
#[derive(Component, Clone)]
pub struct OrbitCamera {
    pub distance: f32,
    /// Radians per second
    pub speed: f32,
    pub yaw: f32,
    pub pitch: f32,
}

impl OrbitCamera {
    pub fn new(distance: f32) -> Self {
        Self {
            distance,
            speed: 1.5,
            yaw: 0.0,
            pitch: 0.3,
        }
    }

    /// Position on the orbit sphere around `target`
    pub fn eye(&self, target: &Point3<f32>) -> Point3<f32> {
        let offset = Vector3::new(
            self.yaw.sin() * self.pitch.cos(),
            self.pitch.sin(),
            self.yaw.cos() * self.pitch.cos(),
        );
        target + offset * self.distance
    }
}

#[derive(Resource)]
pub struct Time(pub std::time::Duration);

pub fn update_orbit_camera(
    mut query: Query<(&mut Transform, &Camera, &mut OrbitCamera)>,
    input: Res<InputState>,
    time: Res<Time>,
) {
    let dt = time.0.as_secs_f32();

    for (mut transform, camera, mut orbit) in query.iter_mut() {
        let mut yaw = 0.0;
        let mut pitch = 0.0;

        if input.is_key_pressed(KeyCode::ArrowLeft) {
            yaw -= 1.0;
        }
        if input.is_key_pressed(KeyCode::ArrowRight) {
            yaw += 1.0;
        }
        if input.is_key_pressed(KeyCode::ArrowUp) {
            pitch += 1.0;
        }
        if input.is_key_pressed(KeyCode::ArrowDown) {
            pitch -= 1.0;
        }

        if yaw == 0.0 && pitch == 0.0 {
            continue;
        }

        orbit.yaw += yaw * orbit.speed * dt;
        orbit.pitch = (orbit.pitch + pitch * orbit.speed * dt).clamp(-1.4, 1.4);
        transform.position = orbit.eye(&camera.target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eye_keeps_distance() {
        let orbit = OrbitCamera {
            distance: 5.0,
            speed: 1.0,
            yaw: 0.7,
            pitch: -0.4,
        };
        let target = Point3::new(1.0, 2.0, 3.0);
        let eye = orbit.eye(&target);

        assert!(((eye - target).norm() - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_zero_angles_look_down_negative_z() {
        let orbit = OrbitCamera {
            distance: 10.0,
            speed: 1.0,
            yaw: 0.0,
            pitch: 0.0,
        };
        assert_eq!(orbit.eye(&Point3::origin()), Point3::new(0.0, 0.0, 10.0));
    }
}

use crate::prelude::*;

use std::collections::HashSet;
use winit::keyboard::KeyCode;

/// Resource that tracks keyboard and mouse input state
#[derive(Resource, Default)]
pub struct InputState {
    /// Currently pressed keys
    pub keys_pressed: HashSet<KeyCode>,
    /// Mouse delta since last frame (x, y)
    pub mouse_delta: (f32, f32),
    /// Mouse position in window coordinates
    pub mouse_position: (f32, f32),
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a key is currently pressed
    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    /// Reset per-frame state (call once every frame has been processed)
    pub fn reset_frame(&mut self) {
        self.mouse_delta = (0.0, 0.0);
    }

    pub fn press_key(&mut self, key: KeyCode) {
        self.keys_pressed.insert(key);
    }

    pub fn release_key(&mut self, key: KeyCode) {
        self.keys_pressed.remove(&key);
    }

    pub fn add_mouse_delta(&mut self, dx: f32, dy: f32) {
        self.mouse_delta.0 += dx;
        self.mouse_delta.1 += dy;
    }

    pub fn set_mouse_position(&mut self, x: f32, y: f32) {
        self.mouse_position = (x, y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_press_and_release() {
        let mut input = InputState::new();
        input.press_key(KeyCode::KeyA);
        assert!(input.is_key_pressed(KeyCode::KeyA));

        input.release_key(KeyCode::KeyA);
        assert!(!input.is_key_pressed(KeyCode::KeyA));
    }

    #[test]
    fn test_mouse_delta_resets_per_frame() {
        let mut input = InputState::new();
        input.add_mouse_delta(1.0, 2.0);
        input.add_mouse_delta(0.5, -1.0);
        assert_eq!(input.mouse_delta, (1.5, 1.0));

        input.reset_frame();
        assert_eq!(input.mouse_delta, (0.0, 0.0));
    }
}

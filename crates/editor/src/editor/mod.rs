mod editor_layer;
mod editor_state;
mod editor_ui;

pub use editor_layer::EditorLayer;
pub use editor_state::{EditorState, WorldSelection};

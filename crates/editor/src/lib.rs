pub mod editor;
pub mod inspector;
pub mod picking;
pub mod prelude;

pub use editor::EditorLayer;

mod camera;
mod label;
mod mesh;
mod resources;
mod transform;

pub use camera::*;
pub use label::*;
pub use mesh::*;
pub use resources::*;
pub use transform::*;

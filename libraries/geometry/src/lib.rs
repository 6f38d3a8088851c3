#![allow(missing_docs, reason = "TODO add later")]

mod camera;
mod light;
mod orbit;
mod projection;

pub use camera::Camera;
pub use light::{AmbientLight, DirectionalLight, LightSet};
pub use orbit::OrbitController;
pub use projection::Projection;

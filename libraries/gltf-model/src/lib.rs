#![allow(missing_docs, reason = "TODO add later")]
#![expect(
    clippy::indexing_slicing,
    reason = "TODO remove before release"
)]

mod animation;
mod model;
mod renderer;

pub use animation::{AnimationClip, AnimationPlayer, Keyframes, Track};
pub use model::{load_document, Document, MeshData, Node, Vertex};
pub use renderer::{GltfModelRenderer, ModelInstance};

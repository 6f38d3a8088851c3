#![allow(missing_docs, reason = "TODO remove before release")]
#![allow(
    clippy::indexing_slicing,
    clippy::unwrap_used,
    reason = "TODO remove before release"
)]

pub mod assets;
pub mod audio;
mod frame_loop;
mod input;
mod renderer;
mod scene_state;

pub use frame_loop::{FrameLoop, TickReport};
pub use input::SceneEvent;
pub use renderer::{Renderer, RendererBuilder};
pub use scene_state::{Actor, MotionPolicy, SceneState};

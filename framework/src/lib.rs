#![allow(missing_docs, reason = "TODO remove before release")]
#![expect(
    clippy::expect_used,
    clippy::missing_panics_doc,
    clippy::unwrap_used,
    reason = "TODO remove before release"
)]

pub mod application;
pub mod event;
mod graphics_context;
pub mod logging;
pub mod renderer;
mod surface_wrapper;

pub use application::Application;
pub use event::{ApplicationEvent, FrameworkEvent};
pub use renderer::{Renderer, RendererBuilder};

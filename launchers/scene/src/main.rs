//! Desktop launcher: spins up logging, the background track and the window,
//! then hands control to the event loop until the window closes.

use std::{path::Path, sync::mpsc::channel};

use catwalk_framework::{logging::init_logger, Application};
use engine_scene::{audio, MotionPolicy, RendererBuilder};
use log::info;
use winit::event_loop::{ControlFlow, EventLoop};

fn main() -> anyhow::Result<()> {
    init_logger();

    let asset_root = Path::new("assets");

    // keep the handle around; dropping it stops the music
    let _audio = audio::start_background_track(&asset_root.join("audio/ambient.ogg"));

    let (event_sender, event_receiver) = channel();
    let renderer_builder =
        RendererBuilder::new(MotionPolicy::default(), event_receiver, asset_root.to_owned());

    let mut application = pollster::block_on(Application::new(
        "catwalk".into(),
        event_sender,
        renderer_builder,
    ));

    // ControlFlow::Poll continuously runs the event loop, even if the OS hasn't
    // dispatched any events. This is ideal for games and similar applications.
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    info!("entering event loop");
    event_loop.run_app(&mut application)?;

    Ok(())
}

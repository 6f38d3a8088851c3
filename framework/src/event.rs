use winit::event::WindowEvent;

/// Events forwarded from the window event loop to whoever drives the scene.
#[derive(Clone, Debug)]
pub enum FrameworkEvent {
    Window { event: WindowEvent },
    Application { event: ApplicationEvent },
}

#[derive(Clone, Debug)]
pub enum ApplicationEvent {
    Exit,
}

impl From<ApplicationEvent> for FrameworkEvent {
    fn from(event: ApplicationEvent) -> Self {
        Self::Application { event }
    }
}

use crate::{
    event::{ApplicationEvent, FrameworkEvent},
    graphics_context::GraphicsContext,
    renderer::{self, Renderer},
    surface_wrapper::SurfaceWrapper,
};
use log::{debug, trace};
use std::{
    sync::{mpsc::Sender, Arc},
    time::{Duration, Instant},
};
use winit::{
    application::ApplicationHandler,
    event::{KeyEvent, WindowEvent},
    event_loop::ActiveEventLoop,
    keyboard::{Key, NamedKey},
    window::{Window, WindowAttributes, WindowId},
};

/// Owns the window, the GPU context and the renderer, and translates the
/// winit event stream into per-frame work.
///
/// Everything that is not handled here (keyboard, mouse) is forwarded to the
/// `event_sink`, which the scene's frame loop drains once per tick. Both ends
/// live on the event-loop thread, so the channel only preserves dispatch
/// order; it never crosses threads.
pub struct Application<RendererBuilder: renderer::RendererBuilder> {
    renderer_builder: Option<RendererBuilder>,
    renderer: Option<RendererBuilder::Renderer>,
    surface: SurfaceWrapper,
    context: GraphicsContext,
    window: Option<Arc<Window>>,
    title: String,
    frame_counter: u32,
    frame_time: Instant,
    event_sink: Sender<FrameworkEvent>,
}

impl<RendererBuilder: renderer::RendererBuilder> Application<RendererBuilder> {
    pub async fn new(
        title: String,
        event_sink: Sender<FrameworkEvent>,
        renderer_builder: RendererBuilder,
    ) -> Self {
        let mut surface = SurfaceWrapper::new();
        let context = GraphicsContext::init_async(&mut surface).await;

        Self {
            renderer_builder: Some(renderer_builder),
            renderer: None,
            surface,
            context,
            window: None,
            title,
            frame_counter: 0,
            frame_time: Instant::now(),
            event_sink,
        }
    }

    fn update_fps(&mut self) {
        self.frame_counter += 1;
        let span = self.frame_time.elapsed();
        if span >= Duration::from_secs(1) {
            #[expect(clippy::cast_precision_loss, reason = "a coarse counter is fine here")]
            let fps = (f64::from(self.frame_counter) / span.as_secs_f64()).round();
            debug!("{fps} fps");
            self.frame_counter = 0;
            self.frame_time += span;
        }
    }

    fn forward(&self, event: WindowEvent) {
        // the receiving frame loop may already be gone during shutdown
        let _ = self.event_sink.send(FrameworkEvent::Window { event });
    }
}

impl<RendererBuilder: renderer::RendererBuilder> ApplicationHandler
    for Application<RendererBuilder>
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let attributes = WindowAttributes::default().with_title(&self.title);

        let window = Arc::new(event_loop.create_window(attributes).unwrap());

        self.surface
            .resume(&self.context, Arc::clone(&window), true);

        self.window = Some(window);

        // First-time init of the scene
        if self.renderer.is_none() {
            let renderer_builder = self.renderer_builder.take().unwrap();
            self.renderer.replace(renderer_builder.build(
                &self.context.adapter,
                &self.context.device,
                &self.context.queue,
                self.surface.config(),
            ));
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::Resized(size) => {
                trace!("WindowEvent::Resized({size:?})");

                self.surface.resize(&self.context, size);
                self.renderer.as_mut().unwrap().resize(
                    &self.context.device,
                    &self.context.queue,
                    self.surface.config(),
                );

                self.window.as_ref().unwrap().request_redraw();
            }

            WindowEvent::CloseRequested => {
                trace!("WindowEvent::CloseRequested()");
                let _ = self.event_sink.send(ApplicationEvent::Exit.into());
                event_loop.exit();
            }

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Named(NamedKey::Escape),
                        ..
                    },
                ..
            } => {
                let _ = self.event_sink.send(ApplicationEvent::Exit.into());
                event_loop.exit();
            }

            WindowEvent::RedrawRequested => {
                // On MacOS, currently redraw requested comes in _before_ Init does.
                // If this happens, just drop the requested redraw on the floor.
                //
                // See https://github.com/rust-windowing/winit/issues/3235 for some discussion
                let Some(renderer) = self.renderer.as_mut() else {
                    return;
                };

                let frame = self.surface.acquire(&self.context);
                let texture_view = frame.texture.create_view(&wgpu::TextureViewDescriptor {
                    format: Some(self.surface.config().view_formats[0]),
                    ..wgpu::TextureViewDescriptor::default()
                });

                renderer.update();
                renderer.render(&texture_view, &self.context.device, &self.context.queue);

                let window = self.window.as_ref().unwrap();
                window.pre_present_notify();
                frame.present();
                self.update_fps();

                // run again before the next paint
                self.window.as_ref().unwrap().request_redraw();
            }

            other => self.forward(other),
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        trace!("window event loop is exiting");
    }

    fn suspended(&mut self, _event_loop: &ActiveEventLoop) {
        trace!("window event loop was suspended");
        self.surface.suspend();
    }
}

use crate::graphics_context::GraphicsContext;
use log::{debug, trace};
use std::sync::Arc;
use winit::{dpi::PhysicalSize, window::Window};

/// Wraps the window's render surface, which only exists while the
/// application is resumed.
pub(crate) struct SurfaceWrapper {
    surface: Option<wgpu::Surface<'static>>,
    config: Option<wgpu::SurfaceConfiguration>,
}

impl SurfaceWrapper {
    pub(crate) fn new() -> Self {
        Self {
            surface: None,
            config: None,
        }
    }

    pub(crate) fn get(&self) -> Option<&wgpu::Surface<'static>> {
        self.surface.as_ref()
    }

    /// Creates and configures the surface for the given window.
    /// Called when the event loop (re)gains control of the window.
    pub(crate) fn resume(&mut self, context: &GraphicsContext, window: Arc<Window>, srgb: bool) {
        // caution: the window size can be (0, 0) as the resizing may occur later on some platforms
        let size = window.inner_size();
        debug!("window size: {size:?}");

        let surface = context.instance.create_surface(window).unwrap();

        let mut config = surface
            .get_default_config(&context.adapter, size.width.max(1), size.height.max(1))
            .expect("Surface isn't supported by the adapter.");
        if srgb {
            let view_format = config.format.add_srgb_suffix();
            config.view_formats.push(view_format);
        } else {
            let format = config.format.remove_srgb_suffix();
            config.format = format;
            config.view_formats.push(format);
        }
        config.present_mode = wgpu::PresentMode::AutoVsync;
        surface.configure(&context.device, &config);

        self.surface = Some(surface);
        self.config = Some(config);
    }

    /// Resize the surface, making sure to not resize to zero.
    pub(crate) fn resize(&mut self, context: &GraphicsContext, size: PhysicalSize<u32>) {
        debug!("Surface resize {size:?}");
        if size.width == 0 || size.height == 0 {
            trace!("surface would be empty");
            return;
        }

        let config = self.config.as_mut().unwrap();
        config.width = size.width;
        config.height = size.height;

        let surface = self.surface.as_ref().unwrap();
        surface.configure(&context.device, config);
    }

    /// Acquire the next texture of the swap chain, recreating the swap chain
    /// if it got lost or outdated.
    pub(crate) fn acquire(&mut self, context: &GraphicsContext) -> wgpu::SurfaceTexture {
        let surface = self.surface.as_ref().unwrap();

        match surface.get_current_texture() {
            Ok(frame) => frame,
            // try again once with a freshly configured surface
            Err(wgpu::SurfaceError::Timeout
            | wgpu::SurfaceError::Outdated
            | wgpu::SurfaceError::Lost) => {
                surface.configure(&context.device, self.config());
                surface
                    .get_current_texture()
                    .expect("Failed to acquire next surface texture")
            }
            Err(error @ wgpu::SurfaceError::OutOfMemory) => {
                panic!("Failed to acquire next surface texture: {error}")
            }
        }
    }

    pub(crate) fn config(&self) -> &wgpu::SurfaceConfiguration {
        self.config.as_ref().unwrap()
    }

    pub(crate) fn suspend(&mut self) {
        self.surface = None;
    }
}

use core::ops::Range;
use glam::Mat4;

/// Perspective projection whose aspect ratio always follows the surface it
/// renders to. Call [`Projection::set_surface_dimensions`] from the resize
/// handler to keep the two in sync.
pub struct Projection {
    surface_dimensions: (u32, u32),
    field_of_view_y: f32,
    z_range: Range<f32>,
}

impl Projection {
    #[must_use]
    pub fn new_perspective(
        surface_dimensions: (u32, u32),
        field_of_view_y: f32,
        z_range: Range<f32>,
    ) -> Self {
        Self {
            surface_dimensions,
            field_of_view_y,
            z_range,
        }
    }

    pub fn set_surface_dimensions(&mut self, surface_dimensions: (u32, u32)) {
        self.surface_dimensions = surface_dimensions;
    }

    #[must_use]
    pub fn surface_dimensions(&self) -> (u32, u32) {
        self.surface_dimensions
    }

    #[expect(clippy::cast_precision_loss, reason = "surface dimensions are small")]
    #[must_use]
    pub fn aspect(&self) -> f32 {
        let (width, height) = self.surface_dimensions;
        width as f32 / height as f32
    }

    #[must_use]
    pub fn matrix(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.field_of_view_y,
            self.aspect(),
            self.z_range.start,
            self.z_range.end,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aspect_follows_surface_dimensions() {
        let mut projection =
            Projection::new_perspective((800, 600), 75_f32.to_radians(), 0.1..1000.0);
        assert!((projection.aspect() - 800.0 / 600.0).abs() < 1e-6);

        projection.set_surface_dimensions((1920, 1080));
        assert!((projection.aspect() - 1920.0 / 1080.0).abs() < 1e-6);
        assert_eq!(projection.surface_dimensions(), (1920, 1080));
    }

    #[test]
    fn matrix_changes_with_aspect() {
        let mut projection =
            Projection::new_perspective((100, 100), 75_f32.to_radians(), 0.1..1000.0);
        let square = projection.matrix();
        projection.set_surface_dimensions((200, 100));
        let wide = projection.matrix();
        // the x scale halves when the surface is twice as wide
        assert!((wide.x_axis.x - square.x_axis.x / 2.0).abs() < 1e-6);
    }
}

use glam::{Mat4, Vec3};

pub struct AmbientLight {
    pub color: Vec3,
    pub intensity: f32,
}

/// A sun-style light. Only the direction derived from `position` matters for
/// shading; the position additionally anchors the shadow projection.
pub struct DirectionalLight {
    pub color: Vec3,
    pub intensity: f32,
    pub position: Vec3,
    pub shadow_map_size: u32,
}

impl DirectionalLight {
    /// Direction the light shines in (towards the origin).
    #[must_use]
    pub fn direction(&self) -> Vec3 {
        (-self.position).normalize()
    }

    /// View-projection matrix used to render and sample the shadow map.
    /// The orthographic box is sized to cover the playable scene area.
    #[must_use]
    pub fn view_projection(&self) -> Mat4 {
        let projection = Mat4::orthographic_rh(-60.0, 60.0, -60.0, 60.0, 1.0, 150.0);
        let view = Mat4::look_at_rh(self.position, Vec3::ZERO, Vec3::Y);
        projection * view
    }
}

pub struct LightSet {
    pub ambient: AmbientLight,
    pub directional: DirectionalLight,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_is_normalized_and_points_at_the_scene() {
        let light = DirectionalLight {
            color: Vec3::ONE,
            intensity: 1.0,
            position: Vec3::new(-30.0, 50.0, 30.0),
            shadow_map_size: 2048,
        };
        let direction = light.direction();
        assert!((direction.length() - 1.0).abs() < 1e-6);
        assert!(direction.y < 0.0, "sun must shine downwards");
    }

    #[test]
    fn shadow_projection_covers_the_origin() {
        let light = DirectionalLight {
            color: Vec3::ONE,
            intensity: 1.0,
            position: Vec3::new(-30.0, 50.0, 30.0),
            shadow_map_size: 2048,
        };
        let clip = light.view_projection() * Vec3::ZERO.extend(1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() <= 1.0 && ndc.y.abs() <= 1.0, "origin outside shadow frustum");
        assert!((0.0..=1.0).contains(&ndc.z), "origin outside shadow depth range");
    }
}

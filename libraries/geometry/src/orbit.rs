use crate::Camera;
use core::f32::consts::PI;
use glam::Vec3;

/// Small angle keeping the camera away from the poles, where the
/// look-at basis would degenerate.
const POLAR_MARGIN: f32 = 0.01;

/// Damped orbit around a target point.
///
/// The controller keeps two sets of spherical coordinates: the pose the
/// camera currently has and the pose the user has steered towards. Each
/// [`OrbitController::update`] call moves the current pose a fixed fraction
/// of the remaining way — calling it with no intervening input lets the
/// camera glide to a stop.
pub struct OrbitController {
    pub target: Vec3,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Fraction of the remaining delta applied per update step.
    pub damping: f32,
    yaw: f32,
    pitch: f32,
    radius: f32,
    goal_yaw: f32,
    goal_pitch: f32,
    goal_radius: f32,
}

impl OrbitController {
    #[must_use]
    pub fn new(eye: Vec3, target: Vec3) -> Self {
        let offset = eye - target;
        let radius = offset.length().max(f32::EPSILON);
        let yaw = offset.x.atan2(offset.z);
        let pitch = (offset.y / radius).clamp(-1.0, 1.0).acos();

        Self {
            target,
            min_distance: 0.1,
            max_distance: 1000.0,
            damping: 0.1,
            yaw,
            pitch,
            radius,
            goal_yaw: yaw,
            goal_pitch: pitch,
            goal_radius: radius,
        }
    }

    /// Steers the orbit by the given yaw/pitch deltas (radians).
    pub fn rotate(&mut self, delta_yaw: f32, delta_pitch: f32) {
        self.goal_yaw += delta_yaw;
        self.goal_pitch =
            (self.goal_pitch + delta_pitch).clamp(POLAR_MARGIN, PI - POLAR_MARGIN);
    }

    /// Zooms by scroll steps; positive steps move the camera closer.
    pub fn zoom(&mut self, steps: f32) {
        let factor = 0.95_f32.powf(steps);
        self.goal_radius = (self.goal_radius * factor).clamp(self.min_distance, self.max_distance);
    }

    /// Advances the damping by one step. No inputs; pure state decay
    /// towards the steered pose.
    pub fn update(&mut self) {
        // the goal may have been set before the distance bounds were tightened
        self.goal_radius = self.goal_radius.clamp(self.min_distance, self.max_distance);

        self.yaw += (self.goal_yaw - self.yaw) * self.damping;
        self.pitch += (self.goal_pitch - self.pitch) * self.damping;
        self.radius += (self.goal_radius - self.radius) * self.damping;
    }

    /// Current camera position in world space.
    #[must_use]
    pub fn eye(&self) -> Vec3 {
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        self.target
            + self.radius * Vec3::new(sin_pitch * sin_yaw, cos_pitch, sin_pitch * cos_yaw)
    }

    #[must_use]
    pub fn camera(&self) -> Camera {
        Camera::new(self.eye(), self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converges_towards_steered_pose() {
        let mut orbit = OrbitController::new(Vec3::new(0.0, 3.0, 5.0), Vec3::ZERO);
        let start = orbit.eye();
        orbit.rotate(0.5, 0.0);

        let mut previous_distance = f32::MAX;
        for _ in 0..200 {
            orbit.update();
            let goal_reached = (orbit.yaw - orbit.goal_yaw).abs();
            assert!(goal_reached <= previous_distance, "damping must not overshoot");
            previous_distance = goal_reached;
        }
        assert!((orbit.yaw - orbit.goal_yaw).abs() < 1e-3);
        assert_ne!(orbit.eye(), start);
    }

    #[test]
    fn update_without_input_is_stable() {
        let mut orbit = OrbitController::new(Vec3::new(2.0, 3.0, 5.0), Vec3::ZERO);
        let eye = orbit.eye();
        for _ in 0..10 {
            orbit.update();
        }
        assert!((orbit.eye() - eye).length() < 1e-5);
    }

    #[test]
    fn zoom_clamps_to_min_distance() {
        let mut orbit = OrbitController::new(Vec3::new(0.0, 0.0, 20.0), Vec3::ZERO);
        orbit.min_distance = 10.0;
        orbit.zoom(1_000.0);
        for _ in 0..500 {
            orbit.update();
        }
        assert!((orbit.eye().length() - 10.0).abs() < 1e-2);
    }

    #[test]
    fn enforcing_min_distance_pushes_camera_out() {
        // the original scene starts closer to the target than the orbit
        // bounds allow; the controller glides out to the minimum distance
        let mut orbit = OrbitController::new(Vec3::new(2.0, 3.0, 5.0), Vec3::ZERO);
        orbit.min_distance = 10.0;
        for _ in 0..1_000 {
            orbit.update();
        }
        assert!((orbit.eye().length() - 10.0).abs() < 1e-2);
    }

    #[test]
    fn pitch_stays_off_the_poles() {
        let mut orbit = OrbitController::new(Vec3::new(0.0, 1.0, 5.0), Vec3::ZERO);
        orbit.rotate(0.0, 100.0);
        assert!(orbit.goal_pitch < PI);
        orbit.rotate(0.0, -200.0);
        assert!(orbit.goal_pitch > 0.0);
    }
}

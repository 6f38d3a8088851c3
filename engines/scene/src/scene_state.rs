use glam::{Mat4, Quat, Vec3};

/// Distance the actor travels per key-press event.
pub(crate) const TRANSLATE_STEP: f32 = 0.1;
/// Angle (radians) the actor turns per key-press event.
pub(crate) const ROTATE_STEP: f32 = 0.1;

const ACTOR_SPAWN_HEIGHT: f32 = 0.5;
const ACTOR_SCALE: f32 = 0.01;

/// The two points where the scene variants historically diverged, folded
/// into one configurable policy pair.
#[derive(Clone, Copy, Debug)]
pub struct MotionPolicy {
    /// Advance the actor's animation only on ticks following a movement
    /// key-press, instead of unconditionally.
    pub animate_only_while_moving: bool,
    /// Apply movement steps along the actor's own heading instead of the
    /// world axes.
    pub local_space_transform: bool,
}

impl Default for MotionPolicy {
    fn default() -> Self {
        Self {
            animate_only_while_moving: true,
            local_space_transform: true,
        }
    }
}

/// Transform of the player-controlled model. It exists from startup; the
/// loaded model attaches to it once its asset slot fills.
pub struct Actor {
    pub position: Vec3,
    /// Rotation around the actor's local Y axis.
    pub heading: f32,
    pub scale: f32,
}

impl Actor {
    fn spawn() -> Self {
        Self {
            position: Vec3::new(0.0, ACTOR_SPAWN_HEIGHT, 0.0),
            heading: 0.0,
            scale: ACTOR_SCALE,
        }
    }

    /// Unit vector the actor currently faces, in world space.
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        Quat::from_rotation_y(self.heading) * Vec3::Z
    }

    #[must_use]
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::splat(self.scale),
            Quat::from_rotation_y(self.heading),
            self.position,
        )
    }
}

/// Everything the frame loop mutates between renders.
pub struct SceneState {
    pub policy: MotionPolicy,
    pub actor: Actor,
    /// True exactly for the tick(s) following a recognized movement
    /// key-press; reset by the frame loop after each sample. Not a latch.
    pub moving: bool,
}

impl SceneState {
    #[must_use]
    pub fn new(policy: MotionPolicy) -> Self {
        Self {
            policy,
            actor: Actor::spawn(),
            moving: false,
        }
    }

    pub(crate) fn step_forward(&mut self, direction: f32) {
        if self.policy.local_space_transform {
            self.actor.position += self.actor.forward() * TRANSLATE_STEP * direction;
        } else {
            self.actor.position.z += TRANSLATE_STEP * direction;
        }
    }

    pub(crate) fn turn(&mut self, direction: f32) {
        self.actor.heading += ROTATE_STEP * direction;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_follows_the_heading() {
        let mut state = SceneState::new(MotionPolicy::default());
        assert!((state.actor.forward() - Vec3::Z).length() < 1e-6);

        state.actor.heading = core::f32::consts::FRAC_PI_2;
        assert!((state.actor.forward() - Vec3::X).length() < 1e-6);
    }

    #[test]
    fn world_space_policy_moves_along_the_world_z_axis() {
        let mut state = SceneState::new(MotionPolicy {
            animate_only_while_moving: false,
            local_space_transform: false,
        });
        state.actor.heading = 1.0; // ignored by the world-space policy

        let spawn = state.actor.position;
        state.step_forward(1.0);
        let delta = state.actor.position - spawn;
        assert!((delta - Vec3::new(0.0, 0.0, TRANSLATE_STEP)).length() < 1e-6);
    }

    #[test]
    fn model_matrix_places_the_scaled_actor() {
        let mut state = SceneState::new(MotionPolicy::default());
        state.actor.position = Vec3::new(1.0, 0.5, -2.0);

        let matrix = state.actor.model_matrix();
        let origin = matrix.transform_point3(Vec3::ZERO);
        assert!((origin - state.actor.position).length() < 1e-6);

        // a point one unit out lands only `scale` away from the origin
        let offset = matrix.transform_point3(Vec3::X) - origin;
        assert!((offset.length() - ACTOR_SCALE).abs() < 1e-6);
    }
}

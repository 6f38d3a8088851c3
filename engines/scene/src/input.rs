use lib_geometry::OrbitController;
use winit::{
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

use crate::scene_state::SceneState;

/// Radians of orbit rotation per pixel of mouse drag.
const DRAG_ROTATE_SCALE: f32 = 0.005;

/// Window events distilled to what the scene reacts to. Key presses keep
/// their raw key code: unrecognized codes matter too (they clear the moving
/// flag).
#[derive(Clone, Copy, Debug)]
pub enum SceneEvent {
    KeyPressed(KeyCode),
    PointerMoved { x: f32, y: f32 },
    PointerButton { pressed: bool },
    Scroll { steps: f32 },
}

/// Maps a raw window event to a [`SceneEvent`], if the scene cares about it.
#[must_use]
pub(crate) fn translate(event: &WindowEvent) -> Option<SceneEvent> {
    match event {
        WindowEvent::KeyboardInput { event, .. } => {
            // every press counts, including the platform's key repeats
            if event.state != ElementState::Pressed {
                return None;
            }
            let PhysicalKey::Code(code) = event.physical_key else {
                return None;
            };
            Some(SceneEvent::KeyPressed(code))
        }
        #[expect(clippy::cast_possible_truncation, reason = "pixel coordinates")]
        WindowEvent::CursorMoved { position, .. } => Some(SceneEvent::PointerMoved {
            x: position.x as f32,
            y: position.y as f32,
        }),
        WindowEvent::MouseInput {
            state,
            button: MouseButton::Left,
            ..
        } => Some(SceneEvent::PointerButton {
            pressed: *state == ElementState::Pressed,
        }),
        WindowEvent::MouseWheel { delta, .. } => {
            #[expect(clippy::cast_possible_truncation, reason = "pixel coordinates")]
            let steps = match delta {
                MouseScrollDelta::LineDelta(_, y) => *y,
                MouseScrollDelta::PixelDelta(position) => position.y as f32 / 20.0,
            };
            Some(SceneEvent::Scroll { steps })
        }
        _ => None,
    }
}

/// Applies scene events to the actor and the orbit camera.
///
/// Keyboard contract, per physical key-press event: `W`/`S` translate the
/// actor along its forward axis by a fixed step, `A`/`D` turn it by a fixed
/// angle, and any recognized key raises the moving flag while any other key
/// clears it. No debouncing and no key-repeat suppression; behavior is
/// whatever the platform's repeat rate delivers.
#[derive(Default)]
pub(crate) struct InputHandler {
    dragging: bool,
    cursor: Option<(f32, f32)>,
}

impl InputHandler {
    pub(crate) fn apply(
        &mut self,
        event: SceneEvent,
        state: &mut SceneState,
        orbit: &mut OrbitController,
    ) {
        match event {
            SceneEvent::KeyPressed(code) => Self::apply_key(code, state),
            SceneEvent::PointerMoved { x, y } => {
                if self.dragging {
                    if let Some((last_x, last_y)) = self.cursor {
                        orbit.rotate(
                            (x - last_x) * DRAG_ROTATE_SCALE,
                            -(y - last_y) * DRAG_ROTATE_SCALE,
                        );
                    }
                }
                self.cursor = Some((x, y));
            }
            SceneEvent::PointerButton { pressed } => self.dragging = pressed,
            SceneEvent::Scroll { steps } => orbit.zoom(steps),
        }
    }

    fn apply_key(code: KeyCode, state: &mut SceneState) {
        match code {
            KeyCode::KeyW => state.step_forward(1.0),
            KeyCode::KeyS => state.step_forward(-1.0),
            KeyCode::KeyA => state.turn(1.0),
            KeyCode::KeyD => state.turn(-1.0),
            _ => {
                state.moving = false;
                return;
            }
        }
        state.moving = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene_state::{MotionPolicy, TRANSLATE_STEP};
    use glam::Vec3;

    fn fixture() -> (InputHandler, SceneState, OrbitController) {
        (
            InputHandler::default(),
            SceneState::new(MotionPolicy::default()),
            OrbitController::new(Vec3::new(2.0, 3.0, 5.0), Vec3::ZERO),
        )
    }

    #[test]
    fn forward_steps_accumulate_per_event() {
        let (mut input, mut state, mut orbit) = fixture();

        let presses = 7;
        for _ in 0..presses {
            input.apply(SceneEvent::KeyPressed(KeyCode::KeyW), &mut state, &mut orbit);
        }

        // translation is event-count-driven, not time-driven
        #[expect(clippy::cast_precision_loss, reason = "small test constant")]
        let expected = presses as f32 * TRANSLATE_STEP;
        assert!((state.actor.position.z - expected).abs() < 1e-6);
        assert!(state.moving);
    }

    #[test]
    fn opposite_keys_cancel_out() {
        let (mut input, mut state, mut orbit) = fixture();
        let spawn = state.actor.position;

        input.apply(SceneEvent::KeyPressed(KeyCode::KeyW), &mut state, &mut orbit);
        input.apply(SceneEvent::KeyPressed(KeyCode::KeyS), &mut state, &mut orbit);

        assert!((state.actor.position - spawn).length() < 1e-6);
    }

    #[test]
    fn turning_changes_the_translation_direction() {
        let (mut input, mut state, mut orbit) = fixture();

        input.apply(SceneEvent::KeyPressed(KeyCode::KeyA), &mut state, &mut orbit);
        input.apply(SceneEvent::KeyPressed(KeyCode::KeyW), &mut state, &mut orbit);

        let delta = state.actor.position - Vec3::new(0.0, 0.5, 0.0);
        assert!(delta.x.abs() > 0.0, "turned actor must leave the Z axis");
        assert!((delta.length() - TRANSLATE_STEP).abs() < 1e-6);
    }

    #[test]
    fn unrecognized_key_clears_a_pending_moving_flag() {
        let (mut input, mut state, mut orbit) = fixture();

        input.apply(SceneEvent::KeyPressed(KeyCode::KeyW), &mut state, &mut orbit);
        assert!(state.moving);

        input.apply(SceneEvent::KeyPressed(KeyCode::KeyQ), &mut state, &mut orbit);
        assert!(!state.moving);
    }

    #[test]
    fn drag_requires_a_held_button() {
        let (mut input, mut state, mut orbit) = fixture();
        let before = orbit.eye();

        input.apply(SceneEvent::PointerMoved { x: 10.0, y: 10.0 }, &mut state, &mut orbit);
        input.apply(SceneEvent::PointerMoved { x: 90.0, y: 10.0 }, &mut state, &mut orbit);
        for _ in 0..100 {
            orbit.update();
        }
        assert!((orbit.eye() - before).length() < 1e-4, "no drag without button");

        input.apply(SceneEvent::PointerButton { pressed: true }, &mut state, &mut orbit);
        input.apply(SceneEvent::PointerMoved { x: 10.0, y: 10.0 }, &mut state, &mut orbit);
        input.apply(SceneEvent::PointerMoved { x: 90.0, y: 10.0 }, &mut state, &mut orbit);
        for _ in 0..100 {
            orbit.update();
        }
        assert!((orbit.eye() - before).length() > 1e-3, "drag with button rotates");
    }
}

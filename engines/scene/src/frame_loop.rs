use std::{path::Path, sync::mpsc::Receiver};

use catwalk_framework::FrameworkEvent;
use glam::Vec3;
use lib_geometry::OrbitController;
use lib_gltf_model::AnimationPlayer;
use lib_time::FrameClock;
use log::info;

use crate::{
    assets::SceneAssets,
    input::{translate, InputHandler, SceneEvent},
    scene_state::{MotionPolicy, SceneState},
};

/// Initial camera pose, chosen to frame the floor from slightly above.
const CAMERA_EYE: Vec3 = Vec3::new(2.0, 3.0, 5.0);
const ORBIT_MIN_DISTANCE: f32 = 10.0;

/// What a single tick did, for callers that want to observe the loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickReport {
    /// Whether the actor's animation was advanced this tick.
    pub advanced_animation: bool,
}

/// Per-frame heart of the scene.
///
/// Ticked once per display refresh by the renderer. Each tick runs the same
/// fixed sequence: drain the window events queued since the previous tick,
/// poll the asset slots, ease the orbit camera, then advance the actor's
/// animation by the real elapsed time — gated on the moving flag when the
/// motion policy asks for it — and finally lower the flag again.
///
/// Draining at the start of the tick means an event that arrives while a
/// tick is in flight takes effect one frame later. At display refresh rates
/// that slack is invisible, so the loop keeps the simpler contract.
pub struct FrameLoop {
    events: Receiver<FrameworkEvent>,
    input: InputHandler,
    clock: FrameClock,
    pub(crate) state: SceneState,
    pub(crate) orbit: OrbitController,
    pub(crate) assets: SceneAssets,
    pub(crate) player: Option<AnimationPlayer>,
}

impl FrameLoop {
    #[must_use]
    pub fn new(policy: MotionPolicy, events: Receiver<FrameworkEvent>, asset_root: &Path) -> Self {
        Self::with_assets(policy, events, SceneAssets::load(asset_root))
    }

    pub(crate) fn with_assets(
        policy: MotionPolicy,
        events: Receiver<FrameworkEvent>,
        assets: SceneAssets,
    ) -> Self {
        let mut orbit = OrbitController::new(CAMERA_EYE, Vec3::ZERO);
        orbit.min_distance = ORBIT_MIN_DISTANCE;

        Self {
            events,
            input: InputHandler::default(),
            clock: FrameClock::default(),
            state: SceneState::new(policy),
            orbit,
            assets,
            player: None,
        }
    }

    /// Feeds one already-translated event into the scene. Events arriving
    /// through the window channel go through the same path when drained.
    pub fn handle_event(&mut self, event: SceneEvent) {
        self.input.apply(event, &mut self.state, &mut self.orbit);
    }

    pub fn tick(&mut self) -> TickReport {
        while let Ok(event) = self.events.try_recv() {
            if let FrameworkEvent::Window { event } = event {
                if let Some(scene_event) = translate(&event) {
                    self.handle_event(scene_event);
                }
            }
        }

        self.poll_assets();
        self.orbit.update();

        let elapsed = self.clock.tick();
        let gate_open = !self.state.policy.animate_only_while_moving || self.state.moving;
        let mut advanced_animation = false;
        if gate_open {
            if let (Some(player), Some(document)) = (&mut self.player, self.assets.actor.get_mut())
            {
                player.advance(elapsed, &document.clips, &mut document.nodes);
                advanced_animation = true;
            }
        }
        // the flag marks a fresh key press, not a held key
        self.state.moving = false;

        TickReport { advanced_animation }
    }

    fn poll_assets(&mut self) {
        if self.assets.actor.poll() {
            if let Some(document) = self.assets.actor.get() {
                if document.clips.is_empty() {
                    info!("actor model carries no animation clips");
                } else {
                    self.player = Some(AnimationPlayer::new(0));
                }
            }
            self.orbit.target = self.state.actor.position;
        }
        self.assets.tree.poll();
        self.assets.grass.poll();
        self.assets.toy.poll();
        self.assets.floor_texture.poll();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::Slot;
    use lib_gltf_model::{AnimationClip, Document, Node};
    use std::sync::mpsc::{channel, Sender};
    use winit::keyboard::KeyCode;

    struct PendingAssets {
        // keeps the loader channels open so the slots stay pending
        _senders: Vec<Sender<anyhow::Result<Document>>>,
        _texture_sender: Sender<anyhow::Result<image::RgbaImage>>,
    }

    fn pending_assets() -> (SceneAssets, PendingAssets) {
        let mut senders = Vec::new();
        let mut slot = || {
            let (sender, completion) = channel();
            senders.push(sender);
            Slot::Pending {
                name: "test",
                completion,
            }
        };
        let (actor, tree, grass, toy) = (slot(), slot(), slot(), slot());
        let (texture_sender, texture_completion) = channel();

        (
            SceneAssets {
                floor_texture: Slot::Pending {
                    name: "test",
                    completion: texture_completion,
                },
                actor,
                tree,
                grass,
                toy,
            },
            PendingAssets {
                _senders: senders,
                _texture_sender: texture_sender,
            },
        )
    }

    /// A slot whose load has already completed but has not been polled yet.
    fn delivered(document: Document) -> Slot<Document> {
        let (sender, completion) = channel();
        sender.send(Ok(document)).unwrap();
        Slot::Pending {
            name: "test",
            completion,
        }
    }

    fn animated_document() -> Document {
        Document {
            nodes: vec![Node {
                parent: None,
                translation: Vec3::ZERO,
                rotation: glam::Quat::IDENTITY,
                scale: Vec3::ONE,
            }],
            meshes: Vec::new(),
            clips: vec![AnimationClip {
                name: "Walk".to_owned(),
                duration: 1.0,
                tracks: Vec::new(),
            }],
        }
    }

    fn frame_loop(policy: MotionPolicy, assets: SceneAssets) -> FrameLoop {
        let (_sender, receiver) = channel();
        FrameLoop::with_assets(policy, receiver, assets)
    }

    #[test]
    fn ticks_run_while_every_asset_is_still_loading() {
        let (assets, _pending) = pending_assets();
        let mut frame_loop = frame_loop(MotionPolicy::default(), assets);

        for _ in 0..50 {
            let report = frame_loop.tick();
            assert!(!report.advanced_animation);
        }
        assert!(frame_loop.player.is_none());
    }

    #[test]
    fn player_attaches_on_the_tick_the_actor_arrives() {
        let (mut assets, _pending) = pending_assets();
        assets.actor = delivered(animated_document());
        let mut frame_loop = frame_loop(MotionPolicy::default(), assets);

        assert!(frame_loop.player.is_none());
        frame_loop.tick();
        assert!(frame_loop.player.is_some());
    }

    #[test]
    fn animation_advances_only_on_ticks_following_a_movement_key() {
        let (mut assets, _pending) = pending_assets();
        assets.actor = delivered(animated_document());
        let mut frame_loop = frame_loop(MotionPolicy::default(), assets);
        frame_loop.tick();

        // idle ticks leave the animation untouched
        assert!(!frame_loop.tick().advanced_animation);

        frame_loop.handle_event(SceneEvent::KeyPressed(KeyCode::KeyW));
        assert!(frame_loop.tick().advanced_animation);

        // the flag is not a latch; the next idle tick freezes again
        assert!(!frame_loop.tick().advanced_animation);
    }

    #[test]
    fn key_press_after_a_tick_counts_towards_the_next_tick() {
        let (mut assets, _pending) = pending_assets();
        assets.actor = delivered(animated_document());
        let mut frame_loop = frame_loop(MotionPolicy::default(), assets);
        frame_loop.tick();

        assert!(!frame_loop.tick().advanced_animation);
        frame_loop.handle_event(SceneEvent::KeyPressed(KeyCode::KeyD));
        assert!(frame_loop.tick().advanced_animation);
    }

    #[test]
    fn unconditional_policy_animates_every_tick() {
        let (mut assets, _pending) = pending_assets();
        assets.actor = delivered(animated_document());
        let mut frame_loop = frame_loop(
            MotionPolicy {
                animate_only_while_moving: false,
                local_space_transform: false,
            },
            assets,
        );
        frame_loop.tick();

        for _ in 0..5 {
            assert!(frame_loop.tick().advanced_animation);
        }
    }

    #[test]
    fn failed_actor_load_leaves_the_loop_running() {
        let (mut assets, _pending) = pending_assets();
        assets.actor = Slot::Failed;
        let mut frame_loop = frame_loop(MotionPolicy::default(), assets);

        frame_loop.handle_event(SceneEvent::KeyPressed(KeyCode::KeyW));
        let report = frame_loop.tick();
        assert!(!report.advanced_animation);
        assert!(frame_loop.player.is_none());

        // movement keys still steer the (invisible) actor
        assert!(frame_loop.state.actor.position.z > 0.0);
    }

    #[test]
    fn clipless_model_attaches_without_a_player() {
        let (mut assets, _pending) = pending_assets();
        let mut document = animated_document();
        document.clips.clear();
        assets.actor = delivered(document);
        let mut frame_loop = frame_loop(MotionPolicy::default(), assets);

        frame_loop.handle_event(SceneEvent::KeyPressed(KeyCode::KeyW));
        assert!(!frame_loop.tick().advanced_animation);
        assert!(frame_loop.player.is_none());
    }
}

use core::time::Duration;

use glam::{Quat, Vec3};
use gltf::animation::util::ReadOutputs;
use gltf::Gltf;

use crate::model::Node;

/// Keyframe values of one track, matching the glTF target property.
pub enum Keyframes {
    Translation(Vec<Vec3>),
    Rotation(Vec<Quat>),
    Scale(Vec<Vec3>),
}

/// One animated property of one node.
pub struct Track {
    pub node: usize,
    pub times: Vec<f32>,
    pub keyframes: Keyframes,
}

/// A named animation taken from a glTF asset. Sampling writes interpolated
/// local transforms onto the document's nodes.
pub struct AnimationClip {
    pub name: String,
    pub duration: f32,
    pub tracks: Vec<Track>,
}

impl AnimationClip {
    /// Writes the pose at `time` (seconds, clip-local) onto `nodes`.
    /// Keyframes are interpolated linearly; rotation uses spherical
    /// interpolation.
    pub fn sample(&self, time: f32, nodes: &mut [Node]) {
        for track in &self.tracks {
            let Some(node) = nodes.get_mut(track.node) else {
                continue;
            };

            let (index, blend) = keyframe_cursor(&track.times, time);
            match &track.keyframes {
                Keyframes::Translation(values) => {
                    if let Some(value) = interpolate(values, index, blend, Vec3::lerp) {
                        node.translation = value;
                    }
                }
                Keyframes::Rotation(values) => {
                    if let Some(value) = interpolate(values, index, blend, Quat::slerp) {
                        node.rotation = value;
                    }
                }
                Keyframes::Scale(values) => {
                    if let Some(value) = interpolate(values, index, blend, Vec3::lerp) {
                        node.scale = value;
                    }
                }
            }
        }
    }
}

/// Returns the index of the keyframe at or before `time` and the blend
/// factor towards the following keyframe.
fn keyframe_cursor(times: &[f32], time: f32) -> (usize, f32) {
    let upper = times.partition_point(|&keyframe_time| keyframe_time <= time);
    if upper == 0 {
        return (0, 0.0);
    }

    let index = upper - 1;
    let Some((&current, &next)) = times.get(index).zip(times.get(upper)) else {
        // at or past the last keyframe
        return (index, 0.0);
    };

    let span = next - current;
    let blend = if span > 0.0 {
        (time - current) / span
    } else {
        0.0
    };
    (index, blend)
}

fn interpolate<T: Copy>(
    values: &[T],
    index: usize,
    blend: f32,
    lerp: impl Fn(T, T, f32) -> T,
) -> Option<T> {
    let current = *values.get(index)?;
    match values.get(index + 1) {
        Some(&next) if blend > 0.0 => Some(lerp(current, next, blend)),
        _ => Some(current),
    }
}

/// Advances one clip of a model and keeps its playback position.
/// Wraps at the clip duration, so the clip loops forever.
pub struct AnimationPlayer {
    clip: usize,
    position: f32,
}

impl AnimationPlayer {
    #[must_use]
    pub fn new(clip: usize) -> Self {
        Self {
            clip,
            position: 0.0,
        }
    }

    #[must_use]
    pub fn clip(&self) -> usize {
        self.clip
    }

    #[must_use]
    pub fn position(&self) -> f32 {
        self.position
    }

    /// Moves playback forward by `elapsed` and writes the new pose onto
    /// `nodes`. Does nothing if the clip index is out of range.
    pub fn advance(&mut self, elapsed: Duration, clips: &[AnimationClip], nodes: &mut [Node]) {
        let Some(clip) = clips.get(self.clip) else {
            return;
        };

        self.position += elapsed.as_secs_f32();
        if clip.duration > 0.0 {
            self.position %= clip.duration;
        }
        clip.sample(self.position, nodes);
    }
}

/// Extracts every animation of a glTF document into [`AnimationClip`]s.
pub(crate) fn clips_from_gltf(gltf: &Gltf, buffer_data: &[Vec<u8>]) -> Vec<AnimationClip> {
    gltf.animations()
        .map(|animation| {
            let mut duration = 0.0_f32;
            let mut tracks = Vec::new();

            for channel in animation.channels() {
                let reader =
                    channel.reader(|buffer| buffer_data.get(buffer.index()).map(Vec::as_slice));

                let Some(times) = reader.read_inputs().map(|times| times.collect::<Vec<f32>>())
                else {
                    continue;
                };
                let Some(outputs) = reader.read_outputs() else {
                    continue;
                };

                let keyframes = match outputs {
                    ReadOutputs::Translations(values) => {
                        Keyframes::Translation(values.map(Vec3::from).collect())
                    }
                    ReadOutputs::Rotations(values) => Keyframes::Rotation(
                        values.into_f32().map(Quat::from_array).collect(),
                    ),
                    ReadOutputs::Scales(values) => {
                        Keyframes::Scale(values.map(Vec3::from).collect())
                    }
                    // morph targets are not supported
                    ReadOutputs::MorphTargetWeights(_) => continue,
                };

                duration = times.iter().copied().fold(duration, f32::max);
                tracks.push(Track {
                    node: channel.target().node().index(),
                    times,
                    keyframes,
                });
            }

            AnimationClip {
                name: animation.name().unwrap_or_default().to_owned(),
                duration,
                tracks,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rest_node() -> Node {
        Node {
            parent: None,
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }

    fn walk_clip() -> AnimationClip {
        AnimationClip {
            name: "walk".to_owned(),
            duration: 2.0,
            tracks: vec![Track {
                node: 0,
                times: vec![0.0, 2.0],
                keyframes: Keyframes::Translation(vec![
                    Vec3::ZERO,
                    Vec3::new(4.0, 0.0, 0.0),
                ]),
            }],
        }
    }

    #[test]
    fn sample_interpolates_between_keyframes() {
        let clip = walk_clip();
        let mut nodes = vec![rest_node()];

        clip.sample(1.0, &mut nodes);
        assert!((nodes[0].translation - Vec3::new(2.0, 0.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn sample_clamps_outside_the_keyframe_range() {
        let clip = walk_clip();
        let mut nodes = vec![rest_node()];

        clip.sample(-1.0, &mut nodes);
        assert!((nodes[0].translation - Vec3::ZERO).length() < 1e-6);

        clip.sample(10.0, &mut nodes);
        assert!((nodes[0].translation - Vec3::new(4.0, 0.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn rotation_tracks_use_spherical_interpolation() {
        let half_turn = Quat::from_rotation_y(core::f32::consts::PI / 2.0);
        let clip = AnimationClip {
            name: String::new(),
            duration: 1.0,
            tracks: vec![Track {
                node: 0,
                times: vec![0.0, 1.0],
                keyframes: Keyframes::Rotation(vec![Quat::IDENTITY, half_turn]),
            }],
        };
        let mut nodes = vec![rest_node()];

        clip.sample(0.5, &mut nodes);
        let expected = Quat::from_rotation_y(core::f32::consts::PI / 4.0);
        assert!(nodes[0].rotation.angle_between(expected) < 1e-4);
    }

    #[test]
    fn player_wraps_at_the_clip_duration() {
        let clips = vec![walk_clip()];
        let mut nodes = vec![rest_node()];
        let mut player = AnimationPlayer::new(0);

        player.advance(Duration::from_secs_f32(2.5), &clips, &mut nodes);
        assert!((player.position() - 0.5).abs() < 1e-6);
        assert!((nodes[0].translation - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn player_with_unknown_clip_is_a_no_op() {
        let mut nodes = vec![rest_node()];
        let mut player = AnimationPlayer::new(7);

        player.advance(Duration::from_secs(1), &[], &mut nodes);
        assert!((player.position() - 0.0).abs() < 1e-6);
        assert!((nodes[0].translation - Vec3::ZERO).length() < 1e-6);
    }
}

use std::{
    path::{Path, PathBuf},
    sync::mpsc::{channel, Receiver, TryRecvError},
    thread,
};

use image::RgbaImage;
use lib_gltf_model::Document;
use log::{debug, error};

/// A scene slot that an asynchronous load will eventually fill.
///
/// Loads run on short-lived background threads and deliver their result over
/// a completion channel; the frame loop polls the slot once per tick. The
/// "empty until the load completes" contract is visible in the type instead
/// of hiding behind null checks: a slot is `Pending`, `Ready` or `Failed`,
/// and a failure is terminal for that asset only.
pub enum Slot<T> {
    Pending {
        name: &'static str,
        completion: Receiver<anyhow::Result<T>>,
    },
    Ready(T),
    Failed,
}

impl<T: Send + 'static> Slot<T> {
    /// Starts loading on a background thread.
    pub fn spawn(
        name: &'static str,
        load: impl FnOnce() -> anyhow::Result<T> + Send + 'static,
    ) -> Self {
        let (sender, completion) = channel();
        thread::spawn(move || {
            // the receiving slot may have been dropped during shutdown
            let _ = sender.send(load());
        });
        Self::Pending { name, completion }
    }
}

impl<T> Slot<T> {
    /// Checks the completion channel without blocking.
    /// Returns `true` exactly once: on the tick the slot becomes ready.
    pub fn poll(&mut self) -> bool {
        let Self::Pending { name, completion } = &*self else {
            return false;
        };

        match completion.try_recv() {
            Ok(Ok(value)) => {
                debug!("asset '{name}' finished loading");
                *self = Self::Ready(value);
                true
            }
            Ok(Err(load_error)) => {
                // the scene continues without this asset
                error!("failed to load asset '{name}': {load_error:#}");
                *self = Self::Failed;
                false
            }
            Err(TryRecvError::Empty) => false,
            Err(TryRecvError::Disconnected) => {
                error!("loader thread for asset '{name}' disappeared");
                *self = Self::Failed;
                false
            }
        }
    }

    #[must_use]
    pub fn get(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            Self::Pending { .. } | Self::Failed => None,
        }
    }

    #[must_use]
    pub fn get_mut(&mut self) -> Option<&mut T> {
        match self {
            Self::Ready(value) => Some(value),
            Self::Pending { .. } | Self::Failed => None,
        }
    }
}

/// Every asset the scene wants on screen. All loads are independent and
/// unordered; none of them is required for the frame loop to keep running.
pub struct SceneAssets {
    pub floor_texture: Slot<RgbaImage>,
    pub actor: Slot<Document>,
    pub tree: Slot<Document>,
    pub grass: Slot<Document>,
    pub toy: Slot<Document>,
}

impl SceneAssets {
    /// Kicks off every load relative to the given asset root.
    #[must_use]
    pub fn load(asset_root: &Path) -> Self {
        Self {
            floor_texture: Slot::spawn("carpet", loader(asset_root, "floor/carpet.jpg", |path| {
                Ok(image::open(path)?.to_rgba8())
            })),
            actor: Slot::spawn(
                "cat",
                loader(asset_root, "cat/scene.gltf", |path| {
                    lib_gltf_model::load_document(path)
                }),
            ),
            tree: Slot::spawn(
                "tree",
                loader(asset_root, "tree/scene.gltf", |path| {
                    lib_gltf_model::load_document(path)
                }),
            ),
            grass: Slot::spawn(
                "grass",
                loader(asset_root, "grass/scene.gltf", |path| {
                    lib_gltf_model::load_document(path)
                }),
            ),
            toy: Slot::spawn(
                "toy",
                loader(asset_root, "toy/scene.gltf", |path| {
                    lib_gltf_model::load_document(path)
                }),
            ),
        }
    }
}

fn loader<T>(
    asset_root: &Path,
    relative: &str,
    load: impl FnOnce(&Path) -> anyhow::Result<T> + Send + 'static,
) -> impl FnOnce() -> anyhow::Result<T> + Send + 'static {
    let path: PathBuf = asset_root.join(relative);
    move || load(&path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::mpsc::Sender;

    fn pending_slot() -> (Slot<u32>, Sender<anyhow::Result<u32>>) {
        let (sender, completion) = channel();
        (
            Slot::Pending {
                name: "test",
                completion,
            },
            sender,
        )
    }

    #[test]
    fn slot_stays_pending_until_the_load_completes() {
        let (mut slot, sender) = pending_slot();

        // repeated polls of a load that never fires must not fault
        for _ in 0..100 {
            assert!(!slot.poll());
            assert!(slot.get().is_none());
        }

        sender.send(Ok(42)).unwrap();
        assert!(slot.poll());
        assert_eq!(slot.get(), Some(&42));

        // "newly ready" is only reported once
        assert!(!slot.poll());
    }

    #[test]
    fn failed_load_is_terminal_for_that_slot_only() {
        let (mut slot, sender) = pending_slot();
        let (mut other, other_sender) = pending_slot();

        sender.send(Err(anyhow!("corrupt file"))).unwrap();
        assert!(!slot.poll());
        assert!(matches!(slot, Slot::Failed));
        assert!(slot.get().is_none());

        other_sender.send(Ok(1)).unwrap();
        assert!(other.poll());
        assert_eq!(other.get(), Some(&1));
    }

    #[test]
    fn spawned_load_delivers_its_result() {
        let mut slot = Slot::spawn("answer", || Ok(41 + 1));

        let mut polls = 0;
        while !slot.poll() {
            polls += 1;
            assert!(polls < 10_000, "load never completed");
            std::thread::yield_now();
        }
        assert_eq!(slot.get(), Some(&42));
    }

    #[test]
    fn spawned_failure_is_swallowed_and_logged() {
        let mut slot: Slot<u32> = Slot::spawn("broken", || Err(anyhow!("no such file")));

        let mut polls = 0;
        while !matches!(slot, Slot::Failed) {
            slot.poll();
            polls += 1;
            assert!(polls < 10_000, "failure never delivered");
            std::thread::yield_now();
        }
        assert!(slot.get().is_none());
    }
}

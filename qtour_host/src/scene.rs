use std::collections::BTreeMap;

use qtour_core::{DecorationHandle, LabelSprite, SceneGraph};
use serde::Serialize;

/// Scene graph stand-in that keeps the live label sprites and counts churn.
#[derive(Debug, Default)]
pub struct RecordingScene {
    next_handle: u64,
    live: BTreeMap<DecorationHandle, LabelSprite>,
    added: usize,
    removed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SceneSummary {
    pub live_labels: Vec<LabelSprite>,
    pub added: usize,
    pub removed: usize,
}

impl RecordingScene {
    pub fn summary(&self) -> SceneSummary {
        SceneSummary {
            live_labels: self.live.values().cloned().collect(),
            added: self.added,
            removed: self.removed,
        }
    }
}

impl SceneGraph for RecordingScene {
    fn add(&mut self, sprite: LabelSprite) -> DecorationHandle {
        self.next_handle += 1;
        let handle = DecorationHandle(self.next_handle);
        log::trace!(
            "[scene] + label {:?} #{} at {}",
            sprite.text,
            handle.0,
            sprite.position
        );
        self.live.insert(handle, sprite);
        self.added += 1;
        handle
    }

    fn remove(&mut self, handle: DecorationHandle) -> bool {
        let removed = self.live.remove(&handle).is_some();
        if removed {
            self.removed += 1;
            log::trace!("[scene] - label #{}", handle.0);
        }
        removed
    }
}

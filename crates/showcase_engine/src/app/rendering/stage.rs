use tracing::{debug, warn};

use crate::app::{SceneHandle, SceneHost};

/// Host-side attachment point for the single live scene.
#[derive(Debug, Default)]
pub struct Stage {
    attached: Vec<(SceneHandle, String)>,
    attach_count: u64,
}

impl Stage {
    pub fn attached_scene(&self) -> Option<&str> {
        self.attached.last().map(|(_, name)| name.as_str())
    }

    pub fn attached_len(&self) -> usize {
        self.attached.len()
    }

    pub fn attach_count(&self) -> u64 {
        self.attach_count
    }
}

impl SceneHost for Stage {
    fn attach(&mut self, handle: SceneHandle, name: &str) {
        if !self.attached.is_empty() {
            warn!(
                scene = name,
                attached = self.attached.len(),
                "stage_attach_while_occupied"
            );
        }
        self.attached.push((handle, name.to_string()));
        self.attach_count = self.attach_count.saturating_add(1);
        debug!(scene = name, handle = handle.0, "stage_attached");
    }

    fn detach(&mut self, handle: SceneHandle) {
        let before = self.attached.len();
        self.attached.retain(|(existing, _)| *existing != handle);
        if self.attached.len() == before {
            warn!(handle = handle.0, "stage_detach_unknown_scene");
        } else {
            debug!(handle = handle.0, "stage_detached");
        }
    }
}

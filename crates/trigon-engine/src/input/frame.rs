use std::collections::HashSet;

use super::types::Key;

/// Per-frame input deltas.
///
/// `InputState` holds the keys currently down; `InputFrame` holds what changed
/// since the last rendered frame.
#[derive(Debug, Default)]
pub struct InputFrame {
    /// Keys pressed this frame.
    pub keys_pressed: HashSet<Key>,
}

impl InputFrame {
    pub fn clear(&mut self) {
        self.keys_pressed.clear();
    }

    /// True if `key` went down at any point this frame, even if already released.
    pub fn pressed(&self, key: Key) -> bool {
        self.keys_pressed.contains(&key)
    }
}

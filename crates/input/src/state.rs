use crate::action::{Action, Key, Movement};
use glam::Vec2;
use std::collections::{BTreeSet, HashSet};

/// Everything the frame loop needs from one frame of input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameInput {
    /// Movement directions held at the end of the frame.
    pub movements: Vec<Movement>,
    pub sprint: bool,
    /// Virtual cursor position, if the mouse moved this frame.
    pub cursor: Option<Vec2>,
    /// Accumulated vertical scroll since the last frame.
    pub scroll: f32,
    /// Discrete actions in press order.
    pub actions: Vec<Action>,
}

/// Accumulates raw window events between frames.
#[derive(Debug, Default)]
pub struct InputState {
    held: HashSet<Key>,
    cursor: Vec2,
    cursor_moved: bool,
    scroll: f32,
    actions: Vec<Action>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key press or release.
    pub fn key(&mut self, key: Key, pressed: bool) {
        if !pressed {
            self.held.remove(&key);
            return;
        }
        let newly_pressed = self.held.insert(key);
        let action = key.action();
        if newly_pressed && action.is_discrete() {
            tracing::debug!(?action, "action queued");
            self.actions.push(action);
        }
    }

    /// Record relative mouse motion. The deltas are summed into a virtual
    /// cursor so the camera sees absolute positions, as with a captured
    /// pointer.
    pub fn mouse_motion(&mut self, dx: f32, dy: f32) {
        self.cursor += Vec2::new(dx, dy);
        self.cursor_moved = true;
    }

    pub fn scroll(&mut self, dy: f32) {
        self.scroll += dy;
    }

    /// Forget held keys, e.g. when the window loses focus.
    pub fn release_all(&mut self) {
        self.held.clear();
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    /// Snapshot this frame's input and reset the per-frame accumulators.
    pub fn take_frame(&mut self) -> FrameInput {
        let movements: BTreeSet<Movement> = self
            .held
            .iter()
            .filter_map(|k| match k.action() {
                Action::Move(m) => Some(m),
                _ => None,
            })
            .collect();
        let cursor = std::mem::take(&mut self.cursor_moved).then_some(self.cursor);
        FrameInput {
            movements: movements.into_iter().collect(),
            sprint: self.is_held(Key::LeftShift),
            cursor,
            scroll: std::mem::take(&mut self.scroll),
            actions: std::mem::take(&mut self.actions),
        }
    }
}

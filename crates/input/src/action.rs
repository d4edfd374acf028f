/// Camera translation directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Movement {
    Forward,
    Back,
    Left,
    Right,
    Up,
    Down,
}

/// Keys the viewer reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    W,
    A,
    S,
    D,
    Space,
    LeftControl,
    LeftShift,
    F,
    Z,
    Escape,
}

/// What a key does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Held: translate the camera every frame.
    Move(Movement),
    /// Held: double the camera speed.
    Sprint,
    /// Pressed: flip the camera-attached spot light.
    ToggleFlashlight,
    /// Pressed: flip polygon fill mode.
    ToggleWireframe,
    /// Pressed: close the viewer.
    Quit,
}

impl Key {
    /// Default key binding.
    pub fn action(self) -> Action {
        match self {
            Key::W => Action::Move(Movement::Forward),
            Key::S => Action::Move(Movement::Back),
            Key::A => Action::Move(Movement::Left),
            Key::D => Action::Move(Movement::Right),
            Key::Space => Action::Move(Movement::Up),
            Key::LeftControl => Action::Move(Movement::Down),
            Key::LeftShift => Action::Sprint,
            Key::F => Action::ToggleFlashlight,
            Key::Z => Action::ToggleWireframe,
            Key::Escape => Action::Quit,
        }
    }
}

impl Action {
    /// Whether the action fires on press rather than while held.
    pub fn is_discrete(self) -> bool {
        matches!(
            self,
            Action::ToggleFlashlight | Action::ToggleWireframe | Action::Quit
        )
    }
}

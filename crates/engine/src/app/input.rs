#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    Jump,
    Cast,
    ToggleRed,
    ToggleGreen,
    ToggleBlue,
    Quit,
}

const ACTION_COUNT: usize = 10;

impl InputAction {
    pub const ALL: [InputAction; ACTION_COUNT] = [
        InputAction::MoveUp,
        InputAction::MoveDown,
        InputAction::MoveLeft,
        InputAction::MoveRight,
        InputAction::Jump,
        InputAction::Cast,
        InputAction::ToggleRed,
        InputAction::ToggleGreen,
        InputAction::ToggleBlue,
        InputAction::Quit,
    ];

    const fn index(self) -> usize {
        match self {
            InputAction::MoveUp => 0,
            InputAction::MoveDown => 1,
            InputAction::MoveLeft => 2,
            InputAction::MoveRight => 3,
            InputAction::Jump => 4,
            InputAction::Cast => 5,
            InputAction::ToggleRed => 6,
            InputAction::ToggleGreen => 7,
            InputAction::ToggleBlue => 8,
            InputAction::Quit => 9,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ActionStates {
    down: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub(crate) fn set(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub(crate) fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }
}

/// Input as seen by one simulation tick: held keys plus press edges since the
/// previous tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    quit_requested: bool,
    held: ActionStates,
    pressed: ActionStates,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn new(quit_requested: bool, held: ActionStates, pressed: ActionStates) -> Self {
        Self {
            quit_requested,
            held,
            pressed,
        }
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.held.is_down(action)
    }

    pub fn was_pressed(&self, action: InputAction) -> bool {
        self.pressed.is_down(action)
    }

    /// 1 when held, 0 otherwise. Handy for `(right - left)` style axes.
    pub fn axis_value(&self, action: InputAction) -> i32 {
        i32::from(self.is_down(action))
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.held.set(action, is_down);
        self
    }

    pub fn with_action_pressed(mut self, action: InputAction, pressed: bool) -> Self {
        self.pressed.set(action, pressed);
        self
    }

    pub fn with_quit_requested(mut self, quit_requested: bool) -> Self {
        self.quit_requested = quit_requested;
        self
    }
}

/// One-shot key release queries. A release is reported to at most one
/// `was_released` call and never survives a `flush`.
#[derive(Debug, Clone, Default)]
pub struct KeyReleaseTracker {
    pending: ActionStates,
}

impl KeyReleaseTracker {
    pub fn on_key_release(&mut self, action: InputAction) {
        self.pending.set(action, true);
    }

    pub fn was_released(&mut self, action: InputAction) -> bool {
        let released = self.pending.is_down(action);
        self.pending.set(action, false);
        released
    }

    /// Drops releases nobody consumed this frame.
    pub fn flush(&mut self) {
        self.pending = ActionStates::default();
    }

    pub fn has_pending(&self) -> bool {
        InputAction::ALL
            .iter()
            .any(|action| self.pending.is_down(*action))
    }
}

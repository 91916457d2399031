use serde::Serialize;
use winit::event::ElementState;
use winit::keyboard::{KeyCode, PhysicalKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    Collect,
    Quit,
}

const ACTION_COUNT: usize = 6;

impl InputAction {
    const fn index(self) -> usize {
        match self {
            InputAction::MoveUp => 0,
            InputAction::MoveDown => 1,
            InputAction::MoveLeft => 2,
            InputAction::MoveRight => 3,
            InputAction::Collect => 4,
            InputAction::Quit => 5,
        }
    }

    pub fn from_physical_key(key: PhysicalKey) -> Option<Self> {
        match key {
            PhysicalKey::Code(KeyCode::KeyW) | PhysicalKey::Code(KeyCode::ArrowUp) => {
                Some(InputAction::MoveUp)
            }
            PhysicalKey::Code(KeyCode::KeyS) | PhysicalKey::Code(KeyCode::ArrowDown) => {
                Some(InputAction::MoveDown)
            }
            PhysicalKey::Code(KeyCode::KeyA) | PhysicalKey::Code(KeyCode::ArrowLeft) => {
                Some(InputAction::MoveLeft)
            }
            PhysicalKey::Code(KeyCode::KeyD) | PhysicalKey::Code(KeyCode::ArrowRight) => {
                Some(InputAction::MoveRight)
            }
            PhysicalKey::Code(KeyCode::Space) => Some(InputAction::Collect),
            PhysicalKey::Code(KeyCode::Escape) => Some(InputAction::Quit),
            _ => None,
        }
    }

    pub fn intent(self) -> Option<PlayerIntent> {
        match self {
            InputAction::MoveUp => Some(PlayerIntent::Move {
                direction: Direction::Up,
            }),
            InputAction::MoveDown => Some(PlayerIntent::Move {
                direction: Direction::Down,
            }),
            InputAction::MoveLeft => Some(PlayerIntent::Move {
                direction: Direction::Left,
            }),
            InputAction::MoveRight => Some(PlayerIntent::Move {
                direction: Direction::Right,
            }),
            InputAction::Collect => Some(PlayerIntent::Collect),
            InputAction::Quit => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Message sent back to the server. The server decides what actually
/// happens; the client never waits for an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PlayerIntent {
    Move { direction: Direction },
    Collect,
}

/// Turns raw key events into edge-triggered actions; held keys fire once.
#[derive(Debug, Clone, Default)]
pub(crate) struct InputCollector {
    down: [bool; ACTION_COUNT],
    pressed: Vec<InputAction>,
    quit_requested: bool,
}

impl InputCollector {
    pub(crate) fn handle_key(&mut self, key: PhysicalKey, state: ElementState) {
        let Some(action) = InputAction::from_physical_key(key) else {
            return;
        };
        let slot = &mut self.down[action.index()];
        match state {
            ElementState::Pressed => {
                if !*slot {
                    self.pressed.push(action);
                    if action == InputAction::Quit {
                        self.quit_requested = true;
                    }
                }
                *slot = true;
            }
            ElementState::Released => *slot = false,
        }
    }

    pub(crate) fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub(crate) fn drain_intents(&mut self) -> Vec<PlayerIntent> {
        self.pressed
            .drain(..)
            .filter_map(InputAction::intent)
            .collect()
    }
}

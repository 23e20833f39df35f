//! Keyboard handling: cursor movement and the name prompt.

use crate::games::tictactoe::Position;
use crossterm::event::KeyCode;

/// Moves cursor based on arrow keys.
pub fn move_cursor(cursor: Position, key: KeyCode) -> Position {
    let index = cursor.to_index();
    let (row, col) = (index / 3, index % 3);

    let (row, col) = match key {
        KeyCode::Right if col < 2 => (row, col + 1),
        KeyCode::Left if col > 0 => (row, col - 1),
        KeyCode::Down if row < 2 => (row + 1, col),
        KeyCode::Up if row > 0 => (row - 1, col),
        _ => (row, col),
    };

    Position::from_index(row * 3 + col).unwrap_or(cursor)
}

/// What the name prompt is collecting a name for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptPurpose {
    /// First match from the menu.
    Play,
    /// Another match after one ended.
    Rematch,
}

/// Modal text entry for the player's display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamePrompt {
    purpose: PromptPurpose,
    buffer: String,
}

/// Outcome of a key press inside the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptResult {
    /// Still editing.
    Editing,
    /// Enter pressed with the given text.
    Confirmed(String),
    /// Esc pressed.
    Cancelled,
}

impl NamePrompt {
    /// Maximum accepted name length.
    pub const MAX_LEN: usize = 24;

    /// Opens a prompt, pre-filled with `initial`.
    pub fn new(purpose: PromptPurpose, initial: impl Into<String>) -> Self {
        Self {
            purpose,
            buffer: initial.into(),
        }
    }

    /// Why the prompt is open.
    pub fn purpose(&self) -> PromptPurpose {
        self.purpose
    }

    /// Current text.
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Feeds one key to the prompt.
    pub fn on_key(&mut self, key: KeyCode) -> PromptResult {
        match key {
            KeyCode::Enter => PromptResult::Confirmed(self.buffer.clone()),
            KeyCode::Esc => PromptResult::Cancelled,
            KeyCode::Backspace => {
                self.buffer.pop();
                PromptResult::Editing
            }
            KeyCode::Char(c) if !c.is_control() && self.buffer.chars().count() < Self::MAX_LEN => {
                self.buffer.push(c);
                PromptResult::Editing
            }
            _ => PromptResult::Editing,
        }
    }
}

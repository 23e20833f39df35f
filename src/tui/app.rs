//! Application state and key mapping.

use crossterm::event::KeyCode;
use tracing::debug;

use super::input::{NamePrompt, PromptPurpose, PromptResult, move_cursor};
use crate::games::tictactoe::Position;
use crate::session::{Intent, NameEntry, SessionPhase, SessionSnapshot};

/// Main application state.
#[derive(Debug)]
pub struct App {
    cursor: Position,
    prompt: Option<NamePrompt>,
    last_name: String,
    should_quit: bool,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    /// Creates a new application.
    pub fn new() -> Self {
        Self {
            cursor: Position::Center,
            prompt: None,
            last_name: String::new(),
            should_quit: false,
        }
    }

    /// Board cursor.
    pub fn cursor(&self) -> Position {
        self.cursor
    }

    /// Open name prompt, if any.
    pub fn prompt(&self) -> Option<&NamePrompt> {
        self.prompt.as_ref()
    }

    /// Whether the user asked to quit.
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Maps a key press to at most one session intent.
    pub fn on_key(&mut self, key: KeyCode, snapshot: &SessionSnapshot) -> Option<Intent> {
        if let Some(prompt) = self.prompt.as_mut() {
            let purpose = prompt.purpose();
            let entry = match prompt.on_key(key) {
                PromptResult::Editing => return None,
                PromptResult::Confirmed(name) => {
                    self.last_name = name.trim().to_string();
                    NameEntry::confirmed(name)
                }
                PromptResult::Cancelled => NameEntry::cancelled(),
            };
            self.prompt = None;
            debug!(?purpose, confirmed = entry.confirmed, "Name prompt closed");
            return Some(match purpose {
                PromptPurpose::Play => Intent::RequestPlay(entry),
                PromptPurpose::Rematch => Intent::RequestRematch(entry),
            });
        }

        match (snapshot.phase, key) {
            (_, KeyCode::Char('q')) => {
                self.should_quit = true;
                None
            }
            (SessionPhase::Disconnected, KeyCode::Char('p')) => {
                self.open_prompt(PromptPurpose::Play);
                None
            }
            (SessionPhase::MatchEnded, KeyCode::Char('r')) => {
                self.open_prompt(PromptPurpose::Rematch);
                None
            }
            (SessionPhase::Disconnected, _) => None,
            (_, KeyCode::Char('m') | KeyCode::Char('c') | KeyCode::Esc) => Some(Intent::Leave),
            (SessionPhase::InMatch, KeyCode::Enter | KeyCode::Char(' ')) => {
                Some(Intent::SubmitMove(self.cursor))
            }
            (SessionPhase::InMatch, KeyCode::Char(c)) => Position::from_key(c).map(Intent::SubmitMove),
            (SessionPhase::InMatch, arrow @ (KeyCode::Up | KeyCode::Down | KeyCode::Left | KeyCode::Right)) => {
                self.cursor = move_cursor(self.cursor, arrow);
                None
            }
            _ => None,
        }
    }

    fn open_prompt(&mut self, purpose: PromptPurpose) {
        self.prompt = Some(NamePrompt::new(purpose, self.last_name.clone()));
    }
}

//! Read-only view handed to the presentation layer.

use serde::Serialize;

use super::phase::{ConnectionStatus, MatchOutcome, OpponentSearch, SessionPhase};
use crate::games::tictactoe::{Board, Mark, Position};

/// This player's identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerIdentity {
    /// Confirmed display name.
    pub name: String,
    /// Mark assigned by the authority for the current match.
    pub mark: Option<Mark>,
}

/// Everything the presentation needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    /// Current phase.
    pub phase: SessionPhase,
    /// Last authoritative board; empty outside a match.
    pub board: Board,
    /// Whose turn it is, while a match exists.
    pub turn_owner: Option<Mark>,
    /// Match result, while a match exists.
    pub outcome: Option<MatchOutcome>,
    /// Cells to highlight for a win.
    pub winning_line: Option<[Position; 3]>,
    /// This player.
    pub player: Option<PlayerIdentity>,
    /// Opponent display name, while a match exists.
    pub opponent_name: Option<String>,
    /// Matchmaking progress while awaiting an opponent.
    pub opponent_search: Option<OpponentSearch>,
    /// Transport status line.
    pub connection_status: ConnectionStatus,
    /// Last connection problem, if any.
    pub last_error: Option<String>,
}

impl SessionSnapshot {
    /// Whether a click on a square could currently produce a move.
    pub fn is_my_turn(&self) -> bool {
        self.phase == SessionPhase::InMatch
            && self.turn_owner.is_some()
            && self.turn_owner == self.player.as_ref().and_then(|p| p.mark)
    }

    /// Cell indices of the winning line.
    pub fn winning_cells(&self) -> Option<[usize; 3]> {
        self.winning_line
            .map(|line| [line[0].to_index(), line[1].to_index(), line[2].to_index()])
    }

    /// Whether `pos` is part of the winning line.
    pub fn is_winning_cell(&self, pos: Position) -> bool {
        self.winning_line.is_some_and(|line| line.contains(&pos))
    }
}

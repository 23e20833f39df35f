//! Typed messages exchanged with the authority.

use crate::games::tictactoe::{Board, Mark, Position};
use serde::{Deserialize, Serialize};

/// Intent sent from this client to the authority.
///
/// Leaving a match has no message of its own; it is expressed by closing the
/// connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientMessage {
    /// Join matchmaking under a display name.
    RequestToPlay {
        /// Confirmed display name.
        player_name: String,
    },
    /// Place `mark` on `cell`.
    SubmitMove {
        /// Target square.
        cell: Position,
        /// The mark the authority assigned to this player.
        mark: Mark,
    },
    /// Become available for a new match.
    RequestRematch,
}

impl ClientMessage {
    /// Wire name of this message.
    pub fn kind(&self) -> &'static str {
        match self {
            ClientMessage::RequestToPlay { .. } => "request_to_play",
            ClientMessage::SubmitMove { .. } => "playerMoveFromClient",
            ClientMessage::RequestRematch => "playAgain",
        }
    }
}

/// How a finished match ended, as declared by the authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    /// Three in a row for this mark.
    WinBy(Mark),
    /// Full board, no winner.
    Draw,
}

/// Authoritative board, turn owner and result carried by one message.
///
/// Applied atomically: the whole snapshot replaces whatever the client showed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Snapshot {
    /// Board exactly as the authority sent it.
    pub board: Board,
    /// Whose turn it is.
    pub turn_owner: Mark,
    /// `Some` once the authority marks the match finished.
    pub verdict: Option<Verdict>,
}

impl Snapshot {
    /// Whether the authority declared the match finished.
    pub fn finished(&self) -> bool {
        self.verdict.is_some()
    }
}

/// Event received from the authority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServerEvent {
    /// Matchmaking paired this client with an opponent.
    OpponentFound {
        /// Mark this client plays for the whole match.
        assigned_mark: Mark,
        /// Opponent display name.
        opponent_name: String,
        /// Starting board.
        board: Board,
        /// Who moves first.
        turn_owner: Mark,
    },
    /// No opponent is available yet.
    OpponentNotFound,
    /// The opponent moved.
    MoveBroadcast(Snapshot),
    /// This client's own move was applied.
    MoveAccepted(Snapshot),
    /// The opponent disconnected.
    OpponentLeft,
    /// The authority dropped this client's match state.
    SessionReset,
    /// The match is over and the authority is idle until we act.
    MatchEndedAwaitingAction,
}

impl ServerEvent {
    /// Wire name of this event.
    pub fn kind(&self) -> &'static str {
        match self {
            ServerEvent::OpponentFound { .. } => "OpponentFound",
            ServerEvent::OpponentNotFound => "OpponentNotFound",
            ServerEvent::MoveBroadcast(_) => "playerMoveFromServer",
            ServerEvent::MoveAccepted(_) => "moveConfirmed",
            ServerEvent::OpponentLeft => "opponentLeftMatch",
            ServerEvent::SessionReset => "gameReset",
            ServerEvent::MatchEndedAwaitingAction => "gameEndedWaitingForAction",
        }
    }
}

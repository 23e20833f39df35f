//! Session phases and the small status types shown alongside them.

use crate::games::tictactoe::Mark;
use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Top-level phase of the session. Exactly one holds at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum SessionPhase {
    /// No connection.
    Disconnected,
    /// Connection requested, not yet open.
    Connecting,
    /// Connected and queued for matchmaking.
    AwaitingOpponent,
    /// Playing a match.
    InMatch,
    /// The authority ended the match; waiting for rematch or menu.
    MatchEnded,
}

/// Result of the current match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum MatchOutcome {
    /// No result yet. Only seen while in a match.
    #[display("in progress")]
    Pending,
    /// The authority declared a winner.
    #[display("{} wins", _0)]
    WinBy(Mark),
    /// The authority declared a draw.
    #[display("draw")]
    Draw,
    /// The opponent left before the match finished.
    #[display("opponent left")]
    OpponentLeft,
}

/// Matchmaking progress while awaiting an opponent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, Serialize, Deserialize)]
pub enum OpponentSearch {
    /// Request sent, no answer yet.
    #[default]
    #[display("searching")]
    Searching,
    /// The authority reported nobody available. Still queued.
    #[display("no opponent available yet")]
    NotFound,
}

/// Transport status as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Display, Serialize, Deserialize)]
pub enum ConnectionStatus {
    /// No connection.
    #[default]
    #[display("disconnected")]
    Disconnected,
    /// Opening.
    #[display("connecting")]
    Connecting,
    /// Open.
    #[display("connected")]
    Connected,
    /// The last connection failed.
    #[display("error: {}", _0)]
    Error(String),
}

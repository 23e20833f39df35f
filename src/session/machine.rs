//! The session state machine.

use std::time::Duration;

use derive_new::new;
use tracing::{debug, info, instrument, warn};

use super::phase::{ConnectionStatus, MatchOutcome, OpponentSearch, SessionPhase};
use super::snapshot::{PlayerIdentity, SessionSnapshot};
use crate::error::{ProtocolViolation, UserInputError};
use crate::games::tictactoe::{Board, Mark, Position, rules};
use crate::protocol::{self, ClientMessage, ServerEvent, Snapshot, Verdict};

/// Result of the name-entry prompt.
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct NameEntry {
    /// Whether the user confirmed the prompt.
    pub confirmed: bool,
    /// Text entered, meaningful only when confirmed.
    pub value: String,
}

impl NameEntry {
    /// A confirmed entry.
    pub fn confirmed(value: impl Into<String>) -> Self {
        Self::new(true, value.into())
    }

    /// A dismissed prompt.
    pub fn cancelled() -> Self {
        Self::new(false, String::new())
    }

    /// Extracts the trimmed display name.
    pub fn into_name(self) -> Result<String, UserInputError> {
        if !self.confirmed {
            return Err(UserInputError::Cancelled);
        }
        let name = self.value.trim();
        if name.is_empty() {
            return Err(UserInputError::EmptyName);
        }
        Ok(name.to_string())
    }
}

/// User gesture translated into a request on the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// "Play online": connect and join matchmaking.
    RequestPlay(NameEntry),
    /// Square clicked.
    SubmitMove(Position),
    /// "Play again" after a match ended.
    RequestRematch(NameEntry),
    /// Cancel matchmaking, leave a match, or return to the menu.
    Leave,
}

/// Lifecycle notification from the connection manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// The connection is open.
    Opened,
    /// One inbound text frame.
    Message(String),
    /// The connection closed.
    Closed {
        /// Whether a close handshake completed.
        was_clean: bool,
    },
    /// Open failed or the transport errored.
    Error(String),
}

/// Everything the session reacts to, in queue order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Transport lifecycle or inbound frame.
    Connection(ConnectionEvent),
    /// User request.
    Intent(Intent),
    /// The delayed half of a rematch under [`RematchPolicy::Delay`].
    RematchTimerElapsed,
}

impl From<Intent> for SessionEvent {
    fn from(intent: Intent) -> Self {
        SessionEvent::Intent(intent)
    }
}

impl From<ConnectionEvent> for SessionEvent {
    fn from(event: ConnectionEvent) -> Self {
        SessionEvent::Connection(event)
    }
}

/// Side effect requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Open the connection to the configured endpoint.
    Open,
    /// Send one message, fire-and-forget.
    Send(ClientMessage),
    /// Close the connection.
    Close,
    /// Deliver [`SessionEvent::RematchTimerElapsed`] after the delay.
    ScheduleRematchRequest(Duration),
}

/// How the two halves of a rematch request are sequenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RematchPolicy {
    /// Send `request_to_play` once the authority acknowledges `playAgain`
    /// with `gameReset`.
    #[default]
    AwaitReset,
    /// Send `request_to_play` a fixed delay after `playAgain`.
    Delay(Duration),
}

/// Per-match data. Exists only while in a match or after it ended.
#[derive(Debug, Clone, PartialEq, Eq)]
struct MatchState {
    assigned_mark: Mark,
    opponent_name: String,
    board: Board,
    turn_owner: Mark,
    outcome: MatchOutcome,
    winning_line: Option<[Position; 3]>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PhaseState {
    Disconnected,
    Connecting,
    AwaitingOpponent { search: OpponentSearch },
    InMatch(MatchState),
    MatchEnded(MatchState),
}

impl PhaseState {
    fn phase(&self) -> SessionPhase {
        match self {
            PhaseState::Disconnected => SessionPhase::Disconnected,
            PhaseState::Connecting => SessionPhase::Connecting,
            PhaseState::AwaitingOpponent { .. } => SessionPhase::AwaitingOpponent,
            PhaseState::InMatch(_) => SessionPhase::InMatch,
            PhaseState::MatchEnded(_) => SessionPhase::MatchEnded,
        }
    }

    fn match_state(&self) -> Option<&MatchState> {
        match self {
            PhaseState::InMatch(m) | PhaseState::MatchEnded(m) => Some(m),
            _ => None,
        }
    }
}

/// Client session state machine.
///
/// Holds the phase, the last authoritative board, turn owner and identities.
/// The board is only ever replaced by a snapshot from the authority.
#[derive(Debug, Clone)]
pub struct Session {
    state: PhaseState,
    player_name: Option<String>,
    connection_status: ConnectionStatus,
    last_error: Option<String>,
    rematch_policy: RematchPolicy,
    /// `playAgain` sent, `request_to_play` still owed.
    rematch_pending: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(RematchPolicy::default())
    }
}

impl Session {
    /// Creates a disconnected session.
    #[instrument]
    pub fn new(rematch_policy: RematchPolicy) -> Self {
        Self {
            state: PhaseState::Disconnected,
            player_name: None,
            connection_status: ConnectionStatus::Disconnected,
            last_error: None,
            rematch_policy,
            rematch_pending: false,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> SessionPhase {
        self.state.phase()
    }

    /// Read-only view for presentation.
    pub fn snapshot(&self) -> SessionSnapshot {
        let m = self.state.match_state();
        SessionSnapshot {
            phase: self.phase(),
            board: m.map(|m| m.board).unwrap_or_default(),
            turn_owner: m.map(|m| m.turn_owner),
            outcome: m.map(|m| m.outcome),
            winning_line: m.and_then(|m| m.winning_line),
            player: self.player_name.as_ref().map(|name| PlayerIdentity {
                name: name.clone(),
                mark: m.map(|m| m.assigned_mark),
            }),
            opponent_name: m.map(|m| m.opponent_name.clone()),
            opponent_search: match &self.state {
                PhaseState::AwaitingOpponent { search } => Some(*search),
                _ => None,
            },
            connection_status: self.connection_status.clone(),
            last_error: self.last_error.clone(),
        }
    }

    /// Processes one event and returns the side effects to perform, in order.
    #[instrument(skip(self, event), fields(phase = %self.phase()))]
    pub fn dispatch(&mut self, event: SessionEvent) -> Vec<Command> {
        let commands = match event {
            SessionEvent::Intent(intent) => self.on_intent(intent),
            SessionEvent::Connection(event) => self.on_connection(event),
            SessionEvent::RematchTimerElapsed => self.on_rematch_timer(),
        };
        debug!(next = %self.phase(), commands = commands.len(), "Dispatch complete");
        commands
    }

    fn on_intent(&mut self, intent: Intent) -> Vec<Command> {
        match intent {
            Intent::RequestPlay(entry) => self.request_play(entry),
            Intent::SubmitMove(pos) => self.submit_move(pos),
            Intent::RequestRematch(entry) => self.request_rematch(entry),
            Intent::Leave => self.leave(),
        }
    }

    #[instrument(skip(self, entry))]
    fn request_play(&mut self, entry: NameEntry) -> Vec<Command> {
        if !matches!(self.state, PhaseState::Disconnected) {
            debug!(phase = %self.phase(), "Play request ignored outside Disconnected");
            return Vec::new();
        }
        let name = match entry.into_name() {
            Ok(name) => name,
            Err(e) => {
                info!(error = %e, "Play request aborted");
                return Vec::new();
            }
        };
        info!(player_name = %name, "Connecting to play online");
        self.player_name = Some(name);
        self.state = PhaseState::Connecting;
        self.connection_status = ConnectionStatus::Connecting;
        self.last_error = None;
        vec![Command::Open]
    }

    /// Advisory guard; the authority still decides whether the move is legal.
    #[instrument(skip(self))]
    fn submit_move(&mut self, pos: Position) -> Vec<Command> {
        let PhaseState::InMatch(m) = &self.state else {
            debug!(phase = %self.phase(), "Move rejected: not in a match");
            return Vec::new();
        };
        if m.turn_owner != m.assigned_mark {
            debug!(turn_owner = %m.turn_owner, assigned = %m.assigned_mark, "Move rejected: not our turn");
            return Vec::new();
        }
        if !m.board.is_empty(pos) {
            debug!(cell = pos.to_index(), "Move rejected: square occupied");
            return Vec::new();
        }
        info!(cell = pos.to_index(), mark = %m.assigned_mark, "Submitting move");
        vec![Command::Send(ClientMessage::SubmitMove {
            cell: pos,
            mark: m.assigned_mark,
        })]
    }

    #[instrument(skip(self, entry))]
    fn request_rematch(&mut self, entry: NameEntry) -> Vec<Command> {
        if !matches!(self.state, PhaseState::MatchEnded(_)) {
            debug!(phase = %self.phase(), "Rematch ignored outside MatchEnded");
            return Vec::new();
        }
        let name = match entry.into_name() {
            Ok(name) => name,
            Err(e) => {
                info!(error = %e, "Rematch aborted");
                return Vec::new();
            }
        };
        info!(player_name = %name, policy = ?self.rematch_policy, "Requesting rematch");
        self.player_name = Some(name);
        self.state = PhaseState::AwaitingOpponent {
            search: OpponentSearch::Searching,
        };
        self.rematch_pending = true;

        let mut commands = vec![Command::Send(ClientMessage::RequestRematch)];
        if let RematchPolicy::Delay(delay) = self.rematch_policy {
            commands.push(Command::ScheduleRematchRequest(delay));
        }
        commands
    }

    #[instrument(skip(self))]
    fn leave(&mut self) -> Vec<Command> {
        if matches!(self.state, PhaseState::Disconnected) {
            return Vec::new();
        }
        info!(phase = %self.phase(), "Leaving session");
        self.clear();
        self.connection_status = ConnectionStatus::Disconnected;
        vec![Command::Close]
    }

    fn on_rematch_timer(&mut self) -> Vec<Command> {
        if !self.rematch_pending || !matches!(self.state, PhaseState::AwaitingOpponent { .. }) {
            debug!("Stale rematch timer ignored");
            return Vec::new();
        }
        self.request_to_play()
    }

    fn request_to_play(&mut self) -> Vec<Command> {
        self.rematch_pending = false;
        match &self.player_name {
            Some(name) => vec![Command::Send(ClientMessage::RequestToPlay {
                player_name: name.clone(),
            })],
            None => {
                warn!("No display name to request a match with; closing");
                self.clear();
                vec![Command::Close]
            }
        }
    }

    fn on_connection(&mut self, event: ConnectionEvent) -> Vec<Command> {
        match event {
            ConnectionEvent::Opened => {
                if !matches!(self.state, PhaseState::Connecting) {
                    warn!(phase = %self.phase(), "Unexpected open notification ignored");
                    return Vec::new();
                }
                info!("Connection open; requesting a match");
                self.connection_status = ConnectionStatus::Connected;
                self.state = PhaseState::AwaitingOpponent {
                    search: OpponentSearch::Searching,
                };
                self.request_to_play()
            }
            ConnectionEvent::Message(frame) => match protocol::decode(&frame) {
                Ok(event) => self.on_server_event(event),
                Err(e) => {
                    warn!(error = %e, "Dropping undecodable message");
                    Vec::new()
                }
            },
            ConnectionEvent::Error(reason) => {
                warn!(reason = %reason, "Connection error");
                self.connection_status = ConnectionStatus::Error(reason.clone());
                self.last_error = Some(reason);
                if matches!(self.state, PhaseState::Disconnected) {
                    return Vec::new();
                }
                self.clear();
                vec![Command::Close]
            }
            ConnectionEvent::Closed { was_clean } => {
                if matches!(self.state, PhaseState::Disconnected) {
                    debug!(was_clean, "Connection closed");
                    return Vec::new();
                }
                warn!(was_clean, phase = %self.phase(), "Connection closed unexpectedly");
                if !was_clean && self.last_error.is_none() {
                    self.last_error = Some("connection lost".to_string());
                }
                if !matches!(self.connection_status, ConnectionStatus::Error(_)) {
                    self.connection_status = ConnectionStatus::Disconnected;
                }
                self.clear();
                Vec::new()
            }
        }
    }

    #[instrument(skip(self, event), fields(kind = event.kind()))]
    fn on_server_event(&mut self, event: ServerEvent) -> Vec<Command> {
        let kind = event.kind();
        match (self.phase(), event) {
            (
                SessionPhase::AwaitingOpponent,
                ServerEvent::OpponentFound {
                    assigned_mark,
                    opponent_name,
                    board,
                    turn_owner,
                },
            ) => {
                info!(%assigned_mark, opponent = %opponent_name, %turn_owner, "Opponent found");
                self.rematch_pending = false;
                self.state = PhaseState::InMatch(MatchState {
                    assigned_mark,
                    opponent_name,
                    board,
                    turn_owner,
                    outcome: MatchOutcome::Pending,
                    winning_line: None,
                });
            }
            (SessionPhase::AwaitingOpponent, ServerEvent::OpponentNotFound) => {
                info!("No opponent available yet");
                self.state = PhaseState::AwaitingOpponent {
                    search: OpponentSearch::NotFound,
                };
            }
            (
                SessionPhase::InMatch,
                ServerEvent::MoveBroadcast(snapshot) | ServerEvent::MoveAccepted(snapshot),
            ) => self.apply_snapshot(snapshot),
            (SessionPhase::InMatch, ServerEvent::OpponentLeft) => {
                info!("Opponent left the match");
                self.end_match(MatchOutcome::OpponentLeft, None);
            }
            (SessionPhase::MatchEnded, ServerEvent::OpponentLeft) => {
                info!("Opponent left after the match ended");
            }
            (SessionPhase::MatchEnded, ServerEvent::MatchEndedAwaitingAction) => {
                debug!("Authority is waiting for rematch or exit");
            }
            (
                SessionPhase::AwaitingOpponent | SessionPhase::InMatch | SessionPhase::MatchEnded,
                ServerEvent::SessionReset,
            ) => {
                info!(rematch_pending = self.rematch_pending, "Session reset by authority");
                self.state = PhaseState::AwaitingOpponent {
                    search: OpponentSearch::Searching,
                };
                if self.rematch_pending && self.rematch_policy == RematchPolicy::AwaitReset {
                    return self.request_to_play();
                }
            }
            (phase, _) => {
                let violation = ProtocolViolation { event: kind, phase };
                warn!(%violation, "Ignoring message");
            }
        }
        Vec::new()
    }

    /// Replaces board and turn owner wholesale. Never merges.
    fn apply_snapshot(&mut self, snapshot: Snapshot) {
        let PhaseState::InMatch(m) = &mut self.state else {
            return;
        };
        m.board = snapshot.board;
        m.turn_owner = snapshot.turn_owner;

        let Some(verdict) = snapshot.verdict else {
            if let Some(mark) = rules::check_winner(&m.board) {
                debug!(%mark, "Board shows three in a row; awaiting the authority's verdict");
            } else if rules::is_full(&m.board) {
                debug!("Board is full; awaiting the authority's verdict");
            }
            return;
        };

        let (outcome, winning_line) = match verdict {
            Verdict::WinBy(mark) => {
                let line = rules::winning_line(&m.board, mark);
                if line.is_none() {
                    warn!(%mark, "Declared winner has no complete line on the board");
                }
                (MatchOutcome::WinBy(mark), line)
            }
            Verdict::Draw => (MatchOutcome::Draw, None),
        };
        info!(%outcome, "Match finished");
        self.end_match(outcome, winning_line);
    }

    /// InMatch -> MatchEnded, keeping the last board.
    fn end_match(&mut self, outcome: MatchOutcome, winning_line: Option<[Position; 3]>) {
        self.state = match std::mem::replace(&mut self.state, PhaseState::Disconnected) {
            PhaseState::InMatch(mut m) => {
                m.outcome = outcome;
                m.winning_line = winning_line;
                PhaseState::MatchEnded(m)
            }
            other => other,
        };
    }

    /// Drops all per-session data and returns to Disconnected.
    fn clear(&mut self) {
        self.state = PhaseState::Disconnected;
        self.player_name = None;
        self.rematch_pending = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_entry_validation() {
        assert_eq!(NameEntry::confirmed("  Ann ").into_name(), Ok("Ann".to_string()));
        assert_eq!(
            NameEntry::confirmed("   ").into_name(),
            Err(UserInputError::EmptyName)
        );
        assert_eq!(
            NameEntry::cancelled().into_name(),
            Err(UserInputError::Cancelled)
        );
    }

    #[test]
    fn test_match_state_only_in_match_phases() {
        let session = Session::default();
        assert!(session.state.match_state().is_none());
        let snapshot = session.snapshot();
        assert_eq!(snapshot.outcome, None);
        assert_eq!(snapshot.turn_owner, None);
        assert_eq!(snapshot.board, Board::new());
    }

    #[test]
    fn test_stale_rematch_timer_is_ignored() {
        let mut session = Session::new(RematchPolicy::Delay(Duration::from_millis(100)));
        assert!(session.dispatch(SessionEvent::RematchTimerElapsed).is_empty());
        assert_eq!(session.phase(), SessionPhase::Disconnected);
    }
}

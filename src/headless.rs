//! Headless player: joins matchmaking and plays the first free square.
//!
//! Useful for exercising an authority without a terminal.

use tracing::{debug, info, instrument, warn};

use crate::driver::ClientHandle;
use crate::error::ConnectionError;
use crate::games::tictactoe::{Board, Position};
use crate::session::{MatchOutcome, NameEntry, SessionPhase};

/// Plays `matches` consecutive matches as `name` and returns their outcomes.
///
/// Fails if the session drops back to Disconnected before the last match ends.
#[instrument(skip(handle))]
pub async fn run_headless(
    handle: &ClientHandle,
    name: &str,
    matches: usize,
) -> Result<Vec<MatchOutcome>, ConnectionError> {
    let mut snapshots = handle.subscribe();
    let mut outcomes = Vec::new();
    let mut answered: Option<Board> = None;
    // A match has been requested and its result not yet counted.
    let mut awaiting_result = true;

    if matches == 0 {
        return Ok(outcomes);
    }
    // Every later notification reflects the driver's work after this request.
    drop(snapshots.borrow_and_update());
    handle.request_play(NameEntry::confirmed(name));

    loop {
        if snapshots.changed().await.is_err() {
            return Err(ConnectionError::new("session driver stopped"));
        }
        let snapshot = snapshots.borrow_and_update().clone();
        debug!(phase = %snapshot.phase, "Snapshot received");

        match snapshot.phase {
            SessionPhase::InMatch if snapshot.is_my_turn() && answered != Some(snapshot.board) => {
                if let Some(pos) = Position::valid_moves(&snapshot.board).first().copied() {
                    debug!(cell = pos.to_index(), "Choosing first free square");
                    handle.submit_move(pos);
                    answered = Some(snapshot.board);
                }
            }
            SessionPhase::MatchEnded if awaiting_result => {
                let outcome = snapshot.outcome.unwrap_or(MatchOutcome::Pending);
                info!(%outcome, played = outcomes.len() + 1, "Match ended");
                outcomes.push(outcome);
                if outcomes.len() >= matches {
                    handle.leave();
                    return Ok(outcomes);
                }
                answered = None;
                handle.request_rematch(NameEntry::confirmed(name));
                // A MatchEnded snapshot does not change until the rematch is
                // processed, so the next one seen belongs to the new match.
                awaiting_result = true;
                continue;
            }
            SessionPhase::Disconnected => {
                let reason = snapshot
                    .last_error
                    .unwrap_or_else(|| "disconnected".to_string());
                warn!(%reason, "Session ended early");
                return Err(ConnectionError::new(reason));
            }
            _ => {}
        }
        awaiting_result = snapshot.phase != SessionPhase::MatchEnded;
    }
}

//! JSON envelope encoding and decoding.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, instrument};

use super::messages::{ClientMessage, ServerEvent, Snapshot, Verdict};
use crate::error::DecodeError;
use crate::games::tictactoe::{Board, Mark, Position, Square};

/// `{"type": ..., "data": ...}` as it arrives.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OpponentFoundData {
    playing_as: Mark,
    opponent_name: String,
    // Older authorities omit these and rely on the client's fresh board.
    #[serde(default)]
    game_state: Option<Value>,
    #[serde(default)]
    current_player: Option<Mark>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MoveData {
    game_state: Value,
    current_player: Mark,
    #[serde(default)]
    finished: bool,
    #[serde(default)]
    winner: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RequestToPlayData {
    player_name: String,
}

#[derive(Debug, Deserialize)]
struct MoveFromClientData {
    id: usize,
    sign: Mark,
}

/// Encodes an outbound intent as one text frame.
#[instrument(skip(message), fields(kind = message.kind()))]
pub fn encode(message: &ClientMessage) -> String {
    let data = match message {
        ClientMessage::RequestToPlay { player_name } => json!({ "playerName": player_name }),
        ClientMessage::SubmitMove { cell, mark } => json!({
            "id": cell.to_index(),
            "sign": mark,
        }),
        ClientMessage::RequestRematch => json!({}),
    };
    envelope(message.kind(), data)
}

/// Decodes one inbound text frame from the authority.
///
/// Fails with `MalformedPayload` when the envelope or a required field is
/// missing or mistyped, and with `UnknownKind` for kinds this client does not
/// handle.
#[instrument(skip(frame), fields(len = frame.len()))]
pub fn decode(frame: &str) -> Result<ServerEvent, DecodeError> {
    let Envelope { kind, data } = serde_json::from_str(frame)?;
    debug!(kind = %kind, "Decoding server message");

    let event = match kind.as_str() {
        "OpponentFound" => {
            let found: OpponentFoundData = payload(&kind, data)?;
            let board = match found.game_state {
                Some(state) => board_from_value(&state)?,
                None => Board::new(),
            };
            ServerEvent::OpponentFound {
                assigned_mark: found.playing_as,
                opponent_name: found.opponent_name,
                board,
                turn_owner: found.current_player.unwrap_or(Mark::Circle),
            }
        }
        "OpponentNotFound" => ServerEvent::OpponentNotFound,
        "playerMoveFromServer" => ServerEvent::MoveBroadcast(snapshot(&kind, data)?),
        "moveConfirmed" => ServerEvent::MoveAccepted(snapshot(&kind, data)?),
        "opponentLeftMatch" => ServerEvent::OpponentLeft,
        "gameReset" => ServerEvent::SessionReset,
        "gameEndedWaitingForAction" => ServerEvent::MatchEndedAwaitingAction,
        _ => return Err(DecodeError::unknown_kind(kind)),
    };
    Ok(event)
}

/// Encodes an authority event. Used by scripted authorities and tooling.
#[instrument(skip(event), fields(kind = event.kind()))]
pub fn encode_event(event: &ServerEvent) -> String {
    let data = match event {
        ServerEvent::OpponentFound {
            assigned_mark,
            opponent_name,
            board,
            turn_owner,
        } => json!({
            "playingAs": assigned_mark,
            "opponentName": opponent_name,
            "gameState": board_to_value(board),
            "currentPlayer": turn_owner,
        }),
        ServerEvent::MoveBroadcast(snapshot) | ServerEvent::MoveAccepted(snapshot) => {
            let winner = match snapshot.verdict {
                Some(Verdict::WinBy(mark)) => json!(mark),
                Some(Verdict::Draw) => json!("draw"),
                None => Value::Null,
            };
            json!({
                "gameState": board_to_value(&snapshot.board),
                "currentPlayer": snapshot.turn_owner,
                "finished": snapshot.finished(),
                "winner": winner,
            })
        }
        ServerEvent::OpponentNotFound
        | ServerEvent::OpponentLeft
        | ServerEvent::SessionReset
        | ServerEvent::MatchEndedAwaitingAction => json!({}),
    };
    envelope(event.kind(), data)
}

/// Decodes a frame sent by a client. The counterpart of [`encode`].
#[instrument(skip(frame), fields(len = frame.len()))]
pub fn decode_client(frame: &str) -> Result<ClientMessage, DecodeError> {
    let Envelope { kind, data } = serde_json::from_str(frame)?;
    match kind.as_str() {
        "request_to_play" => {
            let request: RequestToPlayData = payload(&kind, data)?;
            Ok(ClientMessage::RequestToPlay {
                player_name: request.player_name,
            })
        }
        "playerMoveFromClient" => {
            let mv: MoveFromClientData = payload(&kind, data)?;
            let cell = Position::from_index(mv.id).ok_or_else(|| {
                DecodeError::malformed(format!("{}: cell {} out of range", kind, mv.id))
            })?;
            Ok(ClientMessage::SubmitMove {
                cell,
                mark: mv.sign,
            })
        }
        "playAgain" => Ok(ClientMessage::RequestRematch),
        _ => Err(DecodeError::unknown_kind(kind)),
    }
}

fn envelope(kind: &str, data: Value) -> String {
    json!({ "type": kind, "data": data }).to_string()
}

fn payload<T: DeserializeOwned>(kind: &str, data: Value) -> Result<T, DecodeError> {
    // A missing or null `data` is an empty object.
    let data = if data.is_null() { json!({}) } else { data };
    serde_json::from_value(data).map_err(|e| DecodeError::malformed(format!("{}: {}", kind, e)))
}

fn snapshot(kind: &str, data: Value) -> Result<Snapshot, DecodeError> {
    let mv: MoveData = payload(kind, data)?;
    let board = board_from_value(&mv.game_state)?;
    let verdict = if mv.finished {
        Some(match mv.winner.as_deref() {
            None | Some("draw") => Verdict::Draw,
            Some(other) => Verdict::WinBy(other.parse::<Mark>().map_err(|_| {
                DecodeError::malformed(format!("{}: unknown winner {:?}", kind, other))
            })?),
        })
    } else {
        None
    };
    Ok(Snapshot {
        board,
        turn_owner: mv.current_player,
        verdict,
    })
}

/// Reads a 3x3 array of `"circle"`, `"cross"` or `null`.
///
/// Numeric cells are the placeholders some clients seed empty boards with and
/// read as empty.
fn board_from_value(value: &Value) -> Result<Board, DecodeError> {
    let rows = value
        .as_array()
        .filter(|rows| rows.len() == 3)
        .ok_or_else(|| DecodeError::malformed("gameState must be a 3x3 array"))?;

    let mut grid = [[Square::Empty; 3]; 3];
    for (r, row) in rows.iter().enumerate() {
        let cells = row
            .as_array()
            .filter(|cells| cells.len() == 3)
            .ok_or_else(|| DecodeError::malformed(format!("gameState row {} must have 3 cells", r)))?;
        for (c, cell) in cells.iter().enumerate() {
            grid[r][c] = match cell {
                Value::Null | Value::Number(_) => Square::Empty,
                Value::String(s) => s.parse::<Mark>().map(Square::Occupied).map_err(|_| {
                    DecodeError::malformed(format!("gameState[{}][{}]: unknown mark {:?}", r, c, s))
                })?,
                other => {
                    return Err(DecodeError::malformed(format!(
                        "gameState[{}][{}]: unexpected {}",
                        r, c, other
                    )));
                }
            };
        }
    }
    Ok(Board::from_rows(grid))
}

fn board_to_value(board: &Board) -> Value {
    Value::Array(
        board
            .rows()
            .iter()
            .map(|row| Value::Array(row.iter().map(|sq| json!(sq.mark())).collect()))
            .collect(),
    )
}

//! Transition tests for the session state machine. No network involved.

use std::time::Duration;

use strictly_online::protocol::encode_event;
use strictly_online::{
    Board, ClientMessage, Command, ConnectionEvent, ConnectionStatus, Intent, Mark, MatchOutcome,
    NameEntry, OpponentSearch, Position, RematchPolicy, ServerEvent, Session, SessionEvent,
    SessionPhase, Snapshot, Square, Verdict,
};

fn board(rows: [&str; 3]) -> Board {
    let mut grid = [[Square::Empty; 3]; 3];
    for (r, row) in rows.iter().enumerate() {
        for (c, ch) in row.chars().enumerate() {
            grid[r][c] = match ch {
                'O' => Square::Occupied(Mark::Circle),
                'X' => Square::Occupied(Mark::Cross),
                _ => Square::Empty,
            };
        }
    }
    Board::from_rows(grid)
}

fn server(session: &mut Session, event: ServerEvent) -> Vec<Command> {
    session.dispatch(ConnectionEvent::Message(encode_event(&event)).into())
}

fn raw(session: &mut Session, frame: &str) -> Vec<Command> {
    session.dispatch(ConnectionEvent::Message(frame.to_string()).into())
}

fn awaiting(policy: RematchPolicy) -> Session {
    let mut session = Session::new(policy);
    assert_eq!(
        session.dispatch(Intent::RequestPlay(NameEntry::confirmed("Ann")).into()),
        vec![Command::Open]
    );
    assert_eq!(session.phase(), SessionPhase::Connecting);
    assert_eq!(
        session.dispatch(ConnectionEvent::Opened.into()),
        vec![Command::Send(ClientMessage::RequestToPlay {
            player_name: "Ann".to_string()
        })]
    );
    assert_eq!(session.phase(), SessionPhase::AwaitingOpponent);
    session
}

fn in_match(assigned: Mark, turn: Mark) -> Session {
    let mut session = awaiting(RematchPolicy::AwaitReset);
    let commands = server(
        &mut session,
        ServerEvent::OpponentFound {
            assigned_mark: assigned,
            opponent_name: "Bob".to_string(),
            board: Board::new(),
            turn_owner: turn,
        },
    );
    assert!(commands.is_empty());
    assert_eq!(session.phase(), SessionPhase::InMatch);
    session
}

fn ended_with_win() -> Session {
    let mut session = in_match(Mark::Circle, Mark::Circle);
    server(
        &mut session,
        ServerEvent::MoveBroadcast(Snapshot {
            board: board(["OOO", "XX.", "..."]),
            turn_owner: Mark::Cross,
            verdict: Some(Verdict::WinBy(Mark::Circle)),
        }),
    );
    assert_eq!(session.phase(), SessionPhase::MatchEnded);
    session
}

#[test]
fn test_match_start_scenario() {
    let mut session = awaiting(RematchPolicy::AwaitReset);
    let frame = r#"{"type":"OpponentFound","data":{"playingAs":"circle","opponentName":"Bob","gameState":[[null,null,null],[null,null,null],[null,null,null]],"currentPlayer":"circle"}}"#;

    assert!(raw(&mut session, frame).is_empty());

    let snapshot = session.snapshot();
    assert_eq!(snapshot.phase, SessionPhase::InMatch);
    assert_eq!(snapshot.board, Board::new());
    assert_eq!(snapshot.turn_owner, Some(Mark::Circle));
    assert_eq!(snapshot.outcome, Some(MatchOutcome::Pending));
    assert_eq!(snapshot.opponent_name.as_deref(), Some("Bob"));
    assert_eq!(snapshot.player.and_then(|p| p.mark), Some(Mark::Circle));
}

#[test]
fn test_out_of_turn_click_is_rejected() {
    let mut session = in_match(Mark::Circle, Mark::Cross);
    let before = session.snapshot();

    assert!(session.dispatch(Intent::SubmitMove(Position::Center).into()).is_empty());
    assert_eq!(session.snapshot(), before);
}

#[test]
fn test_click_on_occupied_cell_is_rejected() {
    let mut session = in_match(Mark::Circle, Mark::Circle);
    server(
        &mut session,
        ServerEvent::MoveBroadcast(Snapshot {
            board: board(["X..", "...", "..."]),
            turn_owner: Mark::Circle,
            verdict: None,
        }),
    );
    let before = session.snapshot();

    assert!(session.dispatch(Intent::SubmitMove(Position::TopLeft).into()).is_empty());
    assert_eq!(session.snapshot(), before);
}

#[test]
fn test_click_outside_match_is_rejected() {
    let mut session = awaiting(RematchPolicy::AwaitReset);
    let before = session.snapshot();
    assert!(session.dispatch(Intent::SubmitMove(Position::Center).into()).is_empty());
    assert_eq!(session.snapshot(), before);

    let mut fresh = Session::default();
    assert!(fresh.dispatch(Intent::SubmitMove(Position::Center).into()).is_empty());
}

#[test]
fn test_valid_click_sends_without_touching_board() {
    let mut session = in_match(Mark::Circle, Mark::Circle);

    let commands = session.dispatch(Intent::SubmitMove(Position::Center).into());

    assert_eq!(
        commands,
        vec![Command::Send(ClientMessage::SubmitMove {
            cell: Position::Center,
            mark: Mark::Circle,
        })]
    );
    assert_eq!(session.snapshot().board, Board::new());
    assert_eq!(session.snapshot().turn_owner, Some(Mark::Circle));
}

#[test]
fn test_snapshot_overwrites_board() {
    let mut session = in_match(Mark::Circle, Mark::Circle);
    server(
        &mut session,
        ServerEvent::MoveAccepted(Snapshot {
            board: board(["O..", "...", "..."]),
            turn_owner: Mark::Cross,
            verdict: None,
        }),
    );
    // Contradicts the previous snapshot; it still wins wholesale.
    let authoritative = board(["...", ".X.", "..."]);
    server(
        &mut session,
        ServerEvent::MoveBroadcast(Snapshot {
            board: authoritative,
            turn_owner: Mark::Circle,
            verdict: None,
        }),
    );

    let snapshot = session.snapshot();
    assert_eq!(snapshot.board, authoritative);
    assert_eq!(snapshot.turn_owner, Some(Mark::Circle));
    assert_eq!(snapshot.phase, SessionPhase::InMatch);
}

#[test]
fn test_repeated_snapshot_is_idempotent() {
    let mut session = in_match(Mark::Circle, Mark::Cross);
    let event = ServerEvent::MoveBroadcast(Snapshot {
        board: board(["X..", "...", "..."]),
        turn_owner: Mark::Circle,
        verdict: None,
    });

    assert!(server(&mut session, event.clone()).is_empty());
    let first = session.snapshot();
    assert!(server(&mut session, event).is_empty());
    assert_eq!(session.snapshot(), first);
}

#[test]
fn test_full_board_without_verdict_stays_in_match() {
    let mut session = in_match(Mark::Circle, Mark::Circle);
    server(
        &mut session,
        ServerEvent::MoveBroadcast(Snapshot {
            board: board(["XXX", "OO.", "..."]),
            turn_owner: Mark::Circle,
            verdict: None,
        }),
    );
    assert_eq!(session.phase(), SessionPhase::InMatch);
    assert_eq!(session.snapshot().outcome, Some(MatchOutcome::Pending));
}

#[test]
fn test_win_scenario() {
    let mut session = in_match(Mark::Circle, Mark::Cross);
    let frame = r#"{"type":"playerMoveFromServer","data":{"gameState":[["cross","cross","cross"],[null,null,null],[null,null,null]],"currentPlayer":"circle","finished":true,"winner":"cross"}}"#;

    assert!(raw(&mut session, frame).is_empty());

    let snapshot = session.snapshot();
    assert_eq!(snapshot.phase, SessionPhase::MatchEnded);
    assert_eq!(snapshot.outcome, Some(MatchOutcome::WinBy(Mark::Cross)));
    assert_eq!(snapshot.winning_cells(), Some([0, 1, 2]));
    assert!(!snapshot.is_my_turn());
}

#[test]
fn test_draw_has_no_winning_line() {
    let mut session = in_match(Mark::Circle, Mark::Circle);
    server(
        &mut session,
        ServerEvent::MoveAccepted(Snapshot {
            board: board(["OXO", "OXX", "XOO"]),
            turn_owner: Mark::Cross,
            verdict: Some(Verdict::Draw),
        }),
    );
    let snapshot = session.snapshot();
    assert_eq!(snapshot.outcome, Some(MatchOutcome::Draw));
    assert_eq!(snapshot.winning_line, None);
}

#[test]
fn test_opponent_departs_mid_match() {
    let mut session = in_match(Mark::Circle, Mark::Circle);
    let last = board(["O..", ".X.", "..."]);
    server(
        &mut session,
        ServerEvent::MoveBroadcast(Snapshot {
            board: last,
            turn_owner: Mark::Circle,
            verdict: None,
        }),
    );

    assert!(raw(&mut session, r#"{"type":"opponentLeftMatch","data":{}}"#).is_empty());

    let snapshot = session.snapshot();
    assert_eq!(snapshot.phase, SessionPhase::MatchEnded);
    assert_eq!(snapshot.outcome, Some(MatchOutcome::OpponentLeft));
    assert_eq!(snapshot.board, last);
}

#[test]
fn test_malformed_payload_is_dropped() {
    let mut session = in_match(Mark::Circle, Mark::Circle);
    let before = session.snapshot();

    // currentPlayer missing
    let frame = r#"{"type":"playerMoveFromServer","data":{"gameState":[[null,null,null],[null,null,null],[null,null,null]]}}"#;
    assert!(raw(&mut session, frame).is_empty());
    assert!(raw(&mut session, "not json").is_empty());
    assert!(raw(&mut session, r#"{"type":"chatMessage","data":{"text":"hi"}}"#).is_empty());

    assert_eq!(session.snapshot(), before);
}

#[test]
fn test_move_while_awaiting_opponent_is_ignored() {
    let mut session = awaiting(RematchPolicy::AwaitReset);
    let before = session.snapshot();

    server(
        &mut session,
        ServerEvent::MoveBroadcast(Snapshot {
            board: board(["X..", "...", "..."]),
            turn_owner: Mark::Circle,
            verdict: None,
        }),
    );
    assert_eq!(session.snapshot(), before);
}

#[test]
fn test_exactly_one_phase_through_a_session() {
    let mut session = Session::default();
    let steps: Vec<(SessionEvent, SessionPhase)> = vec![
        (
            Intent::RequestPlay(NameEntry::confirmed("Ann")).into(),
            SessionPhase::Connecting,
        ),
        (ConnectionEvent::Opened.into(), SessionPhase::AwaitingOpponent),
        (
            ConnectionEvent::Message(encode_event(&ServerEvent::OpponentNotFound)).into(),
            SessionPhase::AwaitingOpponent,
        ),
        (
            ConnectionEvent::Message(encode_event(&ServerEvent::OpponentFound {
                assigned_mark: Mark::Cross,
                opponent_name: "Bob".to_string(),
                board: Board::new(),
                turn_owner: Mark::Circle,
            }))
            .into(),
            SessionPhase::InMatch,
        ),
        (
            ConnectionEvent::Message(encode_event(&ServerEvent::MoveBroadcast(Snapshot {
                board: board(["OOO", "XX.", "..."]),
                turn_owner: Mark::Cross,
                verdict: Some(Verdict::WinBy(Mark::Circle)),
            })))
            .into(),
            SessionPhase::MatchEnded,
        ),
        (
            ConnectionEvent::Message(encode_event(&ServerEvent::MatchEndedAwaitingAction)).into(),
            SessionPhase::MatchEnded,
        ),
        (Intent::Leave.into(), SessionPhase::Disconnected),
    ];

    for (event, expected) in steps {
        session.dispatch(event);
        assert_eq!(session.phase(), expected);
        assert_eq!(session.snapshot().phase, expected);
    }
}

#[test]
fn test_opponent_not_found_is_shown() {
    let mut session = awaiting(RematchPolicy::AwaitReset);
    server(&mut session, ServerEvent::OpponentNotFound);
    assert_eq!(
        session.snapshot().opponent_search,
        Some(OpponentSearch::NotFound)
    );
}

#[test]
fn test_cancelled_or_empty_name_aborts_play() {
    let mut session = Session::default();
    assert!(session.dispatch(Intent::RequestPlay(NameEntry::cancelled()).into()).is_empty());
    assert!(session
        .dispatch(Intent::RequestPlay(NameEntry::confirmed("  ")).into())
        .is_empty());
    assert_eq!(session.phase(), SessionPhase::Disconnected);
}

#[test]
fn test_cancel_while_awaiting_closes() {
    let mut session = awaiting(RematchPolicy::AwaitReset);
    assert_eq!(session.dispatch(Intent::Leave.into()), vec![Command::Close]);
    let snapshot = session.snapshot();
    assert_eq!(snapshot.phase, SessionPhase::Disconnected);
    assert_eq!(snapshot.player, None);
    assert_eq!(snapshot.connection_status, ConnectionStatus::Disconnected);
}

#[test]
fn test_connect_failure_surfaces_error() {
    let mut session = Session::default();
    session.dispatch(Intent::RequestPlay(NameEntry::confirmed("Ann")).into());

    let commands = session.dispatch(ConnectionEvent::Error("connection refused".to_string()).into());
    assert_eq!(commands, vec![Command::Close]);
    assert!(session
        .dispatch(ConnectionEvent::Closed { was_clean: false }.into())
        .is_empty());

    let snapshot = session.snapshot();
    assert_eq!(snapshot.phase, SessionPhase::Disconnected);
    assert_eq!(
        snapshot.connection_status,
        ConnectionStatus::Error("connection refused".to_string())
    );
    assert_eq!(snapshot.last_error.as_deref(), Some("connection refused"));
}

#[test]
fn test_close_while_connecting_reports_connection_lost() {
    let mut session = Session::default();
    session.dispatch(Intent::RequestPlay(NameEntry::confirmed("Ann")).into());
    assert_eq!(session.phase(), SessionPhase::Connecting);

    assert!(session
        .dispatch(ConnectionEvent::Closed { was_clean: false }.into())
        .is_empty());

    let snapshot = session.snapshot();
    assert_eq!(snapshot.phase, SessionPhase::Disconnected);
    assert_eq!(snapshot.connection_status, ConnectionStatus::Disconnected);
    assert_eq!(snapshot.last_error.as_deref(), Some("connection lost"));
    assert_eq!(snapshot.player, None);
}

#[test]
fn test_unexpected_close_mid_match_clears_everything() {
    let mut session = in_match(Mark::Circle, Mark::Circle);
    assert!(session
        .dispatch(ConnectionEvent::Closed { was_clean: false }.into())
        .is_empty());

    let snapshot = session.snapshot();
    assert_eq!(snapshot.phase, SessionPhase::Disconnected);
    assert_eq!(snapshot.board, Board::new());
    assert_eq!(snapshot.opponent_name, None);
    assert_eq!(snapshot.outcome, None);
    assert_eq!(snapshot.last_error.as_deref(), Some("connection lost"));
}

#[test]
fn test_return_to_menu_after_match() {
    let mut session = ended_with_win();
    assert_eq!(session.dispatch(Intent::Leave.into()), vec![Command::Close]);
    assert_eq!(session.phase(), SessionPhase::Disconnected);
    assert_eq!(session.snapshot().player, None);
}

#[test]
fn test_rematch_waits_for_reset() {
    let mut session = ended_with_win();

    let commands = session.dispatch(Intent::RequestRematch(NameEntry::confirmed("Ann 2")).into());
    assert_eq!(commands, vec![Command::Send(ClientMessage::RequestRematch)]);
    let snapshot = session.snapshot();
    assert_eq!(snapshot.phase, SessionPhase::AwaitingOpponent);
    assert_eq!(snapshot.board, Board::new());
    assert_eq!(snapshot.outcome, None);

    let commands = server(&mut session, ServerEvent::SessionReset);
    assert_eq!(
        commands,
        vec![Command::Send(ClientMessage::RequestToPlay {
            player_name: "Ann 2".to_string()
        })]
    );
    // A second reset does not request twice.
    assert!(server(&mut session, ServerEvent::SessionReset).is_empty());
}

#[test]
fn test_rematch_with_delay_uses_timer() {
    let delay = Duration::from_millis(100);
    let mut session = awaiting(RematchPolicy::Delay(delay));
    server(
        &mut session,
        ServerEvent::OpponentFound {
            assigned_mark: Mark::Circle,
            opponent_name: "Bob".to_string(),
            board: Board::new(),
            turn_owner: Mark::Circle,
        },
    );
    server(&mut session, ServerEvent::OpponentLeft);
    assert_eq!(session.phase(), SessionPhase::MatchEnded);

    let commands = session.dispatch(Intent::RequestRematch(NameEntry::confirmed("Ann")).into());
    assert_eq!(
        commands,
        vec![
            Command::Send(ClientMessage::RequestRematch),
            Command::ScheduleRematchRequest(delay),
        ]
    );
    assert!(server(&mut session, ServerEvent::SessionReset).is_empty());
    assert_eq!(
        session.dispatch(SessionEvent::RematchTimerElapsed),
        vec![Command::Send(ClientMessage::RequestToPlay {
            player_name: "Ann".to_string()
        })]
    );
}

#[test]
fn test_cancelled_rematch_keeps_match_ended() {
    let mut session = ended_with_win();
    assert!(session
        .dispatch(Intent::RequestRematch(NameEntry::cancelled()).into())
        .is_empty());
    assert_eq!(session.phase(), SessionPhase::MatchEnded);
}

#[test]
fn test_reset_after_match_without_rematch() {
    let mut session = ended_with_win();

    assert!(server(&mut session, ServerEvent::SessionReset).is_empty());

    let snapshot = session.snapshot();
    assert_eq!(snapshot.phase, SessionPhase::AwaitingOpponent);
    assert_eq!(snapshot.board, Board::new());
    assert_eq!(snapshot.outcome, None);
    assert_eq!(snapshot.winning_line, None);
    assert_eq!(snapshot.connection_status, ConnectionStatus::Connected);
}

#[test]
fn test_reset_mid_match_keeps_connection() {
    let mut session = in_match(Mark::Circle, Mark::Circle);
    assert!(server(&mut session, ServerEvent::SessionReset).is_empty());

    let snapshot = session.snapshot();
    assert_eq!(snapshot.phase, SessionPhase::AwaitingOpponent);
    assert_eq!(snapshot.board, Board::new());
    assert_eq!(snapshot.connection_status, ConnectionStatus::Connected);
}

//! Stateless UI rendering.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

use super::app::App;
use super::input::{NamePrompt, PromptPurpose};
use crate::games::tictactoe::{Board, Mark, Position, Square};
use crate::session::{ConnectionStatus, MatchOutcome, OpponentSearch, SessionPhase, SessionSnapshot};

/// Draws one frame from the latest snapshot.
pub fn draw(frame: &mut Frame, app: &App, snapshot: &SessionSnapshot) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(9),    // Body
            Constraint::Length(3), // Status
            Constraint::Length(1), // Help
        ])
        .split(area);

    let title = Paragraph::new("Strictly Online - Tic Tac Toe")
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center);
    frame.render_widget(title, chunks[0]);

    match snapshot.phase {
        SessionPhase::Disconnected => draw_message(frame, chunks[1], menu_lines(snapshot)),
        SessionPhase::Connecting => {
            draw_message(frame, chunks[1], vec![Line::from("Connecting to server...")])
        }
        SessionPhase::AwaitingOpponent => draw_message(frame, chunks[1], waiting_lines(snapshot)),
        SessionPhase::InMatch | SessionPhase::MatchEnded => draw_match(frame, chunks[1], app, snapshot),
    }

    draw_status(frame, chunks[2], snapshot);

    let help = Paragraph::new(help_text(snapshot.phase))
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    frame.render_widget(help, chunks[3]);

    if let Some(prompt) = app.prompt() {
        draw_prompt(frame, area, prompt);
    }
}

fn menu_lines(snapshot: &SessionSnapshot) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(Span::styled(
        "Play a match against another player online.",
        Style::default().add_modifier(Modifier::BOLD),
    ))];
    if let Some(error) = &snapshot.last_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("Last connection problem: {}", error),
            Style::default().fg(Color::Red),
        )));
    }
    lines
}

fn waiting_lines(snapshot: &SessionSnapshot) -> Vec<Line<'static>> {
    let name = snapshot.player.as_ref().map(|p| p.name.clone()).unwrap_or_default();
    let search = match snapshot.opponent_search.unwrap_or_default() {
        OpponentSearch::Searching => "Looking for an opponent...",
        OpponentSearch::NotFound => "No opponent available yet. Still waiting...",
    };
    vec![
        Line::from(format!("Welcome, {}!", name)),
        Line::from(""),
        Line::from(Span::styled(search, Style::default().fg(Color::Yellow))),
    ]
}

fn draw_message(frame: &mut Frame, area: Rect, lines: Vec<Line<'static>>) {
    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(paragraph, area);
}

fn draw_match(frame: &mut Frame, area: Rect, app: &App, snapshot: &SessionSnapshot) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(11)])
        .split(area);

    let header = Paragraph::new(vec![matchup_line(snapshot), turn_line(snapshot)])
        .alignment(Alignment::Center);
    frame.render_widget(header, chunks[0]);

    let cursor = snapshot.is_my_turn().then_some(app.cursor());
    draw_board(frame, chunks[1], &snapshot.board, cursor, snapshot);
}

fn matchup_line(snapshot: &SessionSnapshot) -> Line<'static> {
    let me = snapshot
        .player
        .as_ref()
        .map(|p| match p.mark {
            Some(mark) => format!("{} ({})", p.name, mark.glyph()),
            None => p.name.clone(),
        })
        .unwrap_or_default();
    let opponent = snapshot.opponent_name.clone().unwrap_or_else(|| "?".to_string());
    Line::from(format!("{} vs {}", me, opponent))
}

fn turn_line(snapshot: &SessionSnapshot) -> Line<'static> {
    let my_mark = snapshot.player.as_ref().and_then(|p| p.mark);
    let (text, color) = match snapshot.outcome {
        Some(MatchOutcome::WinBy(mark)) if Some(mark) == my_mark => ("You won!".to_string(), Color::Green),
        Some(MatchOutcome::WinBy(mark)) => (format!("{} won.", mark.glyph()), Color::Red),
        Some(MatchOutcome::Draw) => ("Draw.".to_string(), Color::Yellow),
        Some(MatchOutcome::OpponentLeft) => ("Your opponent left the match.".to_string(), Color::Yellow),
        _ if snapshot.is_my_turn() => ("Your turn".to_string(), Color::Green),
        _ => ("Opponent's turn".to_string(), Color::DarkGray),
    };
    Line::from(Span::styled(text, Style::default().fg(color).add_modifier(Modifier::BOLD)))
}

fn draw_board(
    frame: &mut Frame,
    area: Rect,
    board: &Board,
    cursor: Option<Position>,
    snapshot: &SessionSnapshot,
) {
    let board_area = center_rect(area, 40, 11);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Length(3),
        ])
        .split(board_area);

    for (row, positions) in Position::ALL.chunks(3).enumerate() {
        draw_row(frame, rows[row * 2], board, cursor, snapshot, positions);
        if row < 2 {
            let sep = Paragraph::new("────────────┼────────────┼────────────")
                .style(Style::default().fg(Color::DarkGray));
            frame.render_widget(sep, rows[row * 2 + 1]);
        }
    }
}

fn draw_row(
    frame: &mut Frame,
    area: Rect,
    board: &Board,
    cursor: Option<Position>,
    snapshot: &SessionSnapshot,
    positions: &[Position],
) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(12),
            Constraint::Length(1),
            Constraint::Length(12),
            Constraint::Length(1),
            Constraint::Length(12),
        ])
        .split(area);

    for (i, pos) in positions.iter().enumerate() {
        draw_cell(frame, cols[i * 2], board, cursor, snapshot, *pos);
        if i < 2 {
            let sep = Paragraph::new("│").style(Style::default().fg(Color::DarkGray));
            frame.render_widget(sep, cols[i * 2 + 1]);
        }
    }
}

fn draw_cell(
    frame: &mut Frame,
    area: Rect,
    board: &Board,
    cursor: Option<Position>,
    snapshot: &SessionSnapshot,
    pos: Position,
) {
    let (symbol, base_style) = match board.get(pos) {
        Square::Empty => (
            format!(" {} ", pos.to_index() + 1),
            Style::default().fg(Color::DarkGray),
        ),
        Square::Occupied(Mark::Cross) => (
            " X ".to_string(),
            Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
        ),
        Square::Occupied(Mark::Circle) => (
            " O ".to_string(),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
    };

    let style = if snapshot.is_winning_cell(pos) {
        base_style.bg(Color::Green).fg(Color::Black)
    } else if cursor == Some(pos) {
        base_style.bg(Color::White).fg(Color::Black)
    } else {
        base_style
    };

    let paragraph = Paragraph::new(Line::from(Span::styled(symbol, style))).alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

fn draw_status(frame: &mut Frame, area: Rect, snapshot: &SessionSnapshot) {
    let color = match snapshot.connection_status {
        ConnectionStatus::Connected => Color::Green,
        ConnectionStatus::Connecting => Color::Yellow,
        ConnectionStatus::Error(_) => Color::Red,
        ConnectionStatus::Disconnected => Color::DarkGray,
    };
    let text = format!("Connection: {}", snapshot.connection_status);
    let status = Paragraph::new(text)
        .style(Style::default().fg(color))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, area);
}

fn help_text(phase: SessionPhase) -> &'static str {
    match phase {
        SessionPhase::Disconnected => "p: play online  q: quit",
        SessionPhase::Connecting | SessionPhase::AwaitingOpponent => "c: cancel  q: quit",
        SessionPhase::InMatch => "1-9 or arrows+enter: move  m: leave match  q: quit",
        SessionPhase::MatchEnded => "r: play again  m: menu  q: quit",
    }
}

fn draw_prompt(frame: &mut Frame, area: Rect, prompt: &NamePrompt) {
    let popup = center_rect(area, 40, 5);
    let title = match prompt.purpose() {
        PromptPurpose::Play => "Enter your name",
        PromptPurpose::Rematch => "Play again as",
    };
    let input = Paragraph::new(vec![
        Line::from(format!("{}_", prompt.buffer())),
        Line::from(Span::styled(
            "enter: confirm  esc: cancel",
            Style::default().fg(Color::DarkGray),
        )),
    ])
    .block(Block::default().title(title).borders(Borders::ALL));
    frame.render_widget(Clear, popup);
    frame.render_widget(input, popup);
}

fn center_rect(area: Rect, width: u16, height: u16) -> Rect {
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length((area.height.saturating_sub(height)) / 2),
            Constraint::Length(height),
            Constraint::Length((area.height.saturating_sub(height)) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length((area.width.saturating_sub(width)) / 2),
            Constraint::Length(width),
            Constraint::Length((area.width.saturating_sub(width)) / 2),
        ])
        .split(vert[1])[1]
}

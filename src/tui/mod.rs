//! Terminal UI for the online client.

mod app;
mod input;
mod ui;

pub use app::App;

use std::io;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{error, info, instrument};

use crate::driver::ClientHandle;

/// Runs the terminal UI until the user quits.
pub async fn run_tui(handle: ClientHandle) -> Result<()> {
    info!("Starting Strictly Online TUI");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &handle).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    handle.shutdown();

    if let Err(err) = &res {
        error!(error = ?err, "TUI loop error");
    }
    res
}

#[instrument(skip_all)]
async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    handle: &ClientHandle,
) -> Result<()> {
    let mut app = App::new();

    loop {
        let snapshot = handle.snapshot();
        terminal.draw(|f| ui::draw(f, &app, &snapshot))?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if let Some(intent) = app.on_key(key.code, &snapshot) {
                    handle.send(intent);
                }
            }
        }

        if app.should_quit() {
            info!("User quit");
            return Ok(());
        }

        tokio::task::yield_now().await;
    }
}

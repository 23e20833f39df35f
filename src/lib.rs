//! Strictly Online - client for realtime two-player tic-tac-toe.
//!
//! The client never decides the game. A remote authority owns the board,
//! assigns marks, and declares results; this crate tracks a single session
//! against it and renders what the authority says.
//!
//! # Architecture
//!
//! - **Protocol**: JSON envelope codec for the authority's message vocabulary
//! - **Session**: pure state machine, `dispatch(event) -> commands`
//! - **Connection**: WebSocket transport task with handle-tagged events
//! - **Driver**: single ordered queue tying the three together
//! - **TUI**: ratatui front end over session snapshots
//!
//! # Example
//!
//! ```no_run
//! use strictly_online::{ClientConfig, NameEntry, SessionDriver};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ClientConfig::load(None)?;
//! let (handle, driver) = SessionDriver::spawn(&config);
//! handle.request_play(NameEntry::confirmed("Ada"));
//! let mut snapshots = handle.subscribe();
//! snapshots.changed().await?;
//! println!("{}", snapshots.borrow().phase);
//! handle.shutdown();
//! driver.await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod connection;
mod driver;
mod error;
mod games;
mod headless;
pub mod protocol;
mod session;
pub mod tui;

pub use config::{ClientConfig, ENDPOINT_ENV, RematchMode};
pub use connection::{ConnectionManager, HandleId, TaggedEvent};
pub use driver::{ClientHandle, DriverEvent, SessionDriver};
pub use error::{
    ConfigError, ConnectionError, DecodeError, DecodeErrorKind, ProtocolViolation, SendError,
    UserInputError,
};
pub use games::tictactoe::{Board, Mark, Position, Square, rules};
pub use headless::run_headless;
pub use protocol::{ClientMessage, ServerEvent, Snapshot, Verdict};
pub use session::{
    Command, ConnectionEvent, ConnectionStatus, Intent, MatchOutcome, NameEntry, OpponentSearch,
    PlayerIdentity, RematchPolicy, Session, SessionEvent, SessionPhase, SessionSnapshot,
};

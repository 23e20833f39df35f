//! Client-side realtime session.
//!
//! [`Session`] is a synchronous state machine. It consumes one
//! [`SessionEvent`] at a time and answers with the [`Command`]s the driver
//! must carry out. It never touches the network itself, so every transition
//! can be exercised without a connection.

mod machine;
mod phase;
mod snapshot;

pub use machine::{Command, ConnectionEvent, Intent, NameEntry, RematchPolicy, Session, SessionEvent};
pub use phase::{ConnectionStatus, MatchOutcome, OpponentSearch, SessionPhase};
pub use snapshot::{PlayerIdentity, SessionSnapshot};

//! Error types for the online client.
//!
//! None of these are fatal. Connection problems fall back to
//! [`SessionPhase::Disconnected`](crate::SessionPhase::Disconnected), bad
//! messages are dropped, and bad user input aborts the intent.

use derive_more::{Display, Error};

/// Why an inbound frame could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum DecodeErrorKind {
    /// Required fields are absent or of the wrong kind.
    #[display("malformed payload: {}", _0)]
    MalformedPayload(String),
    /// The envelope names a message kind this client does not know.
    #[display("unknown message kind {:?}", _0)]
    UnknownKind(String),
}

/// Inbound message decode failure with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Decode error: {} at {}:{}", kind, file, line)]
pub struct DecodeError {
    /// What went wrong.
    pub kind: DecodeErrorKind,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl DecodeError {
    /// Creates a malformed-payload error.
    #[track_caller]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::with_kind(DecodeErrorKind::MalformedPayload(message.into()))
    }

    /// Creates an unknown-kind error.
    #[track_caller]
    pub fn unknown_kind(kind: impl Into<String>) -> Self {
        Self::with_kind(DecodeErrorKind::UnknownKind(kind.into()))
    }

    #[track_caller]
    fn with_kind(kind: DecodeErrorKind) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            line: loc.line(),
            file: loc.file(),
        }
    }
}

impl From<serde_json::Error> for DecodeError {
    #[track_caller]
    fn from(err: serde_json::Error) -> Self {
        Self::malformed(format!("invalid JSON: {}", err))
    }
}

/// Connection failure: the open failed or the transport reported an error.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("Connection error: {}", message)]
pub struct ConnectionError {
    /// Human-readable reason, shown as the connection status.
    pub message: String,
}

impl ConnectionError {
    /// Creates a new connection error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for ConnectionError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// Send attempted while no connection is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum SendError {
    /// There is no open connection. The frame was dropped.
    #[display("connection is not open")]
    NotOpen,
}

/// A well-formed event that makes no sense in the current phase.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("Protocol violation: {} received while {}", event, phase)]
pub struct ProtocolViolation {
    /// Kind of the offending event.
    pub event: &'static str,
    /// Phase the session was in.
    pub phase: crate::SessionPhase,
}

/// Name prompt result that cannot start an intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum UserInputError {
    /// The prompt was dismissed.
    #[display("name entry cancelled")]
    Cancelled,
    /// The prompt was confirmed with a blank name.
    #[display("name must not be empty")]
    EmptyName,
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

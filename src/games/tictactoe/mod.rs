//! Tic-tac-toe domain types and advisory rules.
//!
//! Nothing in here decides the course of a match. The authority owns the
//! rules; these types only carry what it reports.

mod position;
pub mod rules;
mod types;

pub use position::Position;
pub use types::{Board, Mark, Square};

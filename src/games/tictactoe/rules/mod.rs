//! Advisory tic-tac-toe rules.
//!
//! Pure functions over a [`Board`](super::Board). The session never lets these
//! decide an outcome; the authority does. They are used to locate the line of
//! an authority-declared winner and to flag a local view that disagrees with
//! the authority.

pub mod draw;
pub mod win;

pub use draw::{is_draw, is_full};
pub use win::{check_winner, winning_line};

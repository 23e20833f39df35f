//! Core domain types for tic-tac-toe.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::Position;

/// The mark a player places on the board.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::AsRefStr,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Mark {
    /// Circle. The authority conventionally lets circle open a match.
    Circle,
    /// Cross.
    Cross,
}

impl Mark {
    /// Returns the other mark.
    pub fn opponent(self) -> Self {
        match self {
            Mark::Circle => Mark::Cross,
            Mark::Cross => Mark::Circle,
        }
    }

    /// Single-character glyph used by text renderings.
    pub fn glyph(self) -> char {
        match self {
            Mark::Circle => 'O',
            Mark::Cross => 'X',
        }
    }
}

/// A square on the tic-tac-toe board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Square {
    /// Empty square.
    #[default]
    Empty,
    /// Square occupied by a mark.
    Occupied(Mark),
}

impl Square {
    /// Returns the mark on this square, if any.
    pub fn mark(self) -> Option<Mark> {
        match self {
            Square::Empty => None,
            Square::Occupied(mark) => Some(mark),
        }
    }
}

/// 3x3 tic-tac-toe board.
///
/// The client never places marks itself. Boards are built whole from an
/// authoritative snapshot and replaced whole by the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Board {
    /// Squares in row-major order (0-8).
    squares: [Square; 9],
}

impl Board {
    /// Creates a new empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a board from squares in row-major order.
    pub fn from_squares(squares: [Square; 9]) -> Self {
        Self { squares }
    }

    /// Builds a board from three rows of three squares.
    pub fn from_rows(rows: [[Square; 3]; 3]) -> Self {
        let mut squares = [Square::Empty; 9];
        for (r, row) in rows.iter().enumerate() {
            squares[r * 3..r * 3 + 3].copy_from_slice(row);
        }
        Self { squares }
    }

    /// Gets the square at the given position.
    pub fn get(&self, pos: Position) -> Square {
        self.squares[pos.to_index()]
    }

    /// Checks if a square is empty.
    pub fn is_empty(&self, pos: Position) -> bool {
        self.get(pos) == Square::Empty
    }

    /// Returns all squares as a slice.
    pub fn squares(&self) -> &[Square; 9] {
        &self.squares
    }

    /// Returns the board as three rows.
    pub fn rows(&self) -> [[Square; 3]; 3] {
        let s = &self.squares;
        [[s[0], s[1], s[2]], [s[3], s[4], s[5]], [s[6], s[7], s[8]]]
    }

    /// Number of occupied squares.
    pub fn occupied(&self) -> usize {
        self.squares.iter().filter(|s| **s != Square::Empty).count()
    }

    /// Formats the board as a human-readable string.
    #[instrument(skip(self))]
    pub fn display(&self) -> String {
        let mut result = String::new();
        for row in 0..3 {
            for col in 0..3 {
                let pos = row * 3 + col;
                match self.squares[pos] {
                    Square::Empty => result.push_str(&(pos + 1).to_string()),
                    Square::Occupied(mark) => result.push(mark.glyph()),
                }
                if col < 2 {
                    result.push('|');
                }
            }
            if row < 2 {
                result.push_str("\n-+-+-\n");
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rows_is_row_major() {
        let x = Square::Occupied(Mark::Cross);
        let o = Square::Occupied(Mark::Circle);
        let e = Square::Empty;
        let board = Board::from_rows([[x, e, e], [e, o, e], [e, e, x]]);
        assert_eq!(board.get(Position::TopLeft), x);
        assert_eq!(board.get(Position::Center), o);
        assert_eq!(board.get(Position::BottomRight), x);
        assert_eq!(board.occupied(), 3);
        assert_eq!(board.rows()[1], [e, o, e]);
    }

    #[test]
    fn test_display() {
        let mut squares = [Square::Empty; 9];
        squares[0] = Square::Occupied(Mark::Cross);
        squares[4] = Square::Occupied(Mark::Circle);
        let board = Board::from_squares(squares);
        assert_eq!(board.display(), "X|2|3\n-+-+-\n4|O|6\n-+-+-\n7|8|9");
    }

    #[test]
    fn test_mark_wire_names() {
        assert_eq!(Mark::Circle.as_ref(), "circle");
        assert_eq!("cross".parse::<Mark>().ok(), Some(Mark::Cross));
        assert!("Cross".parse::<Mark>().is_err());
        assert_eq!(Mark::Circle.opponent(), Mark::Cross);
    }
}

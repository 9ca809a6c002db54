//! Board geometry with rank/file coordinates
//!
//! Squares are addressed `[y][x]`. Row 0 is black's home rank and row 7 is
//! white's, so white advances toward decreasing `y`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::pieces::{Color, Piece, PieceKind};

/// Board width and height
pub const BOARD_SIZE: usize = 8;

/// Files in notation order
const FILES: [char; BOARD_SIZE] = ['a', 'b', 'c', 'd', 'e', 'f', 'g', 'h'];

/// Errors from square and move notation
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum NotationError {
    #[error("square out of range: ({0}, {1})")]
    OutOfRange(i64, i64),

    #[error("invalid square notation: {0:?}")]
    InvalidSquare(String),

    #[error("invalid move notation: {0:?}")]
    InvalidMove(String),
}

/// A square on the board
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawPosition")]
pub struct Position {
    x: u8,
    y: u8,
}

/// Untrusted wire form, range-checked on the way in
#[derive(Deserialize)]
struct RawPosition {
    x: i64,
    y: i64,
}

impl TryFrom<RawPosition> for Position {
    type Error = NotationError;

    fn try_from(raw: RawPosition) -> Result<Self, Self::Error> {
        let on_board = |v: i64| (0..BOARD_SIZE as i64).contains(&v);
        if on_board(raw.x) && on_board(raw.y) {
            Ok(Self {
                x: raw.x as u8,
                y: raw.y as u8,
            })
        } else {
            Err(NotationError::OutOfRange(raw.x, raw.y))
        }
    }
}

impl Position {
    /// Square at file `x`, row `y`, or `None` off the board
    pub fn new(x: i32, y: i32) -> Option<Self> {
        let on_board = |v: i32| (0..BOARD_SIZE as i32).contains(&v);
        if on_board(x) && on_board(y) {
            Some(Self {
                x: x as u8,
                y: y as u8,
            })
        } else {
            None
        }
    }

    pub fn x(self) -> usize {
        self.x as usize
    }

    pub fn y(self) -> usize {
        self.y as usize
    }

    /// Square `dx` files right and `dy` ranks forward as seen from `color`'s side.
    ///
    /// White looks up the board (decreasing `y`), black looks down it with
    /// left and right mirrored, so one offset table serves both colors.
    pub fn offset(self, color: Color, dx: i32, dy: i32) -> Option<Self> {
        let (dx, dy) = match color {
            Color::White => (dx, -dy),
            Color::Black => (-dx, dy),
        };
        Self::new(self.x as i32 + dx, self.y as i32 + dy)
    }

    /// Every square, row by row from black's home rank
    pub fn all() -> impl Iterator<Item = Position> {
        (0..BOARD_SIZE as u8).flat_map(|y| (0..BOARD_SIZE as u8).map(move |x| Position { x, y }))
    }

    /// Parse two-character square notation (`"e2"`)
    pub fn from_notation(s: &str) -> Result<Self, NotationError> {
        let invalid = || NotationError::InvalidSquare(s.to_string());
        let mut chars = s.chars();
        let (file, rank) = match (chars.next(), chars.next(), chars.next()) {
            (Some(file), Some(rank), None) => (file, rank),
            _ => return Err(invalid()),
        };

        let x = FILES.iter().position(|&f| f == file).ok_or_else(invalid)?;
        let rank = rank.to_digit(10).filter(|r| (1..=8).contains(r)).ok_or_else(invalid)?;

        Ok(Self {
            x: x as u8,
            y: (BOARD_SIZE as u32 - rank) as u8,
        })
    }

    pub fn to_notation(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", FILES[self.x()], BOARD_SIZE - self.y())
    }
}

impl FromStr for Position {
    type Err = NotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_notation(s)
    }
}

/// 8x8 grid of optional pieces
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    squares: [[Option<Piece>; BOARD_SIZE]; BOARD_SIZE],
}

impl Board {
    pub fn empty() -> Self {
        Self {
            squares: [[None; BOARD_SIZE]; BOARD_SIZE],
        }
    }

    /// Standard starting layout
    pub fn standard() -> Self {
        const BACK_RANK: [PieceKind; BOARD_SIZE] = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];

        let mut board = Self::empty();
        for (x, &kind) in BACK_RANK.iter().enumerate() {
            board.squares[Color::Black.home_rank()][x] = Some(Piece::new(kind, Color::Black));
            board.squares[Color::Black.pawn_rank()][x] = Some(Piece::new(PieceKind::Pawn, Color::Black));
            board.squares[Color::White.pawn_rank()][x] = Some(Piece::new(PieceKind::Pawn, Color::White));
            board.squares[Color::White.home_rank()][x] = Some(Piece::new(kind, Color::White));
        }
        board
    }

    /// Piece at square
    pub fn get(&self, pos: Position) -> Option<Piece> {
        self.squares[pos.y()][pos.x()]
    }

    pub fn set(&mut self, pos: Position, piece: Option<Piece>) {
        self.squares[pos.y()][pos.x()] = piece;
    }

    /// Move whatever stands on `from` to `to`, clearing `from`.
    /// Returns the piece that was overwritten on `to`.
    pub fn move_piece(&mut self, from: Position, to: Position) -> Option<Piece> {
        let moving = self.squares[from.y()][from.x()].take();
        std::mem::replace(&mut self.squares[to.y()][to.x()], moving)
    }

    /// Iterate occupied squares
    pub fn pieces(&self) -> impl Iterator<Item = (Position, Piece)> + '_ {
        Position::all().filter_map(move |pos| self.get(pos).map(|piece| (pos, piece)))
    }

    /// Square of `color`'s king (first found, scanning from row 0)
    pub fn find_king(&self, color: Color) -> Option<Position> {
        self.pieces()
            .find(|(_, piece)| piece.kind == PieceKind::King && piece.color == color)
            .map(|(pos, _)| pos)
    }

    /// Rows of the grid, `[y][x]`
    pub fn rows(&self) -> &[[Option<Piece>; BOARD_SIZE]; BOARD_SIZE] {
        &self.squares
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (y, row) in self.squares.iter().enumerate() {
            write!(f, "{} ", BOARD_SIZE - y)?;
            for square in row {
                match square {
                    Some(piece) => write!(f, "{}", piece.symbol())?,
                    None => write!(f, ".")?,
                }
            }
            writeln!(f)?;
        }
        write!(f, "  abcdefgh")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_bounds() {
        assert!(Position::new(0, 0).is_some());
        assert!(Position::new(7, 7).is_some());
        assert!(Position::new(8, 0).is_none());
        assert!(Position::new(0, -1).is_none());
    }

    #[test]
    fn test_notation() {
        let e2 = Position::from_notation("e2").unwrap();
        assert_eq!((e2.x(), e2.y()), (4, 6));
        assert_eq!(e2.to_notation(), "e2");

        let a8: Position = "a8".parse().unwrap();
        assert_eq!((a8.x(), a8.y()), (0, 0));

        assert!(Position::from_notation("i1").is_err());
        assert!(Position::from_notation("a9").is_err());
        assert!(Position::from_notation("a0").is_err());
        assert!(Position::from_notation("e22").is_err());
        assert!(Position::from_notation("").is_err());
    }

    #[test]
    fn test_offset_is_color_relative() {
        let d4 = Position::from_notation("d4").unwrap();
        // Forward-right for white is e5, for black it is c3
        assert_eq!(d4.offset(Color::White, 1, 1).unwrap().to_notation(), "e5");
        assert_eq!(d4.offset(Color::Black, 1, 1).unwrap().to_notation(), "c3");

        let h1 = Position::from_notation("h1").unwrap();
        assert!(h1.offset(Color::White, 1, 0).is_none());
        assert!(h1.offset(Color::Black, 0, 1).is_none());
    }

    #[test]
    fn test_standard_layout() {
        let board = Board::standard();
        assert_eq!(board.pieces().count(), 32);
        assert_eq!(
            board.find_king(Color::White),
            Some(Position::from_notation("e1").unwrap())
        );
        assert_eq!(
            board.find_king(Color::Black),
            Some(Position::from_notation("e8").unwrap())
        );
        let a2 = board.get(Position::from_notation("a2").unwrap()).unwrap();
        assert_eq!(a2, Piece::new(PieceKind::Pawn, Color::White));
    }

    #[test]
    fn test_move_piece() {
        let mut board = Board::standard();
        let e2 = Position::from_notation("e2").unwrap();
        let e7 = Position::from_notation("e7").unwrap();
        let captured = board.move_piece(e2, e7);
        assert_eq!(captured, Some(Piece::new(PieceKind::Pawn, Color::Black)));
        assert!(board.get(e2).is_none());
        assert_eq!(board.get(e7).unwrap().color, Color::White);
    }

    #[test]
    fn test_display() {
        let rendered = Board::standard().to_string();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "8 rnbqkbnr");
        assert_eq!(lines[7], "1 RNBQKBNR");
        assert_eq!(lines[8], "  abcdefgh");
    }

    #[test]
    fn test_position_rejects_out_of_range_wire_form() {
        let ok: Position = serde_json::from_str(r#"{"x":4,"y":6}"#).unwrap();
        assert_eq!(ok.to_notation(), "e2");
        assert!(serde_json::from_str::<Position>(r#"{"x":8,"y":0}"#).is_err());
        assert!(serde_json::from_str::<Position>(r#"{"x":-1,"y":0}"#).is_err());
    }
}

//! Piece definitions and movement rules
//!
//! Movement here is pseudo-legal: occupancy and board edges are respected,
//! king safety is not. See [`crate::rules`] for the check-aware layer.

use serde::{Deserialize, Serialize};

use crate::board::{Board, Position, BOARD_SIZE};

/// Side color
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opponent(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Row holding this side's major pieces at the start
    pub fn home_rank(self) -> usize {
        match self {
            Color::White => 7,
            Color::Black => 0,
        }
    }

    /// Row this side's pawns start on (the only row a double step is allowed from)
    pub fn pawn_rank(self) -> usize {
        match self {
            Color::White => 6,
            Color::Black => 1,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Color::White => "white",
            Color::Black => "black",
        }
    }
}

/// Piece kind
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    /// Single lowercase letter
    pub fn code(self) -> char {
        match self {
            PieceKind::Pawn => 'p',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        }
    }
}

/// A piece on the board
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub color: Color,
    #[serde(rename = "type")]
    pub kind: PieceKind,
}

/// Occupancy constraints for a single step
#[derive(Clone, Copy, Debug)]
struct StepRule {
    must_capture: bool,
    can_capture: bool,
}

const ANY_STEP: StepRule = StepRule {
    must_capture: false,
    can_capture: true,
};
const CAPTURE_ONLY: StepRule = StepRule {
    must_capture: true,
    can_capture: true,
};
const QUIET_ONLY: StepRule = StepRule {
    must_capture: false,
    can_capture: false,
};

const KNIGHT_OFFSETS: [(i32, i32); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

const KING_OFFSETS: [(i32, i32); 8] = [
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
];

const DIAGONALS: [(i32, i32); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
const ORTHOGONALS: [(i32, i32); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];

impl Piece {
    pub const fn new(kind: PieceKind, color: Color) -> Self {
        Self { color, kind }
    }

    /// Single lowercase letter for the kind
    pub fn code(&self) -> char {
        self.kind.code()
    }

    /// FEN letter: uppercase for white, lowercase for black
    pub fn symbol(&self) -> char {
        match self.color {
            Color::White => self.kind.code().to_ascii_uppercase(),
            Color::Black => self.kind.code(),
        }
    }

    /// Parse a FEN letter
    pub fn from_code(c: char) -> Option<Self> {
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        let kind = match c.to_ascii_lowercase() {
            'p' => PieceKind::Pawn,
            'n' => PieceKind::Knight,
            'b' => PieceKind::Bishop,
            'r' => PieceKind::Rook,
            'q' => PieceKind::Queen,
            'k' => PieceKind::King,
            _ => return None,
        };
        Some(Self::new(kind, color))
    }

    /// Candidate destinations from `from`, ignoring check
    pub fn moves_from(&self, board: &Board, from: Position) -> Vec<Position> {
        let mut moves = Vec::new();

        match self.kind {
            PieceKind::Pawn => self.pawn_moves(board, from, &mut moves),
            PieceKind::Knight => self.leaper_moves(board, from, &KNIGHT_OFFSETS, &mut moves),
            PieceKind::Bishop => self.ray_moves(board, from, &DIAGONALS, &mut moves),
            PieceKind::Rook => self.ray_moves(board, from, &ORTHOGONALS, &mut moves),
            PieceKind::Queen => {
                self.ray_moves(board, from, &ORTHOGONALS, &mut moves);
                self.ray_moves(board, from, &DIAGONALS, &mut moves);
            }
            PieceKind::King => self.leaper_moves(board, from, &KING_OFFSETS, &mut moves),
        }

        moves
    }

    fn pawn_moves(&self, board: &Board, from: Position, moves: &mut Vec<Position>) {
        for dx in [1, -1] {
            moves.extend(self.step(board, from, dx, 1, CAPTURE_ONLY));
        }

        let Some(forward) = self.step(board, from, 0, 1, QUIET_ONLY) else {
            return;
        };
        moves.push(forward);

        if from.y() == self.color.pawn_rank() {
            moves.extend(self.step(board, from, 0, 2, QUIET_ONLY));
        }
    }

    fn leaper_moves(
        &self,
        board: &Board,
        from: Position,
        offsets: &[(i32, i32)],
        moves: &mut Vec<Position>,
    ) {
        for &(dx, dy) in offsets {
            moves.extend(self.step(board, from, dx, dy, ANY_STEP));
        }
    }

    fn ray_moves(
        &self,
        board: &Board,
        from: Position,
        directions: &[(i32, i32)],
        moves: &mut Vec<Position>,
    ) {
        for &(dx, dy) in directions {
            for distance in 1..BOARD_SIZE as i32 {
                let Some(to) = self.step(board, from, dx * distance, dy * distance, ANY_STEP) else {
                    break;
                };
                moves.push(to);
                if board.get(to).is_some() {
                    break; // Captured
                }
            }
        }
    }

    /// Single color-relative step with the shared occupancy filter
    fn step(&self, board: &Board, from: Position, dx: i32, dy: i32, rule: StepRule) -> Option<Position> {
        let to = from.offset(self.color, dx, dy)?;

        match board.get(to) {
            Some(occupant) if occupant.color == self.color || !rule.can_capture => None,
            None if rule.must_capture => None,
            _ => Some(to),
        }
    }
}

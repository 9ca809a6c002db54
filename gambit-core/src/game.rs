//! Game state and move application

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::board::{Board, NotationError, Position};
use crate::pieces::{Color, Piece};
use crate::rules;

// ============================================================================
// CORE TYPES
// ============================================================================

/// A move request: source and destination squares
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub from: Position,
    pub to: Position,
}

impl Move {
    pub const fn new(from: Position, to: Position) -> Self {
        Self { from, to }
    }

    /// Parse four-character notation (`"e2e4"`)
    pub fn from_notation(s: &str) -> Result<Self, NotationError> {
        if s.len() != 4 || !s.is_ascii() {
            return Err(NotationError::InvalidMove(s.to_string()));
        }
        let from = Position::from_notation(&s[0..2])?;
        let to = Position::from_notation(&s[2..4])?;
        Ok(Self { from, to })
    }

    pub fn to_notation(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)
    }
}

impl FromStr for Move {
    type Err = NotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_notation(s)
    }
}

/// Castling availability. Carried as position data only; moves never update it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Castling {
    pub white_kingside: bool,
    pub white_queenside: bool,
    pub black_kingside: bool,
    pub black_queenside: bool,
}

impl Castling {
    pub const fn all() -> Self {
        Self {
            white_kingside: true,
            white_queenside: true,
            black_kingside: true,
            black_queenside: true,
        }
    }

    pub const fn none() -> Self {
        Self {
            white_kingside: false,
            white_queenside: false,
            black_kingside: false,
            black_queenside: false,
        }
    }
}

impl Default for Castling {
    fn default() -> Self {
        Self::all()
    }
}

/// Game status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GameStatus {
    InProgress,
    Checkmate { winner: Color },
    Stalemate,
}

impl GameStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, GameStatus::InProgress)
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameStatus::InProgress => write!(f, "in progress"),
            GameStatus::Checkmate { winner } => write!(f, "checkmate, {} wins", winner.name()),
            GameStatus::Stalemate => write!(f, "stalemate"),
        }
    }
}

/// Notification raised by [`GameState::attempt_move`], in the order it happened
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameEvent {
    /// A move was applied. `color` is the color of the piece that moved,
    /// which differs from the side to move only when the caller skips turn
    /// order.
    Move {
        mv: Move,
        user_generated: bool,
        color: Color,
    },
    Checkmate {
        winner: Color,
    },
    Stalemate,
}

/// Why a move was refused
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error("no piece at {0}")]
    NoPieceAtSource(Position),

    #[error("illegal move {0}")]
    IllegalMove(Move),

    #[error("game is over ({0})")]
    GameOver(GameStatus),
}

// ============================================================================
// GAME STATE
// ============================================================================

/// One match's state. Mutated only through [`GameState::attempt_move`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    /// Side to move
    pub(crate) turn: Color,

    pub(crate) castling: Castling,

    pub(crate) board: Board,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) en_passant: Option<Position>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) last_move: Option<Move>,

    pub(crate) halfmove_clock: u32,

    pub(crate) fullmove_number: u32,

    /// Every accepted move, oldest first
    pub(crate) moves: Vec<Move>,

    pub(crate) status: GameStatus,
}

impl GameState {
    // ========================================================================
    // CONSTRUCTORS
    // ========================================================================

    /// Position with `turn` to move and no history. Terminal positions are
    /// recognised immediately.
    pub fn new(board: Board, turn: Color) -> Self {
        let mut state = Self {
            turn,
            castling: Castling::all(),
            board,
            en_passant: None,
            last_move: None,
            halfmove_clock: 0,
            fullmove_number: 0,
            moves: Vec::new(),
            status: GameStatus::InProgress,
        };
        state.status = state.evaluate_status();
        state
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn turn(&self) -> Color {
        self.turn
    }

    pub fn castling(&self) -> Castling {
        self.castling
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn en_passant(&self) -> Option<Position> {
        self.en_passant
    }

    pub fn last_move(&self) -> Option<Move> {
        self.last_move
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn piece_at(&self, pos: Position) -> Option<Piece> {
        self.board.get(pos)
    }

    // ========================================================================
    // RULE QUERIES
    // ========================================================================

    /// Legal destinations for the piece on `from`
    pub fn legal_moves(&self, from: Position) -> Vec<Position> {
        rules::legal_moves(&self.board, from)
    }

    /// Every legal move for the side to move
    pub fn all_legal_moves(&self) -> Vec<Move> {
        rules::all_legal_moves(&self.board, self.turn)
    }

    pub fn in_check(&self, side: Color) -> bool {
        rules::in_check(&self.board, side)
    }

    pub fn creates_check(&self, mv: Move) -> bool {
        rules::creates_check(&self.board, mv)
    }

    pub fn has_any_legal_move(&self, side: Color) -> bool {
        rules::has_any_legal_move(&self.board, side)
    }

    // ========================================================================
    // APPLY MOVE
    // ========================================================================

    /// Validate and apply `mv`, returning the events it raised.
    ///
    /// Turn order is not checked here; whoever owns the seats decides who may
    /// call this. On error the state is untouched.
    pub fn attempt_move(&mut self, mv: Move, user_generated: bool) -> Result<Vec<GameEvent>, MoveError> {
        if self.status.is_terminal() {
            return Err(MoveError::GameOver(self.status));
        }

        let piece = self.board.get(mv.from).ok_or(MoveError::NoPieceAtSource(mv.from))?;

        if !self.legal_moves(mv.from).contains(&mv.to) {
            return Err(MoveError::IllegalMove(mv));
        }

        self.board.move_piece(mv.from, mv.to);
        self.last_move = Some(mv);
        self.moves.push(mv);

        let mut events = vec![GameEvent::Move {
            mv,
            user_generated,
            color: piece.color,
        }];

        self.turn = self.turn.opponent();
        self.status = self.evaluate_status();

        match self.status {
            GameStatus::InProgress => {}
            GameStatus::Checkmate { winner } => {
                tracing::info!("Checkmate after {} moves, {} wins", self.moves.len(), winner.name());
                events.push(GameEvent::Checkmate { winner });
            }
            GameStatus::Stalemate => {
                tracing::info!("Stalemate after {} moves", self.moves.len());
                events.push(GameEvent::Stalemate);
            }
        }

        Ok(events)
    }

    /// Terminal check for the side to move
    fn evaluate_status(&self) -> GameStatus {
        if self.has_any_legal_move(self.turn) {
            GameStatus::InProgress
        } else if self.in_check(self.turn) {
            GameStatus::Checkmate {
                winner: self.turn.opponent(),
            }
        } else {
            GameStatus::Stalemate
        }
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(Board::standard(), Color::White)
    }
}

// ============================================================================
// TESTS
// ============================================================================

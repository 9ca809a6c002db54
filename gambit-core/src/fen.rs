//! Forsyth-Edwards Notation import and export
//!
//! All six fields are read and written. Castling rights, en passant target
//! and the clocks are stored as given; move application does not maintain
//! them.

use crate::board::{Board, Position, BOARD_SIZE};
use crate::game::{Castling, GameState};
use crate::pieces::{Color, Piece};

/// FEN of the standard starting position
pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// FEN parse errors
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FenError {
    #[error("expected 6 fields, found {0}")]
    FieldCount(usize),

    #[error("expected 8 ranks, found {0}")]
    RankCount(usize),

    #[error("rank {0} does not describe exactly 8 squares")]
    RankWidth(usize),

    #[error("unknown piece letter {0:?}")]
    UnknownPiece(char),

    #[error("invalid side to move {0:?}")]
    SideToMove(String),

    #[error("invalid castling field {0:?}")]
    Castling(String),

    #[error("invalid en passant square {0:?}")]
    EnPassant(String),

    #[error("invalid move counter {0:?}")]
    Counter(String),
}

impl Board {
    /// Parse the piece-placement field (`"rnbqkbnr/pppppppp/8/..."`)
    pub fn from_placement(placement: &str) -> Result<Self, FenError> {
        let ranks: Vec<&str> = placement.split('/').collect();
        if ranks.len() != BOARD_SIZE {
            return Err(FenError::RankCount(ranks.len()));
        }

        let mut board = Board::empty();
        for (y, rank) in ranks.iter().enumerate() {
            let mut x = 0usize;
            for c in rank.chars() {
                if let Some(skip) = c.to_digit(10) {
                    x += skip as usize;
                    continue;
                }
                let piece = Piece::from_code(c).ok_or(FenError::UnknownPiece(c))?;
                let pos = Position::new(x as i32, y as i32).ok_or(FenError::RankWidth(BOARD_SIZE - y))?;
                board.set(pos, Some(piece));
                x += 1;
            }
            if x != BOARD_SIZE {
                return Err(FenError::RankWidth(BOARD_SIZE - y));
            }
        }

        Ok(board)
    }

    /// Render the piece-placement field
    pub fn placement(&self) -> String {
        let mut out = String::new();
        for (y, row) in self.rows().iter().enumerate() {
            if y > 0 {
                out.push('/');
            }
            let mut empty = 0;
            for square in row {
                match square {
                    Some(piece) => {
                        if empty > 0 {
                            out.push_str(&empty.to_string());
                            empty = 0;
                        }
                        out.push(piece.symbol());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                out.push_str(&empty.to_string());
            }
        }
        out
    }
}

impl GameState {
    /// Build a game from a full FEN string
    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() != 6 {
            return Err(FenError::FieldCount(fields.len()));
        }

        let board = Board::from_placement(fields[0])?;
        let turn = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(FenError::SideToMove(other.to_string())),
        };

        let mut state = GameState::new(board, turn);
        state.castling = parse_castling(fields[2])?;
        state.en_passant = match fields[3] {
            "-" => None,
            square => Some(
                Position::from_notation(square).map_err(|_| FenError::EnPassant(square.to_string()))?,
            ),
        };
        state.halfmove_clock = parse_counter(fields[4])?;
        state.fullmove_number = parse_counter(fields[5])?;

        Ok(state)
    }

    /// Render the position as a FEN string
    pub fn to_fen(&self) -> String {
        let side = match self.turn {
            Color::White => "w",
            Color::Black => "b",
        };
        let en_passant = self
            .en_passant
            .map(|p| p.to_notation())
            .unwrap_or_else(|| "-".to_string());

        format!(
            "{} {} {} {} {} {}",
            self.board.placement(),
            side,
            castling_field(self.castling),
            en_passant,
            self.halfmove_clock,
            self.fullmove_number
        )
    }
}

fn parse_castling(field: &str) -> Result<Castling, FenError> {
    let mut castling = Castling::none();
    if field == "-" {
        return Ok(castling);
    }

    for c in field.chars() {
        let flag = match c {
            'K' => &mut castling.white_kingside,
            'Q' => &mut castling.white_queenside,
            'k' => &mut castling.black_kingside,
            'q' => &mut castling.black_queenside,
            _ => return Err(FenError::Castling(field.to_string())),
        };
        if *flag {
            return Err(FenError::Castling(field.to_string()));
        }
        *flag = true;
    }

    Ok(castling)
}

fn castling_field(castling: Castling) -> String {
    let flags = [
        (castling.white_kingside, 'K'),
        (castling.white_queenside, 'Q'),
        (castling.black_kingside, 'k'),
        (castling.black_queenside, 'q'),
    ];
    let field: String = flags.iter().filter(|(set, _)| *set).map(|&(_, c)| c).collect();
    if field.is_empty() {
        "-".to_string()
    } else {
        field
    }
}

fn parse_counter(field: &str) -> Result<u32, FenError> {
    field.parse().map_err(|_| FenError::Counter(field.to_string()))
}

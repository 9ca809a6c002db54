//! GAMBIT Core - Chess rules engine
//!
//! This crate provides the authoritative game logic behind a live match:
//! - Board geometry (8x8 grid, color-relative offsets, square notation)
//! - Piece kinds and pseudo-legal movement
//! - Legality and check detection by board simulation
//! - Game state machine with a single move entry point
//! - FEN import/export

pub mod board;
pub mod pieces;
pub mod rules;
pub mod game;
pub mod fen;

// Re-exports for convenient access
pub use board::{Board, NotationError, Position, BOARD_SIZE};
pub use pieces::{Color, Piece, PieceKind};
pub use game::{Castling, GameEvent, GameState, GameStatus, Move, MoveError};
pub use fen::{FenError, START_FEN};

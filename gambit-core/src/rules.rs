//! Legality and check detection
//!
//! Every question is answered by brute force over the whole board: a
//! candidate move is played on a cloned board and every opposing piece's
//! pseudo-legal destinations are compared against the king square. Boards
//! are 64 squares, so there are no pin tables or incremental attack maps.

use crate::board::{Board, Position};
use crate::game::Move;
use crate::pieces::{Color, PieceKind};

/// Raw movement of the piece on `from`, ignoring check
pub fn pseudo_legal_moves(board: &Board, from: Position) -> Vec<Position> {
    board
        .get(from)
        .map(|piece| piece.moves_from(board, from))
        .unwrap_or_default()
}

/// Pseudo-legal moves that do not leave the mover's own king attacked
pub fn legal_moves(board: &Board, from: Position) -> Vec<Position> {
    pseudo_legal_moves(board, from)
        .into_iter()
        .filter(|&to| !creates_check(board, Move::new(from, to)))
        .collect()
}

/// Every legal move for `side`
pub fn all_legal_moves(board: &Board, side: Color) -> Vec<Move> {
    board
        .pieces()
        .filter(|(_, piece)| piece.color == side)
        .flat_map(|(from, _)| {
            legal_moves(board, from)
                .into_iter()
                .map(move |to| Move::new(from, to))
        })
        .collect()
}

/// Whether `side`'s king is attacked. A side without a king is never in check.
pub fn in_check(board: &Board, side: Color) -> bool {
    match board.find_king(side) {
        Some(king) => is_attacked(board, king, side.opponent()),
        None => false,
    }
}

/// Whether playing `mv` would leave the mover's king attacked.
///
/// An empty source square or a missing king yields `false`.
pub fn creates_check(board: &Board, mv: Move) -> bool {
    let Some(piece) = board.get(mv.from) else {
        return false;
    };

    let king = if piece.kind == PieceKind::King {
        Some(mv.to)
    } else {
        board.find_king(piece.color)
    };
    let Some(king) = king else {
        return false;
    };

    let mut simulated = board.clone();
    simulated.move_piece(mv.from, mv.to);

    is_attacked(&simulated, king, piece.color.opponent())
}

/// Whether any piece of `side` has at least one legal move
pub fn has_any_legal_move(board: &Board, side: Color) -> bool {
    board
        .pieces()
        .filter(|(_, piece)| piece.color == side)
        .any(|(from, _)| !legal_moves(board, from).is_empty())
}

/// Whether some piece of `by` can reach `target` pseudo-legally
fn is_attacked(board: &Board, target: Position, by: Color) -> bool {
    board
        .pieces()
        .filter(|(_, piece)| piece.color == by)
        .any(|(from, piece)| piece.moves_from(board, from).contains(&target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pieces::Piece;

    fn pos(s: &str) -> Position {
        Position::from_notation(s).unwrap()
    }

    fn place(board: &mut Board, at: &str, kind: PieceKind, color: Color) {
        board.set(pos(at), Some(Piece::new(kind, color)));
    }

    #[test]
    fn test_start_position_has_twenty_moves() {
        let board = Board::standard();
        assert_eq!(all_legal_moves(&board, Color::White).len(), 20);
        assert_eq!(all_legal_moves(&board, Color::Black).len(), 20);
        assert!(!in_check(&board, Color::White));
        assert!(!in_check(&board, Color::Black));
    }

    #[test]
    fn test_rook_gives_check() {
        let mut board = Board::empty();
        place(&mut board, "e1", PieceKind::King, Color::White);
        place(&mut board, "e8", PieceKind::Rook, Color::Black);
        assert!(in_check(&board, Color::White));

        place(&mut board, "e4", PieceKind::Pawn, Color::White);
        assert!(!in_check(&board, Color::White));
    }

    #[test]
    fn test_pawn_attacks_diagonally() {
        let mut board = Board::empty();
        place(&mut board, "e4", PieceKind::King, Color::White);
        place(&mut board, "d5", PieceKind::Pawn, Color::Black);
        assert!(in_check(&board, Color::White));

        // A pawn directly in front does not attack
        let mut board = Board::empty();
        place(&mut board, "e4", PieceKind::King, Color::White);
        place(&mut board, "e5", PieceKind::Pawn, Color::Black);
        assert!(!in_check(&board, Color::White));
    }

    #[test]
    fn test_missing_king_is_not_in_check() {
        let mut board = Board::empty();
        place(&mut board, "e8", PieceKind::Queen, Color::Black);
        assert!(!in_check(&board, Color::White));
        assert!(!creates_check(&board, Move::new(pos("e8"), pos("e1"))));
    }

    #[test]
    fn test_pinned_piece_cannot_leave_the_line() {
        let mut board = Board::empty();
        place(&mut board, "e1", PieceKind::King, Color::White);
        place(&mut board, "e2", PieceKind::Knight, Color::White);
        place(&mut board, "e8", PieceKind::Rook, Color::Black);

        assert!(!pseudo_legal_moves(&board, pos("e2")).is_empty());
        assert!(legal_moves(&board, pos("e2")).is_empty());
        assert!(creates_check(&board, Move::new(pos("e2"), pos("c3"))));
    }

    #[test]
    fn test_king_cannot_step_into_attack() {
        let mut board = Board::empty();
        place(&mut board, "e1", PieceKind::King, Color::White);
        place(&mut board, "d8", PieceKind::Rook, Color::Black);

        let moves: Vec<String> = legal_moves(&board, pos("e1"))
            .into_iter()
            .map(|p| p.to_notation())
            .collect();
        assert!(!moves.contains(&"d1".to_string()));
        assert!(!moves.contains(&"d2".to_string()));
        assert!(moves.contains(&"f1".to_string()));
        assert!(creates_check(&board, Move::new(pos("e1"), pos("d2"))));
    }

    #[test]
    fn test_capturing_the_checker_resolves_check() {
        let mut board = Board::empty();
        place(&mut board, "e1", PieceKind::King, Color::White);
        place(&mut board, "e2", PieceKind::Queen, Color::Black);
        place(&mut board, "a2", PieceKind::Rook, Color::White);
        place(&mut board, "a8", PieceKind::King, Color::Black);

        assert!(in_check(&board, Color::White));
        assert!(!creates_check(&board, Move::new(pos("a2"), pos("e2"))));
        assert!(creates_check(&board, Move::new(pos("a2"), pos("a3"))));
    }

    #[test]
    fn test_has_any_legal_move() {
        // Black king boxed in the corner by a queen, not in check
        let mut board = Board::empty();
        place(&mut board, "h8", PieceKind::King, Color::Black);
        place(&mut board, "g6", PieceKind::Queen, Color::White);
        place(&mut board, "a1", PieceKind::King, Color::White);

        assert!(!has_any_legal_move(&board, Color::Black));
        assert!(!in_check(&board, Color::Black));
        assert!(has_any_legal_move(&board, Color::White));
    }
}

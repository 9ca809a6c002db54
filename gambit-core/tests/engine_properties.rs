//! Property tests for the rules engine
//!
//! Drives the public API only: random playouts, notation round trips and
//! the well-known terminal positions.

use gambit_core::{
    rules, Board, Color, GameEvent, GameState, GameStatus, Move, Piece, PieceKind, Position,
};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// ============================================================================
// TEST FIXTURES
// ============================================================================

fn pos(s: &str) -> Position {
    Position::from_notation(s).unwrap()
}

fn mv(s: &str) -> Move {
    Move::from_notation(s).unwrap()
}

/// Play random legal moves until the game ends or `max_plies` is reached,
/// checking the legality invariant on every visited position.
fn random_playout(seed: u64, max_plies: usize) -> GameState {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut game = GameState::default();

    for _ in 0..max_plies {
        assert_legal_moves_never_create_check(&game);

        let moves = game.all_legal_moves();
        let Some(&choice) = moves.choose(&mut rng) else {
            break;
        };
        game.attempt_move(choice, false).unwrap();
    }

    game
}

fn assert_legal_moves_never_create_check(game: &GameState) {
    for (from, _) in game.board().pieces() {
        for to in game.legal_moves(from) {
            assert!(
                !game.creates_check(Move::new(from, to)),
                "legal move {}{} leaves own king in check",
                from,
                to
            );
        }
    }
}

// ============================================================================
// LEGALITY
// ============================================================================

#[test]
fn test_legal_moves_never_create_check_in_random_games() {
    for seed in 0..12 {
        random_playout(seed, 120);
    }
}

#[test]
fn test_random_games_keep_one_king_per_side() {
    for seed in 100..106 {
        let game = random_playout(seed, 200);
        let kings = |color| {
            game.board()
                .pieces()
                .filter(|(_, p)| p.kind == PieceKind::King && p.color == color)
                .count()
        };
        assert_eq!(kings(Color::White), 1);
        assert_eq!(kings(Color::Black), 1);
    }
}

#[test]
fn test_random_games_alternate_turns() {
    let game = random_playout(7, 60);
    let expected = if game.moves().len() % 2 == 0 {
        Color::White
    } else {
        Color::Black
    };
    assert_eq!(game.turn(), expected);
}

#[test]
fn test_terminal_status_matches_engine_queries() {
    for seed in 200..220 {
        let game = random_playout(seed, 300);
        let side = game.turn();
        match game.status() {
            GameStatus::InProgress => assert!(game.has_any_legal_move(side)),
            GameStatus::Checkmate { winner } => {
                assert_eq!(winner, side.opponent());
                assert!(!game.has_any_legal_move(side));
                assert!(game.in_check(side));
            }
            GameStatus::Stalemate => {
                assert!(!game.has_any_legal_move(side));
                assert!(!game.in_check(side));
            }
        }
    }
}

// ============================================================================
// KNOWN POSITIONS
// ============================================================================

#[test]
fn test_knight_in_corner_has_two_moves() {
    let mut board = Board::empty();
    board.set(pos("a1"), Some(Piece::new(PieceKind::Knight, Color::White)));
    assert_eq!(pos("a1").x(), 0);
    assert_eq!(pos("a1").y(), 7);
    assert_eq!(rules::legal_moves(&board, pos("a1")).len(), 2);
}

#[test]
fn test_start_position_move_count() {
    let game = GameState::default();
    let moves = game.all_legal_moves();
    assert_eq!(moves.len(), 20);

    let by_kind = |kind| {
        moves
            .iter()
            .filter(|m| game.piece_at(m.from).map(|p| p.kind) == Some(kind))
            .count()
    };
    assert_eq!(by_kind(PieceKind::Pawn), 16);
    assert_eq!(by_kind(PieceKind::Knight), 4);
}

#[test]
fn test_fools_mate_is_checkmate_for_black() {
    let mut game = GameState::default();
    for m in ["f2f3", "e7e5", "g2g4"] {
        game.attempt_move(mv(m), true).unwrap();
    }
    let last_events = game.attempt_move(mv("d8h4"), true).unwrap();

    assert!(!game.has_any_legal_move(Color::White));
    assert!(game.in_check(Color::White));
    assert_eq!(game.status(), GameStatus::Checkmate { winner: Color::Black });
    assert_eq!(
        last_events,
        vec![
            GameEvent::Move {
                mv: mv("d8h4"),
                user_generated: true,
                color: Color::Black,
            },
            GameEvent::Checkmate { winner: Color::Black },
        ]
    );
}

#[test]
fn test_no_moves_without_check_is_stalemate() {
    let game = GameState::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
    assert!(!game.has_any_legal_move(Color::Black));
    assert!(!game.in_check(Color::Black));
    assert_eq!(game.status(), GameStatus::Stalemate);
}

// ============================================================================
// NOTATION
// ============================================================================

#[test]
fn test_move_notation_round_trip_for_every_pair() {
    for from in Position::all() {
        for to in Position::all() {
            let m = Move::new(from, to);
            assert_eq!(Move::from_notation(&m.to_notation()).unwrap(), m);
        }
    }
}

#[test]
fn test_square_notation_covers_board() {
    let names: Vec<String> = Position::all().map(|p| p.to_notation()).collect();
    assert_eq!(names.len(), 64);
    assert_eq!(names[0], "a8");
    assert_eq!(names[63], "h1");
}

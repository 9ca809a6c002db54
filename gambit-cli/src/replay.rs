//! Replay command - apply a move list to a position
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: load_position(), play_moves(), report_position()
//! - Level 3: play_random_moves()
//! - Level 4: formatting utilities

use anyhow::{Context, Result};
use clap::Args;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use gambit_core::{GameState, GameStatus, Move};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct ReplayArgs {
    /// Starting position (defaults to the standard setup)
    #[arg(long, value_name = "FEN")]
    pub fen: Option<String>,

    /// Random legal moves to play after the listed ones
    #[arg(long, default_value = "0")]
    pub random: usize,

    /// Seed for --random (random if omitted)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Print the final game state as JSON
    #[arg(long)]
    pub json: bool,

    /// Moves in coordinate notation, e.g. e2e4 e7e5
    #[arg(value_name = "MOVES")]
    pub moves: Vec<String>,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run replay command
///
/// This function reads like a table of contents:
/// 1. Load the starting position
/// 2. Play the listed moves, then any random ones
/// 3. Report the final position
pub fn run(args: ReplayArgs) -> Result<()> {
    let mut game = load_position(args.fen.as_deref())?;

    play_moves(&mut game, &args.moves)?;

    if args.random > 0 {
        let mut rng = create_rng(args.seed);
        let played = play_random_moves(&mut game, args.random, &mut rng);
        tracing::info!("Played {} random moves", played);
    }

    report_position(&game, args.json)
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

/// Build the starting position from an optional FEN string
fn load_position(fen: Option<&str>) -> Result<GameState> {
    match fen {
        Some(fen) => GameState::from_fen(fen).with_context(|| format!("Invalid FEN: {}", fen)),
        None => Ok(GameState::default()),
    }
}

/// Apply every move in order, stopping at the first one the game refuses
fn play_moves(game: &mut GameState, moves: &[String]) -> Result<()> {
    for (index, text) in moves.iter().enumerate() {
        let mv: Move = text
            .parse()
            .with_context(|| format!("Move {} ({}) is not valid notation", index + 1, text))?;

        let side = game.turn();
        game.attempt_move(mv, true)
            .with_context(|| format!("Move {} ({}) rejected", index + 1, mv))?;

        tracing::debug!("{} played {}", side.name(), mv);
    }

    Ok(())
}

/// Print the final position
fn report_position(game: &GameState, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(game)?);
    } else {
        print_text_position(game);
    }
    Ok(())
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

/// Play up to `count` uniformly random legal moves. Returns how many were
/// played before the game ended.
fn play_random_moves(game: &mut GameState, count: usize, rng: &mut ChaCha8Rng) -> usize {
    let mut played = 0;

    while played < count && !game.status().is_terminal() {
        let moves = game.all_legal_moves();
        let Some(&mv) = moves.choose(rng) else {
            break;
        };
        if game.attempt_move(mv, false).is_err() {
            break;
        }
        played += 1;
    }

    played
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

/// Create RNG from seed or random
fn create_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => ChaCha8Rng::from_entropy(),
    }
}

fn status_line(game: &GameState) -> String {
    match game.status() {
        GameStatus::InProgress if game.in_check(game.turn()) => {
            format!("{} to move, in check", game.turn().name())
        }
        GameStatus::InProgress => format!("{} to move", game.turn().name()),
        status => status.to_string(),
    }
}

/// Print results as text
fn print_text_position(game: &GameState) {
    println!("{}", game.board());
    println!();
    println!("FEN:    {}", game.to_fen());
    println!("Moves:  {}", format_moves(game.moves()));
    println!("Status: {}", status_line(game));
}

fn format_moves(moves: &[Move]) -> String {
    if moves.is_empty() {
        return "-".to_string();
    }
    moves
        .iter()
        .map(|m| m.to_notation())
        .collect::<Vec<_>>()
        .join(" ")
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use gambit_core::Color;

    fn moves(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_replay_fools_mate() {
        let mut game = load_position(None).unwrap();
        play_moves(&mut game, &moves(&["f2f3", "e7e5", "g2g4", "d8h4"])).unwrap();
        assert_eq!(game.status(), GameStatus::Checkmate { winner: Color::Black });
        assert_eq!(status_line(&game), "checkmate, black wins");
    }

    #[test]
    fn test_illegal_move_names_the_move() {
        let mut game = load_position(None).unwrap();
        let err = play_moves(&mut game, &moves(&["e2e4", "e2e4"])).unwrap_err();
        assert!(err.to_string().contains("Move 2 (e2e4)"), "{}", err);
        assert_eq!(game.moves().len(), 1);
    }

    #[test]
    fn test_bad_notation_is_reported() {
        let mut game = load_position(None).unwrap();
        let err = play_moves(&mut game, &moves(&["e2-e4"])).unwrap_err();
        assert!(err.to_string().contains("Move 1 (e2-e4)"), "{}", err);
    }

    #[test]
    fn test_load_position_from_fen() {
        let game = load_position(Some("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1")).unwrap();
        assert_eq!(game.status(), GameStatus::Stalemate);
        assert!(load_position(Some("not a fen")).is_err());
    }

    #[test]
    fn test_random_moves_are_reproducible() {
        let play = |seed| {
            let mut game = GameState::default();
            let mut rng = create_rng(Some(seed));
            let played = play_random_moves(&mut game, 40, &mut rng);
            (played, game.moves().to_vec())
        };

        let (played, first) = play(9);
        let (_, second) = play(9);
        assert_eq!(first, second);
        assert_eq!(first.len(), played);
        assert!(played > 0);
    }

    #[test]
    fn test_status_line_reports_check() {
        let mut game = GameState::default();
        play_moves(&mut game, &moves(&["e2e4", "f7f6", "d1h5"])).unwrap();
        assert_eq!(status_line(&game), "black to move, in check");
        assert_eq!(format_moves(game.moves()), "e2e4 f7f6 d1h5");
    }
}

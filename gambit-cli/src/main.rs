//! GAMBIT CLI - Command-line interface
//!
//! Commands:
//! - serve: Start the lobby server
//! - replay: Apply a move list to a position and print the result

mod replay;
mod server;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gambit")]
#[command(about = "GAMBIT live chess server and rules engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the lobby server
    Serve(server::ServerArgs),
    /// Replay moves and print the resulting position
    Replay(replay::ReplayArgs),
}

fn main() -> anyhow::Result<()> {
    // Initialize logging, RUST_LOG overrides the default level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => server::run(args),
        Commands::Replay(args) => replay::run(args),
    }
}

//! Server command - start the lobby server
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: configure_server(), start_server()
//! - Level 3: (delegated to gambit-server crate)
//! - Level 4: configuration validation

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use clap::Args;

use gambit_server::{run_server, ServerConfig};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct ServerArgs {
    /// Port number to listen on
    #[arg(long, default_value = "8080")]
    pub port: u16,

    /// Directory containing the client page and its assets
    #[arg(long, default_value = "web")]
    pub static_dir: PathBuf,

    /// Maximum number of lobbies held at once
    #[arg(long, default_value = "1024")]
    pub max_lobbies: usize,

    /// Seconds a lobby with nobody connected is kept for reconnects
    #[arg(long, default_value = "120")]
    pub vacancy_grace_secs: u64,

    /// Seconds between sweeps for expired lobbies
    #[arg(long, default_value = "30")]
    pub reap_interval_secs: u64,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run server command
///
/// This function reads like a table of contents:
/// 1. Configure server
/// 2. Start server (blocking)
pub fn run(args: ServerArgs) -> Result<()> {
    let config = configure_server(&args)?;

    tracing::info!("Starting GAMBIT lobby server on port {}", config.port);

    start_server(config)
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

/// Configure server from command arguments
fn configure_server(args: &ServerArgs) -> Result<ServerConfig> {
    validate_static_dir(&args.static_dir)?;
    if args.max_lobbies == 0 {
        anyhow::bail!("--max-lobbies must be at least 1");
    }
    if args.reap_interval_secs == 0 {
        anyhow::bail!("--reap-interval-secs must be at least 1");
    }

    Ok(ServerConfig {
        port: args.port,
        static_dir: args.static_dir.to_string_lossy().to_string(),
        max_lobbies: args.max_lobbies,
        vacancy_grace: Duration::from_secs(args.vacancy_grace_secs),
        reap_interval: Duration::from_secs(args.reap_interval_secs),
    })
}

/// Start the server (blocking)
fn start_server(config: ServerConfig) -> Result<()> {
    // Create tokio runtime for async server
    let runtime = tokio::runtime::Runtime::new()?;

    runtime.block_on(async { run_server(config).await })
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

/// Validate that static directory exists
fn validate_static_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        tracing::warn!(
            "Static directory does not exist: {}. Server will start but may not serve files.",
            path.display()
        );
    } else if !path.is_dir() {
        anyhow::bail!(
            "Static path exists but is not a directory: {}",
            path.display()
        );
    }

    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================

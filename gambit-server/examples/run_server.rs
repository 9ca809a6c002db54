//! Example to run the GAMBIT server standalone
//!
//! Run with: cargo run -p gambit-server --example run_server

use gambit_server::{run_server, ServerConfig};
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let config = ServerConfig {
        port: 8080,
        vacancy_grace: Duration::from_secs(30),
        ..ServerConfig::default()
    };

    println!("Starting GAMBIT server on port {}", config.port);
    println!("Static files from: {}", config.static_dir);
    println!("Connect to ws://localhost:{}/api/play/abc?account=guest", config.port);

    run_server(config).await
}

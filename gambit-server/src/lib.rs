//! GAMBIT Server - live chess lobbies over WebSocket
//!
//! This crate provides the multiplayer backend:
//! - Lobby registry keyed by a short session id
//! - Seat assignment, reconnection and spectators
//! - Move validation against `gambit-core` and event relay
//! - Status endpoint and static file serving for the client page

pub mod lobby;
pub mod protocol;
mod routes;
pub mod state;

use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::services::ServeDir;

pub use lobby::{Connection, ConnectionId, Lobby, LobbyError, Seating};
pub use protocol::{Account, ClientEvent, GameId, PlayerDescriptor, ProtocolError, Role, ServerEvent};
pub use state::{LobbyLimits, RegistryError, ServerState, Session};

/// Server configuration
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub port: u16,
    pub static_dir: String,
    pub max_lobbies: usize,
    /// How long a lobby nobody is connected to is kept for reconnects
    pub vacancy_grace: Duration,
    pub reap_interval: Duration,
}

impl ServerConfig {
    pub fn limits(&self) -> LobbyLimits {
        LobbyLimits {
            max_lobbies: self.max_lobbies,
            vacancy_grace: self.vacancy_grace,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        let limits = LobbyLimits::default();
        Self {
            port: 8080,
            static_dir: "web".to_string(),
            max_lobbies: limits.max_lobbies,
            vacancy_grace: limits.vacancy_grace,
            reap_interval: Duration::from_secs(30),
        }
    }
}

/// Create the router with all routes
pub fn create_router(config: &ServerConfig, state: Arc<ServerState>) -> Router {
    let static_service = ServeDir::new(&config.static_dir);

    Router::new()
        // Status endpoint
        .route("/api/status", get(routes::status::status_handler))
        // Game socket
        .route("/api/play/:game_id", get(routes::play::play_handler))
        // Shared state
        .with_state(state)
        // Static file serving (must be last)
        .fallback_service(static_service)
}

/// Periodically tear down lobbies that stayed vacant past their grace period
pub fn spawn_reaper(state: Arc<ServerState>, period: Duration) -> tokio::task::JoinHandle<()> {
    let period = period.max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            let removed = state.reap_vacant(Instant::now());
            if removed > 0 {
                tracing::debug!("Reaper removed {} lobbies, {} open", removed, state.lobby_count());
            }
        }
    })
}

/// Start the HTTP server
pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let state = Arc::new(ServerState::with_limits(config.limits()));
    let router = create_router(&config, Arc::clone(&state));
    let reaper = spawn_reaper(state, config.reap_interval);

    tracing::info!("GAMBIT Server starting on http://0.0.0.0:{}", config.port);
    tracing::info!("Static files served from: {}", config.static_dir);
    tracing::info!(
        "Up to {} lobbies, vacant lobbies kept for {:?}",
        config.max_lobbies,
        config.vacancy_grace
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let served = axum::serve(listener, router).await;
    reaper.abort();
    served?;

    Ok(())
}

//! Server state management
//!
//! The lobby registry shared by every connection. Lock order is always
//! registry first, then a single lobby.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use rand::Rng;
use rustc_hash::FxHashMap;
use tokio::sync::mpsc;

use crate::lobby::{Connection, ConnectionId, Lobby, Seating};
use crate::protocol::{Account, GameId, ServerEvent};

/// Lock a mutex, recovering the data if a previous holder panicked
pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Registry bounds
#[derive(Clone, Copy, Debug)]
pub struct LobbyLimits {
    /// Lobbies held at once
    pub max_lobbies: usize,
    /// How long a lobby with nobody connected survives
    pub vacancy_grace: Duration,
}

impl Default for LobbyLimits {
    fn default() -> Self {
        Self {
            max_lobbies: 1024,
            vacancy_grace: Duration::from_secs(120),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("lobby limit of {0} reached")]
    Full(usize),
}

/// A seated connection: where it sits and how to reach its lobby
#[derive(Clone, Debug)]
pub struct Session {
    pub game_id: GameId,
    pub connection: ConnectionId,
    pub seating: Seating,
    pub lobby: Arc<Mutex<Lobby>>,
}

/// Server-wide shared state
pub struct ServerState {
    lobbies: Mutex<FxHashMap<GameId, Arc<Mutex<Lobby>>>>,
    limits: LobbyLimits,
    next_connection: AtomicU64,
}

impl ServerState {
    pub fn new() -> Self {
        Self::with_limits(LobbyLimits::default())
    }

    pub fn with_limits(limits: LobbyLimits) -> Self {
        Self {
            lobbies: Mutex::new(FxHashMap::default()),
            limits,
            next_connection: AtomicU64::new(1),
        }
    }

    pub fn limits(&self) -> LobbyLimits {
        self.limits
    }

    pub fn next_connection_id(&self) -> ConnectionId {
        ConnectionId(self.next_connection.fetch_add(1, Ordering::Relaxed))
    }

    /// Seat a new connection in the lobby for `game_id`, creating the lobby on
    /// first use.
    pub fn connect(
        &self,
        game_id: &GameId,
        account: Account,
        outbox: mpsc::UnboundedSender<ServerEvent>,
    ) -> Result<Session, RegistryError> {
        self.connect_with_rng(game_id, account, outbox, &mut rand::thread_rng())
    }

    pub fn connect_with_rng<R: Rng + ?Sized>(
        &self,
        game_id: &GameId,
        account: Account,
        outbox: mpsc::UnboundedSender<ServerEvent>,
        rng: &mut R,
    ) -> Result<Session, RegistryError> {
        // The registry stays locked until the connection is seated, so the
        // reaper never sees the new lobby empty.
        let mut lobbies = lock(&self.lobbies);

        let lobby = match lobbies.get(game_id) {
            Some(lobby) => Arc::clone(lobby),
            None => {
                if lobbies.len() >= self.limits.max_lobbies {
                    let purged = purge_expired(&mut lobbies, self.limits.vacancy_grace, Instant::now());
                    tracing::debug!("Registry full, purged {} expired lobbies", purged);
                }
                if lobbies.len() >= self.limits.max_lobbies {
                    tracing::warn!("Refusing lobby {}: limit of {} reached", game_id, self.limits.max_lobbies);
                    return Err(RegistryError::Full(self.limits.max_lobbies));
                }

                let lobby = Arc::new(Mutex::new(Lobby::new(game_id.clone())));
                lobbies.insert(game_id.clone(), Arc::clone(&lobby));
                tracing::info!("Lobby {} created ({} open)", game_id, lobbies.len());
                lobby
            }
        };

        let connection = self.next_connection_id();
        let seating = lock(&lobby).connect(account, Connection::new(connection, outbox), rng);

        Ok(Session {
            game_id: game_id.clone(),
            connection,
            seating,
            lobby,
        })
    }

    pub fn get(&self, game_id: &GameId) -> Option<Arc<Mutex<Lobby>>> {
        lock(&self.lobbies).get(game_id).cloned()
    }

    pub fn lobby_count(&self) -> usize {
        lock(&self.lobbies).len()
    }

    /// Remove a connection from its lobby. With no grace period an emptied
    /// lobby goes away at once; otherwise the reaper collects it later.
    pub fn release(&self, session: &Session) {
        let now = Instant::now();
        let mut lobbies = lock(&self.lobbies);

        let vacant = {
            let mut lobby = lock(&session.lobby);
            lobby.disconnect(session.connection, now);
            lobby.is_vacant()
        };

        let still_registered = lobbies
            .get(&session.game_id)
            .is_some_and(|lobby| Arc::ptr_eq(lobby, &session.lobby));
        if vacant && still_registered && self.limits.vacancy_grace.is_zero() {
            lobbies.remove(&session.game_id);
            tracing::info!("Lobby {} torn down ({} open)", session.game_id, lobbies.len());
        }
    }

    /// Tear down every lobby that has been vacant for longer than the grace
    /// period. Returns how many were removed.
    pub fn reap_vacant(&self, now: Instant) -> usize {
        let mut lobbies = lock(&self.lobbies);
        purge_expired(&mut lobbies, self.limits.vacancy_grace, now)
    }
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new()
    }
}

fn purge_expired(
    lobbies: &mut FxHashMap<GameId, Arc<Mutex<Lobby>>>,
    grace: Duration,
    now: Instant,
) -> usize {
    let before = lobbies.len();
    lobbies.retain(|id, lobby| {
        let expired = lock(lobby)
            .vacant_since(now)
            .is_some_and(|since| now.saturating_duration_since(since) >= grace);
        if expired {
            tracing::info!("Lobby {} torn down after {:?} vacant", id, grace);
        }
        !expired
    });
    before - lobbies.len()
}

//! Lobby: one game, two seats and the spectators watching it
//!
//! A lobby never touches a socket. Every connection is represented by the
//! sending half of its outbox; pushing into it while the lobby is locked is
//! what keeps the event order identical for every observer.

use std::fmt;
use std::time::Instant;

use gambit_core::{Color, GameEvent, GameState, Move, MoveError};
use rand::Rng;
use tokio::sync::mpsc;

use crate::protocol::{Account, GameId, LoadGame, PlayerDescriptor, Role, ServerEvent};

/// Process-unique handle for one WebSocket connection
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Outbound side of a connection
#[derive(Debug)]
pub struct Connection {
    id: ConnectionId,
    outbox: mpsc::UnboundedSender<ServerEvent>,
}

impl Connection {
    pub fn new(id: ConnectionId, outbox: mpsc::UnboundedSender<ServerEvent>) -> Self {
        Self { id, outbox }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// A connection is live until its writer task drops the receiver
    pub fn is_live(&self) -> bool {
        !self.outbox.is_closed()
    }

    /// Queue an event. Returns false if the writer is gone.
    pub fn send(&self, event: ServerEvent) -> bool {
        self.outbox.send(event).is_ok()
    }
}

/// An account identity, bound to at most one connection
#[derive(Debug)]
struct Seat {
    account: Account,
    connection: Option<Connection>,
}

impl Seat {
    fn new(account: Account, connection: Connection) -> Self {
        Self {
            account,
            connection: Some(connection),
        }
    }

    fn is_live(&self) -> bool {
        self.connection.as_ref().is_some_and(Connection::is_live)
    }

    fn holds(&self, id: ConnectionId) -> bool {
        self.connection.as_ref().is_some_and(|c| c.id() == id)
    }

    fn descriptor(&self, team: Role) -> PlayerDescriptor {
        PlayerDescriptor {
            id: self.account.id.clone(),
            display_name: self.account.display_name.clone(),
            team,
            connected: self.is_live(),
        }
    }
}

/// Outcome of seat assignment
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Seating {
    pub role: Role,
    /// The account took back a seat it already held
    pub reconnected: bool,
}

/// Reasons a connection's input is refused. Every one of them ends the
/// connection.
#[derive(Debug, thiserror::Error)]
pub enum LobbyError {
    #[error("connection {0} is not seated in this lobby")]
    UnknownConnection(ConnectionId),

    #[error("spectators cannot move")]
    SpectatorMove,

    #[error("{mover} moved on {turn}'s turn")]
    OutOfTurn { mover: &'static str, turn: &'static str },

    #[error("{0} does not belong to the mover")]
    ForeignPiece(Move),

    #[error(transparent)]
    Move(#[from] MoveError),
}

// ============================================================================
// LOBBY
// ============================================================================

#[derive(Debug)]
pub struct Lobby {
    id: GameId,
    game: GameState,
    white: Option<Seat>,
    black: Option<Seat>,
    spectators: Vec<Seat>,
    /// Set while no connection is live
    vacant_since: Option<Instant>,
}

impl Lobby {
    /// Fresh lobby with the standard starting position and empty seats
    pub fn new(id: GameId) -> Self {
        Self::with_game(id, GameState::default())
    }

    pub fn with_game(id: GameId, game: GameState) -> Self {
        Self {
            id,
            game,
            white: None,
            black: None,
            spectators: Vec::new(),
            vacant_since: Some(Instant::now()),
        }
    }

    pub fn id(&self) -> &GameId {
        &self.id
    }

    pub fn game(&self) -> &GameState {
        &self.game
    }

    pub fn spectator_count(&self) -> usize {
        self.spectators.len()
    }

    /// Role held by a connection, if it belongs here
    pub fn role_of(&self, id: ConnectionId) -> Option<Role> {
        self.occupants()
            .find(|(_, seat)| seat.holds(id))
            .map(|(role, _)| role)
    }

    /// Assign a role to a newly arrived connection.
    ///
    /// An account whose seat has no live connection gets that seat back
    /// (black is checked before white). Otherwise the first arrival in an
    /// empty lobby gets a random color, the second the remaining one, and
    /// everyone after that watches.
    pub fn join<R: Rng + ?Sized>(&mut self, account: Account, connection: Connection, rng: &mut R) -> Seating {
        for color in [Color::Black, Color::White] {
            let seat = self.seat_mut(color);
            if let Some(seat) = seat.as_mut() {
                if seat.account.id == account.id && !seat.is_live() {
                    seat.account = account;
                    seat.connection = Some(connection);
                    self.vacant_since = None;
                    return Seating {
                        role: color.into(),
                        reconnected: true,
                    };
                }
            }
        }

        let role = match (&self.white, &self.black) {
            (None, None) => {
                if rng.gen_bool(0.5) {
                    Role::White
                } else {
                    Role::Black
                }
            }
            (None, Some(_)) => Role::White,
            (Some(_), None) => Role::Black,
            (Some(_), Some(_)) => Role::Spectator,
        };

        let seat = Seat::new(account, connection);
        match role.color() {
            Some(color) => *self.seat_mut(color) = Some(seat),
            None => self.spectators.push(seat),
        }
        self.vacant_since = None;

        Seating {
            role,
            reconnected: false,
        }
    }

    /// Seat a connection and announce it.
    ///
    /// The newcomer always receives the full snapshot. Everyone else hears
    /// about it only when the seat is new; a reconnect is silent.
    pub fn connect<R: Rng + ?Sized>(&mut self, account: Account, connection: Connection, rng: &mut R) -> Seating {
        let id = connection.id();
        let account_id = account.id.clone();
        let seating = self.join(account, connection, rng);

        tracing::info!(
            "Lobby {}: connection {} seated as {:?}{}",
            self.id,
            id,
            seating.role,
            if seating.reconnected { " (reconnect)" } else { "" }
        );

        let load = ServerEvent::LoadGame(LoadGame {
            board: self.game.clone(),
            team: seating.role,
            players: self.other_players(&account_id),
        });
        if let Some(connection) = self.connection(id) {
            connection.send(load);
        }

        if !seating.reconnected {
            if let Some(descriptor) = self.descriptor(id) {
                self.broadcast_except(id, ServerEvent::PlayerJoin(descriptor));
            }
        }

        seating
    }

    /// Everyone in the lobby except the given account: black seat, white
    /// seat, then spectators. Every slot the account holds is left out.
    /// Empty seats are skipped; seats whose player is away are listed as
    /// disconnected.
    pub fn other_players(&self, account_id: &str) -> Vec<PlayerDescriptor> {
        self.occupants()
            .filter(|(_, seat)| seat.account.id != account_id)
            .map(|(role, seat)| seat.descriptor(role))
            .collect()
    }

    /// Validate and apply a move sent by `id`, relaying what it caused
    pub fn handle_move(&mut self, id: ConnectionId, mv: Move) -> Result<(), LobbyError> {
        let role = self.role_of(id).ok_or(LobbyError::UnknownConnection(id))?;
        let mover = role.color().ok_or(LobbyError::SpectatorMove)?;

        let turn = self.game.turn();
        if mover != turn {
            return Err(LobbyError::OutOfTurn {
                mover: mover.name(),
                turn: turn.name(),
            });
        }
        if let Some(piece) = self.game.piece_at(mv.from) {
            if piece.color != mover {
                return Err(LobbyError::ForeignPiece(mv));
            }
        }

        let events = self.game.attempt_move(mv, true)?;
        self.relay(&events);
        Ok(())
    }

    /// Fan game events out to the connections that need them.
    ///
    /// A move goes to every connection not playing the color that made it,
    /// so the mover never gets an echo. The end of the game goes to everyone.
    pub fn relay(&self, events: &[GameEvent]) {
        for event in events {
            match *event {
                GameEvent::Move { mv, color, .. } => {
                    tracing::debug!("Lobby {}: relaying {} by {}", self.id, mv, color.name());
                    for (role, seat) in self.occupants() {
                        if role.color() == Some(color) {
                            continue;
                        }
                        if let Some(connection) = &seat.connection {
                            connection.send(ServerEvent::Move(mv));
                        }
                    }
                }
                GameEvent::Checkmate { .. } | GameEvent::Stalemate => {
                    let status = self.game.status();
                    tracing::info!("Lobby {}: game over, {}", self.id, status);
                    self.broadcast(ServerEvent::GameOver { status });
                }
            }
        }
    }

    /// Drop a connection. Seats are kept for the account to come back to;
    /// spectator entries are removed. Returns the account that left.
    pub fn disconnect(&mut self, id: ConnectionId, now: Instant) -> Option<Account> {
        let account = if let Some(index) = self.spectators.iter().position(|s| s.holds(id)) {
            self.spectators.remove(index).account
        } else {
            let seat = [&mut self.white, &mut self.black]
                .into_iter()
                .flatten()
                .find(|seat| seat.holds(id))?;
            seat.connection = None;
            seat.account.clone()
        };

        tracing::info!("Lobby {}: {} ({}) left", self.id, account.display_name, id);
        self.broadcast(ServerEvent::PlayerLeave(account.id.clone()));

        if self.vacant_since.is_none() && self.is_vacant() {
            self.vacant_since = Some(now);
        }
        Some(account)
    }

    /// No connection in any seat is live
    pub fn is_vacant(&self) -> bool {
        !self.occupants().any(|(_, seat)| seat.is_live())
    }

    /// When the lobby last became vacant. A vacancy noticed only through a
    /// closed outbox is stamped on the first call.
    pub fn vacant_since(&mut self, now: Instant) -> Option<Instant> {
        if !self.is_vacant() {
            self.vacant_since = None;
        } else if self.vacant_since.is_none() {
            self.vacant_since = Some(now);
        }
        self.vacant_since
    }

    // ========================================================================
    // HELPERS
    // ========================================================================

    fn seat_mut(&mut self, color: Color) -> &mut Option<Seat> {
        match color {
            Color::White => &mut self.white,
            Color::Black => &mut self.black,
        }
    }

    fn occupants(&self) -> impl Iterator<Item = (Role, &Seat)> {
        let black = self.black.iter().map(|seat| (Role::Black, seat));
        let white = self.white.iter().map(|seat| (Role::White, seat));
        let spectators = self.spectators.iter().map(|seat| (Role::Spectator, seat));
        black.chain(white).chain(spectators)
    }

    fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.occupants()
            .filter_map(|(_, seat)| seat.connection.as_ref())
            .find(|connection| connection.id() == id)
    }

    fn descriptor(&self, id: ConnectionId) -> Option<PlayerDescriptor> {
        self.occupants()
            .find(|(_, seat)| seat.holds(id))
            .map(|(role, seat)| seat.descriptor(role))
    }

    fn broadcast(&self, event: ServerEvent) {
        for (_, seat) in self.occupants() {
            if let Some(connection) = &seat.connection {
                connection.send(event.clone());
            }
        }
    }

    fn broadcast_except(&self, exclude: ConnectionId, event: ServerEvent) {
        for (_, seat) in self.occupants() {
            if let Some(connection) = &seat.connection {
                if connection.id() != exclude {
                    connection.send(event.clone());
                }
            }
        }
    }
}

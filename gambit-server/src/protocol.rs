//! Wire protocol
//!
//! Every WebSocket text frame is one JSON object `{"event": ..., "data": ...}`.

use std::fmt;

use gambit_core::{Color, GameState, GameStatus, Move};
use serde::{Deserialize, Serialize};

/// Length of a session identifier
const GAME_ID_LEN: usize = 3;

const MAX_ACCOUNT_LEN: usize = 64;
const MIN_NAME_LEN: usize = 2;
const MAX_NAME_LEN: usize = 128;

/// Protocol-level errors
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("invalid game id {0:?}")]
    InvalidGameId(String),

    #[error("missing or invalid account id")]
    InvalidAccount,

    #[error("display name must be 2-128 characters")]
    InvalidDisplayName,

    #[error("malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("binary frames are not part of the protocol")]
    BinaryFrame,
}

// ============================================================================
// IDENTIFIERS
// ============================================================================

/// Session identifier: three lowercase ASCII letters or digits
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct GameId(String);

impl GameId {
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        let valid = raw.len() == GAME_ID_LEN
            && raw
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit());
        if valid {
            Ok(Self(raw.to_string()))
        } else {
            Err(ProtocolError::InvalidGameId(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stable account identity handed over by whatever authenticated the connection
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Account {
    pub id: String,
    pub display_name: String,
}

impl Account {
    /// Validate an account id and optional display name.
    /// Without a name, one is derived from the id.
    pub fn new(id: &str, display_name: Option<&str>) -> Result<Self, ProtocolError> {
        let valid_id = !id.is_empty()
            && id.len() <= MAX_ACCOUNT_LEN
            && id
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
        if !valid_id {
            return Err(ProtocolError::InvalidAccount);
        }

        let display_name = match display_name {
            Some(name) => {
                let name = name.trim();
                let len = name.chars().count();
                if !(MIN_NAME_LEN..=MAX_NAME_LEN).contains(&len) {
                    return Err(ProtocolError::InvalidDisplayName);
                }
                name.to_string()
            }
            None => format!("Guest {}", &id[..id.len().min(6)]),
        };

        Ok(Self {
            id: id.to_string(),
            display_name,
        })
    }
}

// ============================================================================
// MESSAGES
// ============================================================================

/// Role a connection holds in its lobby
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    White,
    Black,
    Spectator,
}

impl Role {
    /// Color played, `None` for spectators
    pub fn color(self) -> Option<Color> {
        match self {
            Role::White => Some(Color::White),
            Role::Black => Some(Color::Black),
            Role::Spectator => None,
        }
    }
}

impl From<Color> for Role {
    fn from(color: Color) -> Self {
        match color {
            Color::White => Role::White,
            Color::Black => Role::Black,
        }
    }
}

/// Another occupant of the lobby, as shown in a participant list
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerDescriptor {
    pub id: String,
    pub display_name: String,
    pub team: Role,
    pub connected: bool,
}

/// Full state sent once to every connection after seating
#[derive(Clone, Debug, Serialize)]
pub struct LoadGame {
    pub board: GameState,
    pub team: Role,
    pub players: Vec<PlayerDescriptor>,
}

/// Server -> client events
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    LoadGame(LoadGame),
    Move(Move),
    PlayerJoin(PlayerDescriptor),
    PlayerLeave(String),
    GameOver { status: GameStatus },
}

/// Client -> server events
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    Move(Move),
}

pub fn decode_client_event(text: &str) -> Result<ClientEvent, ProtocolError> {
    Ok(serde_json::from_str(text)?)
}

pub fn encode_server_event(event: &ServerEvent) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(event)?)
}

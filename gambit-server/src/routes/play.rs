//! Game WebSocket
//!
//! `GET /api/play/{game_id}?account=<id>&name=<display name>` upgrades to a
//! socket seated in that game's lobby. The session id and the identity are
//! checked before the upgrade, so a bad request never reaches a lobby.
//!
//! Any frame that is not a valid move from the side to move closes the
//! connection without a reply.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        FromRequestParts, Path, Query, State,
    },
    http::{request::Parts, StatusCode},
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::lobby::LobbyError;
use crate::protocol::{
    decode_client_event, encode_server_event, Account, ClientEvent, GameId, ProtocolError,
};
use crate::state::{lock, ServerState, Session};

// ============================================================================
// EXTRACTORS
// ============================================================================

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for GameId {
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| StatusCode::NOT_FOUND)?;
        GameId::parse(&raw).map_err(|err| {
            tracing::debug!("Rejecting upgrade: {}", err);
            StatusCode::NOT_FOUND
        })
    }
}

#[derive(Deserialize)]
struct IdentityQuery {
    account: Option<String>,
    name: Option<String>,
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Account {
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(query) = Query::<IdentityQuery>::from_request_parts(parts, state)
            .await
            .map_err(|_| StatusCode::UNAUTHORIZED)?;
        let id = query.account.as_deref().unwrap_or_default();
        Account::new(id, query.name.as_deref()).map_err(|err| {
            tracing::debug!("Rejecting upgrade: {}", err);
            StatusCode::UNAUTHORIZED
        })
    }
}

// ============================================================================
// HANDLER
// ============================================================================

pub async fn play_handler(
    game_id: GameId,
    State(state): State<Arc<ServerState>>,
    account: Account,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, game_id, account))
}

/// Why a connection was cut
#[derive(Debug, thiserror::Error)]
enum Violation {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Lobby(#[from] LobbyError),
}

async fn handle_socket(socket: WebSocket, state: Arc<ServerState>, game_id: GameId, account: Account) {
    let (mut sink, mut stream) = socket.split();
    let (outbox, mut inbox) = mpsc::unbounded_channel();

    let session = match state.connect(&game_id, account, outbox) {
        Ok(session) => session,
        Err(err) => {
            tracing::warn!("Closing connection to {}: {}", game_id, err);
            let _ = sink.close().await;
            return;
        }
    };

    // Ends once the lobby drops the connection's outbox
    let writer = tokio::spawn(async move {
        while let Some(event) = inbox.recv().await {
            let text = match encode_server_event(&event) {
                Ok(text) => text,
                Err(err) => {
                    tracing::warn!("Dropping unencodable event: {}", err);
                    continue;
                }
            };
            if sink.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    while let Some(frame) = stream.next().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(err) => {
                tracing::debug!("Connection {} read error: {}", session.connection, err);
                break;
            }
        };
        match dispatch(&session, frame) {
            Ok(true) => {}
            Ok(false) => break,
            Err(violation) => {
                tracing::warn!(
                    "Lobby {}: closing connection {}: {}",
                    session.game_id,
                    session.connection,
                    violation
                );
                break;
            }
        }
    }

    state.release(&session);
    if let Err(err) = writer.await {
        tracing::warn!("Writer for connection {} failed: {}", session.connection, err);
    }
}

/// Handle one inbound frame. `Ok(false)` means the client closed.
fn dispatch(session: &Session, frame: Message) -> Result<bool, Violation> {
    match frame {
        Message::Text(text) => {
            let ClientEvent::Move(mv) = decode_client_event(&text)?;
            tracing::debug!("Lobby {}: {} plays {}", session.game_id, session.connection, mv);
            lock(&session.lobby).handle_move(session.connection, mv)?;
            Ok(true)
        }
        Message::Binary(_) => Err(ProtocolError::BinaryFrame.into()),
        Message::Ping(_) | Message::Pong(_) => Ok(true),
        Message::Close(_) => Ok(false),
    }
}

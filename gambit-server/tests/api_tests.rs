//! Integration tests for gambit-server routes

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use gambit_server::{create_router, Account, GameId, ServerConfig, ServerEvent, ServerState};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tower::ServiceExt;

fn test_app(state: Arc<ServerState>) -> axum::Router {
    let config = ServerConfig::default();
    create_router(&config, state)
}

async fn get(app: axum::Router, uri: &str) -> axum::response::Response {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_status_endpoint() {
    let state = Arc::new(ServerState::new());
    let response = get(test_app(Arc::clone(&state)), "/api/status").await;

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(json["status"], "ok");
    assert_eq!(json["engine"], "rust");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(json["lobbies"], 0);
}

#[tokio::test]
async fn test_status_counts_lobbies() {
    let state = Arc::new(ServerState::new());
    let (tx, _rx) = mpsc::unbounded_channel::<ServerEvent>();
    let _session = state
        .connect(
            &GameId::parse("abc").unwrap(),
            Account::new("alice", None).unwrap(),
            tx,
        )
        .unwrap();

    let response = get(test_app(state), "/api/status").await;
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["lobbies"], 1);
}

#[tokio::test]
async fn test_bad_game_id_is_not_found() {
    for uri in [
        "/api/play/ABC?account=alice",
        "/api/play/abcd?account=alice",
        "/api/play/a-c?account=alice",
    ] {
        let response = get(test_app(Arc::new(ServerState::new())), uri).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", uri);
    }
}

#[tokio::test]
async fn test_missing_identity_is_unauthorized() {
    for uri in [
        "/api/play/abc",
        "/api/play/abc?account=",
        "/api/play/abc?account=bad%20id",
        "/api/play/abc?account=alice&name=x",
    ] {
        let response = get(test_app(Arc::new(ServerState::new())), uri).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
    }
}

#[tokio::test]
async fn test_plain_get_is_refused_without_seating() {
    let state = Arc::new(ServerState::new());
    let response = get(
        test_app(Arc::clone(&state)),
        "/api/play/abc?account=alice&name=Alice",
    )
    .await;

    let status = response.status();
    assert!(status.is_client_error(), "{}", status);
    assert_ne!(status, StatusCode::NOT_FOUND);
    assert_ne!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(state.lobby_count(), 0);
}

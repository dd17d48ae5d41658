use std::sync::Arc;

use axum::{
    extract::{
        Query, State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
};
use bson::oid::ObjectId;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{error::ApiError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct WsParams {
    pub user_id: String,
}

pub async fn ws_upgrade(
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    let user_id = ObjectId::parse_str(&params.user_id)
        .map_err(|_| ApiError::BadRequest("Invalid user_id".to_string()))?;

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, user_id)))
}

async fn handle_socket(socket: WebSocket, state: AppState, user_id: ObjectId) {
    let connection_id = Uuid::new_v4();
    info!(?user_id, %connection_id, "WebSocket connected");

    let (sender, mut receiver) = socket.split();
    let sender = Arc::new(Mutex::new(sender));

    // Register as the user's single tracked channel; any prior
    // connection for this user stops receiving pushes from here on.
    state
        .presence
        .register(user_id, connection_id, sender.clone());

    {
        let msg = serde_json::json!({
            "event": "connected",
            "data": { "user_id": user_id.to_hex() },
        });
        let mut guard = sender.lock().await;
        let _ = guard
            .send(Message::text(serde_json::to_string(&msg).unwrap_or_default()))
            .await;
    }

    // Pushes flow server -> client; the read loop only services
    // keepalives and shutdown.
    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Ping(data)) => {
                let mut guard = sender.lock().await;
                let _ = guard.send(Message::Pong(data)).await;
            }
            Ok(Message::Close(_)) => {
                break;
            }
            Err(e) => {
                warn!(?user_id, %connection_id, %e, "WebSocket error");
                break;
            }
            _ => {}
        }
    }

    // Removes only this connection's mapping; if a newer connection
    // already replaced it, the registry is untouched.
    state.presence.unregister(connection_id);

    info!(?user_id, %connection_id, "WebSocket disconnected");
}

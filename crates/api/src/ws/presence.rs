use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use bson::oid::ObjectId;
use crewhub_services::{Presence, PresenceRegistry};
use futures::{SinkExt, stream::SplitSink};
use tokio::sync::Mutex;
use tracing::{debug, warn};

pub type WsSender = Arc<Mutex<SplitSink<WebSocket, Message>>>;

/// WebSocket-backed push channel for the fan-out service. A user
/// without a live connection is skipped silently; send errors are
/// logged and swallowed (the notification is already in the ledger and
/// will be picked up on the next inbox fetch).
pub struct WsPresence {
    registry: Arc<PresenceRegistry<WsSender>>,
}

impl WsPresence {
    pub fn new(registry: Arc<PresenceRegistry<WsSender>>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl Presence for WsPresence {
    async fn emit(&self, user_id: ObjectId, event: &str, payload: &serde_json::Value) {
        let Some(sender) = self.registry.sender_of(&user_id) else {
            return;
        };

        let frame = serde_json::json!({ "event": event, "data": payload });
        let text = serde_json::to_string(&frame).unwrap_or_default();

        let mut guard = sender.lock().await;
        if let Err(e) = guard.send(Message::text(text)).await {
            warn!(?user_id, %e, "Failed to push WS event");
        } else {
            debug!(?user_id, event, "WS event pushed");
        }
    }
}

use async_trait::async_trait;
use bson::oid::ObjectId;
use dashmap::DashMap;
use serde_json::Value;
use uuid::Uuid;

/// Best-effort real-time push capability injected into the fan-out
/// service. Emitting to a user with no live channel is a silent no-op;
/// delivery failure is never observable to the caller.
#[async_trait]
pub trait Presence: Send + Sync {
    async fn emit(&self, user_id: ObjectId, event: &str, payload: &Value);
}

/// Process-local map of user id -> live delivery channel. At most one
/// channel is tracked per user: registering a second connection evicts
/// the first from the registry's view (the older socket keeps running
/// but stops receiving pushes). Nothing here survives a restart.
///
/// Generic over the channel handle so the semantics are testable
/// without a live socket.
pub struct PresenceRegistry<S> {
    connections: DashMap<ObjectId, Channel<S>>,
}

#[derive(Debug, Clone)]
pub struct Channel<S> {
    pub connection_id: Uuid,
    pub sender: S,
}

impl<S: Clone> PresenceRegistry<S> {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
        }
    }

    /// Track `sender` as the user's single live channel, replacing any
    /// prior mapping for that user.
    pub fn register(&self, user_id: ObjectId, connection_id: Uuid, sender: S) {
        self.connections.insert(
            user_id,
            Channel {
                connection_id,
                sender,
            },
        );
    }

    /// Drop whichever mapping holds `connection_id`. A connection that
    /// was already evicted by a newer register is not found and nothing
    /// changes.
    pub fn unregister(&self, connection_id: Uuid) {
        self.connections
            .retain(|_, channel| channel.connection_id != connection_id);
    }

    pub fn sender_of(&self, user_id: &ObjectId) -> Option<S> {
        self.connections.get(user_id).map(|c| c.sender.clone())
    }

    pub fn online_user_ids(&self) -> Vec<ObjectId> {
        self.connections.iter().map(|r| *r.key()).collect()
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

impl<S: Clone> Default for PresenceRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}

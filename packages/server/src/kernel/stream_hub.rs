//! In-process pub/sub hub for lobby updates.
//!
//! One broadcast channel per lobby. The service publishes a `LobbyUpdate`
//! after every committed mutation; SSE subscribers forward them to clients.
//! Clients that poll instead never touch this.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

use crate::common::LobbyId;
use crate::domains::lobby::events::LobbyEvent;
use crate::domains::lobby::models::LobbyStatus;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LobbyUpdate {
    pub lobby_id: LobbyId,
    pub status: LobbyStatus,
    pub round: i32,
    /// Store version of the committed document.
    pub version: i64,
    pub events: Vec<LobbyEvent>,
}

/// Cloneable, thread-safe hub keyed by lobby.
#[derive(Clone)]
pub struct StreamHub {
    channels: Arc<RwLock<HashMap<LobbyId, broadcast::Sender<LobbyUpdate>>>>,
    capacity: usize,
}

impl StreamHub {
    /// Create a hub with the default capacity (64 updates per lobby).
    pub fn new() -> Self {
        Self::with_capacity(64)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
            capacity,
        }
    }

    /// Publish to a lobby's subscribers. No-op if nobody is listening.
    pub async fn publish(&self, update: LobbyUpdate) {
        let channels = self.channels.read().await;
        if let Some(tx) = channels.get(&update.lobby_id) {
            let _ = tx.send(update);
        }
    }

    pub async fn subscribe(&self, lobby_id: LobbyId) -> broadcast::Receiver<LobbyUpdate> {
        let mut channels = self.channels.write().await;
        channels
            .entry(lobby_id)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Drop channels nobody listens to any more.
    pub async fn cleanup(&self) {
        let mut channels = self.channels.write().await;
        channels.retain(|_, tx| tx.receiver_count() > 0);
    }
}

impl Default for StreamHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(lobby_id: LobbyId) -> LobbyUpdate {
        LobbyUpdate {
            lobby_id,
            status: LobbyStatus::Matching,
            round: 1,
            version: 3,
            events: vec![LobbyEvent::MatchingStarted { candidate_count: 4 }],
        }
    }

    #[tokio::test]
    async fn test_subscriber_receives_own_lobby_only() {
        let hub = StreamHub::new();
        let mine = LobbyId::new();
        let other = LobbyId::new();
        let mut rx = hub.subscribe(mine).await;

        hub.publish(update(other)).await;
        hub.publish(update(mine)).await;

        assert_eq!(rx.recv().await.unwrap().lobby_id, mine);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_noop() {
        let hub = StreamHub::new();
        hub.publish(update(LobbyId::new())).await;
        assert!(hub.channels.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_cleanup_drops_abandoned_channels() {
        let hub = StreamHub::new();
        let rx = hub.subscribe(LobbyId::new()).await;
        drop(rx);

        hub.cleanup().await;

        assert!(hub.channels.read().await.is_empty());
    }
}

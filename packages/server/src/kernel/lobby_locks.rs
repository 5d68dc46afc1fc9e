//! Per-lobby async mutexes.
//!
//! Serialises mutations of the same lobby inside one process so duplicate
//! triggers observe each other's committed result. Unrelated lobbies never
//! contend. Cross-process safety still comes from the store's version check.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OwnedMutexGuard;

use crate::common::LobbyId;

/// Idle entries are pruned once the map grows past this many lobbies.
const PRUNE_THRESHOLD: usize = 1024;

#[derive(Clone, Default)]
pub struct LobbyLocks {
    locks: Arc<Mutex<HashMap<LobbyId, Arc<tokio::sync::Mutex<()>>>>>,
}

impl LobbyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to one lobby. Released when the guard drops.
    pub async fn acquire(&self, lobby_id: LobbyId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            if locks.len() > PRUNE_THRESHOLD {
                locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            }
            locks.entry(lobby_id).or_default().clone()
        };

        lock.lock_owned().await
    }

    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_lobby_is_exclusive() {
        let locks = LobbyLocks::new();
        let lobby_id = LobbyId::new();

        let guard = locks.acquire(lobby_id).await;
        let pending = tokio::time::timeout(Duration::from_millis(50), locks.acquire(lobby_id)).await;
        assert!(pending.is_err());

        drop(guard);
        let reacquired = tokio::time::timeout(Duration::from_millis(50), locks.acquire(lobby_id)).await;
        assert!(reacquired.is_ok());
    }

    #[tokio::test]
    async fn test_different_lobbies_do_not_contend() {
        let locks = LobbyLocks::new();

        let _first = locks.acquire(LobbyId::new()).await;
        let second = tokio::time::timeout(Duration::from_millis(50), locks.acquire(LobbyId::new())).await;

        assert!(second.is_ok());
        assert_eq!(locks.len(), 2);
    }
}

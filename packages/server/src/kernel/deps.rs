//! Server dependencies (using traits for testability)
//!
//! Central container handed to the lobby service. External collaborators
//! sit behind `Base*` traits so tests can swap in in-memory versions.

use std::sync::Arc;
use std::time::Duration;

use crate::domains::lobby::machines::HostPolicy;
use crate::kernel::{BaseCandidateSupplier, BaseLobbyStore, BaseVisitStore, LobbyLocks, StreamHub};

/// Tunables for lobby behaviour.
#[derive(Debug, Clone, Copy)]
pub struct LobbySettings {
    /// Upper bound on the candidate snapshot.
    pub max_candidates: usize,
    /// Longest a candidate fetch may hold the lobby lock.
    pub candidate_timeout: Duration,
    pub host_policy: HostPolicy,
}

impl Default for LobbySettings {
    fn default() -> Self {
        Self {
            max_candidates: 20,
            candidate_timeout: Duration::from_secs(10),
            host_policy: HostPolicy::Fixed,
        }
    }
}

#[derive(Clone)]
pub struct ServerDeps {
    pub lobby_store: Arc<dyn BaseLobbyStore>,
    pub visit_store: Arc<dyn BaseVisitStore>,
    pub candidates: Arc<dyn BaseCandidateSupplier>,
    /// In-process pub/sub hub for lobby update streams
    pub stream_hub: StreamHub,
    pub locks: LobbyLocks,
    pub settings: LobbySettings,
}

impl ServerDeps {
    pub fn new(
        lobby_store: Arc<dyn BaseLobbyStore>,
        visit_store: Arc<dyn BaseVisitStore>,
        candidates: Arc<dyn BaseCandidateSupplier>,
        settings: LobbySettings,
    ) -> Self {
        Self {
            lobby_store,
            visit_store,
            candidates,
            stream_hub: StreamHub::new(),
            locks: LobbyLocks::new(),
            settings,
        }
    }
}

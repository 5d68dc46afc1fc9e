// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Lobby rules live in domains/lobby/machines and only see these through
// the service layer.
//
// Naming convention: Base* for trait names (e.g., BaseLobbyStore)

use anyhow::Result;
use async_trait::async_trait;

use crate::common::{LobbyId, UserId};
use crate::domains::lobby::models::{GroupPreferences, Lobby, Restaurant};
use crate::domains::visits::Visit;

// =============================================================================
// Lobby Store Trait (Infrastructure - per-lobby document with versioning)
// =============================================================================

/// A lobby document together with the version it was read at.
#[derive(Debug, Clone)]
pub struct VersionedLobby {
    pub lobby: Lobby,
    pub version: i64,
}

#[async_trait]
pub trait BaseLobbyStore: Send + Sync {
    /// Insert a new lobby at version 1.
    ///
    /// Returns `false` (and stores nothing) if its code collides with an
    /// active lobby.
    async fn insert(&self, lobby: &Lobby) -> Result<bool>;

    async fn find(&self, id: LobbyId) -> Result<Option<VersionedLobby>>;

    /// Resolve a join code among active lobbies only.
    async fn find_active_by_code(&self, code: &str) -> Result<Option<VersionedLobby>>;

    async fn code_in_use(&self, code: &str) -> Result<bool>;

    /// Replace the document iff it is still at `expected_version`.
    ///
    /// Returns `false` when another writer committed first, or when the
    /// document would take a join code held by another active lobby. Nothing
    /// is written in either case.
    async fn compare_and_swap(&self, lobby: &Lobby, expected_version: i64) -> Result<bool>;
}

// =============================================================================
// Visit Store Trait (Infrastructure - user history collaborator)
// =============================================================================

#[async_trait]
pub trait BaseVisitStore: Send + Sync {
    /// Record a visit. Returns `false` if one already exists for the
    /// visit's `(lobby_id, round)`.
    async fn record(&self, visit: &Visit) -> Result<bool>;

    /// Visits the user took part in, newest first.
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Visit>>;
}

// =============================================================================
// Candidate Supplier Trait (Infrastructure - search + recommendation ranking)
// =============================================================================

#[async_trait]
pub trait BaseCandidateSupplier: Send + Sync {
    /// Ranked candidates for the group, at most `limit` of them.
    async fn candidates(&self, preferences: &GroupPreferences, limit: usize) -> Result<Vec<Restaurant>>;
}

// TestDependencies - in-memory implementations for testing
//
// Provides stores and a candidate supplier that can be injected into
// ServerDeps for unit and integration tests without Postgres.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{
    BaseCandidateSupplier, BaseLobbyStore, BaseVisitStore, LobbySettings, ServerDeps,
    VersionedLobby,
};
use crate::common::{LobbyId, UserId};
use crate::domains::lobby::models::{GroupPreferences, Lobby, Restaurant};
use crate::domains::visits::Visit;

// =============================================================================
// Memory Lobby Store
// =============================================================================

#[derive(Default)]
pub struct MemoryLobbyStore {
    lobbies: Mutex<HashMap<LobbyId, (Lobby, i64)>>,
    /// Remaining swaps that lose to a simulated concurrent writer.
    interference: AtomicUsize,
    swap_conflicts: AtomicUsize,
}

impl MemoryLobbyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` compare-and-swap calls lose to another writer.
    pub fn interfere(&self, n: usize) {
        self.interference.store(n, Ordering::SeqCst);
    }

    /// Number of swaps rejected because the version had moved.
    pub fn swap_conflicts(&self) -> usize {
        self.swap_conflicts.load(Ordering::SeqCst)
    }

    pub fn version_of(&self, id: LobbyId) -> Option<i64> {
        self.lobbies.lock().unwrap().get(&id).map(|(_, v)| *v)
    }

    fn code_taken(lobbies: &HashMap<LobbyId, (Lobby, i64)>, code: &str, except: LobbyId) -> bool {
        lobbies
            .values()
            .any(|(l, _)| l.id != except && l.code == code && l.is_active())
    }
}

#[async_trait]
impl BaseLobbyStore for MemoryLobbyStore {
    async fn insert(&self, lobby: &Lobby) -> Result<bool> {
        let mut lobbies = self.lobbies.lock().unwrap();
        if lobbies.contains_key(&lobby.id) || Self::code_taken(&lobbies, &lobby.code, lobby.id) {
            return Ok(false);
        }
        lobbies.insert(lobby.id, (lobby.clone(), 1));
        Ok(true)
    }

    async fn find(&self, id: LobbyId) -> Result<Option<VersionedLobby>> {
        Ok(self
            .lobbies
            .lock()
            .unwrap()
            .get(&id)
            .map(|(lobby, version)| VersionedLobby {
                lobby: lobby.clone(),
                version: *version,
            }))
    }

    async fn find_active_by_code(&self, code: &str) -> Result<Option<VersionedLobby>> {
        Ok(self
            .lobbies
            .lock()
            .unwrap()
            .values()
            .find(|(lobby, _)| lobby.code == code && lobby.is_active())
            .map(|(lobby, version)| VersionedLobby {
                lobby: lobby.clone(),
                version: *version,
            }))
    }

    async fn code_in_use(&self, code: &str) -> Result<bool> {
        let lobbies = self.lobbies.lock().unwrap();
        Ok(lobbies
            .values()
            .any(|(lobby, _)| lobby.code == code && lobby.is_active()))
    }

    async fn compare_and_swap(&self, lobby: &Lobby, expected_version: i64) -> Result<bool> {
        let mut lobbies = self.lobbies.lock().unwrap();

        let entry = lobbies
            .get_mut(&lobby.id)
            .ok_or_else(|| anyhow!("lobby {} does not exist", lobby.id))?;

        let interfering = self
            .interference
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if interfering {
            entry.1 += 1;
        }

        if entry.1 != expected_version {
            self.swap_conflicts.fetch_add(1, Ordering::SeqCst);
            return Ok(false);
        }

        if lobby.is_active() && Self::code_taken(&lobbies, &lobby.code, lobby.id) {
            self.swap_conflicts.fetch_add(1, Ordering::SeqCst);
            return Ok(false);
        }

        let entry = lobbies
            .get_mut(&lobby.id)
            .ok_or_else(|| anyhow!("lobby {} does not exist", lobby.id))?;
        *entry = (lobby.clone(), expected_version + 1);
        Ok(true)
    }
}

// =============================================================================
// Memory Visit Store
// =============================================================================

#[derive(Default)]
pub struct MemoryVisitStore {
    visits: Mutex<Vec<Visit>>,
    failures: AtomicUsize,
}

impl MemoryVisitStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<Visit> {
        self.visits.lock().unwrap().clone()
    }

    /// Fail the next `n` writes.
    pub fn fail_next(&self, n: usize) {
        self.failures.store(n, Ordering::SeqCst);
    }
}

#[async_trait]
impl BaseVisitStore for MemoryVisitStore {
    async fn record(&self, visit: &Visit) -> Result<bool> {
        let failing = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(anyhow!("visit history unavailable"));
        }

        let mut visits = self.visits.lock().unwrap();
        if visits
            .iter()
            .any(|v| v.lobby_id == visit.lobby_id && v.round == visit.round)
        {
            return Ok(false);
        }
        visits.push(visit.clone());
        Ok(true)
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Visit>> {
        let mut visits: Vec<Visit> = self
            .visits
            .lock()
            .unwrap()
            .iter()
            .filter(|v| v.participant_ids.contains(&user_id))
            .cloned()
            .collect();
        visits.sort_by(|a, b| b.visited_at.cmp(&a.visited_at));
        Ok(visits)
    }
}

// =============================================================================
// Mock Candidate Supplier
// =============================================================================

pub struct MockCandidateSupplier {
    restaurants: Mutex<Vec<Restaurant>>,
    calls: Mutex<Vec<GroupPreferences>>,
    failures: AtomicUsize,
    delay: Option<Duration>,
}

impl MockCandidateSupplier {
    pub fn new(restaurants: Vec<Restaurant>) -> Self {
        Self {
            restaurants: Mutex::new(restaurants),
            calls: Mutex::new(Vec::new()),
            failures: AtomicUsize::new(0),
            delay: None,
        }
    }

    /// Candidates "1".."=n" with plain defaults.
    pub fn numbered(n: usize) -> Self {
        Self::new((1..=n).map(|i| mock_restaurant(&i.to_string())).collect())
    }

    /// Sleep before answering, to widen race windows in tests.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Fail the next `n` requests.
    pub fn fail_next(&self, n: usize) {
        self.failures.store(n, Ordering::SeqCst);
    }

    pub fn set_restaurants(&self, restaurants: Vec<Restaurant>) {
        *self.restaurants.lock().unwrap() = restaurants;
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<GroupPreferences> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl BaseCandidateSupplier for MockCandidateSupplier {
    async fn candidates(&self, preferences: &GroupPreferences, limit: usize) -> Result<Vec<Restaurant>> {
        self.calls.lock().unwrap().push(preferences.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let failing = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(anyhow!("candidate service unavailable"));
        }

        Ok(self
            .restaurants
            .lock()
            .unwrap()
            .iter()
            .take(limit)
            .cloned()
            .collect())
    }
}

pub fn mock_restaurant(id: &str) -> Restaurant {
    Restaurant {
        id: id.to_string(),
        name: format!("Restaurant {}", id),
        cuisine: "american".to_string(),
        price_tier: 2,
        rating: 4.0,
        description: format!("Test restaurant {}", id),
        dietary_tags: Vec::new(),
        image_url: None,
        distance_miles: Some(1.0),
        tags: Vec::new(),
    }
}

// =============================================================================
// TestDependencies
// =============================================================================

/// In-memory wiring of everything the lobby service needs.
pub struct TestDependencies {
    pub lobby_store: Arc<MemoryLobbyStore>,
    pub visit_store: Arc<MemoryVisitStore>,
    pub candidates: Arc<MockCandidateSupplier>,
    pub settings: LobbySettings,
}

impl TestDependencies {
    pub fn new() -> Self {
        Self {
            lobby_store: Arc::new(MemoryLobbyStore::new()),
            visit_store: Arc::new(MemoryVisitStore::new()),
            candidates: Arc::new(MockCandidateSupplier::numbered(5)),
            settings: LobbySettings::default(),
        }
    }

    pub fn with_candidates(mut self, supplier: MockCandidateSupplier) -> Self {
        self.candidates = Arc::new(supplier);
        self
    }

    pub fn with_settings(mut self, settings: LobbySettings) -> Self {
        self.settings = settings;
        self
    }

    /// Fresh `ServerDeps` over the shared stores. Each call gets its own lock
    /// table and hub, like a separate server process.
    pub fn server_deps(&self) -> ServerDeps {
        ServerDeps::new(
            self.lobby_store.clone(),
            self.visit_store.clone(),
            self.candidates.clone(),
            self.settings,
        )
    }
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}

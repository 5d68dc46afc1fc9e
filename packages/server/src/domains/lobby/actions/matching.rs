//! Matching phase actions - start matching, read the snapshot, swipe.

use anyhow::anyhow;
use tracing::{debug, info, warn};

use super::commit::{commit_locked, load, mutate};
use crate::common::{LobbyId, UserId};
use crate::domains::lobby::data::{RestaurantsData, SwipeProgressData};
use crate::domains::lobby::errors::LobbyError;
use crate::domains::lobby::machines::{ledger, lifecycle, require_participant, StartCheck};
use crate::domains::lobby::models::{Lobby, SwipeDirection};
use crate::kernel::ServerDeps;

/// Host-only `waiting -> matching`.
///
/// Holds the lobby lock across the candidate fetch so a duplicate trigger
/// waits, then finds the lobby already matching and returns it unchanged.
/// The fetch is bounded by `candidate_timeout`; on expiry the lobby stays
/// waiting and the lock is released.
pub async fn start_matching(
    lobby_id: LobbyId,
    user_id: UserId,
    deps: &ServerDeps,
) -> Result<Lobby, LobbyError> {
    let _guard = deps.locks.acquire(lobby_id).await;

    let current = load(lobby_id, deps).await?.lobby;
    let preferences = match lifecycle::check_start_matching(&current, user_id)? {
        StartCheck::Ready(preferences) => preferences,
        StartCheck::AlreadyStarted => {
            debug!(lobby_id = %lobby_id, "Matching already started");
            return Ok(current);
        }
    };

    let max_candidates = deps.settings.max_candidates;
    info!(
        lobby_id = %lobby_id,
        participants = preferences.participant_count,
        max_candidates,
        "Fetching restaurant candidates"
    );
    let fetch = deps.candidates.candidates(&preferences, max_candidates);
    let candidates = match tokio::time::timeout(deps.settings.candidate_timeout, fetch).await {
        Ok(result) => result?,
        Err(_) => {
            warn!(
                lobby_id = %lobby_id,
                timeout_ms = deps.settings.candidate_timeout.as_millis() as u64,
                "Candidate fetch timed out"
            );
            return Err(LobbyError::Internal(anyhow!(
                "candidate fetch timed out after {:?}",
                deps.settings.candidate_timeout
            )));
        }
    };

    let committed = commit_locked(
        lobby_id,
        "start_matching",
        |lobby| lifecycle::begin_matching(lobby, user_id, candidates.clone(), max_candidates),
        deps,
    )
    .await?;

    Ok(committed.lobby)
}

/// The round's candidate snapshot.
pub async fn restaurants(
    lobby_id: LobbyId,
    user_id: UserId,
    deps: &ServerDeps,
) -> Result<RestaurantsData, LobbyError> {
    let lobby = load(lobby_id, deps).await?.lobby;
    require_participant(&lobby, user_id)?;

    Ok(RestaurantsData {
        status: lobby.status,
        round: lobby.round,
        restaurants: lobby.restaurants,
    })
}

pub async fn swipe(
    lobby_id: LobbyId,
    user_id: UserId,
    restaurant_id: &str,
    direction: SwipeDirection,
    deps: &ServerDeps,
) -> Result<Lobby, LobbyError> {
    let committed = mutate(
        lobby_id,
        "swipe",
        |lobby| ledger::swipe(lobby, user_id, restaurant_id, direction),
        deps,
    )
    .await?;

    Ok(committed.lobby)
}

pub async fn swipe_progress(
    lobby_id: LobbyId,
    user_id: UserId,
    deps: &ServerDeps,
) -> Result<SwipeProgressData, LobbyError> {
    let lobby = load(lobby_id, deps).await?.lobby;
    require_participant(&lobby, user_id)?;
    Ok(SwipeProgressData::from(&lobby))
}

//! Membership and lifecycle actions - create, join, get, leave, reset.

use tracing::{debug, info};

use super::commit::{commit_locked, load, mutate};
use crate::common::{LobbyId, UserId};
use crate::domains::lobby::code::{is_valid_code, random_code, MAX_CODE_ATTEMPTS};
use crate::domains::lobby::errors::LobbyError;
use crate::domains::lobby::machines::{lifecycle, registry};
use crate::domains::lobby::models::{Lobby, Participant};
use crate::kernel::{BaseLobbyStore, ServerDeps};

/// Create a lobby with the caller as host and a fresh join code.
pub async fn create_lobby(
    user_id: UserId,
    name: String,
    deps: &ServerDeps,
) -> Result<Lobby, LobbyError> {
    info!(user_id = %user_id, "Creating lobby");

    for attempt in 1..=MAX_CODE_ATTEMPTS {
        let code =
            allocate_code(deps.lobby_store.as_ref(), || random_code(&mut rand::thread_rng())).await?;
        let lobby = Lobby::new(code, user_id, name.clone());

        // The check above can race another creator; insert is the real guard.
        if deps.lobby_store.insert(&lobby).await? {
            info!(lobby_id = %lobby.id, code = %lobby.code, "Lobby created");
            return Ok(lobby);
        }

        debug!(attempt, "Lobby code taken at insert, drawing another");
    }

    Err(code_exhausted())
}

/// Draw codes until one is free among active lobbies.
pub async fn allocate_code<F>(store: &dyn BaseLobbyStore, mut draw: F) -> Result<String, LobbyError>
where
    F: FnMut() -> String,
{
    for _ in 0..MAX_CODE_ATTEMPTS {
        let code = draw();
        if !store.code_in_use(&code).await? {
            return Ok(code);
        }
        debug!(code = %code, "Lobby code collision");
    }

    Err(code_exhausted())
}

fn code_exhausted() -> LobbyError {
    LobbyError::Conflict("Could not allocate a unique lobby code, please try again".to_string())
}

/// Join by code. Joining a lobby you already belong to returns your existing
/// membership.
pub async fn join_lobby(
    code: &str,
    user_id: UserId,
    name: String,
    deps: &ServerDeps,
) -> Result<(Lobby, Participant), LobbyError> {
    let code = code.trim();
    if !is_valid_code(code) {
        return Err(LobbyError::Validation(
            "Lobby codes are exactly 6 digits".to_string(),
        ));
    }

    let found = deps
        .lobby_store
        .find_active_by_code(code)
        .await?
        .ok_or_else(|| LobbyError::NotFound(format!("No active lobby with code {}", code)))?;

    let committed = mutate(
        found.lobby.id,
        "join",
        |lobby| registry::join(lobby, user_id, name.clone()),
        deps,
    )
    .await?;

    let participant = committed
        .lobby
        .participant(user_id)
        .cloned()
        .ok_or_else(|| LobbyError::Internal(anyhow::anyhow!("joined participant missing")))?;

    Ok((committed.lobby, participant))
}

pub async fn get_lobby(lobby_id: LobbyId, deps: &ServerDeps) -> Result<Lobby, LobbyError> {
    Ok(load(lobby_id, deps).await?.lobby)
}

pub async fn leave_lobby(
    lobby_id: LobbyId,
    user_id: UserId,
    deps: &ServerDeps,
) -> Result<Lobby, LobbyError> {
    let policy = deps.settings.host_policy;
    let committed = mutate(
        lobby_id,
        "leave",
        |lobby| registry::leave(lobby, user_id, policy),
        deps,
    )
    .await?;

    info!(lobby_id = %lobby_id, user_id = %user_id, remaining = committed.lobby.participants.len(), "Participant left");
    Ok(committed.lobby)
}

/// Host-only return to the waiting room.
///
/// A completed lobby gave up its code; if another lobby has claimed it since,
/// the reopened lobby gets a new one.
pub async fn reset_lobby(
    lobby_id: LobbyId,
    user_id: UserId,
    deps: &ServerDeps,
) -> Result<Lobby, LobbyError> {
    let _guard = deps.locks.acquire(lobby_id).await;

    let current = load(lobby_id, deps).await?.lobby;
    let fresh_code = if !current.is_active() && deps.lobby_store.code_in_use(&current.code).await? {
        Some(allocate_code(deps.lobby_store.as_ref(), || random_code(&mut rand::thread_rng())).await?)
    } else {
        None
    };

    let committed = commit_locked(
        lobby_id,
        "reset",
        |lobby| {
            let events = lifecycle::reset(lobby, user_id)?;
            if let Some(code) = &fresh_code {
                lobby.code = code.clone();
            }
            Ok(events)
        },
        deps,
    )
    .await?;

    if let Some(code) = &fresh_code {
        info!(lobby_id = %lobby_id, code = %code, "Reopened lobby under a new code");
    }
    Ok(committed.lobby)
}

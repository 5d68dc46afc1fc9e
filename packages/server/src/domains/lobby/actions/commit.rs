//! Read-modify-write pipeline shared by every lobby mutation.
//!
//! 1. take the per-lobby lock (in-process serialisation)
//! 2. load the document and its version
//! 3. apply a pure transition from `machines`
//! 4. compare-and-swap; on a lost swap, go back to 2
//!
//! A rejected transition or an exhausted retry budget writes nothing.

use tracing::warn;

use crate::common::LobbyId;
use crate::domains::lobby::effects::{lobby_effect, Committed};
use crate::domains::lobby::errors::LobbyError;
use crate::domains::lobby::machines::Transition;
use crate::domains::lobby::models::Lobby;
use crate::kernel::{ServerDeps, VersionedLobby};

pub const MAX_COMMIT_ATTEMPTS: usize = 3;

pub async fn load(lobby_id: LobbyId, deps: &ServerDeps) -> Result<VersionedLobby, LobbyError> {
    deps.lobby_store
        .find(lobby_id)
        .await?
        .ok_or_else(LobbyError::lobby_not_found)
}

/// Lock, then commit.
pub async fn mutate<F>(
    lobby_id: LobbyId,
    operation: &str,
    apply: F,
    deps: &ServerDeps,
) -> Result<Committed, LobbyError>
where
    F: FnMut(&mut Lobby) -> Transition,
{
    let _guard = deps.locks.acquire(lobby_id).await;
    commit_locked(lobby_id, operation, apply, deps).await
}

/// Commit with the caller already holding the lobby lock.
///
/// `apply` may run more than once; it must only depend on the document it is
/// given. Transitions that produce no events are treated as no-ops and are not
/// written.
pub async fn commit_locked<F>(
    lobby_id: LobbyId,
    operation: &str,
    mut apply: F,
    deps: &ServerDeps,
) -> Result<Committed, LobbyError>
where
    F: FnMut(&mut Lobby) -> Transition,
{
    for attempt in 1..=MAX_COMMIT_ATTEMPTS {
        let VersionedLobby { mut lobby, version } = load(lobby_id, deps).await?;

        let events = apply(&mut lobby)?;
        if events.is_empty() {
            return Ok(Committed {
                lobby,
                version,
                events,
            });
        }

        lobby.touch();
        if deps.lobby_store.compare_and_swap(&lobby, version).await? {
            let committed = Committed {
                lobby,
                version: version + 1,
                events,
            };
            lobby_effect(&committed, deps).await;
            return Ok(committed);
        }

        warn!(
            lobby_id = %lobby_id,
            operation,
            attempt,
            "Lobby changed underneath, retrying"
        );
    }

    Err(LobbyError::Conflict(
        "The lobby changed while your request was being applied, please try again".to_string(),
    ))
}

//! Vibe check actions.

use super::commit::{load, mutate};
use crate::common::{LobbyId, UserId};
use crate::domains::lobby::data::VibeStatusData;
use crate::domains::lobby::errors::LobbyError;
use crate::domains::lobby::machines::{registry, require_participant};
use crate::domains::lobby::models::{Lobby, VibeCheck};
use crate::kernel::ServerDeps;

pub async fn submit_vibe(
    lobby_id: LobbyId,
    user_id: UserId,
    vibe: VibeCheck,
    deps: &ServerDeps,
) -> Result<Lobby, LobbyError> {
    let committed = mutate(
        lobby_id,
        "submit_vibe",
        |lobby| registry::submit_vibe(lobby, user_id, vibe),
        deps,
    )
    .await?;

    Ok(committed.lobby)
}

pub async fn vibe_status(
    lobby_id: LobbyId,
    user_id: UserId,
    deps: &ServerDeps,
) -> Result<VibeStatusData, LobbyError> {
    let lobby = load(lobby_id, deps).await?.lobby;
    require_participant(&lobby, user_id)?;
    Ok(VibeStatusData::for_caller(&lobby, user_id))
}

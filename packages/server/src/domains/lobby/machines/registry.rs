//! Participant registry and vibe aggregation.

use super::{require_participant, settle, HostPolicy, Transition};
use crate::common::UserId;
use crate::domains::lobby::errors::LobbyError;
use crate::domains::lobby::events::LobbyEvent;
use crate::domains::lobby::models::{Lobby, LobbyStatus, Participant, VibeCheck};

/// Add a participant. Re-joining returns the existing membership unchanged.
pub fn join(lobby: &mut Lobby, user_id: UserId, name: String) -> Transition {
    if lobby.is_participant(user_id) {
        return Ok(Vec::new());
    }

    if lobby.status != LobbyStatus::Waiting {
        return Err(LobbyError::InvalidState(
            "This lobby is no longer accepting new participants".to_string(),
        ));
    }

    lobby.participants.push(Participant::new(user_id, name, false));
    Ok(vec![LobbyEvent::ParticipantJoined { user_id }])
}

/// Remove a participant together with their round data.
pub fn leave(lobby: &mut Lobby, user_id: UserId, policy: HostPolicy) -> Transition {
    require_participant(lobby, user_id)?;

    let was_host = lobby.is_host(user_id);
    lobby.participants.retain(|p| p.user_id != user_id);
    lobby.swipes.retain(|s| s.user_id != user_id);
    lobby.votes.retain(|v| v.user_id != user_id);

    let new_host = match policy {
        HostPolicy::OldestRemaining if was_host => promote_oldest(lobby),
        _ => None,
    };

    let mut events = vec![LobbyEvent::ParticipantLeft { user_id, new_host }];
    if !lobby.participants.is_empty() {
        events.extend(settle(lobby));
    }
    Ok(events)
}

fn promote_oldest(lobby: &mut Lobby) -> Option<UserId> {
    let next = lobby.participants.iter_mut().min_by_key(|p| p.joined_at)?;
    next.is_host = true;
    let user_id = next.user_id;
    lobby.host_id = user_id;
    Some(user_id)
}

/// Record (or overwrite) a participant's vibe check and mark them ready.
pub fn submit_vibe(lobby: &mut Lobby, user_id: UserId, vibe: VibeCheck) -> Transition {
    require_participant(lobby, user_id)?;

    if lobby.status != LobbyStatus::Waiting {
        return Err(LobbyError::InvalidState(
            "Vibe checks are closed once matching has started".to_string(),
        ));
    }

    if let Some(participant) = lobby.participant_mut(user_id) {
        participant.vibe = Some(vibe);
        participant.is_ready = true;
    }

    Ok(vec![LobbyEvent::VibeSubmitted {
        user_id,
        all_ready: lobby.all_ready(),
    }])
}

//! Round lifecycle: starting matching and resetting.

use std::collections::HashSet;

use super::{require_host, Transition};
use crate::common::UserId;
use crate::domains::lobby::errors::LobbyError;
use crate::domains::lobby::events::LobbyEvent;
use crate::domains::lobby::models::{GroupPreferences, Lobby, LobbyStatus, Restaurant};

pub const MIN_PARTICIPANTS: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub enum StartCheck {
    /// Guards pass; fetch candidates for these preferences.
    Ready(GroupPreferences),
    /// A concurrent trigger already moved the lobby into matching.
    AlreadyStarted,
}

/// Evaluate the `waiting -> matching` guards without mutating anything.
pub fn check_start_matching(lobby: &Lobby, user_id: UserId) -> Result<StartCheck, LobbyError> {
    require_host(lobby, user_id, "start matching")?;

    match lobby.status {
        LobbyStatus::Waiting => {}
        LobbyStatus::Matching => return Ok(StartCheck::AlreadyStarted),
        other => {
            return Err(LobbyError::InvalidState(format!(
                "Matching can only start from the waiting room (lobby is {})",
                other
            )))
        }
    }

    if lobby.participants.len() < MIN_PARTICIPANTS {
        return Err(LobbyError::PreconditionFailed(format!(
            "At least {} participants are needed to start matching",
            MIN_PARTICIPANTS
        )));
    }

    if !lobby.all_ready() {
        let pending = lobby.participants.len() - lobby.ready_count();
        return Err(LobbyError::PreconditionFailed(format!(
            "{} participant(s) still need to finish the vibe check",
            pending
        )));
    }

    Ok(StartCheck::Ready(GroupPreferences::aggregate(
        lobby.participants.iter().filter_map(|p| p.vibe.as_ref()),
    )))
}

/// Snapshot the candidate list and move to `matching`.
///
/// Guards are re-checked against the document being committed; if another
/// trigger already started the round this is a no-op. Candidates are
/// de-duplicated by id (first occurrence wins) and capped at `max_candidates`.
pub fn begin_matching(
    lobby: &mut Lobby,
    user_id: UserId,
    candidates: Vec<Restaurant>,
    max_candidates: usize,
) -> Transition {
    if check_start_matching(lobby, user_id)? == StartCheck::AlreadyStarted {
        return Ok(Vec::new());
    }

    let mut seen = HashSet::new();
    let snapshot: Vec<Restaurant> = candidates
        .into_iter()
        .filter(|r| seen.insert(r.id.clone()))
        .take(max_candidates)
        .collect();

    if snapshot.is_empty() {
        return Err(LobbyError::PreconditionFailed(
            "No restaurants matched the group's vibe; adjust the vibe checks and try again"
                .to_string(),
        ));
    }

    let candidate_count = snapshot.len();
    lobby.restaurants = snapshot;
    lobby.swipes.clear();
    lobby.votes.clear();
    lobby.ballot.clear();
    lobby.full_ballot.clear();
    lobby.tied_restaurants = None;
    lobby.winning_restaurant = None;
    lobby.status = LobbyStatus::Matching;

    Ok(vec![LobbyEvent::MatchingStarted { candidate_count }])
}

/// Host-triggered return to the waiting room from any state.
///
/// Participants stay; everything belonging to the round is discarded and a
/// new round begins.
pub fn reset(lobby: &mut Lobby, user_id: UserId) -> Transition {
    require_host(lobby, user_id, "reset the lobby")?;

    lobby.status = LobbyStatus::Waiting;
    lobby.round += 1;
    lobby.restaurants.clear();
    lobby.swipes.clear();
    lobby.votes.clear();
    lobby.ballot.clear();
    lobby.full_ballot.clear();
    lobby.tied_restaurants = None;
    lobby.winning_restaurant = None;
    lobby.revote_count = 0;
    for participant in &mut lobby.participants {
        participant.is_ready = false;
        participant.vibe = None;
    }

    Ok(vec![LobbyEvent::Reset { round: lobby.round }])
}

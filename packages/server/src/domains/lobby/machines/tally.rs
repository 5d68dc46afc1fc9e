//! Vote tally and resolution.

use chrono::Utc;
use serde::Serialize;

use super::{require_host, require_participant, settle, Transition};
use crate::common::UserId;
use crate::domains::lobby::errors::LobbyError;
use crate::domains::lobby::events::LobbyEvent;
use crate::domains::lobby::models::{Lobby, LobbyStatus, RestaurantId, Vote};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tally {
    pub restaurant_id: RestaurantId,
    pub votes: usize,
}

/// Cast or change a vote. Votes stay mutable until the round resolves.
pub fn vote(lobby: &mut Lobby, user_id: UserId, restaurant_id: &str) -> Transition {
    require_participant(lobby, user_id)?;

    if lobby.status != LobbyStatus::Voting {
        return Err(LobbyError::InvalidState(format!(
            "Voting is not open (lobby is {})",
            lobby.status
        )));
    }

    if lobby.is_tied() {
        return Err(LobbyError::InvalidState(
            "Votes are tied; waiting for the host to start a revote".to_string(),
        ));
    }

    if !lobby.ballot.iter().any(|id| id == restaurant_id) {
        return Err(LobbyError::Validation(format!(
            "Restaurant {} is not on the ballot",
            restaurant_id
        )));
    }

    let now = Utc::now();
    match lobby.votes.iter_mut().find(|v| v.user_id == user_id) {
        Some(existing) => {
            existing.restaurant_id = restaurant_id.to_string();
            existing.voted_at = now;
        }
        None => lobby.votes.push(Vote {
            user_id,
            restaurant_id: restaurant_id.to_string(),
            voted_at: now,
        }),
    }

    let mut events = vec![LobbyEvent::Voted { user_id }];
    events.extend(settle(lobby));
    Ok(events)
}

/// Distinct current participants holding a vote.
pub fn vote_count(lobby: &Lobby) -> usize {
    lobby
        .participants
        .iter()
        .filter(|p| lobby.vote_of(p.user_id).is_some())
        .count()
}

pub fn all_voted(lobby: &Lobby) -> bool {
    !lobby.participants.is_empty() && vote_count(lobby) == lobby.participants.len()
}

/// Votes per ballot entry, in ballot order.
pub fn tallies(lobby: &Lobby) -> Vec<Tally> {
    lobby
        .ballot
        .iter()
        .map(|id| Tally {
            restaurant_id: id.clone(),
            votes: lobby
                .votes
                .iter()
                .filter(|v| &v.restaurant_id == id && lobby.is_participant(v.user_id))
                .count(),
        })
        .collect()
}

/// A strict maximum completes the round; otherwise the lobby enters the
/// tied sub-state and waits for the host. Ties are never auto-broken.
pub(crate) fn resolve(lobby: &mut Lobby) -> Option<LobbyEvent> {
    let tallies = tallies(lobby);
    let max = tallies.iter().map(|t| t.votes).max()?;
    let leaders: Vec<RestaurantId> = tallies
        .into_iter()
        .filter(|t| t.votes == max)
        .map(|t| t.restaurant_id)
        .collect();

    if let [winner] = leaders.as_slice() {
        lobby.status = LobbyStatus::Completed;
        lobby.winning_restaurant = Some(winner.clone());
        Some(LobbyEvent::Completed {
            winner: winner.clone(),
        })
    } else {
        lobby.tied_restaurants = Some(leaders.clone());
        Some(LobbyEvent::Tied {
            restaurants: leaders,
        })
    }
}

/// Host resolution of a tie: vote again on the tied subset or on the
/// original ballot. All votes are discarded either way.
pub fn revote(lobby: &mut Lobby, user_id: UserId, tied_only: bool) -> Transition {
    require_host(lobby, user_id, "start a revote")?;

    let tied = match (&lobby.status, &lobby.tied_restaurants) {
        (LobbyStatus::Voting, Some(tied)) => tied.clone(),
        _ => {
            return Err(LobbyError::PreconditionFailed(
                "A revote is only possible after a tie".to_string(),
            ))
        }
    };

    lobby.ballot = if tied_only {
        tied
    } else {
        lobby.full_ballot.clone()
    };
    lobby.votes.clear();
    lobby.tied_restaurants = None;
    lobby.revote_count += 1;

    Ok(vec![LobbyEvent::RevoteStarted {
        tied_only,
        ballot: lobby.ballot.clone(),
    }])
}

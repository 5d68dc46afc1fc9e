//! Swipe ledger and match reduction.

use chrono::Utc;
use serde::Serialize;

use super::{require_participant, settle, Transition};
use crate::common::UserId;
use crate::domains::lobby::errors::LobbyError;
use crate::domains::lobby::events::LobbyEvent;
use crate::domains::lobby::models::{Lobby, LobbyStatus, RestaurantId, Swipe, SwipeDirection};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwipeProgress {
    pub user_id: UserId,
    pub name: String,
    pub swiped: usize,
    pub total: usize,
    pub done: bool,
}

/// Record a one-shot like/pass decision. A second swipe on the same
/// restaurant in the same round is a conflict.
pub fn swipe(
    lobby: &mut Lobby,
    user_id: UserId,
    restaurant_id: &str,
    direction: SwipeDirection,
) -> Transition {
    require_participant(lobby, user_id)?;

    if lobby.status != LobbyStatus::Matching {
        return Err(LobbyError::InvalidState(format!(
            "Swiping is only open while matching (lobby is {})",
            lobby.status
        )));
    }

    if lobby.restaurant(restaurant_id).is_none() {
        return Err(LobbyError::Validation(format!(
            "Restaurant {} is not part of this round",
            restaurant_id
        )));
    }

    if lobby
        .swipes
        .iter()
        .any(|s| s.user_id == user_id && s.restaurant_id == restaurant_id)
    {
        return Err(LobbyError::Conflict(
            "You already swiped on this restaurant".to_string(),
        ));
    }

    lobby.swipes.push(Swipe {
        user_id,
        restaurant_id: restaurant_id.to_string(),
        direction,
        swiped_at: Utc::now(),
    });

    let mut events = vec![LobbyEvent::Swiped {
        user_id,
        done: is_done(lobby, user_id),
    }];
    events.extend(settle(lobby));
    Ok(events)
}

/// Number of snapshot restaurants the user has swiped on.
pub fn swiped_count(lobby: &Lobby, user_id: UserId) -> usize {
    lobby
        .swipes
        .iter()
        .filter(|s| s.user_id == user_id && lobby.restaurant(&s.restaurant_id).is_some())
        .count()
}

/// True iff the user holds exactly one swipe for every snapshot restaurant
/// and none outside it.
pub fn is_done(lobby: &Lobby, user_id: UserId) -> bool {
    let mine: Vec<&Swipe> = lobby.swipes.iter().filter(|s| s.user_id == user_id).collect();
    mine.len() == lobby.restaurants.len()
        && lobby
            .restaurants
            .iter()
            .all(|r| mine.iter().filter(|s| s.restaurant_id == r.id).count() == 1)
}

pub fn all_done(lobby: &Lobby) -> bool {
    !lobby.participants.is_empty() && lobby.participants.iter().all(|p| is_done(lobby, p.user_id))
}

pub fn progress(lobby: &Lobby) -> Vec<SwipeProgress> {
    lobby
        .participants
        .iter()
        .map(|p| SwipeProgress {
            user_id: p.user_id,
            name: p.name.clone(),
            swiped: swiped_count(lobby, p.user_id),
            total: lobby.restaurants.len(),
            done: is_done(lobby, p.user_id),
        })
        .collect()
}

/// Intersection of every participant's right-swiped set, in snapshot order.
pub fn compute_ballot(lobby: &Lobby) -> Vec<RestaurantId> {
    if lobby.participants.is_empty() {
        return Vec::new();
    }

    lobby
        .restaurants
        .iter()
        .filter(|r| {
            lobby.participants.iter().all(|p| {
                lobby.swipes.iter().any(|s| {
                    s.user_id == p.user_id
                        && s.restaurant_id == r.id
                        && s.direction == SwipeDirection::Right
                })
            })
        })
        .map(|r| r.id.clone())
        .collect()
}

/// `matching -> voting`. The ballot is computed once here and kept as the
/// full ballot for later revotes.
pub(crate) fn advance_to_voting(lobby: &mut Lobby) -> LobbyEvent {
    let ballot = compute_ballot(lobby);
    lobby.ballot = ballot.clone();
    lobby.full_ballot = ballot.clone();
    lobby.votes.clear();
    lobby.tied_restaurants = None;
    lobby.status = LobbyStatus::Voting;
    LobbyEvent::BallotFormed { ballot }
}

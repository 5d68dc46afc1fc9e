//! API representations of lobby state.
//!
//! Handlers serialise these, never the stored `Lobby` document, so vibe
//! answers and other participants' ballots stay private.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::{LobbyId, UserId};
use crate::domains::lobby::machines::{ledger, tally, SwipeProgress, Tally};
use crate::domains::lobby::models::{
    Lobby, LobbyStatus, Participant, Restaurant, RestaurantId, SwipeDirection, VibeCheck,
};

// =============================================================================
// Requests
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLobbyInput {
    /// Display name; falls back to the token's name.
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinLobbyInput {
    pub code: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwipeInput {
    pub restaurant_id: RestaurantId,
    pub direction: SwipeDirection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteInput {
    pub restaurant_id: RestaurantId,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevoteInput {
    pub use_tied_only: bool,
}

// =============================================================================
// Responses
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLobbyResponse {
    pub lobby_id: LobbyId,
    pub code: String,
    /// Present when the caller arrived without a token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinLobbyResponse {
    pub lobby_id: LobbyId,
    pub code: String,
    pub status: LobbyStatus,
    pub participant: ParticipantData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantData {
    pub user_id: UserId,
    pub name: String,
    pub is_host: bool,
    pub is_ready: bool,
    pub joined_at: DateTime<Utc>,
}

impl From<&Participant> for ParticipantData {
    fn from(p: &Participant) -> Self {
        Self {
            user_id: p.user_id,
            name: p.name.clone(),
            is_host: p.is_host,
            is_ready: p.is_ready,
            joined_at: p.joined_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LobbyData {
    pub id: LobbyId,
    pub code: String,
    pub host_id: UserId,
    pub status: LobbyStatus,
    pub round: i32,
    pub participants: Vec<ParticipantData>,
    pub restaurants: Vec<Restaurant>,
    pub is_tie: bool,
    pub winning_restaurant: Option<RestaurantId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Lobby> for LobbyData {
    fn from(lobby: &Lobby) -> Self {
        Self {
            id: lobby.id,
            code: lobby.code.clone(),
            host_id: lobby.host_id,
            status: lobby.status,
            round: lobby.round,
            participants: lobby.participants.iter().map(Into::into).collect(),
            restaurants: lobby.restaurants.clone(),
            is_tie: lobby.is_tied(),
            winning_restaurant: lobby.winning_restaurant.clone(),
            created_at: lobby.created_at,
            updated_at: lobby.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessData {
    pub user_id: UserId,
    pub name: String,
    pub is_ready: bool,
}

/// Poll target for the waiting room.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VibeStatusData {
    /// The caller's own submission, if any.
    pub my_vibe: Option<VibeCheck>,
    pub participants: Vec<ReadinessData>,
    pub ready_count: usize,
    pub total_participants: usize,
    pub all_ready: bool,
}

impl VibeStatusData {
    pub fn for_caller(lobby: &Lobby, caller: UserId) -> Self {
        Self {
            my_vibe: lobby.participant(caller).and_then(|p| p.vibe),
            participants: lobby
                .participants
                .iter()
                .map(|p| ReadinessData {
                    user_id: p.user_id,
                    name: p.name.clone(),
                    is_ready: p.is_ready,
                })
                .collect(),
            ready_count: lobby.ready_count(),
            total_participants: lobby.participants.len(),
            all_ready: lobby.all_ready(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantsData {
    pub status: LobbyStatus,
    pub round: i32,
    pub restaurants: Vec<Restaurant>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwipeProgressData {
    pub status: LobbyStatus,
    pub participants: Vec<SwipeProgress>,
    pub all_done: bool,
}

impl From<&Lobby> for SwipeProgressData {
    fn from(lobby: &Lobby) -> Self {
        Self {
            status: lobby.status,
            participants: ledger::progress(lobby),
            all_done: ledger::all_done(lobby),
        }
    }
}

/// Ballot, tallies and resolution state of the current round.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VotingData {
    pub status: LobbyStatus,
    pub ballot: Vec<Restaurant>,
    pub tallies: Vec<Tally>,
    pub vote_count: usize,
    pub participant_count: usize,
    pub all_voted: bool,
    pub my_vote: Option<RestaurantId>,
    pub is_tie: bool,
    pub tied_restaurants: Vec<RestaurantId>,
    pub winning_restaurant: Option<Restaurant>,
    pub revote_count: i32,
}

impl VotingData {
    pub fn for_caller(lobby: &Lobby, caller: UserId) -> Self {
        Self {
            status: lobby.status,
            ballot: lobby
                .ballot
                .iter()
                .filter_map(|id| lobby.restaurant(id).cloned())
                .collect(),
            tallies: tally::tallies(lobby),
            vote_count: tally::vote_count(lobby),
            participant_count: lobby.participants.len(),
            all_voted: tally::all_voted(lobby),
            my_vote: lobby.vote_of(caller).map(|v| v.restaurant_id.clone()),
            is_tie: lobby.is_tied(),
            tied_restaurants: lobby.tied_restaurants.clone().unwrap_or_default(),
            winning_restaurant: lobby
                .winning_restaurant
                .as_deref()
                .and_then(|id| lobby.restaurant(id))
                .cloned(),
            revote_count: lobby.revote_count,
        }
    }
}

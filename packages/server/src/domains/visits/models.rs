use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::{LobbyId, UserId};
use crate::domains::lobby::models::{Lobby, Restaurant};

/// A completed round's winning restaurant, attached to every participant's
/// history. Exactly one exists per `(lobby_id, round)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Visit {
    pub lobby_id: LobbyId,
    pub round: i32,
    pub restaurant: Restaurant,
    pub participant_ids: Vec<UserId>,
    pub visited_at: DateTime<Utc>,
}

impl Visit {
    /// Build the visit for a completed lobby. `None` unless a winner is set
    /// and present in the round's snapshot.
    pub fn for_completed(lobby: &Lobby) -> Option<Self> {
        let winner = lobby.winning_restaurant.as_deref()?;
        let restaurant = lobby.restaurant(winner)?.clone();

        Some(Self {
            lobby_id: lobby.id,
            round: lobby.round,
            restaurant,
            participant_ids: lobby.participants.iter().map(|p| p.user_id).collect(),
            visited_at: Utc::now(),
        })
    }
}

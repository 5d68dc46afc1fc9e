use serde::{Deserialize, Serialize};

use super::models::{LobbyStatus, RestaurantId};
use crate::common::UserId;

/// Lobby domain events - facts produced by committed state transitions.
///
/// The state machine returns these from every mutation; the service logs
/// them, publishes them to lobby subscribers, and runs side effects
/// (the Visit write) off `Completed`. Rejections are `LobbyError`s, not events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LobbyEvent {
    Created {
        code: String,
    },
    ParticipantJoined {
        user_id: UserId,
    },
    ParticipantLeft {
        user_id: UserId,
        new_host: Option<UserId>,
    },
    VibeSubmitted {
        user_id: UserId,
        all_ready: bool,
    },
    MatchingStarted {
        candidate_count: usize,
    },
    Swiped {
        user_id: UserId,
        done: bool,
    },
    BallotFormed {
        ballot: Vec<RestaurantId>,
    },
    Voted {
        user_id: UserId,
    },
    Tied {
        restaurants: Vec<RestaurantId>,
    },
    Completed {
        winner: RestaurantId,
    },
    RevoteStarted {
        tied_only: bool,
        ballot: Vec<RestaurantId>,
    },
    Reset {
        round: i32,
    },
}

impl LobbyEvent {
    /// Status the lobby is in after this event, when the event moves it.
    pub fn status_after(&self) -> Option<LobbyStatus> {
        match self {
            LobbyEvent::MatchingStarted { .. } => Some(LobbyStatus::Matching),
            LobbyEvent::BallotFormed { .. } | LobbyEvent::RevoteStarted { .. } => {
                Some(LobbyStatus::Voting)
            }
            LobbyEvent::Completed { .. } => Some(LobbyStatus::Completed),
            LobbyEvent::Reset { .. } => Some(LobbyStatus::Waiting),
            _ => None,
        }
    }
}
